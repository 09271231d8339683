use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use earshot::cli::{Cli, Commands, OutputFormat};
use earshot::config::Config;
use earshot::pipeline::{Pipeline, ProgressReporter};
use earshot::schemas::KnownSchema;
use earshot::tasks::{self, ExtractOptions, SummarizeOptions, TranscribeOptions};
use earshot::{output, sources, utils};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "earshot=debug"
    } else {
        "earshot=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Config { show } => {
            let config = Config::load()?;
            if show {
                config.display();
            } else {
                config.save()?;
                println!("Configuration file written with current values.");
                println!("Edit it manually to change defaults; API keys stay in the environment.");
            }
        }
        Commands::Sources => {
            print_sources();
        }
        command => {
            // yt-dlp is only needed for remote sources (non-fatal warning)
            if command_needs_download(&command) {
                let missing = utils::check_dependencies().await;
                if !missing.is_empty() {
                    eprintln!("{} Dependency check warnings:", style("⚠").yellow());
                    for dep in missing {
                        eprintln!("   • {}", dep);
                    }
                    eprintln!("   (Continuing anyway - tools may be available)");
                }
            }

            let config = Config::load()?;
            let pipeline = Pipeline::new(&config)?;
            let model = Some(config.model_for(cli.model.as_deref()));

            let progress_bar = if cli.quiet {
                None
            } else {
                Some(make_progress_bar())
            };
            let mut reporter = match progress_bar.clone() {
                Some(bar) => ProgressReporter::new(Box::new(move |event| {
                    bar.set_position((event.progress * 100.0).round() as u64);
                    bar.set_message(event.stage);
                })),
                None => ProgressReporter::disabled(),
            };

            let rendered = run_command(
                command,
                &pipeline,
                &config,
                model,
                &cli.format,
                cli.raw,
                &mut reporter,
            )
            .await;

            if let Some(bar) = progress_bar {
                bar.finish_and_clear();
            }

            let content = rendered?;
            match cli.output {
                Some(path) => {
                    output::save_to_file(&content, &path)?;
                    println!("Result saved to: {}", path.display());
                }
                None => println!("{}", content),
            }
        }
    }

    Ok(())
}

fn command_needs_download(command: &Commands) -> bool {
    match command {
        Commands::Transcribe { source, .. }
        | Commands::Summarize { source, .. }
        | Commands::Extract { source, .. } => sources::is_youtube_url(source),
        _ => false,
    }
}

fn make_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .unwrap(),
    );
    bar
}

async fn run_command(
    command: Commands,
    pipeline: &Pipeline,
    config: &Config,
    model: Option<String>,
    format: &OutputFormat,
    raw: bool,
    reporter: &mut ProgressReporter,
) -> Result<String> {
    match command {
        Commands::Transcribe { source, clean } => {
            tracing::info!("Starting transcription for {}", source);
            let options = TranscribeOptions { model, clean };
            let result = tasks::transcribe(pipeline, &source, &options, reporter).await?;
            output::render(&result, &result.transcription, format, raw)
        }
        Commands::Summarize {
            source,
            max_length,
            language,
        } => {
            tracing::info!("Starting summarization for {}", source);
            let options = SummarizeOptions {
                model,
                max_length,
                language: language.or_else(|| Some(config.app.default_language.clone())),
            };
            let result = tasks::summarize(pipeline, &source, &options, reporter).await?;
            output::render(&result, &result.summary, format, raw)
        }
        Commands::Extract {
            source,
            prompt,
            structured,
            schema,
        } => {
            tracing::info!("Starting extraction for {}", source);
            let schema = match schema {
                Some(name) => Some(KnownSchema::from_name(&name).ok_or_else(|| {
                    anyhow::anyhow!(
                        "unknown schema: {} (available: {})",
                        name,
                        KnownSchema::ALL
                            .iter()
                            .map(|schema| schema.name())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                })?),
                None => None,
            };
            let options = ExtractOptions {
                model,
                structured,
                schema,
            };
            let result = tasks::extract(pipeline, &source, &prompt, &options, reporter).await?;
            output::render(&result, &result.extraction, format, raw)
        }
        Commands::Config { .. } | Commands::Sources => unreachable!("handled before dispatch"),
    }
}

fn print_sources() {
    println!("Supported audio sources:");
    println!("  • Local audio files (mp3, wav, m4a, ogg)");
    println!("  • YouTube URLs (youtube.com, youtu.be)");
    println!();
    println!("Response schemas for `extract --schema`:");
    for schema in KnownSchema::ALL {
        println!("  • {}", schema.name());
    }
}
