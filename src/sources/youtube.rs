use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::sleep;
use uuid::Uuid;

use crate::pipeline::ProgressReporter;
use crate::{EarshotError, Result};

const DOWNLOAD_ATTEMPTS: u32 = 3;

/// Template that makes yt-dlp print "downloaded/total" byte counts, one per line
const PROGRESS_TEMPLATE: &str = "download:%(progress.downloaded_bytes)s/%(progress.total_bytes)s";

/// YouTube audio downloader using yt-dlp
pub struct YoutubeDownloader {
    yt_dlp_path: String,
}

impl YoutubeDownloader {
    pub fn new() -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }

    /// Check if yt-dlp is available
    pub async fn check_availability(&self) -> bool {
        Command::new(&self.yt_dlp_path)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Download audio from a YouTube URL into `temp_dir` as an mp3 file.
    ///
    /// The download step is the only part of the pipeline that is retried:
    /// up to three attempts with exponential backoff between them.
    pub async fn download(
        &self,
        url: &str,
        temp_dir: &Path,
        progress: &mut ProgressReporter,
    ) -> Result<PathBuf> {
        let mut attempt = 1;
        loop {
            match self.download_once(url, temp_dir, progress).await {
                Ok(path) => return Ok(path),
                Err(e) if attempt < DOWNLOAD_ATTEMPTS => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "download attempt {}/{} for {} failed: {} (retrying in {:?})",
                        attempt,
                        DOWNLOAD_ATTEMPTS,
                        url,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn download_once(
        &self,
        url: &str,
        temp_dir: &Path,
        progress: &mut ProgressReporter,
    ) -> Result<PathBuf> {
        let filename = format!("earshot_yt_{}.mp3", &Uuid::new_v4().to_string()[..8]);
        let output_path = temp_dir.join(filename);

        tracing::debug!("Downloading audio from {} to {}", url, output_path.display());

        let mut child = Command::new(&self.yt_dlp_path)
            .args([
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--format",
                "bestaudio/best",
                "--no-playlist",
                "--no-warnings",
                "--newline",
                "--progress-template",
                PROGRESS_TEMPLATE,
                "--output",
                &output_path.to_string_lossy(),
                url,
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| EarshotError::DownloadFailed(format!("failed to launch yt-dlp: {}", e)))?;

        // Drain stderr on the side so a chatty process cannot stall the pipe.
        let mut stderr = child.stderr.take();
        let stderr_task = tokio::spawn(async move {
            let mut buffer = String::new();
            if let Some(stderr) = stderr.as_mut() {
                let _ = stderr.read_to_string(&mut buffer).await;
            }
            buffer
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(fraction) = parse_progress_line(&line) {
                    progress.report("Downloading YouTube audio", fraction);
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EarshotError::DownloadFailed(format!("yt-dlp did not exit: {}", e)))?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(EarshotError::DownloadFailed(format!(
                "yt-dlp failed: {}",
                stderr_output.trim()
            ))
            .into());
        }

        let metadata = fs_err::metadata(&output_path).map_err(|_| {
            EarshotError::DownloadFailed(format!("yt-dlp produced no output for {}", url))
        })?;
        if metadata.len() == 0 {
            let _ = fs_err::remove_file(&output_path);
            return Err(
                EarshotError::DownloadFailed(format!("downloaded file is empty: {}", url)).into(),
            );
        }

        tracing::debug!("Downloaded {} bytes from {}", metadata.len(), url);
        Ok(output_path)
    }
}

impl Default for YoutubeDownloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay before retry `attempt + 1`: 2s, 4s, 8s... capped at 10s
fn backoff_delay(attempt: u32) -> Duration {
    let secs = std::cmp::min(2u64 << (attempt - 1), 10);
    Duration::from_secs(secs)
}

/// Parse a "downloaded/total" progress line into a completion fraction.
///
/// yt-dlp prints "NA" for fields it cannot determine, in which case the line
/// is ignored.
fn parse_progress_line(line: &str) -> Option<f64> {
    let (downloaded, total) = line.trim().split_once('/')?;
    let downloaded: f64 = downloaded.trim().parse().ok()?;
    let total: f64 = total.trim().parse().ok()?;
    if total > 0.0 {
        Some((downloaded / total).clamp(0.0, 1.0))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress_line() {
        assert_eq!(parse_progress_line("512/1024"), Some(0.5));
        assert_eq!(parse_progress_line("1024/1024"), Some(1.0));
        assert_eq!(parse_progress_line(" 100/400 "), Some(0.25));
    }

    #[test]
    fn test_parse_progress_line_invalid() {
        assert_eq!(parse_progress_line("NA/NA"), None);
        assert_eq!(parse_progress_line("100/NA"), None);
        assert_eq!(parse_progress_line("100/0"), None);
        assert_eq!(parse_progress_line("no slash here"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn test_parse_progress_line_clamps_overshoot() {
        // Total bytes can be an estimate that the download exceeds
        assert_eq!(parse_progress_line("2048/1024"), Some(1.0));
    }

    #[test]
    fn test_check_availability_missing_binary() {
        let downloader = YoutubeDownloader {
            yt_dlp_path: "definitely-not-a-real-binary".to_string(),
        };
        assert!(!tokio_test::block_on(downloader.check_availability()));
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(4), Duration::from_secs(10));
    }
}
