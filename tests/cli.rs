use assert_cmd::Command;
use predicates::prelude::*;

fn earshot() -> (Command, tempfile::TempDir) {
    let config_home = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("earshot").unwrap();
    // Keep test runs away from the user's real config file
    cmd.env("XDG_CONFIG_HOME", config_home.path());
    (cmd, config_home)
}

#[test]
fn test_help_lists_subcommands() {
    let (mut cmd, _guard) = earshot();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("transcribe"))
        .stdout(predicate::str::contains("summarize"))
        .stdout(predicate::str::contains("extract"));
}

#[test]
fn test_version_flag() {
    let (mut cmd, _guard) = earshot();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("earshot"));
}

#[test]
fn test_sources_lists_schemas() {
    let (mut cmd, _guard) = earshot();
    cmd.arg("sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("YouTube"))
        .stdout(predicate::str::contains("audio_insights"));
}

#[test]
fn test_rejects_unsupported_input() {
    let (mut cmd, _guard) = earshot();
    cmd.env("GOOGLE_API_KEY", "test-key")
        .args(["transcribe", "notes.txt", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn test_rejects_unknown_schema() {
    let (mut cmd, _guard) = earshot();
    cmd.env("GOOGLE_API_KEY", "test-key")
        .args([
            "extract",
            "audio.mp3",
            "--prompt",
            "list the speakers",
            "--schema",
            "nope",
            "--quiet",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown schema"));
}

#[test]
fn test_missing_api_key_is_reported() {
    let (mut cmd, _guard) = earshot();
    cmd.env_remove("GOOGLE_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GENAI_API_KEY")
        .args(["transcribe", "audio.mp3", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("API key"));
}
