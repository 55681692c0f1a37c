use std::fs;
use std::path::{Path, PathBuf};

use predicates::prelude::*;
use subler_tag_core::ExitCode;
use tempfile::{tempdir, TempDir};

fn cargo_bin(dir: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("subler-tag").unwrap();
    cmd.current_dir(dir).env_remove("SUBLER_CLI_PATH").env_remove("RUST_LOG");
    cmd
}

fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let source = dir.path().join("movie.mp4");
    fs::write(&source, b"movie").unwrap();
    (dir, source)
}

#[test]
fn lists_recognised_tags() {
    let dir = tempdir().unwrap();

    cargo_bin(dir.path())
        .arg("--list-tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("Artist\n"))
        .stdout(predicate::str::contains("Media Kind\n"));
}

#[test]
fn lists_media_kinds() {
    let dir = tempdir().unwrap();

    cargo_bin(dir.path())
        .arg("--list-media-kinds")
        .assert()
        .success()
        .stdout(predicate::str::contains("TV Show\n"));
}

#[test]
fn prints_escaped_command() {
    let (dir, source) = workspace();

    cargo_bin(dir.path())
        .arg(&source)
        .arg("--tag")
        .arg("Cast=John's Doe")
        .arg("--dest")
        .arg("dest & path")
        .arg("--executable")
        .arg("/opt/SublerCLI")
        .arg("--print")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("/opt/SublerCLI -source "))
        .stdout(predicate::str::contains(r"-dest dest\ \&\ path "))
        .stdout(predicate::str::contains(
            r"-metadata {'Cast':'John\'s Doe'}{'Media Kind':'Movie'} ",
        ))
        .stdout(predicate::str::contains(
            "-chapterspreview -optimize -organizegroups -64bitchunk",
        ));
}

#[test]
fn prints_json_command() {
    let (dir, source) = workspace();

    cargo_bin(dir.path())
        .arg(&source)
        .args(["--media-kind", "none", "--no-optimize", "--print", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"executable\": \"/usr/local/bin/SublerCLI\""))
        .stdout(predicate::str::contains("\"-64bitchunk\""))
        .stdout(predicate::str::contains("-optimize").not())
        .stdout(predicate::str::contains("-metadata").not());
}

#[test]
fn config_file_supplies_defaults() {
    let (dir, source) = workspace();
    fs::write(
        dir.path().join(".subler-tag.toml"),
        "media_kind = \"Music\"\n[flags]\nchapters_preview = false\n",
    )
    .unwrap();

    cargo_bin(dir.path())
        .arg(&source)
        .arg("--print")
        .assert()
        .success()
        .stdout(predicate::str::contains("{'Media Kind':'Music'}"))
        .stdout(predicate::str::contains("-chapterspreview").not());
}

#[test]
fn invalid_config_exits_with_config_code() {
    let (dir, source) = workspace();
    fs::write(dir.path().join(".subler-tag.toml"), "media_kind = \"Radio\"\n").unwrap();

    cargo_bin(dir.path())
        .arg(&source)
        .arg("--print")
        .assert()
        .failure()
        .code(ExitCode::Config as i32)
        .stderr(predicate::str::contains("unknown media kind 'Radio'"));
}

#[test]
fn missing_source_fails() {
    let dir = tempdir().unwrap();

    cargo_bin(dir.path())
        .arg("absent.mp4")
        .arg("--print")
        .assert()
        .failure()
        .code(ExitCode::SourceNotFound as i32)
        .stderr(predicate::str::contains("source file not found"));
}

#[test]
fn malformed_tag_is_rejected() {
    let (dir, source) = workspace();

    cargo_bin(dir.path())
        .arg(&source)
        .args(["--tag", "Artist", "--print"])
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments as i32)
        .stderr(predicate::str::contains("expected TAG=VALUE"));
}

#[test]
fn strict_mode_rejects_unknown_tags() {
    let (dir, source) = workspace();

    cargo_bin(dir.path())
        .arg(&source)
        .args(["--tag", "Mood=Happy", "--strict", "--print"])
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments as i32)
        .stderr(predicate::str::contains("unrecognised tag 'Mood'"));
}

#[test]
fn unknown_tags_pass_without_strict() {
    let (dir, source) = workspace();

    cargo_bin(dir.path())
        .arg(&source)
        .args(["--tag", "Mood=Happy", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{'Mood':'Happy'}"));
}

#[test]
fn unknown_option_is_an_invalid_argument() {
    let dir = tempdir().unwrap();

    cargo_bin(dir.path())
        .arg("--bogus")
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments as i32);
}

#[test]
fn missing_source_argument_is_an_invalid_argument() {
    let dir = tempdir().unwrap();

    cargo_bin(dir.path())
        .assert()
        .failure()
        .code(ExitCode::InvalidArguments as i32);
}

#[test]
fn version_request_succeeds() {
    let dir = tempdir().unwrap();

    cargo_bin(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("subler-tag"));
}

#[cfg(unix)]
mod process {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-subler");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn runs_tool_from_environment() {
        let (dir, source) = workspace();
        let tool = fake_tool(dir.path(), r#"echo "tagged $4""#);

        cargo_bin(dir.path())
            .env("SUBLER_CLI_PATH", &tool)
            .arg(&source)
            .assert()
            .success()
            .stdout(predicate::str::contains("tagged ").and(predicate::str::contains("movie.0.mp4")));
    }

    #[test]
    fn quiet_suppresses_tool_output() {
        let (dir, source) = workspace();
        let tool = fake_tool(dir.path(), "echo chatter");

        cargo_bin(dir.path())
            .arg(&source)
            .arg("--executable")
            .arg(&tool)
            .arg("--quiet")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn tool_failure_is_surfaced() {
        let (dir, source) = workspace();
        let tool = fake_tool(dir.path(), "echo boom >&2; exit 7");

        cargo_bin(dir.path())
            .arg(&source)
            .arg("--executable")
            .arg(&tool)
            .assert()
            .failure()
            .code(ExitCode::ExternalProcess as i32)
            .stderr(predicate::str::contains("boom"))
            .stderr(predicate::str::contains("exited with status 7"));
    }
}
