//! CLI surface tests using the compiled binary

use assert_cmd::Command;
use predicates::prelude::*;

fn nqp() -> Command {
    Command::cargo_bin("nqp").expect("binary builds")
}

#[test]
fn help_lists_probe_options() {
    nqp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--probe"))
        .stdout(predicate::str::contains("--url"))
        .stdout(predicate::str::contains("--video-url"))
        .stdout(predicate::str::contains("--policy"));
}

#[test]
fn version_prints_package_version() {
    nqp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn conflicting_color_flags_fail_fast() {
    nqp()
        .args(["--color", "--no-color"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--color"));
}

#[test]
fn unknown_probe_kind_is_rejected() {
    nqp()
        .args(["--probe", "dns"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("dns"));
}

#[test]
fn video_probe_without_url_is_rejected() {
    nqp()
        .args(["--probe", "video"])
        .env_remove("NQP_VIDEO_URL")
        .assert()
        .failure()
        .stderr(predicate::str::contains("video"));
}

#[test]
fn zero_timeout_fails_validation() {
    nqp()
        .args(["--probe", "jitter", "--timeout", "0"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Timeout"));
}
