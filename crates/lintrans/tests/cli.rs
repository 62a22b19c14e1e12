use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Runs the binary with its user directories pointed at `home` so a real
/// config file on the host never leaks in.
fn lintrans(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lintrans"))
        .env_remove("LINTRANS_CONFIG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run lintrans")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn eval_prints_values() {
    let home = TempDir::new().unwrap();

    let output = lintrans(home.path(), &["eval", "2^3 + 1"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "9");

    let output = lintrans(home.path(), &["eval", "t * 2", "--t", "1.5"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "3");
}

#[test]
fn eval_falls_back_to_zero() {
    let home = TempDir::new().unwrap();
    for expression in ["1/0", "__import__('os')", "foo(t)", "sqrt(-1)"] {
        let output = lintrans(home.path(), &["eval", expression]);
        assert!(output.status.success(), "{expression}");
        assert_eq!(stdout(&output), "0", "{expression}");
    }
}

#[test]
fn check_reports_parse_errors() {
    let home = TempDir::new().unwrap();

    let ok = lintrans(home.path(), &["check", "math.cos(t) * 2"]);
    assert!(ok.status.success());
    assert!(stdout(&ok).starts_with("ok"));

    let bad = lintrans(home.path(), &["check", "open('x')"]);
    assert!(!bad.status.success());
    let stderr = String::from_utf8_lossy(&bad.stderr);
    assert!(stderr.contains("is invalid"), "{stderr}");
}

#[test]
fn settings_defaults_without_config_file() {
    let home = TempDir::new().unwrap();
    let output = lintrans(home.path(), &["settings"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("size = \"800x800\""), "{text}");
    assert!(text.contains("a = \"cos(t)\""), "{text}");
    assert!(text.contains("c = \"-sin(t)\""), "{text}");
    assert!(text.contains("grid = true"), "{text}");
}

#[test]
fn settings_merge_file_and_flags() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    fs::write(
        &config,
        "[window]\nsize = \"640x480\"\n\n[matrix]\na = \"2\"\nb = \"t\"\n\n[display]\ngrid = false\n",
    )
    .unwrap();

    let output = lintrans(
        home.path(),
        &["--config", config.to_str().unwrap(), "-b", "3", "settings"],
    );
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("size = \"640x480\""), "{text}");
    assert!(text.contains("a = \"2\""), "{text}");
    assert!(text.contains("b = \"3\""), "{text}");
    assert!(text.contains("grid = false"), "{text}");
}

#[test]
fn settings_read_config_from_environment() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("env.toml");
    fs::write(&config, "[display]\narrow = false\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lintrans"))
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("LINTRANS_CONFIG", &config)
        .arg("settings")
        .output()
        .expect("failed to run lintrans");
    assert!(output.status.success());
    assert!(stdout(&output).contains("arrow = false"));
}

#[test]
fn missing_explicit_config_is_fatal() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("absent.toml");
    let output = lintrans(
        home.path(),
        &["--config", missing.to_str().unwrap(), "settings"],
    );
    assert!(!output.status.success());
}
