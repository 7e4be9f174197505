//! Integration tests for the readycheck binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// A command isolated from CI detection and stray prompt answers.
fn readycheck(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("readycheck"));
    cmd.current_dir(temp.path())
        .env_remove("READYCHECK_CONFIG")
        .env_remove("READYCHECK_ENV_FILE")
        .env("NO_COLOR", "1");
    cmd
}

fn backend_project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let backend = temp.path().join("backend");
    fs::create_dir_all(backend.join("node_modules/express")).unwrap();
    fs::write(
        backend.join("package.json"),
        r#"{"name":"game-server","dependencies":{"express":"^4.18.2"}}"#,
    )
    .unwrap();
    fs::write(
        backend.join("node_modules/express/package.json"),
        r#"{"name":"express","version":"4.18.2"}"#,
    )
    .unwrap();
    temp
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Check and fix everything"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn dry_run_check_all_ready() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["--dry-run", "check"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("6/6 components ready: ready to play"));
    Ok(())
}

#[test]
fn scenario_implies_dry_run_and_partial_verdict() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["--scenario", "gpu.driver=1", "check"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("nvidia-smi not found on PATH"))
        .stderr(predicate::str::contains("5/6 components ready: mostly ready"));
    Ok(())
}

#[test]
fn broken_machine_is_mostly_broken() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args([
            "check",
            "--scenario",
            "node.runtime=1",
            "--scenario",
            "mysql.service=2",
            "--scenario",
            "llm.model=1",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("3/6 components ready: mostly broken"));
    Ok(())
}

#[test]
fn scenarios_before_and_after_subcommand_both_apply() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args([
            "--scenario",
            "mysql.service=1",
            "check",
            "--scenario",
            "gpu.driver=2",
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("MySQL80 is stopped"))
        .stderr(predicate::str::contains("4/6 components ready: mostly broken"));
    Ok(())
}

#[test]
fn check_json_is_machine_readable() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let output = readycheck(&temp)
        .args(["--scenario", "mysql.credentials=1", "check", "--json"])
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["verdict"], "partial");
    assert_eq!(value["total"], 6);
    let mysql = &value["components"][2];
    assert_eq!(mysql["overall_ok"], false);
    assert_eq!(mysql["results"][3]["id"], "mysql.credentials");
    Ok(())
}

#[test]
fn unknown_scenario_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["--scenario", "mysql.service=42", "check"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("mysql.service"));
    Ok(())
}

#[test]
fn unknown_component_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["--dry-run", "component", "redis"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("redis"));
    Ok(())
}

#[test]
fn missing_settings_file_is_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["--config", "nope.yml", "--dry-run", "check"])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn invalid_settings_are_a_usage_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("readycheck.yml"), "partial_threshold: 3\n")?;
    readycheck(&temp)
        .args(["--dry-run", "check"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("partial_threshold"));
    Ok(())
}

#[test]
fn settings_threshold_changes_verdict() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("readycheck.yml"), "partial_threshold: 0.5\n")?;
    readycheck(&temp)
        .args([
            "check",
            "--scenario",
            "node.npm=1",
            "--scenario",
            "gpu.cuda=1",
            "--scenario",
            "llm.library=1",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("mostly ready"));
    Ok(())
}

#[test]
fn list_shows_components_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)node.*backend.*mysql.*gpu.*toolchain.*llm")?)
        .stdout(predicate::str::contains("mysql.credentials"));
    Ok(())
}

#[test]
fn non_interactive_setup_answers_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["--non-interactive", "--scenario", "mysql.database=1", "setup"])
        .env("READYCHECK_PROMPT_CHOICE_MYSQL", "a")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[dry-run] would run:"))
        .stdout(predicate::str::contains("6/6 components ready"));
    Ok(())
}

#[test]
fn non_interactive_setup_skips_by_default() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["--non-interactive", "--scenario", "toolchain.cmake=1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("5/6 components ready"));
    Ok(())
}

#[test]
fn exit_choice_ends_with_success() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["--non-interactive", "--scenario", "node.runtime=2", "setup"])
        .env("READYCHECK_PROMPT_CHOICE_NODE", "x")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Setup stopped"));
    Ok(())
}

#[test]
fn component_check_on_real_project() -> Result<(), Box<dyn std::error::Error>> {
    let temp = backend_project();
    readycheck(&temp)
        .args(["component", "backend", "check"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("1 dependencies installed"));
    Ok(())
}

#[test]
fn component_check_reports_missing_backend() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    readycheck(&temp)
        .args(["component", "backend"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no package.json in backend"));
    Ok(())
}
