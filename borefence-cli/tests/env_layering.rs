//! Environment variables configure the subcommands of the built binary.

use std::path::Path;
use std::process::{Command, Output};

use rstest::{fixture, rstest};
use tempfile::TempDir;

const INPUT: &str = r#"{
    "borings": [{"id": "B1", "x": 0, "elevation": 10}],
    "samples": [
        {"id": "B1", "depths": [1], "values": [2]},
        {"id": "B9", "depths": [1], "values": [2]}
    ]
}"#;

#[fixture]
fn home() -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    std::fs::write(dir.path().join("borings.json"), INPUT).expect("write input");
    dir
}

fn run_borings(home: &Path, strict: Option<&str>) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_borefence"));
    command
        .current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("BOREFENCE_CMDS_BORINGS_INPUT", home.join("borings.json"))
        .env("BOREFENCE_CMDS_BORINGS_WORKSPACE", home.join("gis"))
        .env("BOREFENCE_CMDS_BORINGS_NAME", "EnvFence")
        .arg("borings");
    if let Some(value) = strict {
        command.env("BOREFENCE_CMDS_BORINGS_STRICT", value);
    }
    command.output().expect("run borefence")
}

#[rstest]
fn environment_supplies_every_borings_option(home: TempDir) {
    let output = run_borings(home.path(), None);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let output_path = home.path().join("gis").join("EnvFence.geojson");
    assert!(output_path.exists(), "{} should exist", output_path.display());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("wrote 1 features to "), "stdout: {stdout}");
}

#[rstest]
fn strict_from_environment_survives_cli_merge(home: TempDir) {
    let output = run_borings(home.path(), Some("true"));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("boring B9 is not registered"), "stderr: {stderr}");
    assert!(!home.path().join("gis").exists());
}
