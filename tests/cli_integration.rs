//! Integration tests for the spikeslice binary.

#![allow(clippy::unwrap_used, clippy::cast_precision_loss)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use spikeslice::dataset::{DatasetParams, Firings};
use spikeslice::mda::write_mda_f32;
use spikeslice::output::{ClipsPayload, RangePayload};
use spikeslice::signal::SignalMatrix;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write_dataset(dir: &Path) {
    let rows = (0..3)
        .map(|ch| (0..200).map(|t| (ch * 1000 + t) as f32).collect())
        .collect();
    write_mda_f32(&dir.join("raw.mda"), &SignalMatrix::from_rows(rows).unwrap()).unwrap();
    DatasetParams::new(1000.0)
        .save(&dir.join("params.json"))
        .unwrap();
}

/// Command isolated from the user's configuration.
fn spikeslice(config_dir: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("spikeslice"));
    cmd.env("SPIKESLICE_CONFIG", config_dir.path().join("config.toml"))
        .env_remove("SPIKESLICE_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_info_reports_dimensions() {
    let data = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    write_dataset(data.path());

    spikeslice(&config)
        .arg("info")
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Channels:     3"))
        .stdout(predicate::str::contains("Frames:       200"))
        .stdout(predicate::str::contains("Backend:      dense"));
}

#[test]
fn test_range_csv_zero_fills_before_start() {
    let data = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    write_dataset(data.path());

    spikeslice(&config)
        .args(["range", data.path().to_str().unwrap()])
        .args(["--start", "-2", "--end", "2", "--channels", "2,0"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("frame,time_s,ch2,ch0\n"))
        .stdout(predicate::str::contains("-2,-0.002,0,0\n"))
        .stdout(predicate::str::contains("1,0.001,2001,1\n"));
}

#[test]
fn test_range_json_to_file() {
    let data = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    write_dataset(data.path());
    let out = data.path().join("range.json");

    spikeslice(&config)
        .args(["range", data.path().to_str().unwrap()])
        .args(["--start", "198", "--end", "201", "--format", "json", "-q"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let payload: RangePayload =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(payload.t_end, 201);
    assert_eq!(payload.channels, vec![0, 1, 2]);
    assert_eq!(payload.data[1], vec![1198.0, 1199.0, 0.0]);
}

#[test]
fn test_unknown_channel_fails() {
    let data = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    write_dataset(data.path());

    spikeslice(&config)
        .args(["range", data.path().to_str().unwrap()])
        .args(["--start", "0", "--end", "10", "--channels", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("channel 3"));
}

#[test]
fn test_clips_for_unit() {
    let data = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    write_dataset(data.path());
    Firings::new(vec![10, 100, 150], vec![2, 1, 2])
        .unwrap()
        .save(&data.path().join("firings.mda"))
        .unwrap();

    let output = spikeslice(&config)
        .args(["clips", data.path().to_str().unwrap()])
        .args(["--unit", "2", "--clip-len", "4", "--channels", "1", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let payload: ClipsPayload = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload.times, vec![10, 150]);
    assert_eq!(payload.centering_offset, 1);
    assert_eq!(payload.clips[0][0], vec![1009.0, 1010.0, 1011.0, 1012.0]);
}

#[test]
fn test_chunk_then_read_from_store() {
    let data = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    write_dataset(data.path());

    spikeslice(&config)
        .args(["chunk", data.path().to_str().unwrap()])
        .args(["--chunk-size", "64", "--padding", "4", "--no-progress"])
        .assert()
        .success();
    assert!(data.path().join("raw.chunks").join("store.json").exists());

    spikeslice(&config)
        .arg("info")
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend:      chunked"))
        .stdout(predicate::str::contains("4 x 64 samples (+4 padding)"));

    // refuses to overwrite without --force
    spikeslice(&config)
        .args(["chunk", data.path().to_str().unwrap(), "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_forced_chunk_without_dense_source_keeps_store() {
    let data = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    write_dataset(data.path());

    spikeslice(&config)
        .args(["chunk", data.path().to_str().unwrap()])
        .args(["--chunk-size", "20", "--padding", "2", "--no-progress"])
        .assert()
        .success();
    std::fs::remove_file(data.path().join("raw.mda")).unwrap();

    spikeslice(&config)
        .args(["chunk", data.path().to_str().unwrap(), "--force", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no recording found"));

    // the chunked store is now the only copy and must still serve reads
    assert!(data.path().join("raw.chunks").join("store.json").exists());
    spikeslice(&config)
        .args(["range", data.path().to_str().unwrap()])
        .args(["--start", "0", "--end", "2", "--channels", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1,0.001,1001\n"));
}

#[test]
fn test_forced_chunk_replaces_layout() {
    let data = TempDir::new().unwrap();
    let config = TempDir::new().unwrap();
    write_dataset(data.path());

    for chunk_size in ["64", "50"] {
        spikeslice(&config)
            .args(["chunk", data.path().to_str().unwrap(), "--force"])
            .args(["--chunk-size", chunk_size, "--padding", "0", "--no-progress"])
            .assert()
            .success();
    }

    spikeslice(&config)
        .arg("info")
        .arg(data.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("4 x 50 samples (+0 padding)"));
}

#[test]
fn test_config_init_and_path() {
    let config = TempDir::new().unwrap();
    let path = config.path().join("config.toml");

    spikeslice(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));

    spikeslice(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(path.exists());

    spikeslice(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("clip_len = 50"));
}

#[test]
fn test_missing_dataset_fails() {
    let config = TempDir::new().unwrap();
    spikeslice(&config)
        .args(["info", "/nonexistent/dataset"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no recording found"));
}
