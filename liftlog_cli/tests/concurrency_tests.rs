//! Concurrency tests for the liftlog binary.
//!
//! These tests verify that multiple processes can safely:
//! - Append to the set log simultaneously (file locking)
//! - Read reports while sets are being written
//! - Supersede a day while other sets are being appended

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftlog"));
    cmd.arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

fn setup_test_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[calendar]\nutc_offset_minutes = 0\n",
    )
    .expect("Failed to write config");
    temp_dir
}

fn log_path(dir: &Path) -> PathBuf {
    dir.join("data/sets.jsonl")
}

/// Parse every line of the set log, failing on any invalid one
fn read_log(dir: &Path) -> Vec<Value> {
    let content = std::fs::read_to_string(log_path(dir)).expect("Failed to read set log");
    content
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .unwrap_or_else(|e| panic!("Set log contains invalid JSON line {}: {}", line, e))
        })
        .collect()
}

#[test]
fn test_sequential_logging_keeps_every_set() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    // Run with slight delays (more realistic than thundering herd)
    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        cli(dir)
            .args(["log", "--exercise", "bench_press", "--weight", "60", "--reps", "8"])
            .args(["--date", "2024-05-06"])
            .assert()
            .success();
    }

    let sets = read_log(dir);
    assert_eq!(sets.len(), 5, "Expected 5 sets, got {}", sets.len());

    let orders: Vec<u64> = sets.iter().map(|s| s["order"].as_u64().unwrap()).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_no_log_corruption_under_load() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    // Hammer the CLI with many concurrent writes
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let dir = dir.clone();
            thread::spawn(move || {
                // Small stagger to reduce thundering herd
                thread::sleep(Duration::from_millis(i * 5));
                cli(&dir)
                    .args(["log", "--exercise", "back_squat", "--reps", "5"])
                    .args(["--weight", &format!("{}", 100 + i)])
                    .args(["--date", "2024-05-06"])
                    .timeout(Duration::from_secs(10))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    let sets = read_log(&dir);
    assert_eq!(sets.len(), 10, "Expected 10 valid sets in log");

    let mut weights: Vec<f64> = sets.iter().map(|s| s["weight"].as_f64().unwrap()).collect();
    weights.sort_by(|a, b| a.total_cmp(b));
    let expected: Vec<f64> = (100..110).map(f64::from).collect();
    assert_eq!(weights, expected);
}

#[test]
fn test_reports_while_writing() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    cli(&dir)
        .args(["log", "--exercise", "bench_press", "--weight", "60", "--reps", "8"])
        .assert()
        .success();

    let writer_dir = dir.clone();
    let writer = thread::spawn(move || {
        for _ in 0..4 {
            cli(&writer_dir)
                .args(["log", "--exercise", "bench_press", "--weight", "60", "--reps", "8"])
                .assert()
                .success();
            thread::sleep(Duration::from_millis(5));
        }
    });

    // Readers can run at any time
    for _ in 0..4 {
        cli(&dir).arg("summary").assert().success();
        cli(&dir).arg("prs").assert().success();
    }

    writer.join().expect("Writer thread panicked");
    assert_eq!(read_log(&dir).len(), 5);
}

#[test]
fn test_replace_while_appending() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    for _ in 0..3 {
        cli(&dir)
            .args(["log", "--exercise", "bench_press", "--weight", "60", "--reps", "8"])
            .args(["--date", "2024-05-06"])
            .assert()
            .success();
    }

    let replace_dir = dir.clone();
    let replacer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        cli(&replace_dir)
            .args(["log", "--exercise", "bench_press", "--weight", "70", "--reps", "5"])
            .args(["--date", "2024-05-06", "--replace"])
            .assert()
            .success();
    });

    // Append other sets while the rewrite may be running
    for _ in 0..4 {
        cli(&dir)
            .args(["log", "--exercise", "back_squat", "--weight", "100", "--reps", "5"])
            .args(["--date", "2024-05-07"])
            .assert()
            .success();
        thread::sleep(Duration::from_millis(5));
    }

    replacer.join().expect("Replace thread panicked");

    let sets = read_log(&dir);
    let squats = sets.iter().filter(|s| s["exercise_id"] == "back_squat").count();
    assert_eq!(squats, 4, "Appends lost during rewrite");

    let bench: Vec<&Value> = sets
        .iter()
        .filter(|s| s["exercise_id"] == "bench_press")
        .collect();
    assert_eq!(bench.len(), 1);
    assert_eq!(bench[0]["weight"], 70.0);
}
