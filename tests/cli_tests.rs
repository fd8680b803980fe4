//! Command-line tests for the focusflow binary.
//!
//! Every test points `FOCUSFLOW_HOME` at a temporary directory so nothing
//! touches the real data directory. Commands that need the daemon are only
//! checked for their failure path here; the daemon itself is covered by
//! `daemon_integration.rs`.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

use chrono::{DateTime, Duration, Utc};

use focusflow::recorder::{SessionRecord, StopReason};
use focusflow::settings::{FileSettingsProvider, Settings, SettingsProvider};
use focusflow::types::TimerMode;

// ============================================================================
// Test Helpers
// ============================================================================

fn focusflow(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("focusflow").unwrap();
    cmd.env("FOCUSFLOW_HOME", home).env_remove("RUST_LOG");
    cmd
}

fn write_pomodoros(home: &Path, starts: &[DateTime<Utc>]) {
    let records: Vec<SessionRecord> = starts
        .iter()
        .map(|start| SessionRecord {
            id: uuid::Uuid::new_v4(),
            task_id: None,
            mode: TimerMode::Work,
            start_time: *start,
            end_time: Some(*start + Duration::seconds(1500)),
            duration_seconds: Some(1500),
            is_break: false,
            skipped: false,
            stop_reason: Some(StopReason::Completed),
            notes: None,
        })
        .collect();
    std::fs::write(
        home.join("sessions.json"),
        serde_json::to_vec(&records).unwrap(),
    )
    .unwrap();
}

// ============================================================================
// Help and completions
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("skip"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn test_completions_for_bash() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("focusflow"));
}

#[test]
fn test_unknown_command_fails() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ============================================================================
// Argument validation
// ============================================================================

#[test]
fn test_start_rejects_empty_task() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["start", "--task", ""])
        .assert()
        .failure();
}

#[test]
fn test_start_rejects_unknown_mood() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["start", "--mood", "sleepy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_history_filters_conflict() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["history", "--breaks", "--work"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// Settings
// ============================================================================

#[test]
fn test_settings_show_defaults() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Work:               25 min"))
        .stdout(predicate::str::contains("Long break every:   4 pomodoros"));
}

#[test]
fn test_settings_set_persists() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["settings", "set", "--work", "40", "--auto-breaks", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings saved"))
        .stdout(predicate::str::contains("Work:               40 min"));

    let saved = FileSettingsProvider::in_dir(home.path()).load().unwrap();
    assert_eq!(
        saved,
        Settings {
            pomodoro_duration: 40,
            auto_start_breaks: true,
            ..Default::default()
        }
    );
}

#[test]
fn test_settings_set_out_of_range() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["settings", "set", "--work", "121"])
        .assert()
        .failure();

    assert!(!home.path().join("settings.json").exists());
}

#[test]
fn test_settings_set_without_flags() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["settings", "set"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No settings given"));
}

#[test]
fn test_corrupt_settings_reported() {
    let home = tempfile::tempdir().unwrap();
    std::fs::write(home.path().join("settings.json"), "{ not json").unwrap();

    focusflow(home.path())
        .args(["settings", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

// ============================================================================
// History and stats
// ============================================================================

#[test]
fn test_history_without_sessions() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions recorded yet"));
}

#[test]
fn test_stats_without_sessions() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["stats", "--days", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Focus stats (last 7 days)"))
        .stdout(predicate::str::contains("Completed pomodoros: 0"))
        .stdout(predicate::str::contains("Today: 0/4 (0%)"));
}

#[test]
fn test_stats_window_limits_totals() {
    let home = tempfile::tempdir().unwrap();
    let now = Utc::now();
    write_pomodoros(
        home.path(),
        &[now - Duration::days(20), now - Duration::minutes(30)],
    );

    focusflow(home.path())
        .args(["stats", "--days", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed pomodoros: 1"));

    focusflow(home.path())
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed pomodoros: 2"));
}

#[test]
fn test_stats_rejects_zero_days() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .args(["stats", "--days", "0"])
        .assert()
        .failure();
}

// ============================================================================
// Daemon-backed commands
// ============================================================================

#[test]
fn test_status_without_daemon() {
    let home = tempfile::tempdir().unwrap();

    focusflow(home.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot connect to the daemon"));
}
