//! Display utilities for the focusflow CLI.
//!
//! This module provides formatted output for:
//! - Timer command results and status
//! - Session history and focus statistics
//! - Settings
//! - Error messages
//!
//! Every `show_*` function prints what the matching `render_*` returns.

use std::fmt::Write as _;

use crate::recorder::{SessionRecord, StopReason};
use crate::settings::Settings;
use crate::stats::FocusSummary;
use crate::types::IpcResponse;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the result of a timer command.
    pub fn show_command_result(response: &IpcResponse) {
        print!("{}", Self::render_command_result(response));
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        print!("{}", Self::render_status(response));
    }

    pub fn show_history(records: &[SessionRecord]) {
        print!("{}", Self::render_history(records));
    }

    pub fn show_stats(summary: &FocusSummary, days: Option<u32>) {
        print!("{}", Self::render_stats(summary, days));
    }

    pub fn show_settings(settings: &Settings) {
        print!("{}", Self::render_settings(settings));
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    pub fn render_command_result(response: &IpcResponse) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "* {}", response.message);

        if let Some(data) = &response.data {
            if let Some(mode) = &data.mode {
                let _ = writeln!(out, "  Phase: {}", Self::mode_label(mode));
            }
            if let Some(remaining) = data.remaining_seconds {
                let _ = writeln!(out, "  Remaining: {}", Self::format_clock(remaining));
            }
            if let Some(task) = &data.task_id {
                let _ = writeln!(out, "  Task: {}", task);
            }
            if let Some(warning) = &data.warning {
                let _ = writeln!(out, "  Warning: {}", warning);
            }
        }
        out
    }

    pub fn render_status(response: &IpcResponse) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "focusflow status");
        let _ = writeln!(out, "─────────────────────────────");

        let Some(data) = &response.data else {
            let _ = writeln!(out, "The timer is not running");
            return out;
        };

        let state = data.state.as_deref().unwrap_or("unknown");
        let state_label = match state {
            "idle" => "Idle",
            "running" => "Running",
            "paused" => "Paused",
            other => other,
        };
        let _ = writeln!(out, "State: {}", state_label);

        if let Some(mode) = &data.mode {
            let _ = writeln!(out, "Phase: {}", Self::mode_label(mode));
        }
        if let Some(remaining) = data.remaining_seconds {
            let _ = writeln!(out, "Remaining: {}", Self::format_clock(remaining));
        }
        if let Some(count) = data.completed_work_count {
            let _ = writeln!(out, "Pomodoros this cycle: {}", count);
        }
        if let Some(task) = &data.task_id {
            let _ = writeln!(out, "Task: {}", task);
        }
        if let Some(started) = data.started_at {
            let _ = writeln!(out, "Phase started: {}", started.format("%H:%M:%S UTC"));
        }
        if let Some(warning) = &data.warning {
            let _ = writeln!(out, "Warning: {}", warning);
        }
        out
    }

    pub fn render_history(records: &[SessionRecord]) -> String {
        if records.is_empty() {
            return "No sessions recorded yet\n".to_string();
        }

        let mut out = String::new();
        for record in records {
            let outcome = match (record.stop_reason, record.is_open()) {
                (_, true) => "in progress",
                (Some(StopReason::Completed), _) => "completed",
                (Some(StopReason::Skipped), _) => "skipped",
                (Some(StopReason::Reset), _) => "reset",
                (None, false) => "ended",
            };
            let duration = record
                .duration_seconds
                .map(|s| Self::format_duration(u64::from(s)))
                .unwrap_or_else(|| "-".to_string());

            let _ = write!(
                out,
                "{}  {:<11}  {:>8}  {}",
                record.start_time.format("%Y-%m-%d %H:%M"),
                Self::mode_label(record.mode.as_str()),
                duration,
                outcome
            );
            if let Some(task) = &record.task_id {
                let _ = write!(out, "  [{}]", task);
            }
            out.push('\n');
        }
        out
    }

    pub fn render_stats(summary: &FocusSummary, days: Option<u32>) -> String {
        let mut out = String::new();
        match days {
            Some(days) => {
                let _ = writeln!(out, "Focus stats (last {} days)", days);
            }
            None => {
                let _ = writeln!(out, "Focus stats (all time)");
            }
        }
        let _ = writeln!(out, "─────────────────────────────");
        let _ = writeln!(
            out,
            "Total focus time: {}",
            Self::format_duration(summary.total_focus_seconds)
        );
        let _ = writeln!(out, "Completed pomodoros: {}", summary.completed_pomodoros);
        let _ = writeln!(
            out,
            "Average session: {} min",
            summary.average_session_minutes
        );
        match summary.busiest_day {
            Some(day) => {
                let _ = writeln!(out, "Most productive day: {} ({} min)", day.weekday, day.minutes);
            }
            None => {
                let _ = writeln!(out, "Most productive day: no data");
            }
        }
        let _ = writeln!(out, "Current streak: {} days", summary.current_streak_days);
        let _ = writeln!(
            out,
            "Today: {}/{} ({}%){}",
            summary.today.completed,
            summary.today.goal,
            summary.today.percent(),
            if summary.today.is_met() { " goal met!" } else { "" }
        );
        let _ = writeln!(
            out,
            "This week: {}/{} ({}%)",
            summary.this_week.completed,
            summary.this_week.goal,
            summary.this_week.percent()
        );
        out
    }

    pub fn render_settings(settings: &Settings) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Work:               {} min", settings.pomodoro_duration);
        let _ = writeln!(out, "Short break:        {} min", settings.short_break_duration);
        let _ = writeln!(out, "Long break:         {} min", settings.long_break_duration);
        let _ = writeln!(out, "Long break every:   {} pomodoros", settings.long_break_interval);
        let _ = writeln!(out, "Auto-start breaks:  {}", settings.auto_start_breaks);
        let _ = writeln!(out, "Auto-start work:    {}", settings.auto_start_pomodoros);
        let _ = writeln!(out, "Daily goal:         {}", settings.daily_goal);
        let _ = writeln!(out, "Weekly goal:        {}", settings.weekly_goal);
        out
    }

    // ------------------------------------------------------------------------
    // Formatting helpers
    // ------------------------------------------------------------------------

    fn mode_label(mode: &str) -> &str {
        match mode {
            "work" => "Focus",
            "short_break" => "Short break",
            "long_break" => "Long break",
            other => other,
        }
    }

    /// Formats seconds as `MM:SS`.
    pub fn format_clock(total_seconds: u32) -> String {
        format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    /// Formats a duration as `1d 2h`, `2h 30m`, or `45m 30s`.
    pub fn format_duration(total_seconds: u64) -> String {
        let days = total_seconds / 86_400;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        let mut parts = Vec::new();
        if days > 0 {
            parts.push(format!("{}d", days));
        }
        if hours % 24 > 0 {
            parts.push(format!("{}h", hours % 24));
        }
        if minutes > 0 && days == 0 {
            parts.push(format!("{}m", minutes));
        }
        if seconds > 0 && hours == 0 {
            parts.push(format!("{}s", seconds));
        }

        if parts.is_empty() {
            "0s".to_string()
        } else {
            parts.join(" ")
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseData;

    mod format_tests {
        use super::*;

        #[test]
        fn test_format_clock() {
            assert_eq!(Display::format_clock(0), "00:00");
            assert_eq!(Display::format_clock(90), "01:30");
            assert_eq!(Display::format_clock(25 * 60), "25:00");
            assert_eq!(Display::format_clock(120 * 60 + 59), "120:59");
        }

        #[test]
        fn test_format_duration() {
            assert_eq!(Display::format_duration(0), "0s");
            assert_eq!(Display::format_duration(45), "45s");
            assert_eq!(Display::format_duration(45 * 60 + 30), "45m 30s");
            assert_eq!(Display::format_duration(2 * 3600 + 30 * 60 + 10), "2h 30m");
            assert_eq!(Display::format_duration(86_400 + 2 * 3600 + 5 * 60), "1d 2h");
        }
    }

    mod render_tests {
        use super::*;

        fn running_response() -> IpcResponse {
            IpcResponse::success(
                "Timer started",
                Some(ResponseData {
                    state: Some("running".to_string()),
                    mode: Some("work".to_string()),
                    remaining_seconds: Some(1500),
                    running: Some(true),
                    completed_work_count: Some(2),
                    task_id: Some("task-1".to_string()),
                    started_at: None,
                    warning: Some("session history not saved".to_string()),
                }),
            )
        }

        #[test]
        fn test_render_command_result() {
            let out = Display::render_command_result(&running_response());
            assert!(out.contains("Timer started"));
            assert!(out.contains("Phase: Focus"));
            assert!(out.contains("Remaining: 25:00"));
            assert!(out.contains("Task: task-1"));
            assert!(out.contains("Warning: session history not saved"));
        }

        #[test]
        fn test_render_status() {
            let out = Display::render_status(&running_response());
            assert!(out.contains("State: Running"));
            assert!(out.contains("Pomodoros this cycle: 2"));
        }

        #[test]
        fn test_render_status_without_data() {
            let out = Display::render_status(&IpcResponse::success("", None));
            assert!(out.contains("not running"));
        }

        #[test]
        fn test_render_empty_history() {
            assert!(Display::render_history(&[]).contains("No sessions"));
        }

        #[test]
        fn test_render_settings() {
            let out = Display::render_settings(&Settings::default());
            assert!(out.contains("Work:               25 min"));
            assert!(out.contains("Weekly goal:        20"));
        }
    }
}
