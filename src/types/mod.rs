//! Core data types for focusflow.
//!
//! This module defines the data structures used for:
//! - Timer modes, states, and configuration with validation
//! - Read-only timer snapshots for observers
//! - Mood check-ins that suggest a work duration
//! - IPC request/response serialization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// TimerMode
// ============================================================================

/// The phase a timer run is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Focus interval (a pomodoro)
    Work,
    /// Short break between pomodoros
    ShortBreak,
    /// Long break after every N pomodoros
    LongBreak,
}

impl TimerMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMode::Work => "work",
            TimerMode::ShortBreak => "short_break",
            TimerMode::LongBreak => "long_break",
        }
    }

    /// Returns true for either break mode.
    pub fn is_break(&self) -> bool {
        !matches!(self, TimerMode::Work)
    }
}

impl Default for TimerMode {
    fn default() -> Self {
        TimerMode::Work
    }
}

impl std::fmt::Display for TimerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Externally visible state of the timer.
///
/// `Paused` carries the mode it interrupted. After an expiry without
/// auto-chaining the timer rests in `Paused(next_mode)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "mode", rename_all = "snake_case")]
pub enum TimerState {
    /// No run in progress, ready for a work session
    Idle,
    /// Counting down in the given mode
    Running(TimerMode),
    /// Suspended in the given mode
    Paused(TimerMode),
}

impl TimerState {
    /// Returns the string representation of the state (without mode).
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Idle => "idle",
            TimerState::Running(_) => "running",
            TimerState::Paused(_) => "paused",
        }
    }

    /// Returns the mode carried by the state, if any.
    pub fn mode(&self) -> Option<TimerMode> {
        match self {
            TimerState::Idle => None,
            TimerState::Running(mode) | TimerState::Paused(mode) => Some(*mode),
        }
    }
}

impl Default for TimerState {
    fn default() -> Self {
        TimerState::Idle
    }
}

impl std::fmt::Display for TimerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mode() {
            Some(mode) => write!(f, "{}({})", self.as_str(), mode),
            None => f.write_str(self.as_str()),
        }
    }
}

// ============================================================================
// TimerConfig
// ============================================================================

/// Errors raised when a timer configuration violates its constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A duration field was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration {
        /// Name of the offending field
        field: &'static str,
    },

    /// The long break interval was zero.
    #[error("pomodoros_before_long_break must be at least 1")]
    ZeroLongBreakInterval,
}

/// Immutable timer configuration snapshot, durations in seconds.
///
/// Fields are private so every instance has passed [`TimerConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerConfig {
    work_duration_seconds: u32,
    short_break_duration_seconds: u32,
    long_break_duration_seconds: u32,
    pomodoros_before_long_break: u32,
    auto_start_breaks: bool,
    auto_start_pomodoros: bool,
}

impl TimerConfig {
    /// Builds a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any duration is zero or the long break
    /// interval is zero.
    pub fn new(
        work_duration_seconds: u32,
        short_break_duration_seconds: u32,
        long_break_duration_seconds: u32,
        pomodoros_before_long_break: u32,
        auto_start_breaks: bool,
        auto_start_pomodoros: bool,
    ) -> Result<Self, ConfigError> {
        if work_duration_seconds == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "work_duration_seconds",
            });
        }
        if short_break_duration_seconds == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "short_break_duration_seconds",
            });
        }
        if long_break_duration_seconds == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "long_break_duration_seconds",
            });
        }
        if pomodoros_before_long_break == 0 {
            return Err(ConfigError::ZeroLongBreakInterval);
        }

        Ok(Self {
            work_duration_seconds,
            short_break_duration_seconds,
            long_break_duration_seconds,
            pomodoros_before_long_break,
            auto_start_breaks,
            auto_start_pomodoros,
        })
    }

    pub fn work_duration_seconds(&self) -> u32 {
        self.work_duration_seconds
    }

    pub fn short_break_duration_seconds(&self) -> u32 {
        self.short_break_duration_seconds
    }

    pub fn long_break_duration_seconds(&self) -> u32 {
        self.long_break_duration_seconds
    }

    pub fn pomodoros_before_long_break(&self) -> u32 {
        self.pomodoros_before_long_break
    }

    pub fn auto_start_breaks(&self) -> bool {
        self.auto_start_breaks
    }

    pub fn auto_start_pomodoros(&self) -> bool {
        self.auto_start_pomodoros
    }

    /// Returns the configured duration for a mode.
    pub fn duration_for(&self, mode: TimerMode) -> u32 {
        match mode {
            TimerMode::Work => self.work_duration_seconds,
            TimerMode::ShortBreak => self.short_break_duration_seconds,
            TimerMode::LongBreak => self.long_break_duration_seconds,
        }
    }

    /// Picks the break that follows a work phase given the completed count.
    ///
    /// A long break is due when the count is a positive multiple of
    /// `pomodoros_before_long_break`.
    pub fn break_after(&self, completed_work_count: u32) -> TimerMode {
        if completed_work_count > 0 && completed_work_count % self.pomodoros_before_long_break == 0
        {
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration_seconds: 25 * 60,
            short_break_duration_seconds: 5 * 60,
            long_break_duration_seconds: 15 * 60,
            pomodoros_before_long_break: 4,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
        }
    }
}

// ============================================================================
// Mood
// ============================================================================

/// Mood check-in used to suggest the length of the next focus session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Energized,
    Focused,
    Neutral,
    Struggling,
}

impl Mood {
    /// Suggested work duration in seconds.
    pub fn suggested_work_seconds(&self) -> u32 {
        match self {
            Mood::Energized => 45 * 60,
            Mood::Focused => 25 * 60,
            Mood::Neutral => 20 * 60,
            Mood::Struggling => 10 * 60,
        }
    }

    /// Short encouragement shown after the check-in.
    pub fn feedback(&self) -> &'static str {
        match self {
            Mood::Energized => "Great energy! Perfect time for challenging tasks.",
            Mood::Focused => "You're in the zone! Let's tackle some deep work.",
            Mood::Neutral => "Steady as she goes. A good time for routine tasks.",
            Mood::Struggling => "It's okay to have tough days. Let's start small.",
        }
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Read-only view of the engine, published to observers after each change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub mode: TimerMode,
    pub remaining_seconds: u32,
    pub running: bool,
    pub completed_work_count: u32,
    pub task_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    /// Mode of the most recently expired phase
    pub last_completed: Option<TimerMode>,
}

// ============================================================================
// IPC Types
// ============================================================================

/// Parameters for the start command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartParams {
    /// Task to attribute the run to
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Mood check-in, only honoured when the timer is idle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
}

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start a new run or resume a paused one
    Start {
        #[serde(flatten)]
        params: StartParams,
    },
    /// Pause the running timer
    Pause,
    /// Skip to the next phase without completion credit
    Skip,
    /// Abandon the run and return to idle
    Reset,
    /// Start a break immediately
    Break {
        #[serde(default)]
        long: bool,
    },
    /// Query the current status
    Status,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// State name ("idle", "running", "paused")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Mode name ("work", "short_break", "long_break")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(rename = "completedWorkCount", skip_serializing_if = "Option::is_none")]
    pub completed_work_count: Option<u32>,
    #[serde(rename = "taskId", skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(rename = "startedAt", skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Non-fatal recorder warning, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ResponseData {
    /// Creates response data from a timer snapshot.
    pub fn from_snapshot(snapshot: &TimerSnapshot) -> Self {
        Self {
            state: Some(snapshot.state.as_str().to_string()),
            mode: Some(snapshot.mode.as_str().to_string()),
            remaining_seconds: Some(snapshot.remaining_seconds),
            running: Some(snapshot.running),
            completed_work_count: Some(snapshot.completed_work_count),
            task_id: snapshot.task_id.clone(),
            started_at: snapshot.started_at,
            warning: None,
        }
    }

    /// Attaches a recorder warning.
    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================
