//! focusflow library
//!
//! This library provides the core functionality for the focusflow pomodoro
//! timer. It includes:
//! - Timer engine with work / short break / long break phases
//! - Session recording with a JSON file store and retry on failure
//! - Settings with validation and a pluggable provider
//! - Focus statistics (totals, streaks, goals) from recorded sessions
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities

pub mod cli;
pub mod daemon;
pub mod recorder;
pub mod settings;
pub mod stats;
pub mod types;

// Re-export commonly used types for convenience
pub use daemon::{
    Clock, Daemon, FakeClock, SystemClock, TickOutcome, TimerEngine, TimerError, TimerEvent,
};
pub use recorder::{
    JsonFileRecorder, MockSessionRecorder, RecorderError, SessionQuery, SessionRecord,
    SessionRecorder, SessionStart, SessionStop, StopReason,
};
pub use settings::{
    FileSettingsProvider, Settings, SettingsError, SettingsProvider, StaticSettingsProvider,
};
pub use stats::FocusSummary;
pub use types::{
    ConfigError, IpcRequest, IpcResponse, Mood, ResponseData, StartParams, TimerConfig, TimerMode,
    TimerSnapshot, TimerState,
};
