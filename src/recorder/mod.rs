//! Session recording for timer runs.
//!
//! Every timed phase (a pomodoro or a break) becomes one session record
//! with a start, an end, and the number of seconds actually counted. The
//! records feed `focusflow history` and `focusflow stats`.
//!
//! # Overview
//!
//! The timer engine never talks to a recorder directly. It allocates the
//! session id itself and emits session boundaries as events; the daemon's
//! dispatcher forwards them to a [`SessionRecorder`]. A slow or failing
//! store therefore never stalls the countdown.
//!
//! # Error Handling
//!
//! Recorder errors are non-fatal. See [`RecorderError::is_retryable`].

pub mod error;
pub mod file;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::TimerMode;

pub use error::RecorderError;
pub use file::JsonFileRecorder;

/// Identifier of a recorded session.
pub type SessionId = Uuid;

// ============================================================================
// Session boundary types
// ============================================================================

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The countdown reached zero
    Completed,
    /// The user skipped to the next phase
    Skipped,
    /// The user reset the timer
    Reset,
}

impl StopReason {
    /// Returns true when the session ended without completion credit.
    pub fn is_skipped(&self) -> bool {
        !matches!(self, StopReason::Completed)
    }
}

/// Data recorded when a phase starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStart {
    pub session_id: SessionId,
    pub task_id: Option<String>,
    pub mode: TimerMode,
    pub started_at: DateTime<Utc>,
}

impl SessionStart {
    pub fn is_break(&self) -> bool {
        self.mode.is_break()
    }
}

/// Data recorded when a phase ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStop {
    pub session_id: SessionId,
    pub ended_at: DateTime<Utc>,
    /// Seconds actually counted down, pauses excluded
    pub duration_seconds: u32,
    pub is_break: bool,
    pub reason: StopReason,
}

impl SessionStop {
    pub fn skipped(&self) -> bool {
        self.reason.is_skipped()
    }
}

// ============================================================================
// SessionRecord
// ============================================================================

/// A persisted session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: SessionId,
    pub task_id: Option<String>,
    pub mode: TimerMode,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<u32>,
    pub is_break: bool,
    #[serde(default)]
    pub skipped: bool,
    pub stop_reason: Option<StopReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SessionRecord {
    /// Creates an open record from a session start.
    pub fn started(start: &SessionStart) -> Self {
        Self {
            id: start.session_id,
            task_id: start.task_id.clone(),
            mode: start.mode,
            start_time: start.started_at,
            end_time: None,
            duration_seconds: None,
            is_break: start.is_break(),
            skipped: false,
            stop_reason: None,
            notes: None,
        }
    }

    /// Closes the record.
    pub fn apply_stop(&mut self, stop: &SessionStop) {
        self.end_time = Some(stop.ended_at);
        self.duration_seconds = Some(stop.duration_seconds);
        self.skipped = stop.skipped();
        self.stop_reason = Some(stop.reason);
    }

    /// Returns true for a work session that ran to completion.
    pub fn is_completed_pomodoro(&self) -> bool {
        !self.is_break && self.stop_reason == Some(StopReason::Completed)
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

// ============================================================================
// SessionQuery
// ============================================================================

/// Filters for listing sessions. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQuery {
    /// Inclusive lower bound on start time
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on start time
    pub end_date: Option<DateTime<Utc>>,
    pub is_break: Option<bool>,
    pub task_id: Option<String>,
}

impl SessionQuery {
    pub fn matches(&self, record: &SessionRecord) -> bool {
        if let Some(start) = self.start_date {
            if record.start_time < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if record.start_time > end {
                return false;
            }
        }
        if let Some(is_break) = self.is_break {
            if record.is_break != is_break {
                return false;
            }
        }
        if let Some(task_id) = &self.task_id {
            if record.task_id.as_deref() != Some(task_id.as_str()) {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// SessionRecorder
// ============================================================================

/// Persistence collaborator for timer sessions.
pub trait SessionRecorder: Send + Sync {
    /// Records the start of a session and returns its id.
    fn start_session(
        &self,
        start: &SessionStart,
    ) -> impl Future<Output = Result<SessionId, RecorderError>> + Send;

    /// Records the end of a previously started session.
    fn stop_session(
        &self,
        stop: &SessionStop,
    ) -> impl Future<Output = Result<(), RecorderError>> + Send;

    /// Lists sessions matching `query`, newest first.
    fn list_sessions(
        &self,
        query: &SessionQuery,
    ) -> impl Future<Output = Result<Vec<SessionRecord>, RecorderError>> + Send;
}

// ============================================================================
// MockSessionRecorder
// ============================================================================

/// In-memory recorder for tests, with switchable failures.
#[derive(Debug, Default)]
pub struct MockSessionRecorder {
    records: Mutex<Vec<SessionRecord>>,
    start_calls: Mutex<Vec<SessionStart>>,
    stop_calls: Mutex<Vec<SessionStop>>,
    should_fail: AtomicBool,
}

impl MockSessionRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`RecorderError::Unavailable`].
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn start_calls(&self) -> Vec<SessionStart> {
        self.start_calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn stop_calls(&self) -> Vec<SessionStop> {
        self.stop_calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn records(&self) -> Vec<SessionRecord> {
        self.records.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), RecorderError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(RecorderError::Unavailable("simulated failure".to_string()));
        }
        Ok(())
    }
}

impl SessionRecorder for MockSessionRecorder {
    async fn start_session(&self, start: &SessionStart) -> Result<SessionId, RecorderError> {
        self.check_available()?;
        self.start_calls.lock().unwrap().push(start.clone());
        self.records
            .lock()
            .unwrap()
            .push(SessionRecord::started(start));
        Ok(start.session_id)
    }

    async fn stop_session(&self, stop: &SessionStop) -> Result<(), RecorderError> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == stop.session_id)
            .ok_or(RecorderError::SessionNotFound(stop.session_id))?;
        if !record.is_open() {
            return Err(RecorderError::AlreadyStopped(stop.session_id));
        }
        record.apply_stop(stop);
        self.stop_calls.lock().unwrap().push(stop.clone());
        Ok(())
    }

    async fn list_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<SessionRecord>, RecorderError> {
        self.check_available()?;
        let mut matching: Vec<SessionRecord> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(matching)
    }
}
