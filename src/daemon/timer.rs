//! Timer engine for focusflow.
//!
//! This module provides the pomodoro state machine:
//! - State transitions (Idle → Running ⇄ Paused, expiry, skip, reset, breaks)
//! - One-second countdown driven by an external `tick()`
//! - Session boundary events for the recorder
//! - Auto-chaining of breaks and pomodoros
//! - Long break after every N completed pomodoros
//!
//! The engine performs no I/O. Session starts and stops are emitted as
//! [`TimerEvent`]s and persisted elsewhere, so a failing store can never
//! roll back or stall a transition.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::recorder::{SessionId, SessionStart, SessionStop, StopReason};
use crate::types::{Mood, TimerConfig, TimerMode, TimerSnapshot, TimerState};

use super::clock::{Clock, SystemClock};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for the recorder and other observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A phase began counting and needs a session record
    SessionStarted(SessionStart),
    /// A phase ended and its session record must be closed
    SessionStopped(SessionStop),
    /// A phase counted down to zero
    PhaseCompleted {
        mode: TimerMode,
        /// Completed pomodoros after this phase, before any long-break reset
        completed_work_count: u32,
    },
    /// The timer moved to a new phase
    PhaseChanged { mode: TimerMode, running: bool },
    /// Counting started or resumed
    Started { mode: TimerMode },
    /// Counting paused
    Paused { mode: TimerMode },
    /// The timer returned to idle
    Reset,
    /// One second elapsed
    Tick { remaining_seconds: u32 },
}

// ============================================================================
// TimerError / TickOutcome
// ============================================================================

/// Errors returned for operations that are invalid in the current state.
///
/// The engine state is unchanged whenever one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// The operation is not allowed in the current state.
    #[error("cannot {operation} while timer is {state}")]
    InvalidTransition {
        operation: &'static str,
        state: TimerState,
    },

    /// `start` was called while a run is already counting.
    #[error("timer is already running; reset it before starting another session")]
    AlreadyRunning,
}

/// Result of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer was not running; nothing changed
    Ignored,
    /// One second was counted
    Counted { remaining_seconds: u32 },
    /// The phase expired and the timer moved on
    Expired {
        finished: TimerMode,
        next: TimerMode,
        running: bool,
    },
}

// ============================================================================
// TimerEngine
// ============================================================================

/// The phase currently being recorded.
#[derive(Debug, Clone)]
struct ActiveSession {
    id: SessionId,
    mode: TimerMode,
    started_at: chrono::DateTime<chrono::Utc>,
    /// Seconds counted so far, pauses excluded
    elapsed_seconds: u32,
}

/// Pomodoro state machine.
pub struct TimerEngine {
    config: TimerConfig,
    /// Settings received mid-run, applied at the next reset
    pending_config: Option<TimerConfig>,
    idle: bool,
    mode: TimerMode,
    remaining_seconds: u32,
    running: bool,
    completed_work_count: u32,
    task_id: Option<String>,
    session: Option<ActiveSession>,
    last_completed: Option<TimerMode>,
    clock: Arc<dyn Clock>,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
}

impl TimerEngine {
    /// Creates an idle engine using the system clock.
    pub fn new(config: TimerConfig, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self::with_clock(config, event_tx, Arc::new(SystemClock))
    }

    /// Creates an idle engine with an explicit clock.
    pub fn with_clock(
        config: TimerConfig,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut engine = Self {
            config,
            pending_config: None,
            idle: true,
            mode: TimerMode::Work,
            remaining_seconds: config.work_duration_seconds(),
            running: false,
            completed_work_count: 0,
            task_id: None,
            session: None,
            last_completed: None,
            clock,
            event_tx,
            snapshot_tx: watch::channel(TimerSnapshot {
                state: TimerState::Idle,
                mode: TimerMode::Work,
                remaining_seconds: config.work_duration_seconds(),
                running: false,
                completed_work_count: 0,
                task_id: None,
                started_at: None,
                last_completed: None,
            })
            .0,
        };
        engine.publish();
        engine
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Starts a run from idle or resumes a paused one.
    ///
    /// A new recorder session begins whenever no session is active (from
    /// idle, or after a phase change left the timer paused). `task_id`
    /// re-attributes the run only at those boundaries; resuming mid-phase
    /// keeps the existing attribution.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::AlreadyRunning`] if the timer is counting.
    pub fn start(&mut self, task_id: Option<String>) -> Result<(), TimerError> {
        if self.running {
            return Err(TimerError::AlreadyRunning);
        }

        if self.session.is_none() {
            if task_id.is_some() || self.idle {
                self.task_id = task_id;
            }
            self.begin_session();
        }

        self.idle = false;
        self.running = true;

        tracing::info!(mode = %self.mode, remaining = self.remaining_seconds, "timer started");
        self.emit(TimerEvent::Started { mode: self.mode });
        self.publish();
        Ok(())
    }

    /// Pauses the running timer. No recorder call is made.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidTransition`] unless the timer is running.
    pub fn pause(&mut self) -> Result<(), TimerError> {
        if !self.running {
            return Err(self.invalid("pause"));
        }

        self.running = false;

        tracing::info!(mode = %self.mode, remaining = self.remaining_seconds, "timer paused");
        self.emit(TimerEvent::Paused { mode: self.mode });
        self.publish();
        Ok(())
    }

    /// Counts one second. Invoke once per second from the clock source.
    ///
    /// Ticks delivered while the timer is not running are ignored. Expiry
    /// installs the next phase's duration in the same call, so a late or
    /// duplicate tick can never fire a second transition for one expiry.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Ignored;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if let Some(session) = self.session.as_mut() {
            session.elapsed_seconds += 1;
        }
        self.emit(TimerEvent::Tick {
            remaining_seconds: self.remaining_seconds,
        });

        if self.remaining_seconds == 0 {
            return self.expire();
        }

        self.publish();
        TickOutcome::Counted {
            remaining_seconds: self.remaining_seconds,
        }
    }

    /// Skips to the next phase without completion credit.
    ///
    /// The next mode follows the same rule as expiry, evaluated against the
    /// current completed count. The timer always lands paused.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidTransition`] while idle.
    pub fn skip(&mut self) -> Result<TimerMode, TimerError> {
        if self.idle {
            return Err(self.invalid("skip"));
        }

        let skipped = self.mode;
        self.end_session(StopReason::Skipped);

        let next = match skipped {
            TimerMode::Work => self.config.break_after(self.completed_work_count),
            TimerMode::ShortBreak | TimerMode::LongBreak => TimerMode::Work,
        };

        tracing::info!(from = %skipped, to = %next, "phase skipped");
        self.enter_phase(next, false);
        Ok(next)
    }

    /// Abandons the current run and returns to idle in work mode.
    ///
    /// The completed count is kept. Settings received mid-run take effect.
    pub fn reset(&mut self) {
        self.end_session(StopReason::Reset);

        if let Some(config) = self.pending_config.take() {
            tracing::debug!("applying settings deferred during run");
            self.config = config;
        }

        self.idle = true;
        self.running = false;
        self.mode = TimerMode::Work;
        self.remaining_seconds = self.config.work_duration_seconds();
        self.task_id = None;
        self.last_completed = None;

        tracing::info!("timer reset");
        self.emit(TimerEvent::Reset);
        self.publish();
    }

    /// Starts a break immediately.
    ///
    /// A paused work session is closed as skipped. A long break resets the
    /// completed count.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidTransition`] unless the timer is idle or
    /// paused in work mode.
    pub fn start_break(&mut self, is_long: bool) -> Result<(), TimerError> {
        let allowed = self.idle || (!self.running && self.mode == TimerMode::Work);
        if !allowed {
            return Err(self.invalid("start a break"));
        }

        self.end_session(StopReason::Skipped);

        let mode = if is_long {
            self.completed_work_count = 0;
            TimerMode::LongBreak
        } else {
            TimerMode::ShortBreak
        };

        tracing::info!(mode = %mode, "break started manually");
        self.enter_phase(mode, true);
        Ok(())
    }

    /// Applies a mood check-in to the upcoming work session.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidTransition`] unless the timer is idle.
    pub fn select_mood(&mut self, mood: Mood) -> Result<&'static str, TimerError> {
        if !self.idle {
            return Err(self.invalid("select a mood"));
        }

        self.remaining_seconds = mood.suggested_work_seconds();
        tracing::debug!(?mood, remaining = self.remaining_seconds, "mood selected");
        self.publish();
        Ok(mood.feedback())
    }

    /// Replaces the configuration.
    ///
    /// While idle the new work duration applies at once. Otherwise the
    /// configuration is held until the next reset so an in-progress run is
    /// never altered.
    pub fn update_config(&mut self, config: TimerConfig) {
        if self.idle {
            self.config = config;
            self.pending_config = None;
            self.remaining_seconds = config.work_duration_seconds();
            self.publish();
        } else if config != self.config {
            self.pending_config = Some(config);
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> TimerState {
        if self.idle {
            TimerState::Idle
        } else if self.running {
            TimerState::Running(self.mode)
        } else {
            TimerState::Paused(self.mode)
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn completed_work_count(&self) -> u32 {
        self.completed_work_count
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Start time of the phase being recorded, if any.
    pub fn started_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.session.as_ref().map(|s| s.started_at)
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    /// Builds a read-only view of the engine.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state(),
            mode: self.mode,
            remaining_seconds: self.remaining_seconds,
            running: self.running,
            completed_work_count: self.completed_work_count,
            task_id: self.task_id.clone(),
            started_at: self.started_at(),
            last_completed: self.last_completed,
        }
    }

    /// Subscribes to snapshots published after every state change.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// Handles a phase reaching zero.
    fn expire(&mut self) -> TickOutcome {
        let finished = self.mode;
        self.end_session(StopReason::Completed);
        self.last_completed = Some(finished);

        let (next, auto_start) = match finished {
            TimerMode::Work => {
                self.completed_work_count += 1;
                self.emit(TimerEvent::PhaseCompleted {
                    mode: finished,
                    completed_work_count: self.completed_work_count,
                });
                (
                    self.config.break_after(self.completed_work_count),
                    self.config.auto_start_breaks(),
                )
            }
            TimerMode::ShortBreak | TimerMode::LongBreak => {
                self.emit(TimerEvent::PhaseCompleted {
                    mode: finished,
                    completed_work_count: self.completed_work_count,
                });
                (TimerMode::Work, self.config.auto_start_pomodoros())
            }
        };

        tracing::info!(
            finished = %finished,
            next = %next,
            completed = self.completed_work_count,
            auto_start,
            "phase completed"
        );
        self.enter_phase(next, auto_start);

        TickOutcome::Expired {
            finished,
            next,
            running: auto_start,
        }
    }

    /// Moves into `mode` with a full duration, optionally counting at once.
    fn enter_phase(&mut self, mode: TimerMode, running: bool) {
        if mode == TimerMode::LongBreak {
            self.completed_work_count = 0;
        }

        self.idle = false;
        self.mode = mode;
        self.remaining_seconds = self.config.duration_for(mode);
        self.running = running;
        if running {
            self.begin_session();
        }

        self.emit(TimerEvent::PhaseChanged { mode, running });
        self.publish();
    }

    fn begin_session(&mut self) {
        let session = ActiveSession {
            id: Uuid::new_v4(),
            mode: self.mode,
            started_at: self.clock.now(),
            elapsed_seconds: 0,
        };

        self.emit(TimerEvent::SessionStarted(SessionStart {
            session_id: session.id,
            task_id: self.task_id.clone(),
            mode: session.mode,
            started_at: session.started_at,
        }));
        self.session = Some(session);
    }

    fn end_session(&mut self, reason: StopReason) {
        if let Some(session) = self.session.take() {
            self.emit(TimerEvent::SessionStopped(SessionStop {
                session_id: session.id,
                ended_at: self.clock.now(),
                duration_seconds: session.elapsed_seconds,
                is_break: session.mode.is_break(),
                reason,
            }));
        }
    }

    fn invalid(&self, operation: &'static str) -> TimerError {
        TimerError::InvalidTransition {
            operation,
            state: self.state(),
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("timer event receiver dropped");
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_replace(snapshot);
    }
}

// ============================================================================
// Tests
// ============================================================================
