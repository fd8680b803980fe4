//! Forwards timer session boundaries to the session recorder.
//!
//! The engine emits [`TimerEvent::SessionStarted`] and
//! [`TimerEvent::SessionStopped`] and moves on. This dispatcher owns the
//! receiving end, awaits the recorder, and keeps failed operations in a
//! bounded queue so they can be replayed in order once the store recovers.
//! The last failure is published on a watch channel for `status` responses.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant};

use crate::recorder::{RecorderError, SessionRecorder, SessionStart, SessionStop};

use super::timer::TimerEvent;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of recorder operations kept for retry
pub const MAX_PENDING_OPERATIONS: usize = 64;

/// Attempts before a queued operation is dropped
const MAX_ATTEMPTS: u32 = 10;

/// Minimum spacing between retries triggered by clock ticks
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

// ============================================================================
// RecorderDispatcher
// ============================================================================

#[derive(Debug, Clone)]
enum RecorderOp {
    Start(SessionStart),
    Stop(SessionStop),
}

impl RecorderOp {
    fn describe(&self) -> String {
        match self {
            RecorderOp::Start(start) => format!("start of session {}", start.session_id),
            RecorderOp::Stop(stop) => format!("stop of session {}", stop.session_id),
        }
    }
}

#[derive(Debug)]
struct PendingOp {
    op: RecorderOp,
    /// Failed deliveries so far
    attempts: u32,
}

/// Delivers session boundaries to a [`SessionRecorder`] without blocking the timer.
pub struct RecorderDispatcher<R> {
    recorder: Arc<R>,
    pending: VecDeque<PendingOp>,
    warning_tx: watch::Sender<Option<String>>,
    retry_interval: Duration,
    last_retry: Option<Instant>,
}

impl<R: SessionRecorder> RecorderDispatcher<R> {
    pub fn new(recorder: Arc<R>) -> Self {
        Self {
            recorder,
            pending: VecDeque::new(),
            warning_tx: watch::channel(None).0,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            last_retry: None,
        }
    }

    /// Overrides how often ticks trigger a retry of queued operations.
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Subscribes to the current recorder warning (`None` when healthy).
    pub fn warnings(&self) -> watch::Receiver<Option<String>> {
        self.warning_tx.subscribe()
    }

    /// Number of operations waiting for retry.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Consumes timer events until the engine side closes.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<TimerEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }

        self.flush().await;
        if !self.pending.is_empty() {
            tracing::warn!(
                pending = self.pending.len(),
                "shutting down with unrecorded sessions"
            );
        }
    }

    /// Handles one timer event. Events without a session boundary only
    /// give queued operations a chance to retry.
    pub async fn handle_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::SessionStarted(start) => self.submit(RecorderOp::Start(start)).await,
            TimerEvent::SessionStopped(stop) => self.submit(RecorderOp::Stop(stop)).await,
            _ => {
                if self.retry_due() {
                    self.flush().await;
                }
            }
        }
    }

    fn retry_due(&self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        match self.last_retry {
            Some(at) => at.elapsed() >= self.retry_interval,
            None => true,
        }
    }

    async fn submit(&mut self, op: RecorderOp) {
        // Later operations must not overtake queued ones
        if !self.pending.is_empty() && (!self.retry_due() || !self.flush().await) {
            self.enqueue(PendingOp { op, attempts: 0 });
            return;
        }

        match self.execute(&op).await {
            Ok(()) => self.clear_warning(),
            Err(e) => {
                tracing::warn!(error = %e, operation = %op.describe(), "session recorder failed");
                self.set_warning(&e);
                if e.is_retryable() {
                    self.last_retry = Some(Instant::now());
                    self.enqueue(PendingOp { op, attempts: 1 });
                } else {
                    self.discard_dependents(&op);
                }
            }
        }
    }

    /// Replays queued operations in order. Returns true once the queue is empty.
    ///
    /// Only the head of the queue is charged an attempt when it fails.
    async fn flush(&mut self) -> bool {
        if self.pending.is_empty() {
            return true;
        }
        self.last_retry = Some(Instant::now());

        let mut lost = false;
        while let Some(mut pending) = self.pending.pop_front() {
            match self.execute(&pending.op).await {
                Ok(()) => {
                    tracing::debug!(
                        operation = %pending.op.describe(),
                        "queued recorder operation delivered"
                    );
                }
                Err(e) if !e.is_retryable() => {
                    tracing::warn!(
                        error = %e,
                        operation = %pending.op.describe(),
                        "dropping recorder operation"
                    );
                    self.discard_dependents(&pending.op);
                    lost = true;
                }
                Err(e) => {
                    pending.attempts += 1;
                    if pending.attempts >= MAX_ATTEMPTS {
                        tracing::warn!(
                            error = %e,
                            operation = %pending.op.describe(),
                            attempts = pending.attempts,
                            "giving up on recorder operation"
                        );
                        self.set_warning(&e);
                        self.discard_dependents(&pending.op);
                        lost = true;
                        continue;
                    }
                    self.set_warning(&e);
                    self.pending.push_front(pending);
                    return false;
                }
            }
        }

        if !lost {
            self.clear_warning();
        }
        true
    }

    /// Drops queued stops whose start will never be recorded.
    fn discard_dependents(&mut self, op: &RecorderOp) {
        let RecorderOp::Start(start) = op else {
            return;
        };
        let before = self.pending.len();
        self.pending.retain(|pending| {
            !matches!(&pending.op, RecorderOp::Stop(stop) if stop.session_id == start.session_id)
        });
        if self.pending.len() < before {
            tracing::warn!(session_id = %start.session_id, "dropping stop of unrecorded session");
        }
    }

    fn enqueue(&mut self, pending: PendingOp) {
        if self.pending.len() >= MAX_PENDING_OPERATIONS {
            if let Some(dropped) = self.pending.pop_front() {
                tracing::warn!(
                    operation = %dropped.op.describe(),
                    "retry queue full, dropping oldest recorder operation"
                );
                self.discard_dependents(&dropped.op);
            }
        }
        self.pending.push_back(pending);
    }

    async fn execute(&self, op: &RecorderOp) -> Result<(), RecorderError> {
        match op {
            RecorderOp::Start(start) => self.recorder.start_session(start).await.map(|_| ()),
            RecorderOp::Stop(stop) => self.recorder.stop_session(stop).await,
        }
    }

    fn set_warning(&self, error: &RecorderError) {
        self.warning_tx
            .send_replace(Some(format!("session history not saved: {error}")));
    }

    fn clear_warning(&self) {
        self.warning_tx.send_if_modified(|warning| warning.take().is_some());
    }
}
