//! Daemon module for focusflow.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Timer engine with state transitions and countdown logic
//! - `clock`: Wall-clock abstraction for session timestamps
//! - `dispatcher`: Non-blocking delivery of session boundaries to the recorder
//! - `ipc`: Unix socket server and request handling
//!
//! [`Daemon`] wires them together: a one-second ticker drives the engine, the
//! IPC server accepts commands, and the dispatcher persists sessions.

pub mod clock;
pub mod dispatcher;
pub mod ipc;
pub mod timer;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};

use crate::recorder::JsonFileRecorder;
use crate::settings::{FileSettingsProvider, SettingsProvider};
use crate::types::IpcResponse;

pub use clock::{Clock, FakeClock, SystemClock};
pub use dispatcher::RecorderDispatcher;
pub use ipc::{IpcServer, RequestHandler, SOCKET_FILE_NAME};
pub use timer::{TickOutcome, TimerEngine, TimerError, TimerEvent};

/// How long shutdown waits for the dispatcher to flush
const SHUTDOWN_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Daemon
// ============================================================================

/// Background process owning the single timer instance.
pub struct Daemon {
    data_dir: PathBuf,
}

impl Daemon {
    /// Creates a daemon storing its socket, settings, and sessions in `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn socket_path(&self) -> PathBuf {
        self.data_dir.join(SOCKET_FILE_NAME)
    }

    /// Runs until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the socket cannot be bound.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs until `shutdown` completes.
    ///
    /// On shutdown the timer is reset so an in-progress session is closed
    /// in the history, and queued recorder operations get a final flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are invalid or the socket cannot be bound.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let settings = Arc::new(FileSettingsProvider::in_dir(&self.data_dir));
        let config = settings
            .get_config()
            .context("Failed to load settings")?;
        let recorder = Arc::new(JsonFileRecorder::in_dir(&self.data_dir));

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Mutex::new(TimerEngine::new(config, event_tx)));

        let dispatcher = RecorderDispatcher::new(recorder);
        let warnings = dispatcher.warnings();
        let dispatcher_handle = tokio::spawn(dispatcher.run(event_rx));

        let server = IpcServer::new(&self.socket_path())?;
        let handler = Arc::new(RequestHandler::new(
            Arc::clone(&engine),
            settings,
            warnings,
        ));
        let ticker_handle = tokio::spawn(run_ticker(Arc::clone(&engine)));

        tracing::info!(data_dir = %self.data_dir.display(), "focusflow daemon started");

        tokio::select! {
            () = serve(&server, handler) => {}
            () = shutdown => tracing::info!("shutting down"),
        }

        ticker_handle.abort();
        let _ = ticker_handle.await;
        engine.lock().await.reset();
        drop(engine);

        if timeout(SHUTDOWN_FLUSH_TIMEOUT, dispatcher_handle)
            .await
            .is_err()
        {
            tracing::warn!("timed out waiting for session history to flush");
        }

        Ok(())
    }
}

/// Drives the engine once per second.
///
/// Missed ticks are skipped rather than replayed in a burst.
pub async fn run_ticker(engine: Arc<Mutex<TimerEngine>>) {
    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let outcome = engine.lock().await.tick();
        if let TickOutcome::Expired {
            finished,
            next,
            running,
        } = outcome
        {
            tracing::debug!(%finished, %next, running, "ticker observed expiry");
        }
    }
}

/// Accepts connections forever, one request per connection.
async fn serve(server: &IpcServer, handler: Arc<RequestHandler>) {
    loop {
        let mut stream = match server.accept().await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept IPC connection");
                continue;
            }
        };

        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            let response = match IpcServer::receive_request(&mut stream).await {
                Ok(request) => handler.handle(request).await,
                Err(e) => {
                    tracing::debug!(error = %e, "rejecting IPC request");
                    IpcResponse::error(format!("Invalid request: {e}"))
                }
            };

            if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
                tracing::debug!(error = %e, "failed to send IPC response");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimerConfig;

    #[tokio::test(start_paused = true)]
    async fn test_ticker_counts_running_engine() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Mutex::new(TimerEngine::new(TimerConfig::default(), tx)));
        engine.lock().await.start(None).unwrap();

        let handle = tokio::spawn(run_ticker(Arc::clone(&engine)));
        tokio::time::sleep(Duration::from_millis(3500)).await;
        handle.abort();

        assert_eq!(engine.lock().await.remaining_seconds(), 1497);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_leaves_idle_engine_alone() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let engine = Arc::new(Mutex::new(TimerEngine::new(TimerConfig::default(), tx)));

        let handle = tokio::spawn(run_ticker(Arc::clone(&engine)));
        tokio::time::sleep(Duration::from_secs(10)).await;
        handle.abort();

        let engine = engine.lock().await;
        assert!(engine.is_idle());
        assert_eq!(engine.remaining_seconds(), 1500);
    }

    #[test]
    fn test_socket_path_in_data_dir() {
        let daemon = Daemon::new("/tmp/focusflow-test");
        assert_eq!(
            daemon.socket_path(),
            PathBuf::from("/tmp/focusflow-test/focusflow.sock")
        );
    }
}
