//! IPC server for the focusflow daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Integration with TimerEngine, the settings provider, and recorder warnings

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{watch, Mutex};
use tokio::time::{timeout, Duration};

use crate::settings::SettingsProvider;
use crate::types::{IpcRequest, IpcResponse, ResponseData, StartParams};

use super::timer::{TimerEngine, TimerError};

// ============================================================================
// Constants
// ============================================================================

/// Socket file name inside the data directory
pub const SOCKET_FILE_NAME: &str = "focusflow.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// The client closed the connection before sending a request
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        tracing::debug!(path = ?socket_path, "IPC server listening");

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE + 1];

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to TimerEngine.
pub struct RequestHandler {
    /// Shared reference to the timer engine
    engine: Arc<Mutex<TimerEngine>>,
    /// Source of the configuration applied before each run
    settings: Arc<dyn SettingsProvider>,
    /// Latest recorder warning from the dispatcher
    warnings: watch::Receiver<Option<String>>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(
        engine: Arc<Mutex<TimerEngine>>,
        settings: Arc<dyn SettingsProvider>,
        warnings: watch::Receiver<Option<String>>,
    ) -> Self {
        Self {
            engine,
            settings,
            warnings,
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        tracing::debug!(?request, "handling IPC request");

        match request {
            IpcRequest::Start { params } => self.handle_start(params).await,
            IpcRequest::Pause => self.handle_simple("Timer paused", TimerEngine::pause).await,
            IpcRequest::Skip => {
                self.handle_simple("Skipped to next phase", |engine| engine.skip().map(|_| ()))
                    .await
            }
            IpcRequest::Reset => {
                self.handle_simple("Timer reset", |engine| {
                    engine.reset();
                    Ok(())
                })
                .await
            }
            IpcRequest::Break { long } => self.handle_break(long).await,
            IpcRequest::Status => self.handle_status().await,
        }
    }

    /// Handles the start command.
    ///
    /// Starting from idle reloads the settings so every run gets a fresh
    /// configuration snapshot. A mood is only honoured from idle.
    async fn handle_start(&self, params: StartParams) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let from_idle = engine.is_idle();
        let mut message = if from_idle || engine.started_at().is_none() {
            "Timer started".to_string()
        } else {
            "Timer resumed".to_string()
        };

        if from_idle {
            if let Err(response) = self.reload_settings(&mut engine) {
                return response;
            }

            if let Some(mood) = params.mood {
                match engine.select_mood(mood) {
                    Ok(feedback) => message = format!("{message}. {feedback}"),
                    Err(e) => return IpcResponse::error(e.to_string()),
                }
            }
        } else if params.mood.is_some() {
            return IpcResponse::error(
                "A mood can only be chosen before a run. Reset the timer first",
            );
        }

        match engine.start(params.task_id) {
            Ok(()) => IpcResponse::success(message, Some(self.response_data(&engine))),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the break command. A break from idle begins a new run, so
    /// the settings are reloaded first.
    async fn handle_break(&self, long: bool) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        if engine.is_idle() {
            if let Err(response) = self.reload_settings(&mut engine) {
                return response;
            }
        }

        let message = if long {
            "Long break started"
        } else {
            "Short break started"
        };
        match engine.start_break(long) {
            Ok(()) => IpcResponse::success(message, Some(self.response_data(&engine))),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Applies the current settings to an idle engine.
    fn reload_settings(&self, engine: &mut TimerEngine) -> Result<(), IpcResponse> {
        match self.settings.get_config() {
            Ok(config) => {
                engine.update_config(config);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "refusing to start with invalid settings");
                Err(IpcResponse::error(format!("Invalid settings: {e}")))
            }
        }
    }

    async fn handle_simple<F>(&self, message: &str, operation: F) -> IpcResponse
    where
        F: FnOnce(&mut TimerEngine) -> Result<(), TimerError>,
    {
        let mut engine = self.engine.lock().await;

        match operation(&mut *engine) {
            Ok(()) => IpcResponse::success(message, Some(self.response_data(&engine))),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        IpcResponse::success("", Some(self.response_data(&engine)))
    }

    fn response_data(&self, engine: &TimerEngine) -> ResponseData {
        let warning = self.warnings.borrow().clone();
        ResponseData::from_snapshot(&engine.snapshot()).with_warning(warning)
    }
}

// ============================================================================
// Tests
// ============================================================================
