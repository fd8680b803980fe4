//! JSON file session store.
//!
//! All sessions live in a single JSON array (default
//! `~/.focusflow/sessions.json`). Writes go to a temporary file that is
//! renamed over the original so readers never see a half-written file.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::{
    RecorderError, SessionId, SessionQuery, SessionRecord, SessionRecorder, SessionStart,
    SessionStop,
};

/// File name of the session store inside the data directory.
pub const SESSIONS_FILE_NAME: &str = "sessions.json";

/// Session recorder persisting to a JSON file.
#[derive(Debug)]
pub struct JsonFileRecorder {
    path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileRecorder {
    /// Creates a recorder for the given file. The file is created lazily.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a recorder for `sessions.json` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SESSIONS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> RecorderError {
        RecorderError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn load(&self) -> Result<Vec<SessionRecord>, RecorderError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, records: &[SessionRecord]) -> Result<(), RecorderError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_vec_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

impl SessionRecorder for JsonFileRecorder {
    async fn start_session(&self, start: &SessionStart) -> Result<SessionId, RecorderError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        // A retried start that already landed is not an error.
        if records.iter().any(|r| r.id == start.session_id) {
            return Ok(start.session_id);
        }

        records.push(SessionRecord::started(start));
        self.save(&records).await?;

        tracing::debug!(session_id = %start.session_id, mode = %start.mode, "session recorded");
        Ok(start.session_id)
    }

    async fn stop_session(&self, stop: &SessionStop) -> Result<(), RecorderError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let record = records
            .iter_mut()
            .find(|r| r.id == stop.session_id)
            .ok_or(RecorderError::SessionNotFound(stop.session_id))?;
        if !record.is_open() {
            return Err(RecorderError::AlreadyStopped(stop.session_id));
        }
        record.apply_stop(stop);

        self.save(&records).await?;

        tracing::debug!(
            session_id = %stop.session_id,
            duration = stop.duration_seconds,
            reason = ?stop.reason,
            "session closed"
        );
        Ok(())
    }

    async fn list_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<SessionRecord>, RecorderError> {
        let mut records: Vec<SessionRecord> = self
            .load()
            .await?
            .into_iter()
            .filter(|r| query.matches(r))
            .collect();
        records.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::StopReason;
    use crate::types::TimerMode;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn sample_start(hour: u32, mode: TimerMode) -> SessionStart {
        SessionStart {
            session_id: Uuid::new_v4(),
            task_id: Some("task-1".to_string()),
            mode,
            started_at: Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap(),
        }
    }

    fn sample_stop(start: &SessionStart, reason: StopReason) -> SessionStop {
        SessionStop {
            session_id: start.session_id,
            ended_at: start.started_at + Duration::minutes(25),
            duration_seconds: 1500,
            is_break: start.is_break(),
            reason,
        }
    }

    #[tokio::test]
    async fn test_missing_file_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = JsonFileRecorder::in_dir(dir.path());

        let sessions = recorder
            .list_sessions(&SessionQuery::default())
            .await
            .unwrap();
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn test_start_then_stop_persists() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = JsonFileRecorder::in_dir(dir.path());
        let start = sample_start(9, TimerMode::Work);

        recorder.start_session(&start).await.unwrap();
        recorder
            .stop_session(&sample_stop(&start, StopReason::Completed))
            .await
            .unwrap();

        // A fresh recorder reads what the first one wrote
        let reopened = JsonFileRecorder::in_dir(dir.path());
        let sessions = reopened
            .list_sessions(&SessionQuery::default())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].is_completed_pomodoro());
        assert_eq!(sessions[0].duration_seconds, Some(1500));
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("data");
        let recorder = JsonFileRecorder::in_dir(&nested);

        recorder
            .start_session(&sample_start(9, TimerMode::Work))
            .await
            .unwrap();
        assert!(nested.join(SESSIONS_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_duplicate_start_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = JsonFileRecorder::in_dir(dir.path());
        let start = sample_start(9, TimerMode::Work);

        recorder.start_session(&start).await.unwrap();
        recorder.start_session(&start).await.unwrap();

        let sessions = recorder
            .list_sessions(&SessionQuery::default())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_unknown_session() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = JsonFileRecorder::in_dir(dir.path());
        let start = sample_start(9, TimerMode::Work);

        let err = recorder
            .stop_session(&sample_stop(&start, StopReason::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, RecorderError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_corrupt_file_reports_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSIONS_FILE_NAME), "not json").unwrap();
        let recorder = JsonFileRecorder::in_dir(dir.path());

        let err = recorder
            .list_sessions(&SessionQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RecorderError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_list_filters_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = JsonFileRecorder::in_dir(dir.path());
        recorder
            .start_session(&sample_start(9, TimerMode::Work))
            .await
            .unwrap();
        recorder
            .start_session(&sample_start(10, TimerMode::ShortBreak))
            .await
            .unwrap();

        let work_only = SessionQuery {
            is_break: Some(false),
            ..Default::default()
        };
        let sessions = recorder.list_sessions(&work_only).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].mode, TimerMode::Work);
    }
}
