//! User settings and the timer configuration derived from them.
//!
//! Settings are stored as a camelCase JSON document with durations in
//! minutes. Missing fields fall back to defaults; out-of-range values are
//! rejected rather than clamped. The daemon reads the settings through a
//! [`SettingsProvider`] before every start from idle, so edits made with
//! `focusflow settings set` take effect on the next run.

pub mod error;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::types::TimerConfig;

pub use error::SettingsError;

/// Environment variable overriding the data directory
pub const HOME_ENV_VAR: &str = "FOCUSFLOW_HOME";

/// Data directory name under the user's home
const DATA_DIR_NAME: &str = ".focusflow";

/// File name of the settings document
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Returns the focusflow data directory.
///
/// `FOCUSFLOW_HOME` wins when set; otherwise `~/.focusflow`.
///
/// # Errors
///
/// Returns [`SettingsError::NoDataDir`] if no home directory can be found.
pub fn data_dir() -> Result<PathBuf, SettingsError> {
    if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(DATA_DIR_NAME))
        .ok_or(SettingsError::NoDataDir)
}

// ============================================================================
// Settings
// ============================================================================

/// User settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Work duration in minutes (1-120)
    pub pomodoro_duration: u32,
    /// Short break in minutes (1-60)
    pub short_break_duration: u32,
    /// Long break in minutes (1-60)
    pub long_break_duration: u32,
    /// Pomodoros before a long break (>= 1)
    pub long_break_interval: u32,
    pub auto_start_breaks: bool,
    pub auto_start_pomodoros: bool,
    pub notifications: bool,
    pub sound: bool,
    /// Pomodoros per day to aim for (>= 1)
    pub daily_goal: u32,
    /// Pomodoros per week to aim for (>= 1)
    pub weekly_goal: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pomodoro_duration: 25,
            short_break_duration: 5,
            long_break_duration: 15,
            long_break_interval: 4,
            auto_start_breaks: false,
            auto_start_pomodoros: false,
            notifications: true,
            sound: true,
            daily_goal: 4,
            weekly_goal: 20,
        }
    }
}

impl Settings {
    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::OutOfRange`] for the first invalid field.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range("pomodoroDuration", self.pomodoro_duration, 1, 120)?;
        check_range("shortBreakDuration", self.short_break_duration, 1, 60)?;
        check_range("longBreakDuration", self.long_break_duration, 1, 60)?;
        check_range("longBreakInterval", self.long_break_interval, 1, u32::MAX)?;
        check_range("dailyGoal", self.daily_goal, 1, u32::MAX)?;
        check_range("weeklyGoal", self.weekly_goal, 1, u32::MAX)?;
        Ok(())
    }

    /// Builds the timer configuration snapshot for a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings fail validation.
    pub fn to_timer_config(&self) -> Result<TimerConfig, SettingsError> {
        self.validate()?;
        Ok(TimerConfig::new(
            self.pomodoro_duration * 60,
            self.short_break_duration * 60,
            self.long_break_duration * 60,
            self.long_break_interval,
            self.auto_start_breaks,
            self.auto_start_pomodoros,
        )?)
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), SettingsError> {
    if value < min || value > max {
        return Err(SettingsError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

// ============================================================================
// SettingsProvider
// ============================================================================

/// Supplies settings and the timer configuration derived from them.
pub trait SettingsProvider: Send + Sync {
    /// Loads and validates the current settings.
    fn load(&self) -> Result<Settings, SettingsError>;

    /// Returns an immutable configuration snapshot for the next run.
    fn get_config(&self) -> Result<TimerConfig, SettingsError> {
        self.load()?.to_timer_config()
    }
}

/// Settings provider backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSettingsProvider {
    path: PathBuf,
}

impl FileSettingsProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a provider for `settings.json` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validates and writes `settings`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the write fails.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        settings.validate()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

impl SettingsProvider for FileSettingsProvider {
    fn load(&self) -> Result<Settings, SettingsError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let settings: Settings =
            serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }
}

/// In-memory settings provider.
#[derive(Debug, Default)]
pub struct StaticSettingsProvider {
    settings: Mutex<Settings>,
}

impl StaticSettingsProvider {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }

    /// Replaces the stored settings.
    pub fn set(&self, settings: Settings) {
        *self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
    }
}

impl SettingsProvider for StaticSettingsProvider {
    fn load(&self) -> Result<Settings, SettingsError> {
        let settings = self
            .settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        settings.validate()?;
        Ok(settings)
    }
}
