//! Command definitions for the focusflow CLI.
//!
//! Uses clap derive macro for argument parsing.

use clap::{Args, Parser, Subcommand};

use crate::settings::Settings;
use crate::types::Mood;

// ============================================================================
// CLI Structure
// ============================================================================

/// focusflow - a pomodoro timer built for ADHD brains
#[derive(Parser, Debug)]
#[command(
    name = "focusflow",
    version,
    about = "Pomodoro timer with mood check-ins, session history, and focus stats",
    long_about = "A pomodoro timer that runs as a background daemon.\n\
                  Work, short break, and long break phases are recorded so you can \
                  review your history and streaks.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a pomodoro (or resume a paused phase)
    Start(StartArgs),

    /// Resume a paused timer
    Resume,

    /// Pause the running timer
    Pause,

    /// Skip to the next phase without completion credit
    Skip,

    /// Abandon the current run and return to idle
    Reset,

    /// Start a break right away
    Break {
        /// Take a long break instead of a short one
        #[arg(short, long)]
        long: bool,
    },

    /// Show current timer status
    Status,

    /// Show focus statistics from recorded sessions
    Stats {
        /// Only include sessions from the last N days
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=3650))]
        days: Option<u32>,
    },

    /// List recorded sessions, newest first
    History(HistoryArgs),

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Run as daemon (background service)
    #[command(hide = true)]
    Daemon,

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Start Command Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Task to attribute this session to
    #[arg(short, long, value_parser = validate_task_id)]
    pub task: Option<String>,

    /// How you feel right now; adjusts the next work session length
    #[arg(short, long, value_enum)]
    pub mood: Option<Mood>,
}

// ============================================================================
// History Command Arguments
// ============================================================================

/// Arguments for the history command
#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    /// Only show sessions for this task
    #[arg(short, long)]
    pub task: Option<String>,

    /// Only show breaks
    #[arg(long, conflicts_with = "work")]
    pub breaks: bool,

    /// Only show work sessions
    #[arg(long)]
    pub work: bool,

    /// Maximum number of sessions to show
    #[arg(
        short = 'n',
        long,
        default_value = "20",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub limit: u32,
}

impl HistoryArgs {
    /// Break filter derived from `--breaks` / `--work`.
    pub fn is_break(&self) -> Option<bool> {
        match (self.breaks, self.work) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

// ============================================================================
// Settings Command
// ============================================================================

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Print the current settings
    Show,

    /// Change one or more settings
    Set(SettingsSetArgs),
}

/// Arguments for `settings set`. Omitted flags keep their current value.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsSetArgs {
    /// Work duration in minutes (1-120)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=120))]
    pub work: Option<u32>,

    /// Short break duration in minutes (1-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub short_break: Option<u32>,

    /// Long break duration in minutes (1-60)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=60))]
    pub long_break: Option<u32>,

    /// Pomodoros before a long break
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub interval: Option<u32>,

    /// Start breaks automatically when a pomodoro ends
    #[arg(long)]
    pub auto_breaks: Option<bool>,

    /// Start the next pomodoro automatically when a break ends
    #[arg(long)]
    pub auto_pomodoros: Option<bool>,

    /// Daily pomodoro goal
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub daily_goal: Option<u32>,

    /// Weekly pomodoro goal
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub weekly_goal: Option<u32>,
}

impl SettingsSetArgs {
    /// Returns true if no flag was given.
    pub fn is_empty(&self) -> bool {
        self.work.is_none()
            && self.short_break.is_none()
            && self.long_break.is_none()
            && self.interval.is_none()
            && self.auto_breaks.is_none()
            && self.auto_pomodoros.is_none()
            && self.daily_goal.is_none()
            && self.weekly_goal.is_none()
    }

    /// Applies the given flags on top of `settings`.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(work) = self.work {
            settings.pomodoro_duration = work;
        }
        if let Some(short_break) = self.short_break {
            settings.short_break_duration = short_break;
        }
        if let Some(long_break) = self.long_break {
            settings.long_break_duration = long_break;
        }
        if let Some(interval) = self.interval {
            settings.long_break_interval = interval;
        }
        if let Some(auto) = self.auto_breaks {
            settings.auto_start_breaks = auto;
        }
        if let Some(auto) = self.auto_pomodoros {
            settings.auto_start_pomodoros = auto;
        }
        if let Some(goal) = self.daily_goal {
            settings.daily_goal = goal;
        }
        if let Some(goal) = self.weekly_goal {
            settings.weekly_goal = goal;
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the task identifier.
///
/// - Must not be empty
/// - Must not exceed 100 characters
fn validate_task_id(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("task id cannot be empty".to_string());
    }
    if s.chars().count() > 100 {
        return Err("task id must be at most 100 characters".to_string());
    }
    Ok(s.to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // Cli Tests
    // ------------------------------------------------------------------------

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["focusflow"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
        }

        #[test]
        fn test_parse_short_verbose_flag() {
            let cli = Cli::parse_from(["focusflow", "-v", "status"]);
            assert!(cli.verbose);
            assert!(matches!(cli.command, Some(Commands::Status)));
        }

        #[test]
        fn test_parse_timer_commands() {
            assert!(matches!(
                Cli::parse_from(["focusflow", "pause"]).command,
                Some(Commands::Pause)
            ));
            assert!(matches!(
                Cli::parse_from(["focusflow", "resume"]).command,
                Some(Commands::Resume)
            ));
            assert!(matches!(
                Cli::parse_from(["focusflow", "skip"]).command,
                Some(Commands::Skip)
            ));
            assert!(matches!(
                Cli::parse_from(["focusflow", "reset"]).command,
                Some(Commands::Reset)
            ));
            assert!(matches!(
                Cli::parse_from(["focusflow", "daemon"]).command,
                Some(Commands::Daemon)
            ));
        }

        #[test]
        fn test_parse_break() {
            let cli = Cli::parse_from(["focusflow", "break", "--long"]);
            assert!(matches!(cli.command, Some(Commands::Break { long: true })));

            let cli = Cli::parse_from(["focusflow", "break"]);
            assert!(matches!(cli.command, Some(Commands::Break { long: false })));
        }

        #[test]
        fn test_parse_completions_zsh() {
            let cli = Cli::parse_from(["focusflow", "completions", "zsh"]);
            match cli.command {
                Some(Commands::Completions { shell }) => {
                    assert_eq!(shell, clap_complete::Shell::Zsh);
                }
                _ => panic!("Expected Completions command"),
            }
        }

        #[test]
        fn test_parse_invalid_command() {
            assert!(Cli::try_parse_from(["focusflow", "invalid"]).is_err());
        }
    }

    // ------------------------------------------------------------------------
    // StartArgs Tests
    // ------------------------------------------------------------------------

    mod start_args_tests {
        use super::*;

        #[test]
        fn test_start_defaults() {
            let cli = Cli::parse_from(["focusflow", "start"]);
            match cli.command {
                Some(Commands::Start(args)) => {
                    assert!(args.task.is_none());
                    assert!(args.mood.is_none());
                }
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_start_with_task_and_mood() {
            let cli = Cli::parse_from([
                "focusflow",
                "start",
                "--task",
                "write-report",
                "-m",
                "struggling",
            ]);
            match cli.command {
                Some(Commands::Start(args)) => {
                    assert_eq!(args.task, Some("write-report".to_string()));
                    assert_eq!(args.mood, Some(Mood::Struggling));
                }
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_start_invalid_mood() {
            assert!(Cli::try_parse_from(["focusflow", "start", "--mood", "sleepy"]).is_err());
        }

        #[test]
        fn test_start_empty_task_rejected() {
            assert!(Cli::try_parse_from(["focusflow", "start", "--task", ""]).is_err());
        }

        #[test]
        fn test_start_long_task_rejected() {
            let long = "a".repeat(101);
            assert!(Cli::try_parse_from(["focusflow", "start", "--task", &long]).is_err());
        }
    }

    // ------------------------------------------------------------------------
    // History / Stats Tests
    // ------------------------------------------------------------------------

    mod history_tests {
        use super::*;

        #[test]
        fn test_history_defaults() {
            let cli = Cli::parse_from(["focusflow", "history"]);
            match cli.command {
                Some(Commands::History(args)) => {
                    assert_eq!(args.limit, 20);
                    assert_eq!(args.is_break(), None);
                }
                _ => panic!("Expected History command"),
            }
        }

        #[test]
        fn test_history_filters() {
            let cli = Cli::parse_from([
                "focusflow",
                "history",
                "--work",
                "-n",
                "5",
                "--task",
                "t1",
            ]);
            match cli.command {
                Some(Commands::History(args)) => {
                    assert_eq!(args.limit, 5);
                    assert_eq!(args.is_break(), Some(false));
                    assert_eq!(args.task, Some("t1".to_string()));
                }
                _ => panic!("Expected History command"),
            }
        }

        #[test]
        fn test_history_conflicting_filters() {
            assert!(Cli::try_parse_from(["focusflow", "history", "--work", "--breaks"]).is_err());
        }

        #[test]
        fn test_stats_days() {
            let cli = Cli::parse_from(["focusflow", "stats", "--days", "7"]);
            assert!(matches!(cli.command, Some(Commands::Stats { days: Some(7) })));
            assert!(Cli::try_parse_from(["focusflow", "stats", "--days", "0"]).is_err());
        }
    }

    // ------------------------------------------------------------------------
    // Settings Tests
    // ------------------------------------------------------------------------

    mod settings_tests {
        use super::*;

        #[test]
        fn test_settings_show() {
            let cli = Cli::parse_from(["focusflow", "settings", "show"]);
            assert!(matches!(
                cli.command,
                Some(Commands::Settings(SettingsCommand::Show))
            ));
        }

        #[test]
        fn test_settings_set_applies_flags() {
            let cli = Cli::parse_from([
                "focusflow",
                "settings",
                "set",
                "--work",
                "50",
                "--auto-breaks",
                "true",
                "--daily-goal",
                "6",
            ]);
            let args = match cli.command {
                Some(Commands::Settings(SettingsCommand::Set(args))) => args,
                _ => panic!("Expected settings set"),
            };
            assert!(!args.is_empty());

            let mut settings = Settings::default();
            args.apply(&mut settings);

            assert_eq!(settings.pomodoro_duration, 50);
            assert!(settings.auto_start_breaks);
            assert_eq!(settings.daily_goal, 6);
            assert_eq!(settings.short_break_duration, 5);
        }

        #[test]
        fn test_settings_set_range_checked() {
            let too_long = ["focusflow", "settings", "set", "--work", "121"];
            assert!(Cli::try_parse_from(too_long).is_err());
            let no_interval = ["focusflow", "settings", "set", "--interval", "0"];
            assert!(Cli::try_parse_from(no_interval).is_err());
        }

        #[test]
        fn test_settings_set_empty() {
            assert!(SettingsSetArgs::default().is_empty());
        }
    }
}
