//! focusflow - a pomodoro timer built for ADHD brains
//!
//! Work in focused intervals with breaks in between:
//! - 25 minutes of focused work (adjustable with a mood check-in)
//! - 5 minutes of short break
//! - 15 minutes of long break after 4 pomodoros

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{CommandFactory, Parser};

use focusflow::cli::{Cli, Commands, Display, HistoryArgs, IpcClient, SettingsCommand};
use focusflow::daemon::Daemon;
use focusflow::recorder::{JsonFileRecorder, SessionQuery, SessionRecorder};
use focusflow::settings::{self, FileSettingsProvider, SettingsProvider};
use focusflow::stats::FocusSummary;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins; otherwise `--verbose` raises the level to debug.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let data_dir = settings::data_dir()?;
    tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

    match cli.command {
        Some(Commands::Start(args)) => {
            let response = IpcClient::new(&data_dir).start(&args).await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Resume) => {
            let response = IpcClient::new(&data_dir).resume().await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Pause) => {
            let response = IpcClient::new(&data_dir).pause().await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Skip) => {
            let response = IpcClient::new(&data_dir).skip().await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Reset) => {
            let response = IpcClient::new(&data_dir).reset().await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Break { long }) => {
            let response = IpcClient::new(&data_dir).start_break(long).await?;
            Display::show_command_result(&response);
        }
        Some(Commands::Status) => {
            let response = IpcClient::new(&data_dir).status().await?;
            Display::show_status(&response);
        }
        Some(Commands::Stats { days }) => {
            let recorder = JsonFileRecorder::in_dir(&data_dir);
            let settings = FileSettingsProvider::in_dir(&data_dir).load()?;
            let records = recorder
                .list_sessions(&SessionQuery::default())
                .await
                .context("Failed to read session history")?;
            let now = Utc::now();
            let since = days.map(|d| now - Duration::days(i64::from(d)));
            let summary = FocusSummary::compute_since(&records, &settings, now.date_naive(), since);
            Display::show_stats(&summary, days);
        }
        Some(Commands::History(args)) => {
            show_history(&JsonFileRecorder::in_dir(&data_dir), &args).await?;
        }
        Some(Commands::Settings(SettingsCommand::Show)) => {
            let settings = FileSettingsProvider::in_dir(&data_dir).load()?;
            Display::show_settings(&settings);
        }
        Some(Commands::Settings(SettingsCommand::Set(args))) => {
            let provider = FileSettingsProvider::in_dir(&data_dir);
            let mut settings = provider.load()?;
            if args.is_empty() {
                anyhow::bail!("No settings given. See 'focusflow settings set --help'");
            }
            args.apply(&mut settings);
            provider.save(&settings)?;
            println!("* Settings saved (applied when the timer is next idle)");
            Display::show_settings(&settings);
        }
        Some(Commands::Daemon) => {
            Daemon::new(data_dir).run().await?;
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

async fn show_history(recorder: &JsonFileRecorder, args: &HistoryArgs) -> Result<()> {
    let query = SessionQuery {
        is_break: args.is_break(),
        task_id: args.task.clone(),
        ..Default::default()
    };
    let mut records = recorder
        .list_sessions(&query)
        .await
        .context("Failed to read session history")?;
    records.truncate(args.limit as usize);
    Display::show_history(&records);
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
