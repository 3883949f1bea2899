//! `sqlvault` command-line front end.
//!
//! Argument parsing and exit-code mapping live here so they can be
//! exercised from integration tests; `main.rs` only wires up the process.

use std::ffi::OsString;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use sqlvault_core::messages::{render_error, UsageError};
use sqlvault_core::runner::ProcessRunner;
use sqlvault_core::{Orchestrator, RestoreRequest, VaultError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Process exit code for every kind of failure.
pub const EXIT_FAILURE: i32 = 1;

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "sqlvault=warn,sqlvault_core=warn";

#[derive(Parser, Debug)]
#[command(name = "sqlvault", version, disable_help_subcommand = true)]
#[command(about = "Back up MySQL databases to S3-compatible storage and restore them")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Dump, compress and upload databases
    Backup {
        /// Database to back up (every non-excluded database if omitted)
        db_name: Option<String>,
    },
    /// Download a dump and load it into a database
    Restore {
        /// Database whose dump is restored
        db_name: String,
        /// Dump date as YYYY-MM-DD (today if omitted)
        date: Option<String>,
        /// Database to load into (db_name if omitted)
        target_db_name: Option<String>,
    },
}

/// Why parsing did not yield a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    /// Help or version text was requested; print it and exit 0.
    Display(String),
    /// The invocation is malformed; print the message and exit 1.
    Usage(UsageError),
}

/// Parse a full argument vector (program name first).
pub fn parse_args<I, T>(args: I) -> Result<Command, ArgsError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    match Cli::try_parse_from(&args) {
        Ok(Cli {
            command: Some(command),
        }) => Ok(command),
        Ok(Cli { command: None }) => Err(ArgsError::Usage(UsageError::MissingCommand)),
        Err(err) => Err(classify(&err, &args)),
    }
}

fn classify(err: &clap::Error, args: &[OsString]) -> ArgsError {
    let first = args.get(1).map(|a| a.to_string_lossy().into_owned());

    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ArgsError::Display(err.to_string()),
        ErrorKind::MissingRequiredArgument if first.as_deref() == Some("restore") => {
            ArgsError::Usage(UsageError::MissingRestoreDatabase)
        }
        ErrorKind::InvalidSubcommand | ErrorKind::UnknownArgument
            if first
                .as_deref()
                .is_some_and(|f| !f.starts_with('-') && f != "backup" && f != "restore") =>
        {
            ArgsError::Usage(UsageError::UnknownCommand(first.unwrap_or_default()))
        }
        _ => {
            let rendered = err.to_string();
            let detail = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            ArgsError::Usage(UsageError::Other(detail))
        }
    }
}

/// Install the stderr log subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Run one parsed command.
pub async fn execute<R: ProcessRunner>(
    orchestrator: &Orchestrator<R>,
    command: Command,
) -> Result<(), VaultError> {
    match command {
        Command::Backup { db_name } => {
            orchestrator.backup(db_name.as_deref()).await?;
        }
        Command::Restore {
            db_name,
            date,
            target_db_name,
        } => {
            orchestrator
                .restore(&RestoreRequest {
                    database: db_name,
                    date,
                    target_database: target_db_name,
                })
                .await?;
        }
    }
    Ok(())
}

/// Run one parsed command and map the result to a process exit code,
/// printing the localized error on failure.
pub async fn run<R: ProcessRunner>(orchestrator: &Orchestrator<R>, command: Command) -> i32 {
    match execute(orchestrator, command).await {
        Ok(()) => 0,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("{}", render_error(orchestrator.config().lang, &err));
            EXIT_FAILURE
        }
    }
}
