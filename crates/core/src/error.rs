use std::path::PathBuf;

use crate::runner::RunnerError;

/// Invalid or missing environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// User input that fails validation before any tool is run.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid date in YYYY-MM-DD format")]
    InvalidDate(String),

    #[error("'{name}' is not a valid database name: {reason}")]
    InvalidDatabaseName { name: String, reason: &'static str },
}

/// Why a single external-tool step did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum StepFailure {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("{program} exited with code {exit_code}: {stderr}")]
    ExitStatus {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("expected output file {} is missing", .0.display())]
    MissingOutput(PathBuf),
}

/// Terminal failure of a backup or restore run.
///
/// Each tool-driven variant names the step that failed; the CLI maps
/// every variant to a localized message and exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to list databases: {source}")]
    ListDatabases {
        #[source]
        source: StepFailure,
    },

    #[error("Failed to dump database '{database}': {source}")]
    Dump {
        database: String,
        #[source]
        source: StepFailure,
    },

    #[error("Failed to upload {}: {source}", path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: StepFailure,
    },

    #[error("Failed to download '{object}': {source}")]
    Download {
        object: String,
        #[source]
        source: StepFailure,
    },

    #[error("Failed to decompress {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: StepFailure,
    },

    #[error("Failed to load {} into '{database}': {source}", path.display())]
    Load {
        database: String,
        path: PathBuf,
        #[source]
        source: StepFailure,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
