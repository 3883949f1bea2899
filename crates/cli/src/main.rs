//! `sqlvault` -- MySQL backup/restore through S3-compatible storage.
//!
//! ```text
//! sqlvault backup [db_name]
//! sqlvault restore <db_name> [date] [target_db_name]
//! ```
//!
//! Configuration comes from the environment (optionally a `.env` file);
//! see `VaultConfig::from_env` for the full variable list. Exits with 1 on
//! any failure.

use sqlvault::{parse_args, ArgsError, EXIT_FAILURE};
use sqlvault_core::messages::{render_error, Lang};
use sqlvault_core::runner::SystemRunner;
use sqlvault_core::{Orchestrator, VaultConfig, VaultError};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    sqlvault::init_tracing();

    let lang = Lang::from_env_or_default();

    let command = match parse_args(std::env::args_os()) {
        Ok(command) => command,
        Err(ArgsError::Display(text)) => {
            print!("{text}");
            return;
        }
        Err(ArgsError::Usage(usage)) => {
            eprintln!("{}", usage.render(lang));
            std::process::exit(EXIT_FAILURE);
        }
    };

    let config = VaultConfig::from_env().unwrap_or_else(|err| {
        tracing::error!(error = %err, "Invalid configuration");
        eprintln!("{}", render_error(lang, &VaultError::Config(err)));
        std::process::exit(EXIT_FAILURE);
    });

    tracing::debug!(
        container = %config.storage.container,
        dump_dir = %config.dump_dir.display(),
        ?command,
        "Starting sqlvault",
    );

    let orchestrator = Orchestrator::new(config, SystemRunner);
    let code = sqlvault::run(&orchestrator, command).await;
    if code != 0 {
        std::process::exit(code);
    }
}
