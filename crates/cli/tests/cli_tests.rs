//! Integration tests for argument parsing and exit-code mapping.
//!
//! Commands run against the recording fake runner so no real database, gzip
//! or storage client is needed.

use assert_matches::assert_matches;
use sqlvault::{parse_args, ArgsError, Command, EXIT_FAILURE};
use sqlvault_core::config::{DatabaseConfig, StorageConfig};
use sqlvault_core::messages::{Lang, UsageError};
use sqlvault_core::runner::FakeRunner;
use sqlvault_core::{Orchestrator, VaultConfig};

fn config(dir: &tempfile::TempDir) -> VaultConfig {
    VaultConfig {
        database: DatabaseConfig::default(),
        storage: StorageConfig {
            container: "dumps".to_string(),
            ..StorageConfig::default()
        },
        dump_dir: dir.path().to_path_buf(),
        lang: Lang::En,
    }
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

#[test]
fn backup_without_name() {
    assert_eq!(
        parse_args(["sqlvault", "backup"]),
        Ok(Command::Backup { db_name: None })
    );
}

#[test]
fn backup_with_name() {
    assert_eq!(
        parse_args(["sqlvault", "backup", "shop"]),
        Ok(Command::Backup {
            db_name: Some("shop".to_string())
        })
    );
}

#[test]
fn restore_with_all_arguments() {
    assert_eq!(
        parse_args(["sqlvault", "restore", "shop", "2024-01-01", "shop_copy"]),
        Ok(Command::Restore {
            db_name: "shop".to_string(),
            date: Some("2024-01-01".to_string()),
            target_db_name: Some("shop_copy".to_string()),
        })
    );
}

#[test]
fn restore_with_only_name() {
    assert_eq!(
        parse_args(["sqlvault", "restore", "shop"]),
        Ok(Command::Restore {
            db_name: "shop".to_string(),
            date: None,
            target_db_name: None,
        })
    );
}

#[test]
fn missing_command() {
    assert_eq!(
        parse_args(["sqlvault"]),
        Err(ArgsError::Usage(UsageError::MissingCommand))
    );
}

#[test]
fn restore_requires_database() {
    assert_eq!(
        parse_args(["sqlvault", "restore"]),
        Err(ArgsError::Usage(UsageError::MissingRestoreDatabase))
    );
}

#[test]
fn unknown_command() {
    assert_eq!(
        parse_args(["sqlvault", "dump"]),
        Err(ArgsError::Usage(UsageError::UnknownCommand("dump".to_string())))
    );
}

#[test]
fn help_is_not_a_command() {
    assert_eq!(
        parse_args(["sqlvault", "help"]),
        Err(ArgsError::Usage(UsageError::UnknownCommand("help".to_string())))
    );
}

#[test]
fn extra_arguments_are_rejected() {
    assert_matches!(
        parse_args(["sqlvault", "backup", "a", "b"]),
        Err(ArgsError::Usage(UsageError::Other(_)))
    );
}

#[test]
fn help_is_displayed_not_an_error() {
    assert_matches!(
        parse_args(["sqlvault", "--help"]),
        Err(ArgsError::Display(text)) if text.contains("restore")
    );
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_backup_exits_zero() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let orchestrator = Orchestrator::new(config(&dir), FakeRunner::new());

    let code = sqlvault::run(
        &orchestrator,
        Command::Backup {
            db_name: Some("shop".to_string()),
        },
    )
    .await;

    assert_eq!(code, 0);
    assert_eq!(
        orchestrator.runner().programs(),
        vec!["mysqldump", "gzip", "s3cmd"]
    );
}

#[tokio::test]
async fn failed_dump_exits_one_without_upload() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let orchestrator =
        Orchestrator::new(config(&dir), FakeRunner::new().exit_code("mysqldump", 1));

    let code = sqlvault::run(
        &orchestrator,
        Command::Backup {
            db_name: Some("shop".to_string()),
        },
    )
    .await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(!orchestrator.runner().programs().contains(&"s3cmd".to_string()));
}

#[tokio::test]
async fn failed_download_exits_one_without_load() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let orchestrator = Orchestrator::new(config(&dir), FakeRunner::new().exit_code("s3cmd", 1));

    let code = sqlvault::run(
        &orchestrator,
        Command::Restore {
            db_name: "shop".to_string(),
            date: Some("2024-01-01".to_string()),
            target_db_name: None,
        },
    )
    .await;

    assert_eq!(code, EXIT_FAILURE);
    assert_eq!(orchestrator.runner().programs(), vec!["s3cmd"]);
}

#[tokio::test]
async fn invalid_date_exits_one_before_any_tool() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let orchestrator = Orchestrator::new(config(&dir), FakeRunner::new());

    let code = sqlvault::run(
        &orchestrator,
        Command::Restore {
            db_name: "shop".to_string(),
            date: Some("15.03.2024".to_string()),
            target_db_name: None,
        },
    )
    .await;

    assert_eq!(code, EXIT_FAILURE);
    assert!(orchestrator.runner().programs().is_empty());
}
