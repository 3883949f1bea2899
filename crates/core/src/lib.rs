//! `sqlvault-core`: MySQL dump backup and restore against S3-compatible storage.
//!
//! The [`orchestrator`] drives `mysql`, `mysqldump`, `gzip` and `s3cmd`
//! through the [`runner::ProcessRunner`] seam, configured by a
//! [`config::VaultConfig`] loaded once from the environment.

pub mod config;
pub mod credentials;
pub mod error;
pub mod messages;
pub mod naming;
pub mod orchestrator;
pub mod runner;

pub use config::VaultConfig;
pub use error::VaultError;
pub use orchestrator::{Orchestrator, RestoreOutcome, RestoreRequest};
