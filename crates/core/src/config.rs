use std::path::PathBuf;

use crate::error::ConfigError;
use crate::messages::Lang;

/// Default schema exclusion pattern (MySQL `REGEXP` syntax).
pub const DEFAULT_IGNORE_DATABASE_REGEX: &str = "(^mysql|_schema$|^sys$)";

/// Default local staging directory for dump files.
pub const DEFAULT_DUMP_DIR: &str = "/tmp";

/// Database client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Schemas matching this pattern are skipped when backing up everything.
    pub ignore_database_regex: String,
    /// Tables left out of every dump, without database prefix.
    pub ignore_tables: Vec<String>,
}

/// TLS toggles passed to the storage client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SslConfig {
    pub enabled: bool,
    pub check_certificate: bool,
    pub check_hostname: bool,
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_certificate: true,
            check_hostname: true,
        }
    }
}

/// Object storage client settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    pub access_key: String,
    pub secret_key: String,
    pub host: String,
    pub host_bucket: String,
    pub region: String,
    pub ssl: SslConfig,
    /// Bucket holding the dump files.
    pub container: String,
}

/// Complete runtime configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub dump_dir: PathBuf,
    pub lang: Lang,
}

impl VaultConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `DB_USER`                  | unset                      |
    /// | `DB_PASSWORD`              | unset                      |
    /// | `DB_HOST`                  | unset                      |
    /// | `DB_PORT`                  | unset                      |
    /// | `DB_IGNORE_DATABASE_REGEX` | `(^mysql\|_schema$\|^sys$)` |
    /// | `DB_IGNORE_TABLES`         | unset                      |
    /// | `S3_ACCESS_KEY`            | empty                      |
    /// | `S3_SECRET_KEY`            | empty                      |
    /// | `S3_HOST`                  | empty                      |
    /// | `S3_HOST_BUCKET`           | empty                      |
    /// | `S3_REGION`                | empty                      |
    /// | `S3_SSL`                   | `true`                     |
    /// | `S3_SSL_CHECK_CERT`        | `true`                     |
    /// | `S3_SSL_CHECK_HOST`        | `true`                     |
    /// | `S3_CONTAINER_NAME`        | required                   |
    /// | `SQLVAULT_DUMP_DIR`        | `/tmp`                     |
    /// | `SQLVAULT_LANG`            | `ru`                       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let port = match get("DB_PORT") {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "DB_PORT",
                reason: format!("'{raw}' is not a valid port number"),
            })?),
            None => None,
        };

        let ignore_tables = get("DB_IGNORE_TABLES")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let database = DatabaseConfig {
            user: get("DB_USER"),
            password: get("DB_PASSWORD"),
            host: get("DB_HOST"),
            port,
            ignore_database_regex: get("DB_IGNORE_DATABASE_REGEX")
                .unwrap_or_else(|| DEFAULT_IGNORE_DATABASE_REGEX.to_string()),
            ignore_tables,
        };

        // Only the literal string "false" turns a TLS option off.
        let enabled = |key: &str| get(key).as_deref() != Some("false");

        let storage = StorageConfig {
            access_key: get("S3_ACCESS_KEY").unwrap_or_default(),
            secret_key: get("S3_SECRET_KEY").unwrap_or_default(),
            host: get("S3_HOST").unwrap_or_default(),
            host_bucket: get("S3_HOST_BUCKET").unwrap_or_default(),
            region: get("S3_REGION").unwrap_or_default(),
            ssl: SslConfig {
                enabled: enabled("S3_SSL"),
                check_certificate: enabled("S3_SSL_CHECK_CERT"),
                check_hostname: enabled("S3_SSL_CHECK_HOST"),
            },
            container: get("S3_CONTAINER_NAME").ok_or(ConfigError::Missing("S3_CONTAINER_NAME"))?,
        };

        let dump_dir = get("SQLVAULT_DUMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DUMP_DIR));

        let lang = match get("SQLVAULT_LANG") {
            Some(raw) => raw.parse::<Lang>().map_err(|reason| ConfigError::Invalid {
                var: "SQLVAULT_LANG",
                reason,
            })?,
            None => Lang::default(),
        };

        Ok(Self {
            database,
            storage,
            dump_dir,
            lang,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
