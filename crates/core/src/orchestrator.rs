//! Backup and restore command orchestration.
//!
//! Sequences the external tools for each command and validates every step
//! by exit status and, where a step produces a file, by the file's presence.
//! The first failing step aborts the run; nothing is retried and files left
//! behind by a failed step are not cleaned up.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::VaultConfig;
use crate::credentials::{ignore_table_args, mysql_login_args, s3_login_args};
use crate::error::{StepFailure, VaultError};
use crate::messages::Notice;
use crate::naming::{
    decompressed_path, display_name, dump_file_name, parse_dump_date, today,
    validate_database_name, DATE_FORMAT,
};
use crate::runner::{ProcessRunner, ToolCommand, ToolOutput};

const MYSQL: &str = "mysql";
const MYSQLDUMP: &str = "mysqldump";
const GZIP: &str = "gzip";
const S3CMD: &str = "s3cmd";

/// Arguments of a `restore` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreRequest {
    /// Database whose dump is restored.
    pub database: String,
    /// Dump date as `YYYY-MM-DD`; today when `None`.
    pub date: Option<String>,
    /// Database to load into; `database` when `None`.
    pub target_database: Option<String>,
}

/// What a successful restore did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOutcome {
    pub object: String,
    pub target_database: String,
}

/// Runs backups and restores against the configured database and container.
pub struct Orchestrator<R> {
    config: VaultConfig,
    runner: R,
    clock: fn() -> NaiveDate,
}

impl<R: ProcessRunner> Orchestrator<R> {
    pub fn new(config: VaultConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            clock: today,
        }
    }

    /// Replace the source of "today" used for dump names.
    pub fn with_clock(mut self, clock: fn() -> NaiveDate) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Dump, compress and upload one database, or every non-excluded one.
    ///
    /// Returns the names of the uploaded dump files in upload order.
    pub async fn backup(&self, database: Option<&str>) -> Result<Vec<String>, VaultError> {
        let databases = match database {
            Some(name) => {
                validate_database_name(name)?;
                self.notify(Notice::BackupSingle { database: name });
                vec![name.to_string()]
            }
            None => {
                self.notify(Notice::BackupAll);
                self.list_databases().await?
            }
        };

        if databases.is_empty() {
            self.notify(Notice::NothingToBackup);
        }

        let mut uploaded = Vec::with_capacity(databases.len());
        for name in &databases {
            let dump = self.dump_database(name).await?;
            self.upload(&dump).await?;
            self.remove_local(&dump).await;

            let file = display_name(&dump);
            self.notify(Notice::BackupDone {
                database: name,
                file: &file,
            });
            uploaded.push(file);
        }

        tracing::info!(count = uploaded.len(), "Backup complete");
        Ok(uploaded)
    }

    /// Download, decompress and load one dump.
    pub async fn restore(&self, request: &RestoreRequest) -> Result<RestoreOutcome, VaultError> {
        let date = match &request.date {
            Some(raw) => parse_dump_date(raw)?,
            None => (self.clock)(),
        };
        validate_database_name(&request.database)?;
        let target = request
            .target_database
            .as_deref()
            .unwrap_or(&request.database);
        validate_database_name(target)?;

        let dump = format!("{}.{}", date.format(DATE_FORMAT), request.database);
        self.notify(Notice::RestoreStart {
            target,
            dump: &dump,
        });

        let object = dump_file_name(date, &request.database);
        let archive = self.download(&object).await?;
        let plain = self.decompress(&archive).await?;
        self.load(&plain, target).await?;
        self.remove_local(&plain).await;

        self.notify(Notice::RestoreDone {
            file: &display_name(&plain),
            target,
        });

        Ok(RestoreOutcome {
            object,
            target_database: target.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    /// Schemas not matching the exclusion pattern, as reported by the server.
    pub async fn list_databases(&self) -> Result<Vec<String>, VaultError> {
        let query = format!(
            "SHOW DATABASES WHERE `Database` NOT REGEXP '{}'",
            escape_sql_literal(&self.config.database.ignore_database_regex)
        );
        let cmd = ToolCommand::new(MYSQL)
            .args(mysql_login_args(&self.config.database))
            .args(["--batch", "-e"])
            .arg(query)
            .capture_stdout();

        let output = self
            .runner
            .run(&cmd)
            .await
            .map_err(|e| VaultError::ListDatabases { source: e.into() })?;
        if !output.success() {
            return Err(VaultError::ListDatabases {
                source: exit_failure(&output),
            });
        }

        let databases: Vec<String> = parse_batch_column(&output.stdout)
            .into_iter()
            .filter(|name| match validate_database_name(name) {
                Ok(()) => true,
                Err(err) => {
                    tracing::warn!(error = %err, "Skipping database");
                    false
                }
            })
            .collect();

        tracing::info!(count = databases.len(), "Listed databases");
        Ok(databases)
    }

    /// `mysqldump | gzip -9 > <dump_dir>/<today>.<database>.sql.gz`
    async fn dump_database(&self, database: &str) -> Result<PathBuf, VaultError> {
        let path = self
            .config
            .dump_dir
            .join(dump_file_name((self.clock)(), database));
        let fail = |source: StepFailure| VaultError::Dump {
            database: database.to_string(),
            source,
        };

        let dump = ToolCommand::new(MYSQLDUMP)
            .arg("--single-transaction")
            .args(mysql_login_args(&self.config.database))
            .arg(database)
            .args(ignore_table_args(&self.config.database, database));
        let compress = ToolCommand::new(GZIP).arg("-9").stdout_file(&path);

        tracing::info!(database, path = %path.display(), "Dumping database");
        let output = self
            .runner
            .run_piped(&dump, &compress)
            .await
            .map_err(|e| fail(e.into()))?;
        if let Some(failed) = output.first_failure() {
            return Err(fail(exit_failure(failed)));
        }
        ensure_file(&path).await.map_err(fail)?;

        Ok(path)
    }

    async fn upload(&self, path: &Path) -> Result<(), VaultError> {
        let fail = |source: StepFailure| VaultError::Upload {
            path: path.to_path_buf(),
            source,
        };

        let cmd = ToolCommand::new(S3CMD)
            .arg("-q")
            .args(s3_login_args(&self.config.storage))
            .arg("put")
            .arg(path.to_string_lossy())
            .arg(format!("s3://{}", self.config.storage.container));

        tracing::info!(path = %path.display(), container = %self.config.storage.container, "Uploading dump");
        let output = self.runner.run(&cmd).await.map_err(|e| fail(e.into()))?;
        if !output.success() {
            return Err(fail(exit_failure(&output)));
        }
        Ok(())
    }

    async fn download(&self, object: &str) -> Result<PathBuf, VaultError> {
        let path = self.config.dump_dir.join(object);
        let fail = |source: StepFailure| VaultError::Download {
            object: object.to_string(),
            source,
        };

        // `--force` lets a rerun overwrite an archive left by a failed run.
        let cmd = ToolCommand::new(S3CMD)
            .arg("-q")
            .args(s3_login_args(&self.config.storage))
            .args(["get", "--force"])
            .arg(format!("s3://{}/{object}", self.config.storage.container))
            .arg(path.to_string_lossy());

        tracing::info!(object, path = %path.display(), "Downloading dump");
        let output = self.runner.run(&cmd).await.map_err(|e| fail(e.into()))?;
        if !output.success() {
            return Err(fail(exit_failure(&output)));
        }
        ensure_file(&path).await.map_err(fail)?;

        Ok(path)
    }

    async fn decompress(&self, archive: &Path) -> Result<PathBuf, VaultError> {
        let fail = |source: StepFailure| VaultError::Decompress {
            path: archive.to_path_buf(),
            source,
        };
        let plain = decompressed_path(archive)
            .ok_or_else(|| fail(StepFailure::MissingOutput(archive.to_path_buf())))?;

        let cmd = ToolCommand::new(GZIP)
            .args(["-d", "-f"])
            .arg(archive.to_string_lossy());

        let output = self.runner.run(&cmd).await.map_err(|e| fail(e.into()))?;
        if !output.success() {
            return Err(fail(exit_failure(&output)));
        }
        ensure_file(&plain).await.map_err(fail)?;

        Ok(plain)
    }

    /// `mysql <target> < <file>`
    async fn load(&self, file: &Path, target: &str) -> Result<(), VaultError> {
        let fail = |source: StepFailure| VaultError::Load {
            database: target.to_string(),
            path: file.to_path_buf(),
            source,
        };

        let cmd = ToolCommand::new(MYSQL)
            .args(mysql_login_args(&self.config.database))
            .arg(target)
            .stdin_file(file);

        tracing::info!(database = target, path = %file.display(), "Loading dump");
        let output = self.runner.run(&cmd).await.map_err(|e| fail(e.into()))?;
        if !output.success() {
            return Err(fail(exit_failure(&output)));
        }
        Ok(())
    }

    /// Best-effort removal of a local dump file.
    async fn remove_local(&self, path: &Path) {
        if let Err(err) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %err, "Failed to remove local file");
        }
    }

    fn notify(&self, notice: Notice<'_>) {
        println!("{}", notice.render(self.config.lang));
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn exit_failure(output: &ToolOutput) -> StepFailure {
    StepFailure::ExitStatus {
        program: output.program.clone(),
        exit_code: output.exit_code,
        stderr: output.stderr.trim().to_string(),
    }
}

async fn ensure_file(path: &Path) -> Result<(), StepFailure> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(StepFailure::MissingOutput(path.to_path_buf())),
    }
}

/// Quote-escape a value for a single-quoted SQL string literal.
fn escape_sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Values of a single-column `mysql --batch` result, header line skipped.
fn parse_batch_column(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
