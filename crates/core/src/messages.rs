//! User-facing message catalogue.
//!
//! Everything printed for the operator goes through here so the output
//! language is chosen in one place. Diagnostic detail (stderr of failed
//! tools, I/O errors) is logged through `tracing` instead.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ValidationError, VaultError};

/// Output language, selected by `SQLVAULT_LANG`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    Ru,
    En,
}

impl Lang {
    /// Language from `SQLVAULT_LANG`, falling back to the default when the
    /// variable is unset or unrecognised. Used before configuration loads.
    pub fn from_env_or_default() -> Self {
        std::env::var("SQLVAULT_LANG")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ru" => Ok(Self::Ru),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language '{other}', expected 'ru' or 'en'")),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ru => "ru",
            Self::En => "en",
        })
    }
}

// ---------------------------------------------------------------------------
// Progress notices
// ---------------------------------------------------------------------------

/// Status lines printed while a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice<'a> {
    BackupAll,
    BackupSingle { database: &'a str },
    NothingToBackup,
    BackupDone { database: &'a str, file: &'a str },
    RestoreStart { target: &'a str, dump: &'a str },
    RestoreDone { file: &'a str, target: &'a str },
}

impl Notice<'_> {
    pub fn render(&self, lang: Lang) -> String {
        match (lang, *self) {
            (Lang::Ru, Self::BackupAll) => "Имя БД не передано. Будут экспортированы все БД с именами не совпадающими с паттерном из переменной окружения DB_IGNORE_DATABASE_REGEX".to_string(),
            (Lang::En, Self::BackupAll) => "No database name given. Exporting every database whose name does not match DB_IGNORE_DATABASE_REGEX".to_string(),

            (Lang::Ru, Self::BackupSingle { database }) => {
                format!("Указана БД '{database}'. Будет произведен экспорт только этой БД")
            }
            (Lang::En, Self::BackupSingle { database }) => {
                format!("Database '{database}' given. Only this database will be exported")
            }

            (Lang::Ru, Self::NothingToBackup) => "Нет баз данных для экспорта".to_string(),
            (Lang::En, Self::NothingToBackup) => "No databases to export".to_string(),

            (Lang::Ru, Self::BackupDone { database, file }) => format!(
                "Дамп базы данных '{database}' успешно выполнен в файл {file} и загружен в хранилище"
            ),
            (Lang::En, Self::BackupDone { database, file }) => format!(
                "Database '{database}' dumped to {file} and uploaded to storage"
            ),

            (Lang::Ru, Self::RestoreStart { target, dump }) => {
                format!("Будет произведено восстановление БД '{target}' из дампа '{dump}'")
            }
            (Lang::En, Self::RestoreStart { target, dump }) => {
                format!("Restoring database '{target}' from dump '{dump}'")
            }

            (Lang::Ru, Self::RestoreDone { file, target }) => {
                format!("Дамп '{file}' записан в базу данных '{target}'")
            }
            (Lang::En, Self::RestoreDone { file, target }) => {
                format!("Dump '{file}' loaded into database '{target}'")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Command-line usage errors
// ---------------------------------------------------------------------------

/// Malformed invocations detected while parsing arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    MissingCommand,
    UnknownCommand(String),
    MissingRestoreDatabase,
    /// Any other argument problem, already rendered by the parser.
    Other(String),
}

impl UsageError {
    pub fn render(&self, lang: Lang) -> String {
        match (lang, self) {
            (Lang::Ru, Self::MissingCommand) => {
                "Ошибка: требуется указать первый аргумент 'restore' или 'backup'".to_string()
            }
            (Lang::En, Self::MissingCommand) => {
                "Error: the first argument must be 'restore' or 'backup'".to_string()
            }
            (Lang::Ru, Self::UnknownCommand(arg)) => format!(
                "Ошибка: недопустимый аргумент '{arg}'. Возможные значения: 'restore' или 'backup'"
            ),
            (Lang::En, Self::UnknownCommand(arg)) => format!(
                "Error: invalid argument '{arg}'. Expected 'restore' or 'backup'"
            ),
            (Lang::Ru, Self::MissingRestoreDatabase) => {
                "Ошибка: для операции 'restore' требуется передать имя БД вторым аргументом"
                    .to_string()
            }
            (Lang::En, Self::MissingRestoreDatabase) => {
                "Error: 'restore' requires a database name as the second argument".to_string()
            }
            (Lang::Ru, Self::Other(detail)) => format!("Ошибка: {detail}"),
            (Lang::En, Self::Other(detail)) => format!("Error: {detail}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run failures
// ---------------------------------------------------------------------------

/// Operator-facing text for a failed run.
pub fn render_error(lang: Lang, err: &VaultError) -> String {
    match lang {
        Lang::Ru => render_error_ru(err),
        Lang::En => render_error_en(err),
    }
}

fn render_error_ru(err: &VaultError) -> String {
    match err {
        VaultError::Config(ConfigError::Missing(var)) => {
            format!("Ошибка: не задана обязательная переменная окружения {var}")
        }
        VaultError::Config(ConfigError::Invalid { var, reason }) => {
            format!("Ошибка: недопустимое значение переменной окружения {var}: {reason}")
        }
        VaultError::Validation(ValidationError::InvalidDate(date)) => {
            format!("Ошибка: '{date}' не является допустимой датой в формате YYYY-MM-DD")
        }
        VaultError::Validation(ValidationError::InvalidDatabaseName { name, .. }) => {
            format!("Ошибка: '{name}' не является допустимым именем БД")
        }
        VaultError::ListDatabases { .. } => {
            "Ошибка: не удалось получить список баз данных".to_string()
        }
        VaultError::Dump { database, .. } => {
            format!("Ошибка: не удалось выполнить дамп БД '{database}'")
        }
        VaultError::Upload { path, .. } => format!(
            "Ошибка: не удалось загрузить файл '{}' в хранилище",
            crate::naming::display_name(path)
        ),
        VaultError::Download { object, .. } => {
            format!("Ошибка: не удалось скачать файл '{object}' из хранилища")
        }
        VaultError::Decompress { .. } => "Ошибка: не удалось распаковать архив".to_string(),
        VaultError::Load { database, path, .. } => format!(
            "Ошибка: не удалось восстановить базу данных '{database}' из {}",
            path.display()
        ),
    }
}

fn render_error_en(err: &VaultError) -> String {
    match err {
        VaultError::Config(ConfigError::Missing(var)) => {
            format!("Error: required environment variable {var} is not set")
        }
        VaultError::Config(ConfigError::Invalid { var, reason }) => {
            format!("Error: invalid value of environment variable {var}: {reason}")
        }
        VaultError::Validation(ValidationError::InvalidDate(date)) => {
            format!("Error: '{date}' is not a valid date in YYYY-MM-DD format")
        }
        VaultError::Validation(ValidationError::InvalidDatabaseName { name, reason }) => {
            format!("Error: '{name}' is not a valid database name ({reason})")
        }
        VaultError::ListDatabases { .. } => "Error: failed to list databases".to_string(),
        VaultError::Dump { database, .. } => {
            format!("Error: failed to dump database '{database}'")
        }
        VaultError::Upload { path, .. } => format!(
            "Error: failed to upload file '{}' to storage",
            crate::naming::display_name(path)
        ),
        VaultError::Download { object, .. } => {
            format!("Error: failed to download file '{object}' from storage")
        }
        VaultError::Decompress { .. } => "Error: failed to decompress the archive".to_string(),
        VaultError::Load { database, path, .. } => format!(
            "Error: failed to restore database '{database}' from {}",
            path.display()
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::error::StepFailure;

    #[test]
    fn lang_parsing() {
        assert_eq!("ru".parse::<Lang>(), Ok(Lang::Ru));
        assert_eq!(" EN ".parse::<Lang>(), Ok(Lang::En));
        assert!("de".parse::<Lang>().is_err());
        assert_eq!(Lang::default(), Lang::Ru);
    }

    #[test]
    fn notices_embed_names() {
        let notice = Notice::BackupDone {
            database: "shop",
            file: "2024-01-01.shop.sql.gz",
        };
        assert_eq!(
            notice.render(Lang::Ru),
            "Дамп базы данных 'shop' успешно выполнен в файл 2024-01-01.shop.sql.gz и загружен в хранилище"
        );
        assert_eq!(
            notice.render(Lang::En),
            "Database 'shop' dumped to 2024-01-01.shop.sql.gz and uploaded to storage"
        );
    }

    #[test]
    fn usage_errors() {
        assert_eq!(
            UsageError::UnknownCommand("dump".to_string()).render(Lang::Ru),
            "Ошибка: недопустимый аргумент 'dump'. Возможные значения: 'restore' или 'backup'"
        );
        assert_eq!(
            UsageError::MissingCommand.render(Lang::En),
            "Error: the first argument must be 'restore' or 'backup'"
        );
    }

    #[test]
    fn upload_error_shows_bare_file_name() {
        let err = VaultError::Upload {
            path: PathBuf::from("/tmp/2024-01-01.shop.sql.gz"),
            source: StepFailure::MissingOutput(PathBuf::from("/tmp/x")),
        };
        assert_eq!(
            render_error(Lang::Ru, &err),
            "Ошибка: не удалось загрузить файл '2024-01-01.shop.sql.gz' в хранилище"
        );
    }

    #[test]
    fn invalid_date_error() {
        let err = VaultError::from(ValidationError::InvalidDate("01.01.2024".to_string()));
        assert_eq!(
            render_error(Lang::En, &err),
            "Error: '01.01.2024' is not a valid date in YYYY-MM-DD format"
        );
    }
}
