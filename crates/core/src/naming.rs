//! Dump dates, database names and dump file naming.
//!
//! Dump files are named `<YYYY-MM-DD>.<database>.sql.gz`; the same string is
//! used as the object key in the storage container.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// `chrono` format of the date component in dump names.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Suffix of a compressed dump.
pub const DUMP_SUFFIX: &str = ".sql.gz";

/// Suffix appended by gzip, stripped on decompression.
pub const GZIP_SUFFIX: &str = ".gz";

/// Strict shape check; `chrono` alone would accept `2024-1-1`.
static DATE_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// The current local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` string into a real calendar date.
pub fn parse_dump_date(input: &str) -> Result<NaiveDate, ValidationError> {
    if !DATE_SHAPE_RE.is_match(input) {
        return Err(ValidationError::InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(input.to_string()))
}

// ---------------------------------------------------------------------------
// Database names
// ---------------------------------------------------------------------------

/// Reject names that would be read as tool options or escape the dump
/// directory once embedded in a file path.
pub fn validate_database_name(name: &str) -> Result<(), ValidationError> {
    let reason = if name.is_empty() {
        Some("name must not be empty")
    } else if name.starts_with('-') {
        Some("name must not start with '-'")
    } else if name.contains('/') || name.contains('\0') {
        Some("name must not contain '/' or NUL")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ValidationError::InvalidDatabaseName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// File names
// ---------------------------------------------------------------------------

/// Object key (and local file name) of the dump of `database` taken on `date`.
pub fn dump_file_name(date: NaiveDate, database: &str) -> String {
    format!("{}.{database}{DUMP_SUFFIX}", date.format(DATE_FORMAT))
}

/// Path of the decompressed sibling of a `.gz` file.
pub fn decompressed_path(archive: &Path) -> Option<PathBuf> {
    archive
        .to_str()
        .and_then(|s| s.strip_suffix(GZIP_SUFFIX))
        .map(PathBuf::from)
}

/// The bare file name of `path`, for user-facing messages.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
