//! Log file naming, lookup and listing.
//!
//! Sequential naming scans the directory for the lowest free index. The scan
//! is not atomic, so two writers sharing a directory should use
//! [`unique_log_path`] instead.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const DEFAULT_LOG_DIR: &str = "serial_logs";
pub const DEFAULT_LOG_PREFIX: &str = "test";
pub const DEFAULT_LOG_EXTENSION: &str = "csv";

#[derive(Debug, Error)]
pub enum LogFileError {
    #[error("log file '{}' not found", .0.display())]
    NotFound(PathBuf),
    #[error("no free log file name left in '{}'", .0.display())]
    NamesExhausted(PathBuf),
    #[error("log file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFileEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Lowest unused `<prefix><n>.<extension>` in `dir`, counting from 1.
///
/// Creates `dir` when it does not exist yet.
pub fn next_sequential_log_path(
    dir: &Path,
    prefix: &str,
    extension: &str,
) -> Result<PathBuf, LogFileError> {
    fs::create_dir_all(dir)?;
    (1..=u32::MAX)
        .map(|n| dir.join(format!("{}{}.{}", prefix, n, extension)))
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| LogFileError::NamesExhausted(dir.to_path_buf()))
}

/// `<prefix>_<unix millis>_<random hex>.<extension>` in `dir`.
pub fn unique_log_path(dir: &Path, prefix: &str, extension: &str) -> Result<PathBuf, LogFileError> {
    fs::create_dir_all(dir)?;
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let suffix: u32 = rand::thread_rng().gen();
    Ok(dir.join(format!("{}_{}_{:08x}.{}", prefix, millis, suffix, extension)))
}

/// Finds a log given either a path or a bare name inside `log_dir`.
pub fn resolve_log_path(input: &Path, log_dir: &Path) -> Result<PathBuf, LogFileError> {
    if input.is_file() {
        return Ok(input.to_path_buf());
    }
    let in_log_dir = log_dir.join(input);
    if in_log_dir.is_file() {
        return Ok(in_log_dir);
    }
    Err(LogFileError::NotFound(input.to_path_buf()))
}

/// Log files in `dir` with the given extension, sorted by name.
///
/// A missing directory yields an empty list.
pub fn list_log_files(dir: &Path, extension: &str) -> Result<Vec<LogFileEntry>, LogFileError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path.extension().is_some_and(|ext| ext == extension);
        if matches && path.is_file() {
            entries.push(LogFileEntry {
                size_bytes: entry.metadata()?.len(),
                path,
            });
        }
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}
