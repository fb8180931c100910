use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("unsafe result file name: {0:?}")]
    UnsafeName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Accepts a result object name as a local file name only if it stays inside
/// the output directory and is valid on Windows as well.
pub fn safe_file_name(name: &str) -> Result<&str, PersistError> {
    let trimmed = name.trim();
    let unsafe_name = trimmed.is_empty()
        || trimmed != name
        || name.chars().any(is_forbidden)
        || name.ends_with('.')
        || is_reserved_windows_name(name);
    if unsafe_name {
        return Err(PersistError::UnsafeName(name.to_string()));
    }
    Ok(name)
}

/// Atomically writes the fetched script to `{dir}/{result_name}`: temp file in
/// the same directory, then rename over any previous copy.
pub fn save_result(dir: &Path, result_name: &str, payload: &str) -> Result<PathBuf, PersistError> {
    let file_name = safe_file_name(result_name)?;
    ensure_output_dir(dir)?;

    let target = dir.join(file_name);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(payload.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
    Ok(target)
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}
