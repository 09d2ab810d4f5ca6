// ABOUTME: Filesystem helpers for deckhand
// ABOUTME: Path validation and reading of input files with typed errors

use crate::errors::{DeckError, Result};
use std::path::Path;

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(DeckError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Validate that a directory exists
pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(DeckError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Path is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(DeckError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Create the parent directory of an output file if needed
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_directory_exists(parent),
        _ => Ok(()),
    }
}

/// Read a UTF-8 input file after checking it exists
pub fn read_text_file(path: &Path) -> Result<String> {
    validate_file_exists(path)?;
    Ok(std::fs::read_to_string(path)?)
}

/// Read a binary input file after checking it exists
pub fn read_binary_file(path: &Path) -> Result<Vec<u8>> {
    validate_file_exists(path)?;
    Ok(std::fs::read(path)?)
}
