// ABOUTME: Utility functions for the bibslide application
// ABOUTME: Path validation, atomic file output and markup escaping

use crate::errors::{Result, SlideError};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SlideError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(SlideError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    } else if !path.is_dir() {
        return Err(SlideError::ValidationError(format!(
            "Path exists but is not a directory: {:?}",
            path
        )));
    }
    Ok(())
}

/// Ensure a file's parent directory exists
pub fn ensure_parent_directory_exists(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_directory_exists(parent)?;
        }
    }
    Ok(())
}

/// Get the absolute path
pub fn get_absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| {
        SlideError::ValidationError(format!("Failed to get absolute path for {:?}: {}", path, e))
    })
}

/// `{dir}/{stem}.{extension}`
pub fn output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", stem, extension))
}

/// Write a file so that readers see either the complete content or nothing.
///
/// Content goes to a uniquely named sibling first and is renamed into place.
pub fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_directory_exists(path)?;

    let temp_path = temp_sibling(path);
    debug!("Writing {} bytes to {:?}", content.len(), temp_path);

    if let Err(e) = fs::write(&temp_path, content) {
        remove_quietly(&temp_path);
        return Err(SlideError::FileError(e));
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        remove_quietly(&temp_path);
        return Err(SlideError::FileError(e));
    }
    Ok(())
}

/// A uniquely named `.tmp` path next to `path`
pub fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4()))
}

pub fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to clean up temporary file {:?}: {}", path, e);
        }
    }
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}
