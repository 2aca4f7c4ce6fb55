// ABOUTME: Utility functions for the present-tex application
// ABOUTME: Path resolution for image destinations and file validation for the command line

use crate::errors::{Result, TexError};
use log::info;
use std::path::{Path, PathBuf};

/// Resolve an image destination against an optional base directory.
///
/// Absolute destinations and destinations without a base are returned as-is.
pub fn resolve_relative(base_dir: Option<&Path>, destination: &str) -> PathBuf {
    let path = Path::new(destination);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// Validate that a file exists
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(TexError::PathNotFoundError(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(TexError::ValidationError(format!(
            "Path is not a file: {:?}",
            path
        )));
    }
    Ok(())
}

/// Write rendered output, creating the parent directory if necessary
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    info!("Writing LaTeX to file: {:?}", path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(TexError::FileReadError)?;
        } else if parent.exists() && !parent.is_dir() {
            return Err(TexError::ValidationError(format!(
                "Path exists but is not a directory: {:?}",
                parent
            )));
        }
    }

    std::fs::write(path, contents).map_err(TexError::FileReadError)
}
