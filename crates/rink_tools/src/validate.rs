//! Rule config validation.

use std::path::{Path, PathBuf};

use rink_core::config::RuleConfig;

use crate::error::{Result, ToolError};

/// Outcome for one config file.
#[derive(Debug)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// Parse or validation error, if any.
    pub error: Option<String>,
}

/// Validate one config file.
#[must_use]
pub fn validate_file(path: &Path) -> FileReport {
    let error = RuleConfig::load(path).err().map(|e| e.to_string());
    match &error {
        None => tracing::info!(path = %path.display(), "Config valid"),
        Some(message) => tracing::warn!(path = %path.display(), %message, "Config invalid"),
    }
    FileReport {
        path: path.to_path_buf(),
        error,
    }
}

/// Validate a config file, or every `.ron` file in a directory.
///
/// # Errors
///
/// Returns [`ToolError::ValidationFailed`] if any file is rejected, and
/// [`ToolError::NotFound`] if `path` does not exist.
pub fn validate_path(path: &Path) -> Result<Vec<FileReport>> {
    if !path.exists() {
        return Err(ToolError::NotFound(path.to_path_buf()));
    }

    let files = if path.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let reports: Vec<FileReport> = files.iter().map(|p| validate_file(p)).collect();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        return Err(ToolError::ValidationFailed {
            checked: reports.len(),
            failed,
        });
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.ron");
        std::fs::write(&path, RuleConfig::default().to_ron_string().unwrap()).unwrap();

        let reports = validate_path(&path).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].error.is_none());
    }

    #[test]
    fn test_directory_with_bad_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ron"), "(possession: (max_tipped_ms: 50))").unwrap();
        std::fs::write(
            dir.path().join("b.ron"),
            "(possession: (min_possession_ms: 800, max_possession_ms: 700))",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        match validate_path(dir.path()) {
            Err(ToolError::ValidationFailed { checked, failed }) => {
                assert_eq!(checked, 2);
                assert_eq!(failed, 1);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_path() {
        assert!(matches!(
            validate_path(Path::new("/definitely/not/here.ron")),
            Err(ToolError::NotFound(_))
        ));
    }
}
