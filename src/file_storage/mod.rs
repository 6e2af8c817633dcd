//! File-based storage for client state
//!
//! Everything lives under a single state directory (`~/.model-advisor/` by default):
//! - `session.json` - the persisted session identity
//! - `config.toml` - optional user configuration
//!
//! Writes go through a temp file and a rename so a crash never leaves a
//! half-written JSON document behind.

use crate::utils::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};

/// Common file operations result type
pub type FileResult<T> = Result<T, String>;

/// Get the default state directory in the user's home
pub fn get_state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".model-advisor")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> FileResult<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(&format!("Failed to create directory {:?}", path))?;
    }
    Ok(())
}

/// Write data to a file atomically (temp file + rename)
pub fn atomic_write(path: &Path, content: &str) -> FileResult<()> {
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    fs::write(&temp_path, content)
        .with_context(&format!("Failed to write temp file {:?}", temp_path))?;

    fs::rename(&temp_path, path)
        .map_err(|e| format!("Failed to rename {:?} to {:?}: {}", temp_path, path, e))?;

    Ok(())
}

/// Read a JSON file and deserialize it
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> FileResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file {:?}: {}", path, e))?;

    serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse JSON from {:?}: {}", path, e))
}

/// Write data as pretty-printed JSON atomically
pub fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> FileResult<()> {
    let content = serde_json::to_string_pretty(data).with_context("Failed to serialize to JSON")?;

    atomic_write(path, &content)
}

/// Delete a file; a missing file counts as success
pub fn remove_file_if_exists(path: &Path) -> FileResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("Failed to remove file {:?}: {}", path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_state_dir_name() {
        assert!(get_state_dir().ends_with(".model-advisor"));
    }

    #[test]
    fn test_ensure_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b");

        assert!(!nested_path.exists());
        ensure_dir(&nested_path).unwrap();
        assert!(nested_path.exists());
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("state").join("session.json");

        atomic_write(&file_path, "{}").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
        assert!(!file_path.with_extension("tmp").exists());
    }

    #[test]
    fn test_read_write_json() {
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Stored {
            email: String,
        }

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("stored.json");
        let data = Stored {
            email: "ada@example.com".to_string(),
        };

        write_json(&file_path, &data).unwrap();
        let read_back: Stored = read_json(&file_path).unwrap();
        assert_eq!(data, read_back);
    }

    #[test]
    fn test_read_json_reports_parse_failure() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("broken.json");
        fs::write(&file_path, "not json").unwrap();

        let err = read_json::<serde_json::Value>(&file_path).unwrap_err();
        assert!(err.contains("Failed to parse JSON"));
    }

    #[test]
    fn test_remove_file_if_exists() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("gone.json");

        remove_file_if_exists(&file_path).unwrap();
        fs::write(&file_path, "{}").unwrap();
        remove_file_if_exists(&file_path).unwrap();
        assert!(!file_path.exists());
    }
}
