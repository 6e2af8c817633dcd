// Durable storage of the session identity across client restarts

use crate::file_storage::{read_json, remove_file_if_exists, write_json, FileResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredIdentity {
    email: String,
}

/// One-entry key-value store holding the current identity
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted identity; a missing file or blank identity is `None`
    pub fn load(&self) -> FileResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let stored: StoredIdentity = read_json(&self.path)?;
        let identity = stored.email.trim();
        if identity.is_empty() {
            Ok(None)
        } else {
            Ok(Some(identity.to_string()))
        }
    }

    pub fn save(&self, identity: &str) -> FileResult<()> {
        write_json(
            &self.path,
            &StoredIdentity {
                email: identity.to_string(),
            },
        )
    }

    pub fn clear(&self) -> FileResult<()> {
        remove_file_if_exists(&self.path)
    }
}
