//! Opaque session identifiers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const SESSION_FILE: &str = "session";

/// Identifies one migration workspace. Every store call is scoped by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the session id stored in `data_dir`, creating one on first use.
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SESSION_FILE);
        if let Ok(existing) = std::fs::read_to_string(&path) {
            let existing = existing.trim();
            if !existing.is_empty() {
                return Ok(Self(existing.to_string()));
            }
        }

        let session = Self::new();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        std::fs::write(&path, session.as_str())
            .with_context(|| format!("failed to write session file: {}", path.display()))?;
        Ok(session)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_eq!(SessionId::new().as_str().len(), 36);
    }

    #[test]
    fn test_load_or_create_persists() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("relink");
        let first = SessionId::load_or_create(&data_dir).unwrap();
        let second = SessionId::load_or_create(&data_dir).unwrap();
        assert_eq!(first, second);
        assert!(data_dir.join("session").exists());
    }
}
