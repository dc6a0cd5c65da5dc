//! Session store persisted as a JSON file, so the CLI keeps its identity
//! between invocations.

use std::path::{Path, PathBuf};

use quizkit_core::model::UserInfo;
use quizkit_core::traits::SessionStore;

/// [`SessionStore`] backed by a single JSON file.
///
/// I/O failures are logged and treated as "no session"; the session manager
/// never sees them.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<UserInfo> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("failed to read session file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("ignoring corrupt session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, user: &UserInfo) {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("failed to create {}: {}", parent.display(), e);
                return;
            }
        }

        let result = serde_json::to_string_pretty(user)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.path, json));
        if let Err(e) = result {
            tracing::warn!("failed to write session file {}: {}", self.path.display(), e);
        }
    }

    fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!("failed to remove session file {}: {}", self.path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizkit_core::model::Role;

    fn user() -> UserInfo {
        UserInfo {
            username: "anna".into(),
            name: "Anna".into(),
            role: Role::Student,
            token: "jwt".into(),
        }
    }

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));
        assert!(store.load().is_none());

        store.save(&user());
        assert_eq!(store.load(), Some(user()));

        store.clear();
        assert!(store.load().is_none());
        assert!(!store.path().exists());

        // Clearing twice is fine.
        store.clear();
    }

    #[test]
    fn corrupt_file_reads_as_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(FileSessionStore::new(path).load().is_none());
    }
}
