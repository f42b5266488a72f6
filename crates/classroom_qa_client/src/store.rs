//! Persisted pointer to the student's current session.
//!
//! The pointer survives restarts for one identity and is cleared on logout,
//! on leave and when the session ends.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::model::{Session, UserId};

/// Current-session pointer, one slot per identity.
pub trait SessionStore: Send + Sync {
    fn get(&self, user: &UserId) -> Result<Option<Session>, StoreError>;
    fn set(&self, user: &UserId, session: &Session) -> Result<(), StoreError>;
    fn clear(&self, user: &UserId) -> Result<(), StoreError>;
}

/// Keeps the pointers for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: Mutex<HashMap<UserId, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // map updates are single calls, so a poisoned map is still consistent
    fn slots(&self) -> MutexGuard<'_, HashMap<UserId, Session>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, user: &UserId) -> Result<Option<Session>, StoreError> {
        Ok(self.slots().get(user).cloned())
    }

    fn set(&self, user: &UserId, session: &Session) -> Result<(), StoreError> {
        self.slots().insert(user.clone(), session.clone());
        Ok(())
    }

    fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        self.slots().remove(user);
        Ok(())
    }
}

/// One JSON file per identity under a state directory.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    state_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// `<state_dir>/current-session-<user>.json`
    pub fn path_for(&self, user: &UserId) -> PathBuf {
        let safe: String = user
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.state_dir.join(format!("current-session-{}.json", safe))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, user: &UserId) -> Result<Option<Session>, StoreError> {
        let contents = match std::fs::read_to_string(self.path_for(user)) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn set(&self, user: &UserId, session: &Session) -> Result<(), StoreError> {
        if !self.state_dir.exists() {
            std::fs::create_dir_all(&self.state_dir)?;
        }
        let contents = serde_json::to_string(session)?;
        std::fs::write(self.path_for(user), contents)?;
        Ok(())
    }

    fn clear(&self, user: &UserId) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(user)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
