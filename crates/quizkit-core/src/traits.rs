//! Collaborator traits for the session manager.
//!
//! [`AuthBackend`] is implemented over HTTP by `quizkit-client`; the other
//! traits are the seams to whatever hosts the session (router, storage,
//! notification area).

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::AuthError;
use crate::model::{Credentials, UserInfo};

// ---------------------------------------------------------------------------
// Auth backend
// ---------------------------------------------------------------------------

/// The token endpoints of the gateway.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for an identity carrying a fresh token.
    async fn login(&self, credentials: &Credentials) -> Result<UserInfo, AuthError>;

    /// Exchange a still-valid token for a new one.
    async fn refresh(&self, token: &str) -> Result<String, AuthError>;
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// The routing layer, told where to go when the session ends.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Navigator that ignores redirects.
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self) {}
}

// ---------------------------------------------------------------------------
// Session persistence
// ---------------------------------------------------------------------------

/// Storage scoped to the lifetime of one browser (or process) session.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Option<UserInfo>;
    fn save(&self, user: &UserInfo);
    fn clear(&self);
}

/// In-memory session store.
#[derive(Default)]
pub struct MemorySessionStore {
    user: Mutex<Option<UserInfo>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: UserInfo) -> Self {
        Self {
            user: Mutex::new(Some(user)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<UserInfo> {
        self.user.lock().map(|u| u.clone()).unwrap_or(None)
    }

    fn save(&self, user: &UserInfo) {
        if let Ok(mut slot) = self.user.lock() {
            *slot = Some(user.clone());
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.user.lock() {
            *slot = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A transient error notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub error: String,
    pub reason: String,
    /// How long the notice stays visible before it is dismissed.
    pub visible_for: Duration,
}

/// Where error notices are shown.
pub trait Notifier: Send + Sync {
    fn show(&self, notification: &Notification);
    fn dismiss(&self, id: u64);
}

/// Notifier that only logs.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notification: &Notification) {
        tracing::warn!(
            id = notification.id,
            reason = %notification.reason,
            "{}",
            notification.error
        );
    }

    fn dismiss(&self, _: u64) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        assert!(store.load().is_none());

        let user = UserInfo {
            username: "mmm".into(),
            name: "Max".into(),
            role: Role::Teacher,
            token: "t1".into(),
        };
        store.save(&user);
        assert_eq!(store.load(), Some(user));

        store.clear();
        assert!(store.load().is_none());
    }
}
