//! Session lifecycle: the current identity, its bearer token, and the
//! background cycle that keeps the token fresh.
//!
//! A [`SessionManager`] is cheap to clone and meant to be handed to every
//! component that needs credentials. A refresh failure ends the session it
//! was made for: the user is cleared, the cycle stops, and the navigator is
//! sent to the login view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::AuthError;
use crate::model::{Credentials, Role, UserInfo};
use crate::traits::{
    AuthBackend, LogNotifier, MemorySessionStore, Navigator, NoopNavigator, Notification,
    Notifier, SessionStore,
};

/// Timing configuration for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Period of the background refresh cycle.
    pub refresh_interval: Duration,
    /// Upper bound on a single login or refresh request.
    pub request_timeout: Duration,
    /// How long an error notification stays visible.
    pub notification_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(5 * 60),
            request_timeout: Duration::from_secs(10),
            notification_ttl: Duration::from_secs(5),
        }
    }
}

/// Whether a user is currently signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    Active,
}

/// What a call to [`SessionManager::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No user was signed in, or the session changed before the answer
    /// arrived and the answer was dropped.
    Skipped,
    /// Another refresh was already in flight, nothing was sent.
    Coalesced,
    /// The token was replaced.
    Refreshed,
    /// The refresh failed and the session was ended.
    LoggedOut,
}

/// Cancellation handle of a running refresh cycle.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Builder for [`SessionManager`]. Collaborators default to no-op navigation,
/// in-memory storage, and log-only notifications.
pub struct SessionManagerBuilder {
    backend: Arc<dyn AuthBackend>,
    navigator: Arc<dyn Navigator>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
}

impl SessionManagerBuilder {
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the manager, restoring any identity the store still holds.
    pub fn build(self) -> SessionManager {
        let restored = self.store.load();
        if let Some(user) = &restored {
            tracing::debug!(username = %user.username, "restored session");
        }
        let (user, _) = watch::channel(restored);

        SessionManager {
            inner: Arc::new(Inner {
                backend: self.backend,
                navigator: self.navigator,
                store: self.store,
                notifier: self.notifier,
                config: self.config,
                user,
                in_flight: tokio::sync::Mutex::new(()),
                schedule: Mutex::new(None),
                next_notification: AtomicU64::new(1),
            }),
        }
    }
}

/// Owns the current user and keeps their token alive.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    backend: Arc<dyn AuthBackend>,
    navigator: Arc<dyn Navigator>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
    user: watch::Sender<Option<UserInfo>>,
    in_flight: tokio::sync::Mutex<()>,
    schedule: Mutex<Option<RefreshHandle>>,
    next_notification: AtomicU64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.schedule.get_mut().ok().and_then(Option::take) {
            handle.cancel();
        }
    }
}

impl SessionManager {
    /// A manager with default collaborators and timing.
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self::builder(backend).build()
    }

    pub fn builder(backend: Arc<dyn AuthBackend>) -> SessionManagerBuilder {
        SessionManagerBuilder {
            backend,
            navigator: Arc::new(NoopNavigator),
            store: Arc::new(MemorySessionStore::new()),
            notifier: Arc::new(LogNotifier),
            config: SessionConfig::default(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Snapshot of the signed-in user.
    pub fn current_user(&self) -> Option<UserInfo> {
        self.inner.user.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        if self.inner.user.borrow().is_some() {
            SessionState::Active
        } else {
            SessionState::LoggedOut
        }
    }

    /// Receiver that observes every replacement of the user snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserInfo>> {
        self.inner.user.subscribe()
    }

    /// `Authorization` header value for protected requests.
    pub fn bearer_header(&self) -> Option<String> {
        self.inner
            .user
            .borrow()
            .as_ref()
            .map(|u| format!("Bearer {}", u.token))
    }

    /// Whether the signed-in user holds one of `allowed`.
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        self.inner
            .user
            .borrow()
            .as_ref()
            .is_some_and(|u| allowed.contains(&u.role))
    }

    /// Sign in and start the refresh cycle.
    ///
    /// A failure is shown through the notifier and returned; the session
    /// state is left untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserInfo, AuthError> {
        let timeout = self.inner.config.request_timeout;
        let result = tokio::time::timeout(timeout, self.inner.backend.login(credentials))
            .await
            .unwrap_or(Err(AuthError::timeout(timeout)));

        match result {
            Ok(user) => {
                tracing::info!(username = %user.username, role = %user.role, "logged in");
                self.inner.store.save(&user);
                self.inner.user.send_replace(Some(user.clone()));
                self.start_auto_refresh();
                Ok(user)
            }
            Err(e) => {
                self.report_error("Login failed", e.to_string());
                Err(e)
            }
        }
    }

    /// End the session on request. Unlike a failed refresh this does not
    /// redirect; the caller already knows.
    pub fn logout(&self) {
        self.cancel_auto_refresh();
        self.inner.user.send_replace(None);
        self.inner.store.clear();
        tracing::info!("logged out");
    }

    /// Stop background work, keeping the stored identity.
    pub fn shutdown(&self) {
        self.cancel_auto_refresh();
    }

    /// Renew the token once.
    ///
    /// Failures never surface as errors: they end the session and redirect
    /// to login. A call made while another refresh is in flight returns
    /// [`RefreshOutcome::Coalesced`] without sending anything.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Ok(_guard) = self.inner.in_flight.try_lock() else {
            tracing::debug!("token refresh already in flight");
            return RefreshOutcome::Coalesced;
        };
        let Some(user) = self.current_user() else {
            return RefreshOutcome::Skipped;
        };

        let timeout = self.inner.config.request_timeout;
        let result = tokio::time::timeout(timeout, self.inner.backend.refresh(&user.token))
            .await
            .unwrap_or(Err(AuthError::timeout(timeout)))
            .and_then(|token| {
                let token = token.trim().to_string();
                if token.is_empty() {
                    Err(AuthError::InvalidResponse("empty token".into()))
                } else {
                    Ok(token)
                }
            });

        match result {
            Ok(token) => {
                let renewed = user.with_token(token);
                // Only replace the identity the request was made for; a logout
                // or re-login while the request was out wins.
                let replaced = self.inner.user.send_if_modified(|current| {
                    if current.as_ref() == Some(&user) {
                        *current = Some(renewed.clone());
                        true
                    } else {
                        false
                    }
                });
                if !replaced {
                    tracing::debug!("session changed during refresh, discarding token");
                    return RefreshOutcome::Skipped;
                }
                self.inner.store.save(&renewed);
                tracing::info!(username = %renewed.username, "token refreshed");
                RefreshOutcome::Refreshed
            }
            Err(e) => {
                if !self.invalidate(&user) {
                    tracing::debug!(error = %e, "session changed during refresh, ignoring failure");
                    return RefreshOutcome::Skipped;
                }
                tracing::warn!(error = %e, username = %user.username, "token refresh failed, ending session");
                RefreshOutcome::LoggedOut
            }
        }
    }

    /// Refresh now and then every `refresh_interval`, replacing any cycle
    /// already running. The cycle ends by itself once a refresh logs out.
    ///
    /// Outside a tokio runtime no cycle is started and a warning is logged.
    pub fn start_auto_refresh(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime, token refresh cycle not started");
            return;
        };
        let mut schedule = match self.inner.schedule.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = schedule.take() {
            previous.cancel();
        }

        let period = self.inner.config.refresh_interval.max(Duration::from_millis(1));
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let manager = SessionManager { inner };
                if manager.refresh().await == RefreshOutcome::LoggedOut {
                    break;
                }
            }
        });

        tracing::debug!(period_secs = period.as_secs(), "refresh cycle started");
        *schedule = Some(RefreshHandle { task });
    }

    pub fn is_auto_refresh_active(&self) -> bool {
        self.inner
            .schedule
            .lock()
            .map(|s| s.as_ref().is_some_and(RefreshHandle::is_active))
            .unwrap_or(false)
    }

    /// Show a transient error notice, dismissed after `notification_ttl`.
    pub fn report_error(&self, error: impl Into<String>, reason: impl Into<String>) {
        let notification = Notification {
            id: self.inner.next_notification.fetch_add(1, Ordering::Relaxed),
            error: error.into(),
            reason: reason.into(),
            visible_for: self.inner.config.notification_ttl,
        };
        self.inner.notifier.show(&notification);

        let id = notification.id;
        let ttl = notification.visible_for;
        let notifier = Arc::clone(&self.inner.notifier);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    notifier.dismiss(id);
                });
            }
            Err(_) => tracing::warn!(id, "no async runtime, notification will not auto-dismiss"),
        }
    }

    fn cancel_auto_refresh(&self) {
        let handle = match self.inner.schedule.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.cancel();
            tracing::debug!("refresh cycle cancelled");
        }
    }

    /// End the session of `expected` and redirect once. Returns false, and
    /// changes nothing, when another identity (or none) is signed in.
    fn invalidate(&self, expected: &UserInfo) -> bool {
        let cleared = self.inner.user.send_if_modified(|current| {
            if current.as_ref() == Some(expected) {
                *current = None;
                true
            } else {
                false
            }
        });
        if !cleared {
            return false;
        }
        self.inner.store.clear();
        self.cancel_auto_refresh();
        self.inner.navigator.redirect_to_login();
        true
    }
}
