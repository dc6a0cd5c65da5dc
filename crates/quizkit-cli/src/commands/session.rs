//! Session commands: `login`, `refresh`, `keepalive`, `whoami`, `logout`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use quizkit_client::{FileSessionStore, HttpAuthBackend, QuizkitConfig};
use quizkit_core::model::Credentials;
use quizkit_core::session::{RefreshOutcome, SessionManager};
use quizkit_core::traits::{Navigator, Notification, Notifier};

/// There is no login view to route to; tell the user what to run instead.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect_to_login(&self) {
        eprintln!("Session ended. Run `quizkit login` to sign in again.");
    }
}

struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show(&self, notification: &Notification) {
        eprintln!("{}: {}", notification.error, notification.reason);
    }

    fn dismiss(&self, _: u64) {}
}

fn build_manager(config: &QuizkitConfig) -> Result<SessionManager> {
    let backend = HttpAuthBackend::new(&config.base_url, config.request_timeout())
        .with_context(|| format!("invalid gateway URL: {}", config.base_url))?;

    Ok(SessionManager::builder(Arc::new(backend))
        .navigator(Arc::new(TerminalNavigator))
        .store(Arc::new(FileSessionStore::new(&config.session_file)))
        .notifier(Arc::new(TerminalNotifier))
        .config(config.session_config())
        .build())
}

pub async fn login(username: String, password: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = quizkit_client::load_config_from(config_path.as_deref())?;
    let manager = build_manager(&config)?;

    let user = manager
        .login(&Credentials { username, password })
        .await
        .context("login failed")?;
    // The CLI does not keep a cycle running after login.
    manager.shutdown();

    println!("Logged in as {} ({}, {})", user.username, user.name, user.role);
    println!("Session stored in {}", config.session_file.display());
    Ok(())
}

pub async fn refresh(config_path: Option<PathBuf>) -> Result<()> {
    let config = quizkit_client::load_config_from(config_path.as_deref())?;
    let manager = build_manager(&config)?;

    match manager.refresh().await {
        RefreshOutcome::Refreshed => {
            println!("Token refreshed.");
            Ok(())
        }
        RefreshOutcome::Skipped => anyhow::bail!("not logged in"),
        RefreshOutcome::Coalesced => anyhow::bail!("another refresh is already running"),
        RefreshOutcome::LoggedOut => anyhow::bail!("token refresh failed, session ended"),
    }
}

pub async fn keepalive(config_path: Option<PathBuf>) -> Result<()> {
    let config = quizkit_client::load_config_from(config_path.as_deref())?;
    let manager = build_manager(&config)?;

    if manager.current_user().is_none() {
        anyhow::bail!("not logged in");
    }

    let mut updates = manager.subscribe();
    manager.start_auto_refresh();
    println!(
        "Refreshing every {}s. Press Ctrl-C to stop.",
        config.refresh_interval_secs
    );

    let ended = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted, stopping refresh cycle");
                break false;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break true;
                }
                match updates.borrow_and_update().as_ref() {
                    Some(user) => tracing::debug!(username = %user.username, "session token renewed"),
                    None => break true,
                }
            }
        }
    };

    manager.shutdown();
    if ended {
        anyhow::bail!("session ended");
    }
    println!("Stopped.");
    Ok(())
}

pub fn whoami(config_path: Option<PathBuf>) -> Result<()> {
    let config = quizkit_client::load_config_from(config_path.as_deref())?;
    let manager = build_manager(&config)?;
    match manager.current_user() {
        Some(user) => {
            println!("{} ({}, {})", user.username, user.name, user.role);
            Ok(())
        }
        None => anyhow::bail!("not logged in"),
    }
}

pub fn logout(config_path: Option<PathBuf>) -> Result<()> {
    let config = quizkit_client::load_config_from(config_path.as_deref())?;
    build_manager(&config)?.logout();
    println!("Logged out.");
    Ok(())
}
