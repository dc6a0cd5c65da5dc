//! quizkit-client — gateway integration.
//!
//! Implements `AuthBackend` over HTTP, loads the TOML configuration, and
//! provides a file-backed session store for command-line use.

pub mod config;
pub mod http;
pub mod store;

pub use config::{load_config, load_config_from, QuizkitConfig};
pub use http::HttpAuthBackend;
pub use store::FileSessionStore;
