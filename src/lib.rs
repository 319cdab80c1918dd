//! Share a local directory with devices on the same network.
//!
//! The served root is exposed read-only under `/files/`. Directory views carry
//! absolute links built from the host's LAN address so they can be opened (or
//! scanned as QR codes) from a phone on the same network.

pub mod address;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod opener;
pub mod qr;
pub mod resolve;
pub mod routes;
pub mod settings;

use std::sync::Arc;

pub use auth::{Authorizer, RequestContext};
pub use config::Config;
pub use error::ShareError;
pub use resolve::ServedRoot;

use settings::SettingsStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Directory exposed under `/files/`
    pub root: ServedRoot,
    /// Port used in shareable links
    pub port: u16,
    /// Configuration
    pub config: Arc<Config>,
    /// Decides who counts as the administrator
    pub authorizer: Arc<dyn Authorizer>,
    /// Username storage
    pub settings: Arc<SettingsStore>,
}

impl AppState {
    /// Create state for `root`, taking the authorizer and settings file from `config`.
    pub fn new(root: ServedRoot, port: u16, config: Config) -> Self {
        let authorizer = Arc::from(config.admin_policy.authorizer());
        let settings = Arc::new(SettingsStore::new(config.settings_file.clone()));
        Self {
            root,
            port,
            config: Arc::new(config),
            authorizer,
            settings,
        }
    }

    /// Replace the authorizer.
    pub fn with_authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }
}
