//! Persisted user settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ShareError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_username")]
    pub username: String,
}

fn default_username() -> String {
    "anonymous".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: default_username(),
        }
    }
}

/// TOML settings file. Writes are serialized through a lock.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Read the settings file. A missing file yields the defaults.
    pub async fn load(&self) -> Result<Settings, ShareError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, using defaults", self.path.display());
                return Ok(Settings::default());
            }
            Err(err) => return Err(ShareError::Io(err)),
        };

        toml::from_str(&content)
            .map_err(|err| ShareError::Settings(format!("{}: {}", self.path.display(), err)))
    }

    /// Replace the stored username.
    pub async fn set_username(&self, username: &str) -> Result<Settings, ShareError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ShareError::InvalidRequest(
                "username must not be empty".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let mut settings = self.load().await?;
        settings.username = username.to_string();
        self.save(&settings).await?;
        info!("Updated username in {}", self.path.display());
        Ok(settings)
    }

    async fn save(&self, settings: &Settings) -> Result<(), ShareError> {
        let content =
            toml::to_string(settings).map_err(|err| ShareError::Settings(err.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // Readers never observe a partially written file.
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
