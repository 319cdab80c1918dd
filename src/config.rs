use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::auth::AdminPolicy;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File holding user settings (username)
    #[serde(default = "default_settings_file")]
    pub settings_file: PathBuf,

    /// Seconds to wait for in-flight requests after a shutdown signal
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    /// Minimum edge length of generated QR codes, in pixels
    #[serde(default = "default_qr_size")]
    pub qr_size: u32,

    /// Who may use administrator features
    #[serde(default)]
    pub admin_policy: AdminPolicy,
}

fn default_settings_file() -> PathBuf {
    PathBuf::from("config.toml")
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

fn default_qr_size() -> u32 {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_file: default_settings_file(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            qr_size: default_qr_size(),
            admin_policy: AdminPolicy::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: Config = toml::from_str("qr_size = 512").unwrap();
        assert_eq!(config.qr_size, 512);
        assert_eq!(config.shutdown_grace_secs, 5);
        assert_eq!(config.settings_file, PathBuf::from("config.toml"));
        assert_eq!(config.admin_policy, AdminPolicy::Host);
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lan-share.toml");
        std::fs::write(
            &path,
            "admin_policy = \"open\"\nshutdown_grace_secs = 1\nsettings_file = \"/tmp/s.toml\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.admin_policy, AdminPolicy::Open);
        assert_eq!(config.shutdown_grace_secs, 1);
        assert_eq!(config.settings_file, PathBuf::from("/tmp/s.toml"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::from_file(Path::new("/nonexistent/lan-share.toml")).is_err());
    }
}
