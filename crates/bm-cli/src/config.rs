//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use bm_client::AuthEndpoints;
use bm_client::auth::{DEFAULT_IDENTITY_URL, DEFAULT_TOKEN_URL};
use bm_core::aggregation::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Realtime database root, e.g. `https://<project>.firebaseio.com`.
    pub database_url: Option<String>,
    /// Web API key of the identity provider project.
    pub api_key: Option<String>,
    /// Base URL for sign-up and sign-in.
    pub auth_url: String,
    /// Token refresh endpoint.
    pub token_url: String,
    /// Where the session is persisted.
    pub session_path: PathBuf,
    /// Days shown by the chart commands.
    pub window_days: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("session_path", &self.session_path)
            .field("window_days", &self.window_days)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let state_dir = dirs_state_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_url: None,
            api_key: None,
            auth_url: DEFAULT_IDENTITY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            session_path: state_dir.join("session.json"),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (BM_*)
        figment = figment.merge(Env::prefixed("BM_"));

        let config: Self = figment.extract()?;
        if !(1..=MAX_WINDOW_DAYS).contains(&config.window_days) {
            return Err(figment::Error::from(format!(
                "window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}",
                config.window_days
            )));
        }
        Ok(config)
    }

    /// Identity provider endpoints from `auth_url` and `token_url`.
    pub fn endpoints(&self) -> AuthEndpoints {
        AuthEndpoints {
            identity_url: self.auth_url.clone(),
            token_url: self.token_url.clone(),
        }
    }
}

/// Returns the platform-specific config directory for bm.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bm"))
}

/// Returns the platform-specific state directory for bm.
///
/// On Linux: `~/.local/state/bm`. Platforms without a state directory use the
/// local data directory.
pub fn dirs_state_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|p| p.join("bm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_state_path_ends_with_bm() {
        let path = dirs_state_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "bm");
    }

    #[test]
    fn test_default_config_uses_state_dir_for_session() {
        let config = Config::default();
        let state_dir = dirs_state_path().unwrap();
        assert_eq!(config.session_path, state_dir.join("session.json"));
    }

    #[test]
    fn test_default_endpoints_and_window() {
        let config = Config::default();
        assert_eq!(config.endpoints(), AuthEndpoints::default());
        assert_eq!(config.window_days, 14);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bm.toml");
        std::fs::write(
            &path,
            "database_url = \"https://baby.example.com\"\nwindow_days = 7\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("https://baby.example.com"));
        assert_eq!(config.window_days, 7);
    }

    #[test]
    fn test_window_days_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for days in [0, 200_000_000] {
            let path = dir.path().join("bm.toml");
            std::fs::write(&path, format!("window_days = {days}\n")).unwrap();

            let err = Config::load_from(Some(&path)).unwrap_err();
            assert!(err.to_string().contains("window_days must be between 1 and 3660"));
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("super-secret".to_string()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
