//! Layered configuration.
//!
//! Sources, later ones win:
//! 1. defaults
//! 2. `<config_dir>/radar-ingest/config.toml`
//! 3. environment variables prefixed with `RADAR_INGEST_`
//! 4. command-line flags (applied by `cli`)

use crate::error::ConfigError;
use crate::model::Identity;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const APP_DIR_NAME: &str = "radar-ingest";
const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_PREFIX: &str = "RADAR_INGEST_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin of the ingest service; endpoint paths are joined onto it.
    pub base_url: String,
    /// Identity attached to ingest, audit and private download requests.
    pub user: Identity,
    pub api_key: Option<String>,
    /// Request timeout. Unset means no timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Where downloads are saved. Defaults to the current directory.
    pub download_dir: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            user: Identity::default(),
            api_key: None,
            timeout: None,
            download_dir: None,
            user_agent: format!("radar-ingest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load from defaults, the config file (custom or default path) and env.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::Validation {
            message: format!("base_url {:?} is not a valid URL: {e}", self.base_url),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                message: format!("base_url must use http or https, got {}", url.scheme()),
            });
        }
        if self.user.as_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "user must not be empty".to_string(),
            });
        }
        if self.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Validation {
                message: "timeout must be greater than 0 (omit it for no timeout)".to_string(),
            });
        }
        Ok(())
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.user.as_str(), "definitelynotaspren");
        assert_eq!(cfg.timeout, None);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(Some(dir.path().join("nope.toml"))).unwrap();
        assert_eq!(cfg.base_url, Config::default().base_url);
    }

    #[test]
    fn file_values_override_defaults() {
        let f = write_config(
            r#"
base_url = "https://radar.example.org"
user = "analyst"
timeout = "30s"
download_dir = "/tmp/radar"
"#,
        );
        let cfg = Config::load_from(Some(f.path().to_path_buf())).unwrap();
        assert_eq!(cfg.base_url, "https://radar.example.org");
        assert_eq!(cfg.user, Identity::new("analyst"));
        assert_eq!(cfg.timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.download_dir(), PathBuf::from("/tmp/radar"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let f = write_config(r#"base_url = "ftp://radar.example.org""#);
        let err = Config::load_from(Some(f.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));

        let cfg = Config {
            base_url: "not a url".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_user_is_rejected() {
        let cfg = Config {
            user: Identity::new(""),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
