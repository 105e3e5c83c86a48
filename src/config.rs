//! Configuration file support
//!
//! Settings are read from a TOML file. Every key is optional:
//!
//! ```toml
//! programmer = "linux_gpio:gpiochip=0,prog=24,reset=23,fcsn=8,sck=11,mosi=10,miso=9"
//! probe_on_entry = true
//!
//! [timing]
//! erase_poll_us = 80000
//! max_ready_polls = 50
//!
//! [geometry]
//! main_size = 16384
//! ```

use nrfprog_core::flash::SessionConfig;
use nrfprog_core::{FlashGeometry, Timing};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "nrfprog.toml";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys
    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of a configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Programmer string used when `-p` is not given
    pub programmer: Option<String>,
    /// Probe the FSR right after entering programming mode
    pub probe_on_entry: Option<bool>,
    /// Hardware delay overrides
    pub timing: Timing,
    /// Flash region sizes
    pub geometry: FlashGeometry,
}

impl Config {
    /// Load the configuration
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// used if present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Settings for a programming session
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            timing: self.timing,
            geometry: self.geometry,
            probe_on_entry: self.probe_on_entry.unwrap_or(defaults.probe_on_entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.session_config(), SessionConfig::default());
    }

    #[test]
    fn test_partial_timing_override() {
        let config = Config::parse(
            r#"
            programmer = "dummy"

            [timing]
            erase_poll_us = 80000
            max_ready_polls = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.programmer.as_deref(), Some("dummy"));
        let session = config.session_config();
        assert_eq!(session.timing.erase_poll_us, 80_000);
        assert_eq!(session.timing.max_ready_polls, 0);
        assert_eq!(session.timing.reset_low_ms, Timing::default().reset_low_ms);
        assert!(session.probe_on_entry);
    }

    #[test]
    fn test_probe_can_be_disabled() {
        let config = Config::parse("probe_on_entry = false").unwrap();
        assert!(!config.session_config().probe_on_entry);
    }

    #[test]
    fn test_geometry_override() {
        let config = Config::parse("[geometry]\nmain_size = 32768").unwrap();
        assert_eq!(config.geometry.main_size, 32768);
        assert_eq!(config.geometry.page_size, FlashGeometry::NRF24LE1.page_size);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Config::parse("[timing]\nreset_ms = 5").is_err());
        assert!(Config::parse("speed = 1").is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = Config::load(Some(Path::new("/nonexistent/nrfprog.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
