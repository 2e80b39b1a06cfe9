use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use substrate_loss::LossConfig;

/// The environment variable a deployment can set instead of (or alongside)
/// a TOML config file.
const CONFIG_PATH_ENV: &str = "SUBSTRATE_CONFIG";

/// Errors raised while loading a [`SubstrateConfig`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file's contents are not valid TOML, or don't match
    /// [`SubstrateConfig`]'s shape.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// The path whose contents failed to parse.
        path: String,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Engine-wide configuration (§5, §4.F), deserializable from a config file
/// or environment so a deployment never has to recompile to retune a
/// threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstrateConfig {
    /// Thresholds, weights, and sample counts for the Galois Loss Engine.
    pub loss: LossConfig,
    /// Bounded tail size consulted for contradiction detection (§4.G).
    /// Default `128`.
    pub contradiction_window: usize,
    /// Maximum concurrent oracle calls in flight (§5). Default `8`.
    pub oracle_concurrency: usize,
    /// Per-call oracle timeout in seconds (§5). Default `30`.
    pub oracle_timeout_secs: u64,
    /// Event channel bounded capacity (§5: lossless, backpressured).
    /// Default `1024`.
    pub event_channel_capacity: usize,
}

impl SubstrateConfig {
    /// `oracle_timeout_secs` as a [`Duration`].
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Parses `path`'s contents as TOML into a `SubstrateConfig`, falling
    /// back to [`Default::default`] for any field the file omits (every
    /// field carries `#[serde(default)]` via the struct-level attribute).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads from the file named by the `SUBSTRATE_CONFIG` environment
    /// variable if it's set, otherwise returns the default configuration.
    /// A deployment that wants to retune thresholds sets this variable
    /// rather than recompiling.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::load_from_file(path),
            Err(_) => Ok(Self::default()),
        }
    }
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            loss: LossConfig::default(),
            contradiction_window: 128,
            oracle_concurrency: 8,
            oracle_timeout_secs: 30,
            event_channel_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_toml_file_fills_remaining_fields_from_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "oracle_concurrency = 4").unwrap();
        let config = SubstrateConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.oracle_concurrency, 4);
        assert_eq!(config.contradiction_window, SubstrateConfig::default().contradiction_window);
    }

    #[test]
    fn missing_env_var_falls_back_to_defaults() {
        env::remove_var(CONFIG_PATH_ENV);
        assert_eq!(SubstrateConfig::load_from_env().unwrap(), SubstrateConfig::default());
    }

    #[test]
    fn unreadable_path_is_an_io_error() {
        let err = SubstrateConfig::load_from_file("/nonexistent/substrate.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
