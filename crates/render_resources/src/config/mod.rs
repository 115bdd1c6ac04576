//! Configuration system
//!
//! [`Config`] gives any serde type TOML/RON file loading and saving.
//! [`DeviceConfig`] holds the tunables of a [`ResourceDevice`](crate::device::ResourceDevice).

pub use serde::{Deserialize, Serialize};

use std::path::Path;

use crate::resources::pool::DEFAULT_POOL_CAPACITY;

/// Largest accepted deferred release latency, in frames
pub const MAX_RELEASE_LATENCY_FRAMES: u32 = 16;

/// Largest accepted initial slot count per pool
pub const MAX_INITIAL_POOL_CAPACITY: usize = 1 << 16;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file, picking the format from its extension
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => Self::from_toml_str(&contents),
            ConfigFormat::Ron => Self::from_ron_str(&contents),
        }
    }

    /// Save configuration to file, picking the format from its extension
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse from a RON document
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its accepted range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// # Resource Device Configuration
///
/// Tunables for one [`ResourceDevice`](crate::device::ResourceDevice).
/// Missing fields fall back to their defaults, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Name used in log output
    pub label: String,
    /// Slots each pool holds before its first doubling
    pub initial_pool_capacity: usize,
    /// Frames a destroyed resource stays alive before its slot is recycled;
    /// 0 releases immediately
    pub release_latency_frames: u32,
}

impl DeviceConfig {
    /// Default config with deferred release enabled for `frames` frames
    pub fn with_release_latency(frames: u32) -> Self {
        Self {
            release_latency_frames: frames,
            ..Self::default()
        }
    }

    /// Reject values the device cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_pool_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "initial_pool_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.initial_pool_capacity > MAX_INITIAL_POOL_CAPACITY {
            return Err(ConfigError::InvalidValue {
                field: "initial_pool_capacity",
                reason: format!(
                    "{} exceeds the maximum of {}",
                    self.initial_pool_capacity, MAX_INITIAL_POOL_CAPACITY
                ),
            });
        }
        if self.release_latency_frames > MAX_RELEASE_LATENCY_FRAMES {
            return Err(ConfigError::InvalidValue {
                field: "release_latency_frames",
                reason: format!(
                    "{} exceeds the maximum of {}",
                    self.release_latency_frames, MAX_RELEASE_LATENCY_FRAMES
                ),
            });
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            label: "device".to_string(),
            initial_pool_capacity: DEFAULT_POOL_CAPACITY,
            release_latency_frames: 0,
        }
    }
}

impl Config for DeviceConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DeviceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.release_latency_frames, 0);
        assert_eq!(config.initial_pool_capacity, DEFAULT_POOL_CAPACITY);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = DeviceConfig::from_toml_str(
            r#"
            label = "main"
            release_latency_frames = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.label, "main");
        assert_eq!(config.release_latency_frames, 3);
        assert_eq!(config.initial_pool_capacity, DEFAULT_POOL_CAPACITY);
    }

    #[test]
    fn test_parse_ron() {
        let config =
            DeviceConfig::from_ron_str("(label: \"shadow\", initial_pool_capacity: 4)").unwrap();
        assert_eq!(config.label, "shadow");
        assert_eq!(config.initial_pool_capacity, 4);
    }

    #[test]
    fn test_parse_error() {
        let result = DeviceConfig::from_toml_str("initial_pool_capacity = \"lots\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = DeviceConfig {
            initial_pool_capacity: 0,
            ..DeviceConfig::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(ConfigError::InvalidValue { field: "initial_pool_capacity", .. })
        ));

        let slow = DeviceConfig::with_release_latency(MAX_RELEASE_LATENCY_FRAMES + 1);
        assert!(slow.validate().is_err());
        assert!(DeviceConfig::with_release_latency(3).validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_initial_capacity() {
        let at_limit = DeviceConfig {
            initial_pool_capacity: MAX_INITIAL_POOL_CAPACITY,
            ..DeviceConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let huge = DeviceConfig::from_toml_str(&format!("initial_pool_capacity = {}", usize::MAX / 2)).unwrap();
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::InvalidValue { field: "initial_pool_capacity", .. })
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = std::env::temp_dir();
        let config = DeviceConfig {
            label: "round-trip".to_string(),
            initial_pool_capacity: 32,
            release_latency_frames: 2,
        };

        for name in ["render_resources_config_test.toml", "render_resources_config_test.ron"] {
            let path = dir.join(name);
            config.save_to_file(&path).unwrap();
            let loaded = DeviceConfig::load_from_file(&path).unwrap();
            std::fs::remove_file(&path).ok();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let result = DeviceConfig::default().save_to_file(std::env::temp_dir().join("device.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
