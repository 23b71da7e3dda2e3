//! Configuration system
//!
//! All tuning is gathered into one immutable [`SimConfig`] built at startup
//! and handed by reference to the systems that read it. Nothing looks tuning
//! up through globals.

pub mod tuning;
pub mod weapons;

pub use serde::{Deserialize, Serialize};
pub use tuning::{
    CombatTuning, FeedbackTuning, HitboxGeometry, MeleeAiProfile, PhysicsTuning, PlayerTuning,
    ProjectileTuning, RangedAiProfile, RelicTuning, RunTuning, SimConfig,
};
pub use weapons::{WeaponDefinition, WeaponKind, WeaponTable};

use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Check value ranges after loading
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Load configuration from file (`.toml` or `.ron`) and validate it
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;

        let config: Self = match format {
            ConfigFormat::Toml => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            ConfigFormat::Ron => {
                ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
        };

        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Supported on-disk formats
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

    /// A value is out of its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension_rejected() {
        let err = SimConfig::load_from_file("tuning.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_ron_roundtrip_through_disk() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("raider_sim_cfg_{}.ron", std::process::id()));

        let mut config = SimConfig::default();
        config.player.max_hp = 12;
        config.save_to_file(&path).unwrap();

        let loaded = SimConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.player.max_hp, 12);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_toml_roundtrip_through_disk() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("raider_sim_cfg_{}.toml", std::process::id()));

        SimConfig::default().save_to_file(&path).unwrap();
        let loaded = SimConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.physics.velocity_iterations, 6);
        let _ = std::fs::remove_file(&path);
    }
}
