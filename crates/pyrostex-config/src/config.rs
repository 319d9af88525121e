//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Platform config directory for pyrostex (e.g. `~/.config/pyrostex`).
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pyrostex"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Map resolutions.
    pub maps: MapsConfig,
    /// Procedural detail noise.
    pub detail: DetailConfig,
    /// Logging.
    pub log: LogConfig,
}

/// Resolutions of the generated maps, in pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapsConfig {
    /// Width of the latitude/longitude base map from the height synthesizer;
    /// height fields must match it exactly.
    pub base_width: usize,
    /// Height requested from the synthesizer; an upper bound on filled rows.
    pub base_height: usize,
    /// Width of the tectonic height cube atlas (three faces).
    pub tectonic_width: usize,
    /// Height of the tectonic height cube atlas (two faces).
    pub tectonic_height: usize,
    /// Width of the whole-planet detail height atlas.
    pub detail_width: usize,
    /// Height of the whole-planet detail height atlas.
    pub detail_height: usize,
    /// Edge length of every region tile.
    pub tile_size: usize,
}

/// Fractal noise added on top of resampled heights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetailConfig {
    /// Noise seed.
    pub seed: u32,
    /// Number of octaves.
    pub octaves: u32,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Frequency of the first octave on the unit sphere.
    pub base_frequency: f64,
    /// Amplitude of the first octave, in height units.
    pub amplitude: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive (e.g. "info", "pyrostex_map=debug").
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            base_width: 2048,
            base_height: 1306,
            tectonic_width: 1536,
            tectonic_height: 1024,
            detail_width: 768,
            detail_height: 512,
            tile_size: 1024,
        }
    }
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 6,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 4.0,
            amplitude: 8.0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn check_atlas(name: &str, width: usize, height: usize) -> Result<(), ConfigError> {
    if width == 0 || width % 3 != 0 || height % 2 != 0 || width / 3 != height / 2 {
        return Err(ConfigError::Invalid(format!(
            "{name} atlas {width}x{height} must be 3s x 2s with s > 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(2)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read the file: `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Reject settings no map could be built from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let maps = &self.maps;
        if maps.base_width == 0 || maps.base_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "base map {}x{} must be at least 1x1",
                maps.base_width, maps.base_height
            )));
        }
        check_atlas("tectonic", maps.tectonic_width, maps.tectonic_height)?;
        check_atlas("detail", maps.detail_width, maps.detail_height)?;
        if maps.tile_size == 0 {
            return Err(ConfigError::Invalid("tile size must be positive".into()));
        }

        let detail = &self.detail;
        let finite = [
            detail.lacunarity,
            detail.persistence,
            detail.base_frequency,
            detail.amplitude,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid(
                "detail noise parameters must be finite".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(2))
                .unwrap();
        assert!(ron_str.contains("base_width: 2048"));
        assert!(ron_str.contains("tectonic_height: 1024"));
        assert!(ron_str.contains("level: \"info\""));
    }

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(maps: (tile_size: 256))").unwrap();
        assert_eq!(config.maps.tile_size, 256);
        assert_eq!(config.maps.base_width, 2048);
        assert_eq!(config.detail, DetailConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_atlas() {
        let mut config = Config::default();
        config.maps.tectonic_width = 1500;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.maps.detail_height = 500;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.maps.tile_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.detail.lacunarity = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.maps.tile_size = 512;
        config.detail.seed = 77;
        config.log.level = "pyrostex_map=debug".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        let config = Config::load_or_create(&nested).unwrap();
        assert_eq!(config, Config::default());
        assert!(nested.join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.detail.octaves = 3;
        modified.save(dir.path()).unwrap();

        let reloaded = config.reload(dir.path()).unwrap();
        assert_eq!(reloaded.map(|c| c.detail.octaves), Some(3));
        assert!(modified.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_default_config_dir_is_namespaced() {
        if let Some(dir) = default_config_dir() {
            assert!(dir.ends_with("pyrostex"));
        }
    }
}
