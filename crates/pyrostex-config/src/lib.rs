//! Configuration for the pyrostex map pipeline.
//!
//! Settings persist to disk as a RON file; missing sections and fields fall
//! back to defaults so older files keep loading.

mod config;
mod error;

pub use config::{CONFIG_FILE_NAME, Config, DetailConfig, LogConfig, MapsConfig, default_config_dir};
pub use error::ConfigError;
