//! Scanner Configuration
//!
//! Tunable zone constants and scan behaviour stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::geometry::ZoneParams;

/// Scanner settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// MRZ zone geometry
    pub zone: ZoneParams,
    /// Scan pipeline behaviour
    pub scan: ScanSettings,
}

/// Scan pipeline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Reject decoded records whose check digits don't add up
    pub require_valid_checksums: bool,
    /// Convert the cropped zone to grayscale before the second OCR pass
    pub grayscale_crop: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            require_valid_checksums: true,
            grayscale_crop: false,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<ScannerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: ScannerConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &ScannerConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("org", "mrz", "mrz-scanner")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Load `path`, or `config.toml` in the config directory, falling back to defaults
pub fn load_or_default(path: Option<&Path>) -> Result<ScannerConfig> {
    let path = match path {
        Some(path) => return load_config(path),
        None => get_config_dir()?.join("config.toml"),
    };

    if path.exists() {
        info!("Loaded configuration from {:?}", path);
        return load_config(&path);
    }

    info!("Using default configuration");
    Ok(ScannerConfig::default())
}
