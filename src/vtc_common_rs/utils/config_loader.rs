use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::vtc_common_rs::packet::core::bit_utils::ByteOrder;
use crate::vtc_common_rs::packet::core::checksum::CrcPreset;
use crate::vtc_common_rs::packet::core::exceptions::{FrameError, FrameResult};
use super::log_config::LogLevel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrcConfig {
    /// Catalogue name, see `CrcPreset::by_name`
    pub algorithm: String,
    pub verify_on_decode: bool,
}

impl Default for CrcConfig {
    fn default() -> Self {
        Self {
            algorithm: "CRC-16/IBM-3740".into(),
            verify_on_decode: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub byte_order: ByteOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            timestamps: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub crc: CrcConfig,
    pub frame: FrameConfig,
    pub logging: LogConfig,
}

impl CodecConfig {
    /// Preset named by `crc.algorithm`
    pub fn crc_preset(&self) -> FrameResult<CrcPreset> {
        Ok(CrcPreset::by_name(&self.crc.algorithm)?)
    }
}

/// Loads `CodecConfig` from the first config file found, then the environment
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::with_paths(vec![PathBuf::from("vtc.config.toml"), PathBuf::from("vtc.config.json")])
    }

    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_prefix: "VTC_".into(),
        }
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(&self) -> FrameResult<CodecConfig> {
        let mut config = CodecConfig::default();
        for path in &self.config_paths {
            if !path.exists() {
                continue;
            }
            match self.load_from_file(path) {
                Ok(file_config) => {
                    debug!("loaded config from {}", path.display());
                    config = file_config;
                    break;
                }
                Err(e) => warn!("failed to load config from {}: {}", path.display(), e),
            }
        }
        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;
        Ok(config)
    }

    /// Load a file the caller asked for by name; a missing or malformed file is an error
    pub fn load_required(&self, path: &Path) -> FrameResult<CodecConfig> {
        let mut config = self.load_from_file(path)?;
        debug!("loaded config from {}", path.display());
        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;
        Ok(config)
    }

    pub fn load_from_file(&self, path: &Path) -> FrameResult<CodecConfig> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| FrameError::Config(format!("failed to parse JSON config: {}", e))),
            Some("toml") => toml::from_str(&content)
                .map_err(|e| FrameError::Config(format!("failed to parse TOML config: {}", e))),
            _ => Err(FrameError::Config(format!("unsupported config file format: {}", path.display()))),
        }
    }

    fn env_var(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", self.env_prefix, key)).ok()
    }

    pub fn apply_env_overrides(&self, config: &mut CodecConfig) -> FrameResult<()> {
        if let Some(algorithm) = self.env_var("CRC_ALGORITHM") {
            config.crc.algorithm = algorithm;
        }
        if let Some(verify) = self.env_var("VERIFY_CRC") {
            config.crc.verify_on_decode = verify
                .parse()
                .map_err(|_| FrameError::Config(format!("invalid {}VERIFY_CRC: {}", self.env_prefix, verify)))?;
        }
        if let Some(order) = self.env_var("BYTE_ORDER") {
            config.frame.byte_order = order.parse().map_err(FrameError::Config)?;
        }
        if let Some(level) = self.env_var("LOG_LEVEL") {
            config.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(&self, config: &CodecConfig) -> FrameResult<()> {
        config.crc_preset()?;
        config
            .logging
            .level
            .parse::<LogLevel>()
            .map_err(FrameError::Config)?;
        Ok(())
    }

    pub fn save_config(&self, config: &CodecConfig, path: &Path) -> FrameResult<()> {
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)
                .map_err(|e| FrameError::Config(format!("failed to serialize config to JSON: {}", e)))?,
            Some("toml") => toml::to_string_pretty(config)
                .map_err(|e| FrameError::Config(format!("failed to serialize config to TOML: {}", e)))?,
            _ => {
                return Err(FrameError::Config(format!(
                    "unsupported config file format for saving: {}",
                    path.display()
                )))
            }
        };
        fs::write(path, content)?;
        Ok(())
    }
}
