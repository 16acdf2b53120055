//! Configuration types for onnx-shim.

use serde::Deserialize;
use std::path::PathBuf;

use crate::memory::DEVICE_CPU;
use crate::types::{AllocatorType, LoggingLevel, MemType};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Engine environment configuration.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Memory used for input tensors.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Engine environment configuration.
#[derive(Debug, Deserialize)]
pub struct EnvironmentConfig {
    /// Identifier the engine uses in its log lines.
    #[serde(default = "default_env_name")]
    pub name: String,

    /// Engine logging threshold.
    #[serde(default)]
    pub log_level: LoggingLevel,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            name: default_env_name(),
            log_level: LoggingLevel::default(),
        }
    }
}

/// Session configuration.
#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    /// Path to the .onnx model.
    #[serde(default)]
    pub model_path: Option<PathBuf>,
}

/// Memory configuration.
#[derive(Debug, Deserialize)]
pub struct MemoryConfig {
    /// Device name ("Cpu", "Cuda").
    #[serde(default = "default_memory_name")]
    pub name: String,

    /// Allocator kind.
    #[serde(default)]
    pub allocator: AllocatorType,

    /// Device index.
    #[serde(default)]
    pub device_id: i32,

    /// Memory kind.
    #[serde(default)]
    pub mem_type: MemType,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            name: default_memory_name(),
            allocator: AllocatorType::default(),
            device_id: 0,
            mem_type: MemType::default(),
        }
    }
}

fn default_env_name() -> String {
    "onnx-shim".to_string()
}

fn default_memory_name() -> String {
    DEVICE_CPU.to_string()
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> crate::error::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}
