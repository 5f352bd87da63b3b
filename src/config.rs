//! Configuration management for hwbench
//!
//! Config file location:
//! - Linux: ~/.config/hwbench/config.toml
//! - macOS: ~/Library/Application Support/com.hwbench.hwbench/config.toml
//! - Windows: %APPDATA%/hwbench/hwbench/config/config.toml
//!
//! You can override the config location by setting `HWBENCH_CONFIG_PATH`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Workload sizes for each stage
    #[serde(default)]
    pub benchmark: BenchmarkConfig,

    /// Numeric/graphics backend preferences
    #[serde(default)]
    pub backends: BackendConfig,

    /// Report defaults
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from the default location, or defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `config_path`, or defaults if the file doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config from {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `config_path`
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("HWBENCH_CONFIG_PATH") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = ProjectDirs::from("com", "hwbench", "hwbench")
            .context("Could not determine project directories")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Load `config_path`, writing the defaults there first if the file doesn't exist
    pub fn init_at(config_path: &Path) -> Result<Self> {
        let config = Self::load_from(config_path)?;

        if !config_path.exists() {
            config.save_to(config_path)?;
        }

        Ok(config)
    }
}

/// Workload sizes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// CPU matrix size multiplier (side = 1000 x mult, capped at 3000)
    #[serde(default = "default_cpu_iter_mult")]
    pub cpu_iter_mult: u32,

    /// RAM buffer size in MB
    #[serde(default = "default_ram_size_mb")]
    pub ram_size_mb: u64,

    /// Disk scratch file size in MB
    #[serde(default = "default_disk_size_mb")]
    pub disk_size_mb: u64,

    /// Directory the disk scratch file is created under (OS temp dir when unset)
    #[serde(default)]
    pub disk_dir: Option<PathBuf>,

    /// GPU render duration in seconds
    #[serde(default = "default_gpu_duration_secs")]
    pub gpu_duration_secs: f64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            cpu_iter_mult: default_cpu_iter_mult(),
            ram_size_mb: default_ram_size_mb(),
            disk_size_mb: default_disk_size_mb(),
            disk_dir: None,
            gpu_duration_secs: default_gpu_duration_secs(),
        }
    }
}

fn default_cpu_iter_mult() -> u32 {
    1
}

fn default_ram_size_mb() -> u64 {
    1024
}

fn default_disk_size_mb() -> u64 {
    500
}

fn default_gpu_duration_secs() -> f64 {
    5.0
}

/// Numeric kernel preference
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NumericPreference {
    /// Use accelerated kernels when compiled in
    #[default]
    Auto,
    /// Always use the portable kernels
    Portable,
}

/// Graphics preference
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GraphicsPreference {
    #[default]
    Auto,
    /// Skip the GPU stage (scores 0)
    Disabled,
}

/// Backend preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub numeric: NumericPreference,

    #[serde(default)]
    pub graphics: GraphicsPreference,
}

/// Report format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default report format
    #[serde(default)]
    pub format: OutputFormat,

    /// Hide the progress bar
    #[serde(default)]
    pub quiet: bool,
}
