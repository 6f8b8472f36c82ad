//! # ufs-config
//!
//! Configuration management for UFS hosts (the FUSE wrapper and the CLI).
//!
//! Loads configuration from:
//! 1. `~/.ufs/config.toml` (global)
//! 2. `.ufs/config.toml` (project-local, overrides global)
//! 3. Environment variables (highest priority)

pub mod logging;
pub mod path;
pub mod testing;

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ufs_defs::{SizeRequest, UFS_IMAGE_FILE};

/// Global config instance
static CONFIG: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new(Config::load().unwrap_or_else(|e| {
        eprintln!(
            "[ufs-config] WARNING: Failed to load config: {}. Using defaults.",
            e
        );
        Config::default()
    }))
});

/// Get global config (read-only)
pub fn config() -> std::sync::RwLockReadGuard<'static, Config> {
    CONFIG.read().unwrap()
}

/// Reload config from disk
pub fn reload() -> Result<(), ConfigError> {
    let new_config = Config::load()?;
    *CONFIG.write().unwrap() = new_config;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Current config schema version
pub const CONFIG_VERSION: u32 = 1;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Config schema version (for forward compatibility)
    pub config_version: u32,
    pub image: ImageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            image: ImageConfig::default(),
        }
    }
}

/// Backing-image settings: where the index lives and how large a fresh
/// image is carved.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Path of the index image, relative to the mount's working directory.
    pub path: PathBuf,
    pub num_files: u64,
    pub num_areas: u64,
    pub num_nodes: u64,
    pub num_str_bytes: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        let req = SizeRequest::default();
        Self {
            path: PathBuf::from(UFS_IMAGE_FILE),
            num_files: req.num_files,
            num_areas: req.num_areas,
            num_nodes: req.num_nodes,
            num_str_bytes: req.num_str_bytes,
        }
    }
}

impl ImageConfig {
    /// Capacity request for a freshly-initialised image.
    pub fn size_request(&self) -> SizeRequest {
        SizeRequest {
            num_files: self.num_files,
            num_areas: self.num_areas,
            num_nodes: self.num_nodes,
            num_str_bytes: self.num_str_bytes,
        }
    }
}

impl Config {
    /// Load config from standard locations (CWD-relative project config)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_for_project(Path::new("."))
    }

    /// Load config for a specific project root directory.
    /// Resolution order: global → project → env vars.
    pub fn load_for_project(project_root: &Path) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Load global config (~/.ufs/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                debug!("Loading global config from {:?}", global_path);
                let contents = std::fs::read_to_string(&global_path)?;
                config = toml::from_str(&contents)?;
            }
        }

        // 2. Load project config (<project_root>/.ufs/config.toml)
        let project_config_path = project_root.join(".ufs/config.toml");
        if project_config_path.exists() {
            debug!("Loading project config from {:?}", project_config_path);
            let contents = std::fs::read_to_string(&project_config_path)?;
            let project_config: Config = toml::from_str(&contents)?;
            config.merge(project_config);
        }

        // 3. Apply environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    /// Global config path: ~/.ufs/config.toml
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".ufs/config.toml"))
    }

    /// Merge another config (project overrides global).
    /// Non-default values from `other` replace values in `self`.
    fn merge(&mut self, other: Config) {
        let defaults = ImageConfig::default();
        if other.image.path != defaults.path {
            self.image.path = other.image.path;
        }
        if other.image.num_files != defaults.num_files {
            self.image.num_files = other.image.num_files;
        }
        if other.image.num_areas != defaults.num_areas {
            self.image.num_areas = other.image.num_areas;
        }
        if other.image.num_nodes != defaults.num_nodes {
            self.image.num_nodes = other.image.num_nodes;
        }
        if other.image.num_str_bytes != defaults.num_str_bytes {
            self.image.num_str_bytes = other.image.num_str_bytes;
        }
    }

    /// Apply environment variable overrides (highest priority)
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("UFS_IMAGE_PATH") {
            self.image.path = PathBuf::from(path);
        }
        if let Ok(Ok(n)) = std::env::var("UFS_NUM_FILES").map(|v| v.parse()) {
            self.image.num_files = n;
        }
        if let Ok(Ok(n)) = std::env::var("UFS_NUM_AREAS").map(|v| v.parse()) {
            self.image.num_areas = n;
        }
        if let Ok(Ok(n)) = std::env::var("UFS_NUM_NODES").map(|v| v.parse()) {
            self.image.num_nodes = n;
        }
        if let Ok(Ok(n)) = std::env::var("UFS_NUM_STR_BYTES").map(|v| v.parse()) {
            self.image.num_str_bytes = n;
        }
    }
}
