//! Configuration loading and path resolution
//!
//! Paths resolve in priority order:
//! 1. Environment variables (`JOIN_SOUND_DB_PATH`, `JOIN_SOUND_SOUNDS_PATH`,
//!    then `JOIN_SOUND_ROOT` for both)
//! 2. TOML configuration file
//! 3. OS-dependent compiled default root folder
//!
//! Upload limits and logging only come from the TOML file or defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Root folder holding the database and the sound directory
pub const ENV_ROOT: &str = "JOIN_SOUND_ROOT";
/// Explicit database file path
pub const ENV_DB_PATH: &str = "JOIN_SOUND_DB_PATH";
/// Explicit sound-file directory
pub const ENV_SOUNDS_PATH: &str = "JOIN_SOUND_SOUNDS_PATH";
/// Explicit TOML configuration file
pub const ENV_CONFIG: &str = "JOIN_SOUND_CONFIG";

const APP_DIR: &str = "join-sound";
const DB_FILE: &str = "main.db";
const SOUNDS_DIR: &str = "sounds";

/// Configuration as read from the TOML file
///
/// Every key is optional; missing keys fall through to environment or defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder (database and sounds live beneath it unless overridden)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory holding stored sound files
    #[serde(default)]
    pub sounds_path: Option<PathBuf>,

    /// Upload and library limits
    #[serde(default)]
    pub limits: Limits,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.limits.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }
}

/// Upload and library limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Per-file size ceiling in bytes
    pub max_file_size_bytes: u64,
    /// Maximum filename length in characters
    pub max_filename_len: usize,
    /// Maximum decoded audio duration in milliseconds
    pub max_duration_ms: u64,
    /// Maximum stored sounds per identity
    pub max_sounds_per_identity: usize,
    /// Maximum files accepted in one bulk upload
    pub max_files_per_batch: usize,
    /// Bytes inspected for magic-byte detection
    pub sniff_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
            max_filename_len: 255,
            max_duration_ms: 5_000,
            max_sounds_per_identity: 5,
            max_files_per_batch: 5,
            sniff_len: 8 * 1024,
        }
    }
}

impl Limits {
    /// Duration ceiling as a `Duration`
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }

    /// Reject zero-valued limits
    pub fn validate(&self) -> Result<()> {
        let zero = [
            ("max_file_size_bytes", self.max_file_size_bytes == 0),
            ("max_filename_len", self.max_filename_len == 0),
            ("max_duration_ms", self.max_duration_ms == 0),
            ("max_sounds_per_identity", self.max_sounds_per_identity == 0),
            ("max_files_per_batch", self.max_files_per_batch == 0),
            ("sniff_len", self.sniff_len == 0),
        ];

        match zero.iter().find(|(_, is_zero)| *is_zero) {
            Some((key, _)) => Err(Error::Config(format!("limits.{} must be greater than zero", key))),
            None => Ok(()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub sounds_path: PathBuf,
    pub limits: Limits,
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Resolve configuration from the process environment and TOML file
    ///
    /// `config_file` names an explicit TOML file; without it `JOIN_SOUND_CONFIG`
    /// is consulted, then the platform config directory. Only the implicit
    /// platform file may be missing.
    pub fn resolve(config_file: Option<&Path>) -> Result<Self> {
        let toml_config = load_toml_config(config_file)?;
        Self::from_sources(toml_config, |key| std::env::var(key).ok())
    }

    /// Resolve configuration from an already-parsed TOML file and an
    /// environment lookup
    pub fn from_sources<F>(toml_config: TomlConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        toml_config.limits.validate()?;

        let root = env(ENV_ROOT)
            .map(PathBuf::from)
            .or_else(|| toml_config.root_folder.clone())
            .unwrap_or_else(default_root_folder);

        let database_path = env(ENV_DB_PATH)
            .map(PathBuf::from)
            .or(toml_config.database_path)
            .unwrap_or_else(|| root.join(DB_FILE));

        let sounds_path = env(ENV_SOUNDS_PATH)
            .map(PathBuf::from)
            .or(toml_config.sounds_path)
            .unwrap_or_else(|| root.join(SOUNDS_DIR));

        info!(
            database = %database_path.display(),
            sounds = %sounds_path.display(),
            "Configuration resolved"
        );

        Ok(Self {
            database_path,
            sounds_path,
            limits: toml_config.limits,
            logging: toml_config.logging,
        })
    }
}

fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        return TomlConfig::load(path);
    }

    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return TomlConfig::load(Path::new(&path));
    }

    match default_config_file() {
        Some(path) if path.exists() => TomlConfig::load(&path),
        Some(path) => {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Platform config file location (`<config dir>/join-sound/config.toml`)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./data"))
}
