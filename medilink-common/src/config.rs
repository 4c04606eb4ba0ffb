//! Configuration loading and root folder resolution
//!
//! The TOML file is optional. A missing file means built-in defaults; an
//! unreadable or unparsable file is a configuration error.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `MEDILINK_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::{Error, Result};

pub const ROOT_FOLDER_ENV: &str = "MEDILINK_ROOT_FOLDER";
pub const API_KEY_ENV: &str = "MEDILINK_GEMINI_API_KEY";
/// Variable name the browser build read its key from
pub const LEGACY_API_KEY_ENV: &str = "API_KEY";

const DATABASE_FILE: &str = "medilink.db";

/// Configuration loaded from the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Root folder for the slot database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database file, overriding `<root>/medilink.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Transcription gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Upper bound for one transcription round trip
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TranscriptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the API key: environment first, then TOML
    pub fn resolve_api_key(&self) -> Result<String> {
        for var in [API_KEY_ENV, LEGACY_API_KEY_ENV] {
            if let Ok(key) = std::env::var(var) {
                if is_valid_key(&key) {
                    info!("Transcription API key loaded from {}", var);
                    return Ok(key);
                }
            }
        }

        if let Some(key) = &self.api_key {
            if is_valid_key(key) {
                info!("Transcription API key loaded from TOML config");
                return Ok(key.clone());
            }
        }

        Err(Error::Config(format!(
            "Transcription API key not configured. Set {} or add api_key under [transcription] in the config file",
            API_KEY_ENV
        )))
    }
}

/// Government portal credentials
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_admin_username() -> String {
    "gov_admin".to_string()
}

fn default_admin_password() -> String {
    "admin_password".to_string()
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

impl TomlConfig {
    /// Load from an explicit path; the file must exist and parse
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the explicit path if given, else the platform config file, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match default_config_file() {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                Self::load_from(&path)
            }
            None => {
                warn!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Resolve the root folder following the priority order above
    pub fn resolve_root_folder(&self, cli_arg: Option<&Path>) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.root_folder {
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        default_root_folder()
    }

    /// Database file inside the resolved root folder
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE))
    }
}

/// Platform config file if one exists
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("medilink").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/medilink/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/medilink (or /var/lib/medilink for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("medilink"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/medilink"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/medilink
        dirs::data_dir()
            .map(|d| d.join("medilink"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/medilink"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\medilink
        dirs::data_local_dir()
            .map(|d| d.join("medilink"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\medilink"))
    } else {
        PathBuf::from("./medilink_data")
    }
}
