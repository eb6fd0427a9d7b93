//! Bootstrap configuration loading and folder resolution
//!
//! Resolution priority for every bootstrap value:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is never fatal: a warning is logged and compiled
//! defaults are used. A TOML file that exists but fails to parse is an error.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Application directory name used under the platform config/data dirs
pub const APP_DIR_NAME: &str = "guesscasso";

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

/// Compiled defaults used when neither CLI, ENV nor TOML provide a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub words_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was compiled for
    pub fn for_current_platform() -> Self {
        Self {
            words_folder: default_data_folder().join("words"),
            log_level: default_log_level(),
        }
    }
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/guesscasso (or /var/lib/guesscasso for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib").join(APP_DIR_NAME))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support").join(APP_DIR_NAME))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData").join(APP_DIR_NAME))
    } else {
        PathBuf::from("./guesscasso_data")
    }
}

/// Locate the default configuration file for the platform
///
/// On Linux `~/.config/guesscasso/config.toml` is tried first, then
/// `/etc/guesscasso/config.toml`. Returns `None` when no file exists.
pub fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR_NAME).join("config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML file into `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    let parsed = toml::from_str(&content)?;
    Ok(parsed)
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    CompiledDefaults,
}

impl ConfigSource {
    /// Report the source; call once tracing is initialised
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::CompiledDefaults => {
                warn!("No config file found, using compiled defaults")
            }
        }
    }
}

/// Load bootstrap configuration with graceful degradation
///
/// An explicitly requested path must exist. Without one, the platform
/// config file is used if present, otherwise `T::default()`. Nothing is
/// logged here since this runs before tracing is set up; the returned
/// [`ConfigSource`] is reported afterwards.
pub fn load_toml_or_default<T>(explicit: Option<&Path>) -> Result<(T, ConfigSource)>
where
    T: DeserializeOwned + Default,
{
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let parsed = load_toml(path)?;
        return Ok((parsed, ConfigSource::File(path.to_path_buf())));
    }

    match find_config_file() {
        Some(path) => {
            let parsed = load_toml(&path)?;
            Ok((parsed, ConfigSource::File(path)))
        }
        None => Ok((T::default(), ConfigSource::CompiledDefaults)),
    }
}

/// Resolve a folder following CLI → ENV → TOML → default priority
pub fn resolve_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
    default: PathBuf,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    default
}
