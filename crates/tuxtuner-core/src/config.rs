use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_HELPER_PATH: &str = "/usr/libexec/tuxtuner-helper";
pub const DEFAULT_CPU_SYSFS_ROOT: &str = "/sys/devices/system/cpu";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Operator settings. None of these are reachable from the UI.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub helper: HelperConfig,
    pub probe: ProbeConfig,
    pub session: SessionConfig,
    pub log_level: LogLevelConfig,
}

impl Config {
    /// Loads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct HelperConfig {
    pub path: PathBuf,
    /// Authorization agent that elevates the helper, e.g. `pkexec`.
    pub escalator: String,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_HELPER_PATH),
            escalator: "pkexec".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    pub gpu_cli: String,
    pub display_cli: String,
    pub cpu_sysfs_root: PathBuf,
    /// Core count assumed when enumeration finds nothing. `None` disables the CPU control instead.
    pub core_fallback: Option<u32>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            gpu_cli: "supergfxctl".to_string(),
            display_cli: "hyprctl".to_string(),
            cpu_sysfs_root: PathBuf::from(DEFAULT_CPU_SYSFS_ROOT),
            core_fallback: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub env_var: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            env_var: "XDG_SESSION_ID".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct LogLevelConfig(pub String);

impl Default for LogLevelConfig {
    fn default() -> Self {
        Self("info".to_string())
    }
}
