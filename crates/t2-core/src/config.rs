// crates/t2-core/src/config.rs - Configuration System
//
// The t2 home directory holds everything the CLI persists between runs:
//
//   <home>/config.toml        - discovery and crash-reporting settings
//   <home>/preferences.json   - key/value preference store
//   <home>/id_t2              - generated access key
//   <home>/crash-reports/     - queued crash reports
//
// HOME RESOLUTION (highest to lowest priority):
// 1. T2_HOME environment variable
// 2. $HOME/.t2
//
// A missing config.toml is not an error: every field has a default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.toml";
pub const PREFERENCES_FILE: &str = "preferences.json";
pub const KEY_FILE: &str = "id_t2";
pub const CRASH_DIR: &str = "crash-reports";

/// Errors that can occur during configuration loading and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot locate the t2 home directory: set T2_HOME or HOME")]
    NoHome,

    #[error("Invalid TOML syntax in {file}: {error}")]
    ParseError { file: String, error: String },

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("I/O error reading config: {0}")]
    IoError(#[from] std::io::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete configuration schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct T2Config {
    /// Hosts probed by LAN discovery
    #[serde(default)]
    pub lan: LanConfig,

    /// Serial device discovery
    #[serde(default)]
    pub usb: UsbConfig,

    #[serde(default)]
    pub crash: CrashConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanConfig {
    /// Host names or addresses to probe, optionally `name=address`
    #[serde(default)]
    pub hosts: Vec<String>,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsbConfig {
    /// Directory listing attached serial devices
    #[serde(default = "default_device_dir")]
    pub device_dir: String,

    /// Substring a device node name must contain to count as a device
    #[serde(rename = "match", default = "default_match")]
    pub match_name: String,

    /// Where `t2 install drivers` writes its udev rule
    #[serde(default = "default_rules_dir")]
    pub rules_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashConfig {
    /// Initial state when no preference has been recorded yet
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Loads and validates configuration from the home directory
pub struct ConfigManager;

impl ConfigManager {
    /// Resolve the home directory from `T2_HOME` and `HOME` values
    pub fn resolve_home(t2_home: Option<PathBuf>, home: Option<PathBuf>) -> ConfigResult<PathBuf> {
        if let Some(dir) = t2_home.filter(|p| !p.as_os_str().is_empty()) {
            return Ok(dir);
        }
        home.filter(|p| !p.as_os_str().is_empty())
            .map(|h| h.join(".t2"))
            .ok_or(ConfigError::NoHome)
    }

    /// Resolve the home directory from the process environment
    pub fn home_from_env() -> ConfigResult<PathBuf> {
        Self::resolve_home(
            std::env::var_os("T2_HOME").map(PathBuf::from),
            std::env::var_os("HOME").map(PathBuf::from),
        )
    }

    /// Load `<home>/config.toml`, falling back to defaults when absent
    pub fn load(home: &Path) -> ConfigResult<T2Config> {
        let path = home.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(T2Config::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config = Self::parse(&content, &path)?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn parse(content: &str, path: &Path) -> ConfigResult<T2Config> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            file: path.display().to_string(),
            error: e.to_string(),
        })
    }

    fn validate(config: &T2Config) -> ConfigResult<()> {
        if config.lan.port == 0 {
            return Err(ConfigError::ValidationError(
                "lan.port must be between 1 and 65535".to_string(),
            ));
        }
        if config.lan.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "lan.hosts cannot contain empty entries".to_string(),
            ));
        }
        if config.usb.device_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "usb.device_dir cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Commented config file written by `t2 install homedir`
    pub fn generate_default_config() -> String {
        r#"# t2 configuration file
#
# Lines starting with # are comments and are ignored.

[lan]
# Hosts probed during LAN discovery, as "address" or "name=address"
# hosts = ["tessel-one.local", "bench=192.168.1.12"]
hosts = []

# TCP port the device agent listens on
port = 22

[usb]
# Directory listing attached serial devices
device_dir = "/dev/serial/by-id"

# Only device nodes whose name contains this text are considered
match = "Tessel"

# Destination of the udev rule written by `t2 install drivers` (Linux)
rules_dir = "/etc/udev/rules.d"

[crash]
# Collect crash reports unless `t2 crash-reporter --off` says otherwise
enabled = true
"#
        .to_string()
    }
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    22
}

fn default_device_dir() -> String {
    "/dev/serial/by-id".to_string()
}

fn default_match() -> String {
    "Tessel".to_string()
}

fn default_rules_dir() -> String {
    "/etc/udev/rules.d".to_string()
}

impl Default for LanConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            port: default_port(),
        }
    }
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            device_dir: default_device_dir(),
            match_name: default_match(),
            rules_dir: default_rules_dir(),
        }
    }
}

impl Default for CrashConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_matches_defaults() {
        let parsed = ConfigManager::parse(
            &ConfigManager::generate_default_config(),
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(parsed, T2Config::default());
        assert!(ConfigManager::validate(&parsed).is_ok());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let parsed = ConfigManager::parse(
            "[lan]\nhosts = [\"bench=10.0.0.2\"]\n\n[usb]\nmatch = \"Board\"\n",
            Path::new("config.toml"),
        )
        .unwrap();
        assert_eq!(parsed.lan.hosts, vec!["bench=10.0.0.2".to_string()]);
        assert_eq!(parsed.lan.port, 22);
        assert_eq!(parsed.usb.match_name, "Board");
        assert_eq!(parsed.usb.device_dir, "/dev/serial/by-id");
        assert!(parsed.crash.enabled);
    }

    #[test]
    fn test_invalid_toml_names_file() {
        let err = ConfigManager::parse("[lan\nport = ", Path::new("/tmp/t2/config.toml")).unwrap_err();
        match err {
            ConfigError::ParseError { file, .. } => assert_eq!(file, "/tmp/t2/config.toml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = T2Config::default();
        config.lan.port = 0;
        assert!(matches!(
            ConfigManager::validate(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_home_precedence() {
        let home = ConfigManager::resolve_home(
            Some(PathBuf::from("/custom")),
            Some(PathBuf::from("/home/me")),
        )
        .unwrap();
        assert_eq!(home, PathBuf::from("/custom"));

        let home = ConfigManager::resolve_home(None, Some(PathBuf::from("/home/me"))).unwrap();
        assert_eq!(home, PathBuf::from("/home/me/.t2"));

        assert!(matches!(
            ConfigManager::resolve_home(Some(PathBuf::new()), None),
            Err(ConfigError::NoHome)
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = std::env::temp_dir().join(format!("t2-config-missing-{}", std::process::id()));
        let config = ConfigManager::load(&dir).unwrap();
        assert_eq!(config, T2Config::default());
    }
}
