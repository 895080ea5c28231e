use anyhow::Result;
use std::path::{Path, PathBuf};
use t2_core::{CommandName, T2Config};
use t2_core::config::{CRASH_DIR, ConfigManager, KEY_FILE, PREFERENCES_FILE};
use tracing::warn;

use crate::services::JsonPreferences;

/// Help, unknown commands and commands that need no device
fn runs_locally(command: Option<&str>) -> bool {
    command
        .and_then(|name| name.parse::<CommandName>().ok())
        .is_none_or(|name| !name.needs_device())
}

/// Application context handed to the collaborators
///
/// Owns everything loaded from the t2 home directory. Collaborators borrow
/// from it, so it lives for the whole invocation.
pub struct Context {
    home: PathBuf,
    pub config: T2Config,
    pub preferences: JsonPreferences,
}

impl Context {
    /// Home from `T2_HOME` > `$HOME/.t2`
    ///
    /// `command` is the first argument. Commands that never reach a device
    /// still run on default settings when `config.toml` is broken, so
    /// `t2 install homedir` and `t2 help` keep working.
    pub fn from_env(command: Option<&str>) -> Result<Self> {
        Self::load(ConfigManager::home_from_env()?, command)
    }

    pub fn load(home: PathBuf, command: Option<&str>) -> Result<Self> {
        let config = match ConfigManager::load(&home) {
            Ok(config) => config,
            Err(err) if runs_locally(command) => {
                warn!("{}; using default settings", err);
                T2Config::default()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self::new(home, config))
    }

    pub fn new(home: PathBuf, config: T2Config) -> Self {
        let preferences = JsonPreferences::new(home.join(PREFERENCES_FILE));
        Self {
            home,
            config,
            preferences,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn key_path(&self) -> PathBuf {
        self.home.join(KEY_FILE)
    }

    pub fn crash_dir(&self) -> PathBuf {
        self.home.join(CRASH_DIR)
    }
}
