// crates/t2-cli/src/services/installer.rs - `t2 install` tasks

use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use std::path::PathBuf;
use t2_core::config::{CONFIG_FILE, ConfigManager};
use t2_core::{Installer, Invocation, OpResult};
use tracing::info;

pub const UDEV_RULE_FILE: &str = "85-tessel.rules";

const UDEV_RULE: &str = "# t2 devices: allow non-root access over USB\n\
SUBSYSTEM==\"usb\", ATTR{idVendor}==\"1209\", ATTR{idProduct}==\"7551\", MODE=\"0666\"\n";

pub struct SystemInstaller {
    home: PathBuf,
    rules_dir: PathBuf,
}

impl SystemInstaller {
    pub fn new(home: PathBuf, rules_dir: PathBuf) -> Self {
        Self { home, rules_dir }
    }
}

#[async_trait]
impl Installer for SystemInstaller {
    async fn drivers(&self, _invocation: &Invocation) -> OpResult {
        if !cfg!(target_os = "linux") {
            info!("No drivers are needed on this platform");
            return Ok(());
        }

        let path = self.rules_dir.join(UDEV_RULE_FILE);
        tokio::fs::create_dir_all(&self.rules_dir)
            .await
            .with_context(|| format!("Cannot create {}", self.rules_dir.display()))?;
        tokio::fs::write(&path, UDEV_RULE)
            .await
            .with_context(|| format!("Cannot write {} (try again with sudo)", path.display()))?;

        info!("Installed udev rule: {}", path.display());
        info!("Reload rules with: udevadm control --reload-rules");
        Ok(())
    }

    async fn homedir(&self, _invocation: &Invocation) -> OpResult {
        tokio::fs::create_dir_all(&self.home)
            .await
            .with_context(|| format!("Cannot create {}", self.home.display()))?;

        let config = self.home.join(CONFIG_FILE);
        if tokio::fs::try_exists(&config).await.unwrap_or(false) {
            info!("Keeping existing {}", config.display());
        } else {
            tokio::fs::write(&config, ConfigManager::generate_default_config())
                .await
                .with_context(|| format!("Cannot write {}", config.display()))?;
            info!("Created {}", config.display());
        }

        info!("t2 home directory: {}", self.home.display());
        Ok(())
    }
}
