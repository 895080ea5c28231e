// crates/t2-cli/src/controller.rs - Controller backed by real devices
//
// Device operations all follow the same path:
//
//   discover (policy from --lan/--usb/--lanPrefer/--timeout)
//     -> select one device (--name)
//     -> open the agent link
//     -> one request, one reply
//
// Local operations (key, init, list bookkeeping) never open a link.

use anyhow::Context as AnyhowContext;
use async_trait::async_trait;
use console::{Term, style};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use t2_core::{
    Controller, Device, ENTRY_POINT_KEY, Invocation, OpResult, OperationError, Seeker, discover,
    select_device,
};
use tracing::{debug, info};

use crate::context::Context;
use crate::services::agent;
use crate::services::keys::{self, KeyStatus};
use crate::services::project::{self, Language};

pub const DEFAULT_KEY_PREFERENCE: &str = "key.default";

pub struct DeviceController<'a> {
    ctx: &'a Context,
    lan: &'a dyn Seeker,
    usb: &'a dyn Seeker,
}

fn output_enabled(invocation: &Invocation) -> bool {
    invocation.options.get_bool("output").unwrap_or(true)
}

fn spinner(enabled: bool) -> Option<ProgressBar> {
    if !enabled || !Term::stderr().is_term() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(template);
    }
    bar.set_message("Searching for devices...");
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

fn device_name_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").ok()).as_ref()
}

fn valid_device_name(name: &str) -> bool {
    device_name_pattern().is_some_and(|re| re.is_match(name))
}

/// Print an agent reply the way a user wants to read it
fn report(result: &Value) {
    match result {
        Value::Null => {}
        Value::String(text) => info!("{}", text),
        other => info!("{:#}", other),
    }
}

impl<'a> DeviceController<'a> {
    pub fn new(ctx: &'a Context, lan: &'a dyn Seeker, usb: &'a dyn Seeker) -> Self {
        Self { ctx, lan, usb }
    }

    async fn find_all(&self, invocation: &Invocation) -> Result<Vec<Device>, OperationError> {
        let policy = invocation
            .transport
            .as_ref()
            .ok_or_else(|| OperationError::new(format!("{} does not use a device", invocation.command)))?;

        let bar = spinner(output_enabled(invocation));
        let devices = discover(policy, self.lan, self.usb).await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
        debug!(count = devices.len(), "discovery finished");
        Ok(devices)
    }

    async fn locate(&self, invocation: &Invocation) -> Result<Device, OperationError> {
        let devices = self.find_all(invocation).await?;
        let name_filter = invocation
            .transport
            .as_ref()
            .and_then(|policy| policy.name_filter.as_deref());
        let device = select_device(devices, name_filter)?;
        info!("Connected to {} over {}", style(&device.name).bold(), device.transport);
        Ok(device)
    }

    async fn send(
        &self,
        device: &Device,
        op: &str,
        invocation: &Invocation,
        payload: Option<&Value>,
    ) -> Result<Value, OperationError> {
        let mut stream = agent::connect(device).await?;
        agent::request(&mut stream, op, &invocation.options, payload).await
    }

    /// Locate the device, run `op` there and report the reply
    async fn remote(&self, op: &str, invocation: &Invocation) -> OpResult {
        let device = self.locate(invocation).await?;
        let result = self.send(&device, op, invocation, None).await?;
        report(&result);
        Ok(())
    }
}

#[async_trait]
impl Controller for DeviceController<'_> {
    async fn restart(&self, invocation: &Invocation) -> OpResult {
        self.remote("restart", invocation).await
    }

    async fn update(&self, invocation: &Invocation) -> OpResult {
        self.remote("update", invocation).await
    }

    async fn print_available_updates(&self, invocation: &Invocation) -> OpResult {
        self.remote("printAvailableUpdates", invocation).await
    }

    async fn restore(&self, invocation: &Invocation) -> OpResult {
        self.remote("restore", invocation).await
    }

    async fn rename(&self, invocation: &Invocation) -> OpResult {
        if !invocation.options.flag("reset") {
            let Some(name) = invocation.options.get_str("newName") else {
                return Err(OperationError::new("A new name is required (or pass --reset)"));
            };
            if !valid_device_name(name) {
                return Err(OperationError::new(format!(
                    "Invalid name \"{}\": use up to 32 letters, digits, '-' or '_'",
                    name
                )));
            }
        }
        self.remote("rename", invocation).await
    }

    async fn setup_local(&self, invocation: &Invocation) -> OpResult {
        let path = self.ctx.key_path();
        if invocation.options.flag("generate") {
            match keys::ensure_key(&path).await? {
                KeyStatus::Created(path) => info!("Created key {}", path.display()),
                KeyStatus::Existing(path) => info!("Key already exists: {}", path.display()),
            }
            return Ok(());
        }

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!("Key: {}", path.display());
            Ok(())
        } else {
            Err(OperationError::new("No key found. Create one with: t2 key --generate"))
        }
    }

    async fn enable_access_point(&self, invocation: &Invocation) -> OpResult {
        self.remote("enableAccessPoint", invocation).await
    }

    async fn disable_access_point(&self, invocation: &Invocation) -> OpResult {
        self.remote("disableAccessPoint", invocation).await
    }

    async fn create_access_point(&self, invocation: &Invocation) -> OpResult {
        self.remote("createAccessPoint", invocation).await
    }

    async fn get_access_point_info(&self, invocation: &Invocation) -> OpResult {
        self.remote("getAccessPointInfo", invocation).await
    }

    async fn provision(&self, invocation: &Invocation) -> OpResult {
        self.remote("provision", invocation).await
    }

    async fn reboot(&self, invocation: &Invocation) -> OpResult {
        self.remote("reboot", invocation).await
    }

    async fn erase_script(&self, invocation: &Invocation) -> OpResult {
        self.remote("eraseScript", invocation).await
    }

    async fn get_wifi_info(&self, invocation: &Invocation) -> OpResult {
        self.remote("getWifiInfo", invocation).await
    }

    async fn print_available_networks(&self, invocation: &Invocation) -> OpResult {
        self.remote("printAvailableNetworks", invocation).await
    }

    async fn set_wifi_state(&self, invocation: &Invocation) -> OpResult {
        self.remote("setWiFiState", invocation).await
    }

    async fn connect_to_network(&self, invocation: &Invocation) -> OpResult {
        self.remote("connectToNetwork", invocation).await
    }

    async fn root(&self, invocation: &Invocation) -> OpResult {
        self.remote("root", invocation).await
    }

    async fn deploy(&self, invocation: &Invocation) -> OpResult {
        let entry_point = invocation
            .options
            .get_str("entryPoint")
            .ok_or_else(|| OperationError::new("Cannot determine entry point file name"))?;

        let source = tokio::fs::read_to_string(entry_point)
            .await
            .with_context(|| format!("Cannot read entry point {}", entry_point))?;
        let payload = json!({
            "entryPoint": entry_point,
            "source": source,
        });

        let device = self.locate(invocation).await?;
        let result = self.send(&device, "deploy", invocation, Some(&payload)).await?;
        report(&result);

        self.ctx
            .preferences
            .write(ENTRY_POINT_KEY, entry_point)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(())
    }

    async fn list_devices(&self, invocation: &Invocation) -> OpResult {
        if let Some(key) = invocation.options.get_str("key") {
            let absolute = std::path::absolute(PathBuf::from(key)).unwrap_or_else(|_| PathBuf::from(key));
            self.ctx
                .preferences
                .write(DEFAULT_KEY_PREFERENCE, &absolute.display().to_string())
                .await
                .map_err(anyhow::Error::from)?;
            debug!(key = %absolute.display(), "registered default key");
        }

        let devices = self.find_all(invocation).await?;
        if devices.is_empty() {
            return Err(OperationError::new("No devices found"));
        }

        if output_enabled(invocation) {
            for device in &devices {
                println!("{}\t{}", style(&device.name).bold(), device.transport);
            }
        }
        Ok(())
    }

    async fn create_new_project(&self, invocation: &Invocation) -> OpResult {
        let lang = Language::parse(invocation.options.get_str("lang").unwrap_or("js"))?;
        let dir = PathBuf::from(invocation.options.get_str("directory").unwrap_or("."));

        let created = project::scaffold(&dir, lang)?;
        for path in &created {
            info!("Created {}", path.display());
        }
        let entry = match lang {
            Language::JavaScript => "index.js",
            Language::Rust => "src/main.rs",
        };
        info!("Deploy it with: t2 run {}", dir.join(entry).display());
        Ok(())
    }

    async fn env_versions(&self, invocation: &Invocation) -> OpResult {
        info!("t2-cli: {}", env!("CARGO_PKG_VERSION"));

        let device = match self.locate(invocation).await {
            Ok(device) => device,
            Err(err) => {
                info!("No device versions available: {}", err);
                return Ok(());
            }
        };
        let result = self.send(&device, "envVersions", invocation, None).await?;
        report(&result);
        Ok(())
    }
}
