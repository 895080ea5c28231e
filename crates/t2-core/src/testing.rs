// crates/t2-core/src/testing.rs - Recording fakes for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::closer::Console;
use crate::controller::{Controller, CrashReporter, Installer, Invocation, OpResult};
use crate::discovery::{Device, DiscoveryError, Seeker, Transport};
use crate::error::OperationError;
use crate::preferences::{PreferenceError, PreferenceStore};

pub struct FakePreferences {
    values: HashMap<String, String>,
    reads: AtomicUsize,
}

impl FakePreferences {
    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn with(key: &str, value: &str) -> Self {
        let mut prefs = Self::empty();
        prefs.values.insert(key.to_string(), value.to_string());
        prefs
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreferenceStore for FakePreferences {
    async fn read(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.values.get(key).cloned())
    }
}

#[derive(Default)]
pub struct RecordingConsole {
    infos: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingConsole {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn total(&self) -> usize {
        self.infos().len() + self.warnings().len() + self.errors().len()
    }
}

impl Console for RecordingConsole {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub struct FakeSeeker {
    transport: Transport,
    names: Vec<String>,
    delay: Duration,
    calls: AtomicUsize,
    finished: AtomicBool,
}

impl FakeSeeker {
    pub fn new(transport: Transport, names: &[&str], delay: Duration) -> Self {
        Self {
            transport,
            names: names.iter().map(|n| n.to_string()).collect(),
            delay,
            calls: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Seeker for FakeSeeker {
    fn transport(&self) -> Transport {
        self.transport
    }

    async fn seek(&self) -> Result<Vec<Device>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(self
            .names
            .iter()
            .map(|name| Device {
                name: name.clone(),
                transport: self.transport,
                address: format!("{}-address", name),
            })
            .collect())
    }
}

/// Controller that records every call by operation name
#[derive(Default)]
pub struct FakeController {
    calls: Mutex<Vec<(String, Invocation)>>,
    failures: Mutex<HashMap<String, OperationError>>,
}

impl FakeController {
    pub fn fail_with(&self, operation: &str, err: OperationError) {
        self.failures
            .lock()
            .unwrap()
            .insert(operation.to_string(), err);
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == operation)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_invocation(&self, operation: &str) -> Option<Invocation> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == operation)
            .map(|(_, invocation)| invocation.clone())
    }

    fn record(&self, operation: &str, invocation: &Invocation) -> OpResult {
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), invocation.clone()));
        match self.failures.lock().unwrap().get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Controller for FakeController {
    async fn restart(&self, invocation: &Invocation) -> OpResult {
        self.record("restart", invocation)
    }
    async fn update(&self, invocation: &Invocation) -> OpResult {
        self.record("update", invocation)
    }
    async fn print_available_updates(&self, invocation: &Invocation) -> OpResult {
        self.record("printAvailableUpdates", invocation)
    }
    async fn restore(&self, invocation: &Invocation) -> OpResult {
        self.record("restore", invocation)
    }
    async fn rename(&self, invocation: &Invocation) -> OpResult {
        self.record("rename", invocation)
    }
    async fn setup_local(&self, invocation: &Invocation) -> OpResult {
        self.record("setupLocal", invocation)
    }
    async fn enable_access_point(&self, invocation: &Invocation) -> OpResult {
        self.record("enableAccessPoint", invocation)
    }
    async fn disable_access_point(&self, invocation: &Invocation) -> OpResult {
        self.record("disableAccessPoint", invocation)
    }
    async fn create_access_point(&self, invocation: &Invocation) -> OpResult {
        self.record("createAccessPoint", invocation)
    }
    async fn get_access_point_info(&self, invocation: &Invocation) -> OpResult {
        self.record("getAccessPointInfo", invocation)
    }
    async fn provision(&self, invocation: &Invocation) -> OpResult {
        self.record("provision", invocation)
    }
    async fn reboot(&self, invocation: &Invocation) -> OpResult {
        self.record("reboot", invocation)
    }
    async fn erase_script(&self, invocation: &Invocation) -> OpResult {
        self.record("eraseScript", invocation)
    }
    async fn get_wifi_info(&self, invocation: &Invocation) -> OpResult {
        self.record("getWifiInfo", invocation)
    }
    async fn print_available_networks(&self, invocation: &Invocation) -> OpResult {
        self.record("printAvailableNetworks", invocation)
    }
    async fn set_wifi_state(&self, invocation: &Invocation) -> OpResult {
        self.record("setWiFiState", invocation)
    }
    async fn connect_to_network(&self, invocation: &Invocation) -> OpResult {
        self.record("connectToNetwork", invocation)
    }
    async fn root(&self, invocation: &Invocation) -> OpResult {
        self.record("root", invocation)
    }
    async fn deploy(&self, invocation: &Invocation) -> OpResult {
        self.record("deploy", invocation)
    }
    async fn list_devices(&self, invocation: &Invocation) -> OpResult {
        self.record("listTessels", invocation)
    }
    async fn create_new_project(&self, invocation: &Invocation) -> OpResult {
        self.record("createNewProject", invocation)
    }
    async fn env_versions(&self, invocation: &Invocation) -> OpResult {
        self.record("envVersions", invocation)
    }
}

#[derive(Default)]
pub struct FakeCrashReporter {
    calls: Mutex<Vec<String>>,
    failing: Mutex<Option<String>>,
}

impl FakeCrashReporter {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_on(&self, action: &str) {
        *self.failing.lock().unwrap() = Some(action.to_string());
    }

    fn record(&self, action: &str) -> OpResult {
        self.calls.lock().unwrap().push(action.to_string());
        if self.failing.lock().unwrap().as_deref() == Some(action) {
            return Err(OperationError::new(format!("{} failed", action)));
        }
        Ok(())
    }
}

#[async_trait]
impl CrashReporter for FakeCrashReporter {
    async fn status(&self) -> OpResult {
        self.record("status")
    }
    async fn on(&self) -> OpResult {
        self.record("on")
    }
    async fn off(&self) -> OpResult {
        self.record("off")
    }
    async fn test(&self) -> OpResult {
        self.record("test")
    }
    async fn post(&self, _report: serde_json::Value) -> OpResult {
        self.record("post")
    }
    async fn submit(&self, _path: &str) -> OpResult {
        self.record("submit")
    }
}

#[derive(Default)]
pub struct FakeInstaller {
    calls: Mutex<Vec<(String, Invocation)>>,
}

impl FakeInstaller {
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        self.calls.lock().unwrap().last().map(|(_, inv)| inv.clone())
    }
}

#[async_trait]
impl Installer for FakeInstaller {
    async fn drivers(&self, invocation: &Invocation) -> OpResult {
        self.calls
            .lock()
            .unwrap()
            .push(("drivers".to_string(), invocation.clone()));
        Ok(())
    }

    async fn homedir(&self, invocation: &Invocation) -> OpResult {
        self.calls
            .lock()
            .unwrap()
            .push(("homedir".to_string(), invocation.clone()));
        Ok(())
    }
}
