// crates/t2-core/src/controller.rs - External operation contracts
//
// The dispatcher knows *which* operation to run; these traits are *how*.
// Implementations live in the binary crate (real devices, files on disk)
// and in tests (recording fakes). Every method receives the invocation by
// shared reference, so an operation can read but never alter its options.

use async_trait::async_trait;

use crate::error::OperationError;
use crate::options::ResolvedOptions;
use crate::registry::CommandName;
use crate::transport::TransportPolicy;

/// Result of one external operation
pub type OpResult = Result<(), OperationError>;

/// Read-only input handed to an external operation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: CommandName,
    pub options: ResolvedOptions,
    /// Present for commands that have to locate a device
    pub transport: Option<TransportPolicy>,
}

/// Device-facing operations
#[async_trait]
pub trait Controller: Send + Sync {
    async fn restart(&self, invocation: &Invocation) -> OpResult;
    async fn update(&self, invocation: &Invocation) -> OpResult;
    async fn print_available_updates(&self, invocation: &Invocation) -> OpResult;
    async fn restore(&self, invocation: &Invocation) -> OpResult;
    async fn rename(&self, invocation: &Invocation) -> OpResult;
    async fn setup_local(&self, invocation: &Invocation) -> OpResult;
    async fn enable_access_point(&self, invocation: &Invocation) -> OpResult;
    async fn disable_access_point(&self, invocation: &Invocation) -> OpResult;
    async fn create_access_point(&self, invocation: &Invocation) -> OpResult;
    async fn get_access_point_info(&self, invocation: &Invocation) -> OpResult;
    async fn provision(&self, invocation: &Invocation) -> OpResult;
    async fn reboot(&self, invocation: &Invocation) -> OpResult;
    async fn erase_script(&self, invocation: &Invocation) -> OpResult;
    async fn get_wifi_info(&self, invocation: &Invocation) -> OpResult;
    async fn print_available_networks(&self, invocation: &Invocation) -> OpResult;
    async fn set_wifi_state(&self, invocation: &Invocation) -> OpResult;
    async fn connect_to_network(&self, invocation: &Invocation) -> OpResult;
    async fn root(&self, invocation: &Invocation) -> OpResult;
    /// `run` and `push`, told apart by the `push` option
    async fn deploy(&self, invocation: &Invocation) -> OpResult;
    async fn list_devices(&self, invocation: &Invocation) -> OpResult;
    async fn create_new_project(&self, invocation: &Invocation) -> OpResult;
    async fn env_versions(&self, invocation: &Invocation) -> OpResult;
}

/// Crash report collection
#[async_trait]
pub trait CrashReporter: Send + Sync {
    async fn status(&self) -> OpResult;
    async fn on(&self) -> OpResult;
    async fn off(&self) -> OpResult;
    /// Post a synthetic report to check the pipeline end to end
    async fn test(&self) -> OpResult;
    async fn post(&self, report: serde_json::Value) -> OpResult;
    async fn submit(&self, path: &str) -> OpResult;
}

/// Host setup tasks behind `t2 install`
#[async_trait]
pub trait Installer: Send + Sync {
    async fn drivers(&self, invocation: &Invocation) -> OpResult;
    async fn homedir(&self, invocation: &Invocation) -> OpResult;
}
