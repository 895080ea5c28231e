//! # t2 core
//!
//! Command-dispatch core for the `t2` device CLI.
//!
//! One invocation flows through the modules in this order:
//!
//! ```text
//! argv ─▶ subargs ─▶ registry/parser ─▶ resolve ─▶ transport ─▶ dispatch ─▶ closer
//! ```
//!
//! Everything that actually touches a device (discovery transports, the
//! device agent, crash reports, scaffolding) sits behind the traits in
//! [`controller`] and [`preferences`], so the binary wires real
//! implementations and tests wire recording fakes.

pub mod closer;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod dispatch;
pub mod error;
pub mod operation;
pub mod options;
pub mod parser;
pub mod preferences;
pub mod registry;
pub mod resolve;
pub mod subargs;
pub mod transport;

pub use closer::{Closer, Console, FailureReason, Termination, TracingConsole};
pub use config::{ConfigError, ConfigManager, T2Config};
pub use controller::{Controller, CrashReporter, Installer, Invocation, OpResult};
pub use discovery::{Device, DiscoveryError, Seeker, Transport, discover, select_device};
pub use dispatch::{Dispatcher, Plan, Services};
pub use error::{CliError, CliResult, ErrorCode, OperationError};
pub use operation::{CrashAction, Operation};
pub use options::{OptionValue, ResolvedOptions};
pub use preferences::{ENTRY_POINT_KEY, PreferenceError, PreferenceStore};
pub use registry::{CommandName, CommandRegistry, CommandSpec, OptionKind};
pub use transport::{TransportMode, TransportPolicy};

#[cfg(test)]
pub(crate) mod testing;
