// crates/t2-cli/src/services/mod.rs - Service layer modules
pub mod agent;
pub mod crash;
pub mod installer;
pub mod keys;
pub mod preferences;
pub mod project;
pub mod seekers;

pub use crash::FileCrashReporter;
pub use installer::SystemInstaller;
pub use preferences::JsonPreferences;
pub use seekers::{LanSeeker, UsbSeeker};
