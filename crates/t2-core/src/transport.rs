// crates/t2-core/src/transport.rs - Connection policy for device discovery
//
// | --lan | --usb | --lanPrefer | mode     |
// |-------|-------|-------------|----------|
// | yes   | no    | any         | LanOnly  |
// | no    | yes   | any         | UsbOnly  |
// | no    | no    | true        | LanFirst |
// | no    | no    | false       | Either   |
//
// Giving both `--lan` and `--usb` is the same as giving neither.

use serde::Serialize;
use std::time::Duration;

use crate::error::{CliError, CliResult};
use crate::options::ResolvedOptions;

/// How discovery is allowed to reach a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransportMode {
    LanOnly,
    UsbOnly,
    /// LAN first, USB only when LAN finds nothing
    LanFirst,
    /// Both probed concurrently, first answer wins
    Either,
}

/// Effective transport policy for one invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportPolicy {
    pub use_lan: bool,
    pub use_usb: bool,
    pub prefer_lan: bool,
    pub timeout: Duration,
    pub name_filter: Option<String>,
}

impl TransportPolicy {
    pub fn from_options(options: &ResolvedOptions) -> CliResult<Self> {
        let lan = options.flag("lan");
        let usb = options.flag("usb");
        let prefer_lan = options.flag("lanPrefer");

        let (use_lan, use_usb) = match (lan, usb) {
            (true, false) => (true, false),
            (false, true) => (false, true),
            _ => (true, true),
        };

        let seconds = options.get_number("timeout").unwrap_or(5.0);
        let timeout = Duration::try_from_secs_f64(seconds).map_err(|_| {
            CliError::validation(
                "--timeout",
                format!("`{}` is not a valid number of seconds", seconds),
            )
        })?;

        let name_filter = options
            .get_str("name")
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(Self {
            use_lan,
            use_usb,
            prefer_lan,
            timeout,
            name_filter,
        })
    }

    pub fn mode(&self) -> TransportMode {
        match (self.use_lan, self.use_usb) {
            (true, false) => TransportMode::LanOnly,
            (false, true) => TransportMode::UsbOnly,
            _ if self.prefer_lan => TransportMode::LanFirst,
            _ => TransportMode::Either,
        }
    }

    /// Whether a discovered device passes the `--name` filter
    pub fn accepts(&self, device_name: &str) -> bool {
        self.name_filter
            .as_deref()
            .is_none_or(|wanted| wanted == device_name)
    }
}
