// crates/t2-core/src/discovery.rs - Policy-driven device discovery
//
// Each transport is probed through a Seeker. The timeout bounds a single
// probe; when it elapses that transport simply found nothing. Probing is
// read-only, so abandoning the losing probe of an `Either` race (dropping
// its future) leaves nothing half-done on any device.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::OperationError;
use crate::transport::{TransportMode, TransportPolicy};

/// Connectivity path to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Lan,
    Usb,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lan => f.write_str("LAN"),
            Self::Usb => f.write_str("USB"),
        }
    }
}

/// A device found by a seeker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub transport: Transport,
    /// `host:port` for LAN, device node path for USB
    pub address: String,
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("I/O error while probing: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Probe(String),
}

/// Finds devices on one transport
#[async_trait]
pub trait Seeker: Send + Sync {
    fn transport(&self) -> Transport;

    async fn seek(&self) -> Result<Vec<Device>, DiscoveryError>;
}

/// Find devices according to `policy`
pub async fn discover(policy: &TransportPolicy, lan: &dyn Seeker, usb: &dyn Seeker) -> Vec<Device> {
    debug!(mode = ?policy.mode(), timeout = ?policy.timeout, "starting discovery");

    match policy.mode() {
        TransportMode::LanOnly => probe(policy, lan).await,
        TransportMode::UsbOnly => probe(policy, usb).await,
        TransportMode::LanFirst => {
            let found = probe(policy, lan).await;
            if found.is_empty() {
                probe(policy, usb).await
            } else {
                found
            }
        }
        TransportMode::Either => first_found(probe(policy, lan), probe(policy, usb)).await,
    }
}

async fn probe(policy: &TransportPolicy, seeker: &dyn Seeker) -> Vec<Device> {
    let transport = seeker.transport();

    match tokio::time::timeout(policy.timeout, seeker.seek()).await {
        Ok(Ok(devices)) => devices
            .into_iter()
            .filter(|device| policy.accepts(&device.name))
            .collect(),
        Ok(Err(err)) => {
            warn!(%transport, "discovery failed: {}", err);
            Vec::new()
        }
        Err(_) => {
            debug!(%transport, "discovery timed out");
            Vec::new()
        }
    }
}

/// Run both probes, keep the first non-empty answer and drop the other
async fn first_found<A, B>(a: A, b: B) -> Vec<Device>
where
    A: Future<Output = Vec<Device>>,
    B: Future<Output = Vec<Device>>,
{
    tokio::pin!(a);
    tokio::pin!(b);

    tokio::select! {
        found = &mut a => if found.is_empty() { b.await } else { found },
        found = &mut b => if found.is_empty() { a.await } else { found },
    }
}

/// Pick the single device an operation should target
pub fn select_device(
    mut devices: Vec<Device>,
    name_filter: Option<&str>,
) -> Result<Device, OperationError> {
    match devices.len() {
        0 => Err(match name_filter {
            Some(name) => OperationError::new(format!("No device found with name \"{}\"", name)),
            None => OperationError::new("No devices found"),
        }),
        1 => Ok(devices.remove(0)),
        _ => {
            let names: Vec<String> = devices
                .iter()
                .map(|d| format!("{} ({})", d.name, d.transport))
                .collect();
            Err(OperationError::new(format!(
                "Multiple devices found: {}. Use --name to select one",
                names.join(", ")
            )))
        }
    }
}
