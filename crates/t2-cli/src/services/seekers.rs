// crates/t2-cli/src/services/seekers.rs - LAN and USB device seekers

use async_trait::async_trait;
use std::path::PathBuf;
use t2_core::config::{LanConfig, UsbConfig};
use t2_core::{Device, DiscoveryError, Seeker, Transport};
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::{debug, trace};

/// Probes configured hosts with a TCP connect
pub struct LanSeeker {
    /// (name, host:port)
    hosts: Vec<(String, String)>,
}

impl LanSeeker {
    pub fn new(config: &LanConfig) -> Self {
        let hosts = config
            .hosts
            .iter()
            .map(|entry| parse_host(entry, config.port))
            .collect();
        Self { hosts }
    }
}

/// `name=address` or bare `address`; a missing port gets `default_port`
fn parse_host(entry: &str, default_port: u16) -> (String, String) {
    let (name, address) = match entry.split_once('=') {
        Some((name, address)) => (name.trim(), address.trim()),
        None => (entry.trim(), entry.trim()),
    };
    let address = if address.contains(':') {
        address.to_string()
    } else {
        format!("{}:{}", address, default_port)
    };
    (name.to_string(), address)
}

#[async_trait]
impl Seeker for LanSeeker {
    fn transport(&self) -> Transport {
        Transport::Lan
    }

    async fn seek(&self) -> Result<Vec<Device>, DiscoveryError> {
        let mut probes = JoinSet::new();
        for (name, address) in self.hosts.clone() {
            probes.spawn(async move {
                match TcpStream::connect(&address).await {
                    Ok(_) => Some(Device {
                        name,
                        transport: Transport::Lan,
                        address,
                    }),
                    Err(err) => {
                        trace!(%address, "no answer: {}", err);
                        None
                    }
                }
            });
        }

        let mut found = Vec::new();
        while let Some(result) = probes.join_next().await {
            match result {
                Ok(Some(device)) => found.push(device),
                Ok(None) => {}
                Err(err) => return Err(DiscoveryError::Probe(err.to_string())),
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = found.len(), "LAN probe finished");
        Ok(found)
    }
}

/// Lists serial device nodes whose names contain the match string
pub struct UsbSeeker {
    dir: PathBuf,
    match_name: String,
}

impl UsbSeeker {
    pub fn new(config: &UsbConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.device_dir),
            match_name: config.match_name.clone(),
        }
    }
}

#[async_trait]
impl Seeker for UsbSeeker {
    fn transport(&self) -> Transport {
        Transport::Usb
    }

    async fn seek(&self) -> Result<Vec<Device>, DiscoveryError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.contains(&self.match_name) {
                found.push(Device {
                    name,
                    transport: Transport::Usb,
                    address: entry.path().display().to_string(),
                });
            }
        }
        found.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = found.len(), dir = %self.dir.display(), "USB probe finished");
        Ok(found)
    }
}
