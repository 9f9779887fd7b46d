//! Component D — discovery advertiser.
//!
//! Publishes one mDNS service record for the lifetime of the server and
//! withdraws it on shutdown. mDNS failures never fail the server (§4.D) —
//! every fallible operation here logs and degrades to "no discovery"
//! instead of propagating.

use std::net::IpAddr;
use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceInfo};

use relay_proto::{DEFAULT_SERVICE_TYPE, MDNS_INSTANCE_LABEL};

pub struct DiscoveryAdvertiser {
    daemon: ServiceDaemon,
    fullname: String,
    registered: bool,
}

impl DiscoveryAdvertiser {
    /// Start advertising `port` under `service_type` (default
    /// `_http._tcp.local.`). Returns `None` (not an error) if mDNS cannot be
    /// initialized at all — the caller logs and continues without discovery.
    pub fn start(port: u16, service_type: Option<&str>) -> Option<DiscoveryAdvertiser> {
        let service_type = service_type.unwrap_or(DEFAULT_SERVICE_TYPE).to_string();

        let daemon = match ServiceDaemon::new() {
            Ok(daemon) => daemon,
            Err(err) => {
                tracing::error!(%err, "failed to start mDNS daemon; discovery disabled");
                return None;
            }
        };

        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());

        let ip = match local_ip_address::local_ip() {
            Ok(IpAddr::V4(ip)) => ip,
            Ok(IpAddr::V6(_)) | Err(_) => {
                tracing::error!("could not determine a local IPv4 address; discovery disabled");
                return None;
            }
        };

        let instance_name = format!("{MDNS_INSTANCE_LABEL} ({hostname})");
        let host_fqdn = format!("{hostname}.local.");

        let info = match ServiceInfo::new(
            &service_type,
            &instance_name,
            &host_fqdn,
            ip,
            port,
            None,
        ) {
            Ok(info) => info,
            Err(err) => {
                tracing::error!(%err, "failed to build mDNS service record; discovery disabled");
                return None;
            }
        };

        let fullname = info.get_fullname().to_string();
        if let Err(err) = daemon.register(info) {
            tracing::error!(%err, "mDNS registration failed; discovery disabled");
            return None;
        }

        tracing::info!(instance_name, %ip, port, "mDNS service advertised");
        Some(DiscoveryAdvertiser { daemon, fullname, registered: true })
    }

    /// Withdraw the service record, with a short bounded timeout — failure
    /// here never blocks shutdown (§5 cancellation policy).
    pub async fn stop(mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        let fullname = self.fullname.clone();
        let daemon = self.daemon.clone();
        let unregister = tokio::task::spawn_blocking(move || daemon.unregister(&fullname));
        match tokio::time::timeout(Duration::from_secs(2), unregister).await {
            Ok(Ok(Ok(_))) => tracing::info!("mDNS service withdrawn"),
            Ok(Ok(Err(err))) => tracing::warn!(%err, "mDNS unregister failed"),
            Ok(Err(err)) => tracing::warn!(%err, "mDNS unregister task panicked"),
            Err(_) => tracing::warn!("mDNS unregister timed out"),
        }
    }
}
