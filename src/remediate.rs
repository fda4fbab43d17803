//! Detached best-effort retry after a total resolution miss: walks a wider
//! port set with the native client and feeds any hit into the identity
//! cache. Fire-and-forget; the Result already returned to the caller is
//! never touched.

use crate::cache::IdentityCache;
use crate::config::ResolverConfig;
use crate::model::Credential;
use crate::resolve::native::NativeApiStrategy;
use crate::resolve::DiscoveryStrategy;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub(crate) fn spawn(
    addr: IpAddr,
    credentials: Vec<Credential>,
    config: ResolverConfig,
    cache: Arc<IdentityCache>,
) {
    tokio::spawn(async move {
        let mut ports = config.api_ports.clone();
        for port in &config.remediation_ports {
            if !ports.contains(port) {
                ports.push(*port);
            }
        }

        let window = Duration::from_millis(config.attempt_ceiling_ms);
        let strategy = NativeApiStrategy::new(config);
        for cred in &credentials {
            for &port in &ports {
                if let Some(identity) = strategy.resolve(addr, cred, port, window).await {
                    info!(%addr, port, identity, "remediation recovered an identity");
                    cache.insert(addr, identity);
                    return;
                }
                // pace the sweep so the device is not hammered
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
        debug!(%addr, "remediation found nothing");
    });
}
