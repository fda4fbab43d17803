use super::DiscoveryStrategy;
use crate::config::ResolverConfig;
use crate::model::Credential;
use crate::proto::session::Session;
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Native binary API channel: connect, log in, run
/// `/system/identity/print`, disconnect. The most reliable source when the
/// API port is reachable, so the orchestrator tries it first across every
/// candidate port.
pub struct NativeApiStrategy {
    config: ResolverConfig,
}

impl NativeApiStrategy {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DiscoveryStrategy for NativeApiStrategy {
    fn name(&self) -> &'static str {
        "routeros-api"
    }

    fn candidate_ports(&self, config: &ResolverConfig) -> Vec<u16> {
        config.api_ports.clone()
    }

    async fn resolve(
        &self,
        addr: IpAddr,
        cred: &Credential,
        port: u16,
        window: Duration,
    ) -> Option<String> {
        let connect_window = window.min(Duration::from_millis(self.config.connect_timeout_ms));
        let command_window = window.min(Duration::from_millis(self.config.command_timeout_ms));

        let session =
            match Session::connect(addr, port, cred, connect_window, command_window).await {
                Ok(session) => session,
                Err(err) => {
                    debug!(%addr, port, user = %cred.user_preview(), %err, "native API connect failed");
                    return None;
                }
            };

        let identity = match session.system_identity().await {
            Ok(identity) => identity,
            Err(err) => {
                debug!(%addr, port, %err, "native API identity command failed");
                None
            }
        };
        session.disconnect().await;
        identity
    }
}
