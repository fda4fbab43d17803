use crate::config::ResolverConfig;
use crate::model::Credential;
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

// Submodule declarations
pub mod native;
pub mod rest;
pub mod ssh;
pub mod webfig;

/// One discovery channel for a device identity.
///
/// Implementations never surface raw errors: every internal failure is
/// logged and collapsed into `None`, so one channel failing can never abort
/// the cascade for a device. Each call must finish within `window` and must
/// not leave a connection or handle open, whatever the outcome.
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    /// Channel name used in method labels and attempt records
    fn name(&self) -> &'static str;

    /// Ports this channel should be tried on, in order
    fn candidate_ports(&self, config: &ResolverConfig) -> Vec<u16>;

    /// Attempt to resolve the device identity; `None` on any failure
    async fn resolve(
        &self,
        addr: IpAddr,
        cred: &Credential,
        port: u16,
        window: Duration,
    ) -> Option<String>;
}
