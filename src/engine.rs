use crate::cache::IdentityCache;
use crate::config::ResolverConfig;
use crate::model::{AttemptRecord, Budget, Credential, Outcome, Resolution};
use crate::remediate;
use crate::resolve::native::NativeApiStrategy;
use crate::resolve::rest::RestStrategy;
use crate::resolve::ssh::SshStrategy;
use crate::resolve::webfig::WebFigStrategy;
use crate::resolve::DiscoveryStrategy;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info};

/// Orchestrates credential x strategy x port attempts for one device under
/// a global wall-clock budget. Holds the shared identity cache, so repeated
/// lookups of the same address inside the TTL window cost nothing.
pub struct IdentityResolver {
    config: ResolverConfig,
    cache: Arc<IdentityCache>,
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
}

impl IdentityResolver {
    /// Build a resolver with the full strategy cascade: native API first,
    /// then REST, WebFig scraping and SSH
    pub fn new(config: ResolverConfig) -> Self {
        let strategies: Vec<Box<dyn DiscoveryStrategy>> = vec![
            Box::new(NativeApiStrategy::new(config.clone())),
            Box::new(RestStrategy::new(config.clone())),
            Box::new(WebFigStrategy::new(config.clone())),
            Box::new(SshStrategy::new(config.clone())),
        ];
        Self::with_strategies(config, strategies)
    }

    /// Build a resolver over an explicit strategy list; attempts are made
    /// in exactly the order given here
    pub fn with_strategies(
        config: ResolverConfig,
        strategies: Vec<Box<dyn DiscoveryStrategy>>,
    ) -> Self {
        let cache = Arc::new(IdentityCache::new(Duration::from_millis(config.cache_ttl_ms)));
        Self {
            config,
            cache,
            strategies,
        }
    }

    /// Resolve the identity of one device.
    ///
    /// Iteration is strictly sequential: for each credential candidate, each
    /// strategy is tried on each of its candidate ports, and the first
    /// non-empty identity wins. Before every attempt the remaining budget is
    /// checked; an attempt only starts while the configured floor can still
    /// be granted, and its window never exceeds what is left.
    ///
    /// This never fails for "could not resolve"; the outcome field tells
    /// `Unresolved`, `BudgetExhausted` and `NoCredentials` apart. Callers
    /// may run many devices concurrently; a caller sweeping a fleet is
    /// expected to throttle itself (bounded in-flight devices, a delay
    /// between them), which is not this function's concern.
    pub async fn resolve(&self, addr: IpAddr, credentials: &[Credential]) -> Resolution {
        let budget = Budget::new(Duration::from_millis(self.config.budget_ms));

        if credentials.is_empty() {
            info!(%addr, "no credential candidates supplied");
            return Resolution::empty(Outcome::NoCredentials, budget.elapsed(), Vec::new());
        }

        if let Some(identity) = self.cache.get(addr) {
            debug!(%addr, identity, "identity cache hit");
            return Resolution {
                identity: Some(identity),
                method: Some("cache".to_string()),
                outcome: Outcome::Resolved,
                elapsed: budget.elapsed(),
                attempts: Vec::new(),
            };
        }

        let floor = Duration::from_millis(self.config.attempt_floor_ms);
        let ceiling = Duration::from_millis(self.config.attempt_ceiling_ms);
        let mut attempts: Vec<AttemptRecord> = Vec::new();
        let mut ran_dry = false;

        'search: for cred in credentials {
            for strategy in &self.strategies {
                for port in strategy.candidate_ports(&self.config) {
                    let Some(window) = budget.slice(floor, ceiling) else {
                        ran_dry = true;
                        break 'search;
                    };

                    let started = Instant::now();
                    let identity = timeout(window, strategy.resolve(addr, cred, port, window))
                        .await
                        .ok()
                        .flatten()
                        .map(|identity| identity.trim().to_string())
                        .filter(|identity| !identity.is_empty());
                    let elapsed = started.elapsed();

                    info!(
                        strategy = strategy.name(),
                        %addr,
                        port,
                        user = %cred.user_preview(),
                        found = identity.is_some(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "identity attempt"
                    );
                    attempts.push(AttemptRecord {
                        strategy: strategy.name(),
                        port,
                        provenance: cred.provenance.clone(),
                        found: identity.is_some(),
                        elapsed,
                    });

                    if let Some(identity) = identity {
                        self.cache.insert(addr, identity.clone());
                        return Resolution {
                            identity: Some(identity),
                            method: Some(format!("{} (port {port})", strategy.name())),
                            outcome: Outcome::Resolved,
                            elapsed: budget.elapsed(),
                            attempts,
                        };
                    }
                }
            }
        }

        if ran_dry {
            info!(%addr, elapsed_ms = budget.elapsed().as_millis() as u64, "budget exhausted");
            return Resolution::empty(Outcome::BudgetExhausted, budget.elapsed(), attempts);
        }

        // everything was tried and nothing answered; hand the address to the
        // detached remediation sweep and report the miss
        remediate::spawn(
            addr,
            credentials.to_vec(),
            self.config.clone(),
            Arc::clone(&self.cache),
        );
        Resolution::empty(Outcome::Unresolved, budget.elapsed(), attempts)
    }

    /// Drop cache entries past their TTL
    pub fn purge_cache(&self) {
        self.cache.purge_expired();
    }
}
