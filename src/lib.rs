//! rosident - RouterOS identity resolution
//!
//! This library resolves the human-readable identity of a MikroTik device:
//! - Native binary API client (length-prefixed word protocol, both login variants)
//! - Best-effort fallback channels: REST, WebFig scraping, SSH
//! - Budgeted orchestration: first success wins, under a global time cap
//! - TTL cache to short-circuit repeated lookups

pub mod cache;
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod model;
pub mod proto;
mod remediate;
pub mod resolve;

// Re-export commonly used types for convenience
pub use cache::IdentityCache;
pub use config::ResolverConfig;
pub use engine::IdentityResolver;
pub use errors::ResolveError;
pub use model::{AttemptRecord, Budget, Credential, Outcome, Resolution};
pub use proto::session::Session;
pub use resolve::DiscoveryStrategy;
