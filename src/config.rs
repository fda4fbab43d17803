use crate::constants::*;

/// Configuration for identity resolution attempts
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Candidate RouterOS API ports, tried in order by the native strategy
    pub api_ports: Vec<u16>,

    /// HTTP port for the REST and WebFig strategies
    pub http_port: u16,

    /// HTTPS port for the REST strategy; `None` disables the https probes
    pub https_port: Option<u16>,

    /// SSH port for the remote-shell strategy
    pub ssh_port: u16,

    /// Total wall-clock budget for one resolution call, in milliseconds
    pub budget_ms: u64,

    /// Socket connect + login timeout for one session, in milliseconds
    pub connect_timeout_ms: u64,

    /// Per-command timeout on an established session, in milliseconds
    pub command_timeout_ms: u64,

    /// Minimum slice granted to a single attempt; when the remaining budget
    /// drops below this, the search stops instead of starving an attempt
    pub attempt_floor_ms: u64,

    /// Maximum slice granted to a single attempt
    pub attempt_ceiling_ms: u64,

    /// Time-to-live for cached identities, in milliseconds
    pub cache_ttl_ms: u64,

    /// Extra ports the detached remediation sweep retries after a total miss
    pub remediation_ports: Vec<u16>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_ports: vec![DEFAULT_API_PORT],
            http_port: DEFAULT_HTTP_PORT,
            https_port: None,
            ssh_port: DEFAULT_SSH_PORT,
            budget_ms: DEFAULT_BUDGET_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            attempt_floor_ms: DEFAULT_ATTEMPT_FLOOR_MS,
            attempt_ceiling_ms: DEFAULT_ATTEMPT_CEILING_MS,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            remediation_ports: vec![DEFAULT_API_PORT, API_SSL_PORT],
        }
    }
}
