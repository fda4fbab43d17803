/// Default RouterOS API port (plain, no TLS)
pub const DEFAULT_API_PORT: u16 = 8728;

/// RouterOS API-SSL port, tried by the remediation sweep
pub const API_SSL_PORT: u16 = 8729;

/// Default WebFig / REST HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default SSH port
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Hard cap for one top-level resolution call
pub const DEFAULT_BUDGET_MS: u64 = 45_000;

/// Socket connect + login window for one session
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 6_000;

/// Window for one tagged command to reach its terminal sentence
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 20_000;

/// Smallest slice an attempt is ever granted; if the remaining budget
/// cannot cover it, the attempt is not started at all
pub const DEFAULT_ATTEMPT_FLOOR_MS: u64 = 3_000;

/// Largest slice any single attempt is granted
pub const DEFAULT_ATTEMPT_CEILING_MS: u64 = 10_000;

/// How long a resolved identity short-circuits repeat lookups
pub const DEFAULT_CACHE_TTL_MS: u64 = 5 * 60 * 1_000;

/// REST endpoints that expose the identity on RouterOS v7
pub const REST_IDENTITY_PATHS: &[&str] = &[
    "/rest/system/identity",
    "/rest/system/identity/print",
    "/rest/system/identity/",
];

/// WebFig pages and internal endpoints that leak the identity
pub const WEBFIG_IDENTITY_PATHS: &[&str] = &[
    "/webfig/api/system/identity",
    "/webfig/api/system",
    "/webfig/api/status",
    "/webfig/system/identity",
    "/webfig/data/system/identity",
    "/webfig/json/system/identity",
    "/webfig/system",
    "/webfig/status",
];

/// User-Agent presented to WebFig; some builds gate on a browser-ish string
pub const WEBFIG_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
