use thiserror::Error;

/// Failures a single attempt can produce. Resolution-level states such as
/// an exhausted budget are reported through `model::Outcome`, not here.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Connection Error: {0}")]
    ConnectionError(String),

    #[error("Auth Error: {0}")]
    AuthError(String),

    #[error("Protocol Error: {0}")]
    ProtocolError(String),

    #[error("Command Timeout: no terminal reply for tag {tag} within {ms}ms")]
    CommandTimeout { tag: u32, ms: u64 },

    #[error("Command Error: {0}")]
    CommandError(String),

    #[error("Error: {0}")]
    Other(String),
}
