use std::time::{Duration, Instant};

/// A username/password candidate with a tag recording where it came from
/// (e.g. "settings", "cli"). The resolver never invents credentials; every
/// candidate is supplied by the caller.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub provenance: String,
}

impl Credential {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        provenance: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            provenance: provenance.into(),
        }
    }

    /// First two characters of the username, rest masked; safe for logs
    pub fn user_preview(&self) -> String {
        let prefix: String = self.username.chars().take(2).collect();
        format!("{}***", prefix)
    }
}

/// Remaining wall-clock allowance for one top-level resolution call.
/// Every sub-operation derives its own timeout from what is left here,
/// never from a fixed constant alone.
#[derive(Debug, Clone, Copy)]
pub struct Budget {
    started: Instant,
    total: Duration,
}

impl Budget {
    pub fn new(total: Duration) -> Self {
        Self {
            started: Instant::now(),
            total,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.started.elapsed())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Slice granted to the next attempt: capped by the ceiling and by what
    /// is left. Returns `None` once the floor can no longer be granted, so
    /// an attempt is never started with a degenerately small window.
    pub fn slice(&self, floor: Duration, ceiling: Duration) -> Option<Duration> {
        let remaining = self.remaining();
        if remaining < floor {
            None
        } else {
            Some(remaining.min(ceiling))
        }
    }
}

/// Why a resolution call ended the way it did. Callers need to tell
/// "ran out of time" apart from "nothing worked" and "nothing to try".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A strategy produced a non-empty identity
    Resolved,
    /// Every credential/strategy combination was tried and none succeeded
    Unresolved,
    /// The global budget ran out before the search space was exhausted
    BudgetExhausted,
    /// The caller supplied an empty credential list
    NoCredentials,
}

/// One strategy/port/credential attempt, kept for observability only
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub strategy: &'static str,
    pub port: u16,
    pub provenance: String,
    pub found: bool,
    pub elapsed: Duration,
}

/// Result of one top-level resolution call. Exactly one of these is
/// produced per call; the first successful attempt wins.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub identity: Option<String>,
    /// Label of the winning channel, e.g. "routeros-api (port 8728)"
    pub method: Option<String>,
    pub outcome: Outcome,
    pub elapsed: Duration,
    pub attempts: Vec<AttemptRecord>,
}

impl Resolution {
    pub(crate) fn empty(outcome: Outcome, elapsed: Duration, attempts: Vec<AttemptRecord>) -> Self {
        Self {
            identity: None,
            method: None,
            outcome,
            elapsed,
            attempts,
        }
    }
}
