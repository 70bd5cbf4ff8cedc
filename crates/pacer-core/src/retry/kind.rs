use std::collections::HashSet;
use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// High-level classification of a failure for retry purposes.
///
/// Callers map their own errors (HTTP status codes, IO failures, ...) into
/// these kinds via [`Classify`] or a classifier closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Operation timed out.
    Timeout,
    /// Peer or local limiter asked us to slow down.
    Throttled,
    /// Network-level failure (refused, reset, DNS).
    Connection,
    /// Remote side failed (e.g. HTTP 5xx).
    Server,
    /// Local IO failure.
    Io,
    /// Anything else.
    Other,
}

impl FailureKind {
    pub const ALL: [FailureKind; 6] = [
        FailureKind::Timeout,
        FailureKind::Throttled,
        FailureKind::Connection,
        FailureKind::Server,
        FailureKind::Io,
        FailureKind::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Throttled => "throttled",
            FailureKind::Connection => "connection",
            FailureKind::Server => "server",
            FailureKind::Io => "io",
            FailureKind::Other => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        FailureKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownFailureKind(s.to_string()))
    }
}

/// Errors that know which [`FailureKind`] they belong to.
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

impl Classify for io::Error {
    fn failure_kind(&self) -> FailureKind {
        match self.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => FailureKind::Timeout,
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::AddrNotAvailable => FailureKind::Connection,
            _ => FailureKind::Io,
        }
    }
}

/// Which failure kinds a policy retries. Everything else is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RetryOn {
    #[default]
    All,
    Kinds(HashSet<FailureKind>),
}

impl RetryOn {
    pub fn kinds(kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        RetryOn::Kinds(kinds.into_iter().collect())
    }

    pub fn is_retryable(&self, kind: FailureKind) -> bool {
        match self {
            RetryOn::All => true,
            RetryOn::Kinds(set) => set.contains(&kind),
        }
    }
}
