use std::io;

use thiserror::Error;

/// Errors produced by the statsd client.
///
/// Only `InvalidSample` and `AddrParse` ever reach callers: the first from
/// metric calls with unencodable input, the second from client construction.
/// `Io` covers socket failures, which are reported through the client's
/// error channel and never returned from a metric call.
#[derive(Debug, Error)]
pub enum StatsdError {
    /// A sample that cannot be encoded: empty or delimiter-carrying name,
    /// non-finite value, or a sample rate outside (0, 1].
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// The destination address could not be resolved.
    #[error("address parsing error: {0}")]
    AddrParse(String),

    /// A socket-level send failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}
