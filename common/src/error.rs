//! # Error Taxonomy
//!
//! Only [`ScanError`] aborts a run. [`ConnectionFailure`] and
//! [`VerificationFailure`] are recovered where they happen and end up as a
//! negative classification, never as an error surfaced to the caller.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Fatal errors. Both are raised before any packet leaves the host.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("decoder '{program}' is not available: {source}")]
    DecoderUnavailable {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ScanError {
    pub fn invalid_address(input: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single connection attempt against a target or candidate went wrong.
#[derive(Debug, Error)]
pub enum ConnectionFailure {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection refused")]
    Refused,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("rejected with status {status}")]
    Rejected { status: u16 },
}

impl ConnectionFailure {
    /// Maps a connect error onto the refused/other split the scanner needs.
    pub fn from_connect(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => Self::Refused,
            _ => Self::Io(err),
        }
    }
}

/// The decoder could not pull a frame out of a candidate stream.
#[derive(Debug, Error)]
pub enum VerificationFailure {
    #[error("failed to spawn decoder: {0}")]
    Spawn(#[source] io::Error),

    #[error("decoder exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("decoder timed out after {0:?}")]
    Timeout(Duration),

    #[error("decoder produced no frame")]
    EmptyOutput,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}
