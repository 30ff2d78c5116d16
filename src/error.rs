//! # Echoflare Error Handling
//!
//! This module defines the `EchoflareError` enum, which represents the
//! different error types that can occur across the ground-station toolkit.

use thiserror::Error;

/// Represents the different error types that can occur in the Echoflare crate.
#[derive(Debug, Error)]
pub enum EchoflareError {
    /// Malformed binary input: truncated buffer, wrong packet type, invalid
    /// WAV parameters, bad AX.25 address length, etc.
    #[error("Format error: {0}")]
    FormatError(String),

    /// HMAC verification failed on a telecommand.
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// The Robot36 sync chain came up short of a decodable image.
    #[error("SSTV sync failure: {0}")]
    SyncFailure(String),

    /// File open/read/write failure at a boundary.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A WAV file failed to parse or did not meet the expected format.
    #[error("WAV error: {0}")]
    WavError(String),

    /// An HTTP request to the ground-station site failed.
    #[error("Ground station request failed: {0}")]
    RequestError(String),

    /// A wait-for-condition call (e.g. wait_for_elevation) timed out.
    #[error("Timed out waiting for: {0}")]
    Timeout(String),

    /// A catch-all for uncategorized cases.
    #[error("Other error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for EchoflareError {
    fn from(e: reqwest::Error) -> Self {
        EchoflareError::RequestError(e.to_string())
    }
}

impl From<hound::Error> for EchoflareError {
    fn from(e: hound::Error) -> Self {
        EchoflareError::WavError(e.to_string())
    }
}
