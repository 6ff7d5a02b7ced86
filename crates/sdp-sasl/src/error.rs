// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy for the SDP mechanism.
//!
//! Three layers, each narrower than the next:
//!
//! - [`ParseError`] -- the token bytes are malformed
//! - [`AuthFailure`] -- the credential could not be verified
//! - [`SaslError`] -- what a transport sees from any mechanism operation

use thiserror::Error;

/// Malformed authentication message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The message did not split into 2 or 3 NUL-delimited fields.
    #[error("Invalid SASL/SDP response: expected 2 or 3 fields, got {got}")]
    FieldCount { got: usize },

    /// The authentication info did not split into 4 space-delimited parts.
    #[error("SDP auth params not specified: expected 4 parts, got {got}")]
    TupleArity { got: usize },

    /// A numeric sub-field (timestamp or sequence) is not an integer.
    #[error("SDP auth param '{field}' is not a valid integer: {value:?}")]
    NumericFormat { field: &'static str, value: String },
}

/// Credential verification failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// The credential tuple could not be converted to typed values.
    /// The identity service was not called.
    #[error("Malformed credential: {0}")]
    MalformedCredential(ParseError),

    /// The identity service declined the credential.
    #[error("Authentication for sdp mechanism failed: {0}")]
    Rejected(String),
}

/// Errors surfaced by mechanism and transport operations.
#[derive(Debug, Error)]
pub enum SaslError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// API misuse: an operation was called in a state that forbids it.
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),

    #[error("Unsupported mechanism: {0}")]
    UnsupportedMechanism(String),

    /// The peer aborted negotiation or sent an unexpected frame.
    #[error("SASL negotiation failed: {0}")]
    Negotiation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SaslError {
    /// True for failures caused by the peer's credential rather than API
    /// misuse or I/O.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Auth(_))
    }
}

/// Result alias for mechanism operations.
pub type SaslResult<T> = Result<T, SaslError>;
