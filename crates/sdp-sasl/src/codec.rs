// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Credential Token Wire Format
//!
//! The SDP mechanism reuses the PLAIN message layout (RFC 4616) but reads
//! its credential from the authentication-identity slot.
//!
//! # Wire Format
//!
//! ```text
//! shape A:  authentication_info NUL trailing
//! shape B:  authorization_id NUL authentication_info NUL trailing
//!
//! authentication_info = client_id SP timestamp SP sequence SP signature
//! ```
//!
//! The trailing field occupies the PLAIN password slot and is ignored.

use std::fmt;

use crate::error::ParseError;

/// Separator between message fields.
pub const FIELD_SEPARATOR: u8 = 0x00;

/// Separator between authentication info parts.
pub const AUTH_INFO_SEPARATOR: char = ' ';

/// Decoded authentication message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialToken {
    authorization_id: Option<String>,
    authentication_info: AuthenticationInfo,
}

impl CredentialToken {
    /// Identity the caller asks to act as. `None` means "same as authenticated".
    pub fn authorization_id(&self) -> Option<&str> {
        self.authorization_id.as_deref()
    }

    /// The four-part credential tuple.
    pub fn authentication_info(&self) -> &AuthenticationInfo {
        &self.authentication_info
    }
}

/// Credential tuple, still in string form.
///
/// Parts are trimmed and guaranteed non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticationInfo {
    client_id: String,
    timestamp: String,
    sequence: String,
    signature: String,
}

impl AuthenticationInfo {
    /// Split a raw `client_id timestamp sequence signature` string.
    ///
    /// Runs of separators count as one; empty parts are never produced.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let parts: Vec<&str> = raw
            .split(AUTH_INFO_SEPARATOR)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        match parts.as_slice() {
            [client_id, timestamp, sequence, signature] => Ok(Self {
                client_id: (*client_id).to_string(),
                timestamp: (*timestamp).to_string(),
                sequence: (*sequence).to_string(),
                signature: (*signature).to_string(),
            }),
            _ => Err(ParseError::TupleArity { got: parts.len() }),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Convert the numeric parts.
    ///
    /// # Errors
    ///
    /// `ParseError::NumericFormat` if the timestamp is not an `i64` or the
    /// sequence is not an `i32`.
    pub fn to_credential(&self) -> Result<Credential, ParseError> {
        Credential::from_parts(
            &self.client_id,
            &self.timestamp,
            &self.sequence,
            &self.signature,
        )
    }
}

impl fmt::Debug for AuthenticationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationInfo")
            .field("client_id", &self.client_id)
            .field("timestamp", &self.timestamp)
            .field("sequence", &self.sequence)
            .field("signature", &"<redacted>")
            .finish()
    }
}

/// Typed credential handed to the identity service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub client_id: String,
    pub timestamp: i64,
    pub sequence: i32,
    pub signature: String,
}

impl Credential {
    /// Build a credential from its string parts, trimming each one.
    ///
    /// # Errors
    ///
    /// `ParseError::NumericFormat` if `timestamp` is not an `i64` or
    /// `sequence` is not an `i32`.
    pub fn from_parts(
        client_id: &str,
        timestamp: &str,
        sequence: &str,
        signature: &str,
    ) -> Result<Self, ParseError> {
        let timestamp = timestamp.trim();
        let sequence = sequence.trim();

        Ok(Self {
            client_id: client_id.trim().to_string(),
            timestamp: timestamp
                .parse::<i64>()
                .map_err(|_| ParseError::NumericFormat {
                    field: "timestamp",
                    value: timestamp.to_string(),
                })?,
            sequence: sequence
                .parse::<i32>()
                .map_err(|_| ParseError::NumericFormat {
                    field: "sequence",
                    value: sequence.to_string(),
                })?,
            signature: signature.trim().to_string(),
        })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("timestamp", &self.timestamp)
            .field("sequence", &self.sequence)
            .field("signature", &"<redacted>")
            .finish()
    }
}

/// Decode an authentication message.
///
/// Pure and total: every input either decodes or maps to a [`ParseError`].
///
/// # Errors
///
/// - `ParseError::FieldCount` -- fewer than 2 or more than 3 fields
/// - `ParseError::TupleArity` -- authentication info is not 4 parts
pub fn decode(message: &[u8]) -> Result<CredentialToken, ParseError> {
    let mut fields = split_fields(message);

    if fields.len() < 2 || fields.len() > 3 {
        return Err(ParseError::FieldCount { got: fields.len() });
    }

    // Password slot
    fields.pop();
    let raw_info = fields.pop().unwrap_or_default();
    let authorization_id = fields.pop().filter(|id| !id.trim().is_empty());

    let authentication_info = AuthenticationInfo::parse(&raw_info)?;

    Ok(CredentialToken {
        authorization_id,
        authentication_info,
    })
}

/// Encode a PLAIN message: `[authorization_id] NUL username NUL password`.
pub fn encode_plain(authorization_id: &str, username: &str, password: &str) -> Vec<u8> {
    let mut message =
        Vec::with_capacity(authorization_id.len() + username.len() + password.len() + 2);
    message.extend_from_slice(authorization_id.as_bytes());
    message.push(FIELD_SEPARATOR);
    message.extend_from_slice(username.as_bytes());
    message.push(FIELD_SEPARATOR);
    message.extend_from_slice(password.as_bytes());
    message
}

/// Single pass over the message; the final (possibly empty) field is
/// always emitted. Each byte maps to the char of the same value, so
/// distinct inputs never collapse to the same field.
fn split_fields(message: &[u8]) -> Vec<String> {
    message
        .split(|b| *b == FIELD_SEPARATOR)
        .map(|field| field.iter().map(|&b| char::from(b)).collect())
        .collect()
}
