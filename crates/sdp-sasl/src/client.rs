// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client-side token builder.
//!
//! The client speaks the legacy PLAIN layout (`NUL username NUL password`).
//! Deployments talking to the SDP server place the four-part credential
//! tuple in the username slot; this module does not build or inspect it.

use std::fmt;

use zeroize::Zeroize;

use crate::codec::encode_plain;
use crate::error::{SaslError, SaslResult};
use crate::mechanism::{MechanismProperties, SaslClient, SaslClientFactory, SDP_MECHANISM};

/// Build the single outbound token: `NUL username NUL password`.
pub fn build_initial_token(username: &str, password: &str) -> Vec<u8> {
    encode_plain("", username, password)
}

/// One-shot client: sends the initial token and nothing else.
pub struct PlainSaslClient {
    mechanism: &'static str,
    username: String,
    password: String,
    sent: bool,
}

impl PlainSaslClient {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mechanism: SDP_MECHANISM,
            username: username.into(),
            password: password.into(),
            sent: false,
        }
    }
}

impl SaslClient for PlainSaslClient {
    fn mechanism_name(&self) -> &str {
        self.mechanism
    }

    fn has_initial_response(&self) -> bool {
        true
    }

    fn evaluate_challenge(&mut self, _challenge: &[u8]) -> SaslResult<Option<Vec<u8>>> {
        if self.sent {
            return Ok(None);
        }
        self.sent = true;
        Ok(Some(build_initial_token(&self.username, &self.password)))
    }

    fn is_complete(&self) -> bool {
        self.sent
    }
}

impl fmt::Debug for PlainSaslClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainSaslClient")
            .field("mechanism", &self.mechanism)
            .field("username", &"<redacted>")
            .field("sent", &self.sent)
            .finish_non_exhaustive()
    }
}

impl Drop for PlainSaslClient {
    fn drop(&mut self) {
        self.username.zeroize();
        self.password.zeroize();
    }
}

/// Factory producing [`PlainSaslClient`] instances for the SDP mechanism.
#[derive(Debug, Clone, Copy, Default)]
pub struct SdpSaslClientFactory;

impl SaslClientFactory for SdpSaslClientFactory {
    fn mechanism_names(&self) -> Vec<&'static str> {
        vec![SDP_MECHANISM]
    }

    fn create_client(
        &self,
        mechanism: &str,
        username: &str,
        password: &str,
        _properties: &MechanismProperties,
    ) -> SaslResult<Box<dyn SaslClient>> {
        if !mechanism.eq_ignore_ascii_case(SDP_MECHANISM) {
            return Err(SaslError::UnsupportedMechanism(mechanism.to_string()));
        }
        Ok(Box::new(PlainSaslClient::new(username, password)))
    }
}
