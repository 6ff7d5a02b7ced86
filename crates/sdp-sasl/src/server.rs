// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SDP server mechanism.
//!
//! Single-round exchange:
//!
//! ```text
//! Client                                 Server
//!    |                                      |
//!    |------- credential token ------------>|
//!    |                                      | decode -> verify
//!    |<------ empty acknowledgement --------|
//!    |                                      |
//! ```
//!
//! # State Machine
//!
//! ```text
//! AwaitingToken --(verified)--> Completed
//!       |
//!       +--(parse/auth error)--> Failed
//! ```
//!
//! Both terminal states reject further tokens with `IllegalState`.

use crate::codec;
use crate::error::{SaslError, SaslResult};
use crate::mechanism::{MechanismProperties, SaslServer, SaslServerFactory, SDP_MECHANISM};
use crate::verifier::IdentityVerifier;

#[derive(Debug, Clone, PartialEq, Eq)]
enum MechanismState {
    /// Waiting for the single client token
    AwaitingToken,
    /// Credential verified
    Completed { authorized_id: String },
    /// Exchange failed
    Failed(String),
}

/// Server-side SDP mechanism for one connection attempt.
#[derive(Debug)]
pub struct SdpSaslServer {
    state: MechanismState,
    verifier: IdentityVerifier,
}

impl SdpSaslServer {
    pub fn new(verifier: IdentityVerifier) -> Self {
        Self {
            state: MechanismState::AwaitingToken,
            verifier,
        }
    }

    /// Process the client token.
    ///
    /// # Returns
    ///
    /// An empty acknowledgement; the mechanism never sends data back.
    ///
    /// # Errors
    ///
    /// - `SaslError::Parse` -- malformed token (state becomes `Failed`)
    /// - `SaslError::Auth` -- identity service rejected it (state becomes `Failed`)
    /// - `SaslError::IllegalState` -- called after a terminal state; the
    ///   verifier is not invoked
    pub fn process_token(&mut self, token: &[u8]) -> SaslResult<Vec<u8>> {
        if self.state != MechanismState::AwaitingToken {
            return Err(SaslError::IllegalState(
                "SDP SASL authentication exchange already finished",
            ));
        }

        match self.authenticate(token) {
            Ok(authorized_id) => {
                tracing::debug!(
                    "successfully authenticated user {} with sdp auth",
                    authorized_id
                );
                self.state = MechanismState::Completed { authorized_id };
                Ok(Vec::new())
            }
            Err(e) => {
                self.state = MechanismState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn authenticate(&self, token: &[u8]) -> SaslResult<String> {
        let token = codec::decode(token)?;
        let info = token.authentication_info();
        tracing::debug!(
            "decoded sdp token for client_id={} authz_present={}",
            info.client_id(),
            token.authorization_id().is_some()
        );

        // Numeric check happens here so a malformed tuple never reaches the service
        let credential = info.to_credential()?;
        let principal = self.verifier.verify_credential(&credential)?;
        tracing::debug!("authenticated user: {}", principal.name);

        Ok(token
            .authorization_id()
            .map_or(principal.name, str::to_string))
    }

    /// True once the credential has been verified.
    pub fn is_completed(&self) -> bool {
        matches!(self.state, MechanismState::Completed { .. })
    }

    /// True if the exchange failed.
    pub fn is_failed(&self) -> bool {
        matches!(self.state, MechanismState::Failed(_))
    }

    /// Reason recorded when the exchange failed.
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            MechanismState::Failed(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    fn ensure_complete(&self) -> SaslResult<&str> {
        match &self.state {
            MechanismState::Completed { authorized_id } => Ok(authorized_id.as_str()),
            _ => Err(SaslError::IllegalState(
                "SDP SASL authentication exchange has not completed",
            )),
        }
    }
}

impl SaslServer for SdpSaslServer {
    fn mechanism_name(&self) -> &str {
        SDP_MECHANISM
    }

    fn evaluate_response(&mut self, response: &[u8]) -> SaslResult<Vec<u8>> {
        self.process_token(response)
    }

    fn is_complete(&self) -> bool {
        self.is_completed()
    }

    fn authorization_id(&self) -> SaslResult<&str> {
        self.ensure_complete()
    }

    fn wrap(&self, outgoing: &[u8]) -> SaslResult<Vec<u8>> {
        self.ensure_complete()?;
        Ok(outgoing.to_vec())
    }

    fn unwrap(&self, incoming: &[u8]) -> SaslResult<Vec<u8>> {
        self.ensure_complete()?;
        Ok(incoming.to_vec())
    }

    fn negotiated_property(&self, _name: &str) -> SaslResult<Option<String>> {
        self.ensure_complete()?;
        Ok(None)
    }

    fn dispose(&mut self) {}
}

/// Factory producing a fresh [`SdpSaslServer`] per connection.
#[derive(Debug, Clone)]
pub struct SdpSaslServerFactory {
    verifier: IdentityVerifier,
}

impl SdpSaslServerFactory {
    pub fn new(verifier: IdentityVerifier) -> Self {
        Self { verifier }
    }
}

impl SaslServerFactory for SdpSaslServerFactory {
    fn mechanism_names(&self) -> Vec<&'static str> {
        vec![SDP_MECHANISM]
    }

    fn create_server(
        &self,
        mechanism: &str,
        _protocol: &str,
        _server_name: &str,
        _properties: &MechanismProperties,
    ) -> SaslResult<Box<dyn SaslServer>> {
        if !mechanism.eq_ignore_ascii_case(SDP_MECHANISM) {
            return Err(SaslError::UnsupportedMechanism(format!(
                "{} (only {} supported)",
                mechanism, SDP_MECHANISM
            )));
        }
        Ok(Box::new(SdpSaslServer::new(self.verifier.clone())))
    }
}
