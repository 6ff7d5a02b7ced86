// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SASL mechanism contracts.
//!
//! These are the narrow interfaces a transport drives during negotiation:
//! "evaluate one token, return one token". Mechanisms never touch the
//! network themselves.
//!
//! # Lifecycle (server)
//!
//! 1. Created by a [`SaslServerFactory`] for one connection attempt
//! 2. `evaluate_response()` -- called with each client token
//! 3. `is_complete()` -- polled by the transport after each step
//! 4. `authorization_id()` -- read once the exchange is complete
//! 5. `wrap()` / `unwrap()` -- post-authentication payload processing
//! 6. `dispose()` -- release resources

use std::fmt;

use crate::error::SaslResult;

/// Name under which the SDP mechanism is negotiated.
pub const SDP_MECHANISM: &str = "SDP";

/// Quality of protection requested for the post-authentication channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Qop {
    /// Authentication only; payloads pass through unchanged.
    #[default]
    Auth,
    /// Authentication with integrity protection.
    AuthInt,
    /// Authentication with integrity and confidentiality.
    AuthConf,
}

impl Qop {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::AuthInt => "auth-int",
            Self::AuthConf => "auth-conf",
        }
    }
}

impl fmt::Display for Qop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties handed to mechanism factories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanismProperties {
    pub qop: Qop,
    /// The server must authenticate to the client.
    pub server_auth: bool,
}

impl Default for MechanismProperties {
    fn default() -> Self {
        Self {
            qop: Qop::Auth,
            server_auth: true,
        }
    }
}

/// Server half of a mechanism.
///
/// One instance per connection attempt; never shared, never reused.
pub trait SaslServer: fmt::Debug + Send {
    /// Mechanism name this instance was created for.
    fn mechanism_name(&self) -> &str;

    /// Process one client token and produce the challenge to send back.
    ///
    /// # Errors
    ///
    /// Parse and authentication failures, or `IllegalState` if the
    /// exchange already reached a terminal state.
    fn evaluate_response(&mut self, response: &[u8]) -> SaslResult<Vec<u8>>;

    /// True once the exchange completed successfully.
    fn is_complete(&self) -> bool;

    /// Identity the connection is authorized as.
    ///
    /// # Errors
    ///
    /// `IllegalState` before completion.
    fn authorization_id(&self) -> SaslResult<&str>;

    /// Process an outgoing payload after authentication.
    fn wrap(&self, outgoing: &[u8]) -> SaslResult<Vec<u8>>;

    /// Process an incoming payload after authentication.
    fn unwrap(&self, incoming: &[u8]) -> SaslResult<Vec<u8>>;

    /// Value of a negotiated property such as the QOP.
    fn negotiated_property(&self, name: &str) -> SaslResult<Option<String>>;

    /// Release any resources held by the mechanism.
    fn dispose(&mut self);
}

/// Client half of a mechanism.
pub trait SaslClient: fmt::Debug + Send {
    fn mechanism_name(&self) -> &str;

    /// True if the client speaks first.
    fn has_initial_response(&self) -> bool;

    /// Produce the next token. An empty challenge requests the initial
    /// response. `None` means the client has nothing more to send.
    fn evaluate_challenge(&mut self, challenge: &[u8]) -> SaslResult<Option<Vec<u8>>>;

    fn is_complete(&self) -> bool;
}

/// Creates server mechanism instances.
pub trait SaslServerFactory: Send + Sync {
    /// Mechanism names this factory can serve.
    fn mechanism_names(&self) -> Vec<&'static str>;

    /// Create a fresh server instance for one connection attempt.
    ///
    /// # Errors
    ///
    /// `UnsupportedMechanism` if `mechanism` is not one of
    /// [`mechanism_names`](Self::mechanism_names).
    fn create_server(
        &self,
        mechanism: &str,
        protocol: &str,
        server_name: &str,
        properties: &MechanismProperties,
    ) -> SaslResult<Box<dyn SaslServer>>;
}

/// Creates client mechanism instances from a username/password pair.
pub trait SaslClientFactory: Send + Sync {
    fn mechanism_names(&self) -> Vec<&'static str>;

    /// # Errors
    ///
    /// `UnsupportedMechanism` for unknown names.
    fn create_client(
        &self,
        mechanism: &str,
        username: &str,
        password: &str,
        properties: &MechanismProperties,
    ) -> SaslResult<Box<dyn SaslClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_properties_request_bare_auth() {
        let props = MechanismProperties::default();
        assert_eq!(props.qop, Qop::Auth);
        assert!(props.server_auth);
        assert_eq!(props.qop.to_string(), "auth");
    }
}
