// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wiring helpers for the SDP mechanism.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::client::SdpSaslClientFactory;
use crate::config::SaslConfig;
use crate::error::{SaslError, SaslResult};
use crate::mechanism::{MechanismProperties, Qop, SDP_MECHANISM};
use crate::registry::MechanismRegistry;
use crate::server::SdpSaslServerFactory;
use crate::transport::{SaslClientTransport, SaslServerTransportFactory};
use crate::verifier::IdentityVerifier;

/// Register the SDP server and client factories.
///
/// Idempotent; calling it again replaces the entries with equivalent ones.
pub fn install_default_mechanisms(registry: &MechanismRegistry, verifier: IdentityVerifier) {
    registry.register_server(Arc::new(SdpSaslServerFactory::new(verifier)));
    registry.register_client(Arc::new(SdpSaslClientFactory));
}

/// Properties the SDP mechanism is negotiated with.
pub fn sdp_properties() -> MechanismProperties {
    MechanismProperties {
        qop: Qop::Auth,
        server_auth: true,
    }
}

/// Server transport factory accepting the SDP mechanism.
pub fn server_transport_factory(
    registry: Arc<MechanismRegistry>,
    config: &SaslConfig,
) -> SaslServerTransportFactory {
    let mut factory =
        SaslServerTransportFactory::new(registry).max_frame_size(config.max_frame_size);
    factory.add_server_definition(
        SDP_MECHANISM,
        config.protocol.clone(),
        config.server_name.clone(),
        sdp_properties(),
    );
    factory
}

/// Open an SDP-authenticated client stream over `inner`.
///
/// # Errors
///
/// - `SaslError::UnsupportedMechanism` -- no SDP client factory registered
/// - `SaslError::Negotiation` -- the server rejected the credential
pub fn client_transport<T: Read + Write>(
    registry: &MechanismRegistry,
    username: &str,
    password: &str,
    inner: T,
) -> SaslResult<SaslClientTransport<T>> {
    let factory = registry
        .client_factory(SDP_MECHANISM)
        .ok_or_else(|| SaslError::UnsupportedMechanism(SDP_MECHANISM.to_string()))?;
    let client = factory.create_client(SDP_MECHANISM, username, password, &sdp_properties())?;
    SaslClientTransport::open(inner, client)
}
