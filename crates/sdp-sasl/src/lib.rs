// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SDP SASL Mechanism
//!
//! Single-round SASL mechanism that authenticates an RPC connection with a
//! signed credential tuple checked by an external identity service.
//!
//! # Features
//!
//! - **Token Codec**: PLAIN-layout messages carrying a
//!   `client_id timestamp sequence signature` tuple
//! - **Identity Verification**: pluggable [`IdentityService`] port
//! - **Server Mechanism**: one-shot state machine producing the authorized id
//! - **Client Token**: legacy `NUL username NUL password` initial response
//! - **Registry**: explicit, lock-free mechanism registry
//! - **Transport**: framed negotiation over any `Read + Write` stream
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::net::TcpStream;
//! use std::sync::Arc;
//! use sdp_sasl::{
//!     helper, IdentityVerifier, MechanismRegistry, SaslConfig, StaticIdentityService,
//! };
//!
//! let config = SaslConfig::example();
//! let service = StaticIdentityService::new(config.identity.principals.clone());
//!
//! let registry = Arc::new(MechanismRegistry::new());
//! helper::install_default_mechanisms(&registry, IdentityVerifier::new(Arc::new(service)));
//!
//! let stream = TcpStream::connect("127.0.0.1:9090").expect("connect");
//! let transport = helper::client_transport(
//!     &registry,
//!     "reporting-app 1700000000 1 change-me",
//!     "",
//!     stream,
//! );
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! server_name = "auth.example.com"
//! protocol = "rpc"
//! max_frame_size = 65536
//!
//! [[identity.principals]]
//! client_id = "reporting-app"
//! secret = "change-me"
//! name = "Reporting App"
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod helper;
pub mod mechanism;
pub mod registry;
pub mod server;
pub mod transport;
pub mod user;
pub mod verifier;

pub use client::{build_initial_token, PlainSaslClient, SdpSaslClientFactory};
pub use codec::{decode, AuthenticationInfo, Credential, CredentialToken};
pub use config::{
    ConfigError, EnvSource, PropertySource, SaslConfig, SdpAuthKeys, StaticPrincipal,
};
pub use connection::{Connection, ConnectionError, ConnectionFactory, DefaultConnection};
pub use error::{AuthFailure, ParseError, SaslError, SaslResult};
pub use mechanism::{
    MechanismProperties, Qop, SaslClient, SaslClientFactory, SaslServer, SaslServerFactory,
    SDP_MECHANISM,
};
pub use registry::MechanismRegistry;
pub use server::{SdpSaslServer, SdpSaslServerFactory};
pub use transport::{SaslClientTransport, SaslServerTransport, SaslServerTransportFactory};
pub use user::{resolve_user, User, UserLookupError, UserProvider};
pub use verifier::{
    IdentityService, IdentityServiceError, IdentityVerifier, Principal, StaticIdentityService,
};
