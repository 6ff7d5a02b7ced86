// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identity verification.
//!
//! The external identity service is reached through the [`IdentityService`]
//! port. [`IdentityVerifier`] adapts it to the mechanism: it converts the
//! string tuple into typed values, calls the service exactly once, and
//! folds every service-specific failure into [`AuthFailure::Rejected`].
//!
//! Retry and timeout policy belong to the service implementation, not here.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::codec::Credential;
use crate::config::StaticPrincipal;
use crate::error::AuthFailure;

/// Verified identity returned by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Display name, used as the authenticated identity.
    pub name: String,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Failures reported by an identity service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityServiceError {
    #[error("unknown client identifier: {0}")]
    UnknownIdentifier(String),

    #[error("signature expired")]
    ExpiredSignature,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// External identity service (SPI).
///
/// One synchronous call per authentication attempt; implementations may
/// block for the duration of a network round trip.
pub trait IdentityService: Send + Sync {
    /// Turn a credential tuple into a verified principal.
    fn authenticate(&self, credential: &Credential) -> Result<Principal, IdentityServiceError>;
}

/// Adapter between the mechanism and an [`IdentityService`].
///
/// Cheap to clone; every server mechanism instance holds its own copy.
#[derive(Clone)]
pub struct IdentityVerifier {
    service: Arc<dyn IdentityService>,
}

impl IdentityVerifier {
    pub fn new(service: Arc<dyn IdentityService>) -> Self {
        Self { service }
    }

    /// Verify a credential given as its four string parts.
    ///
    /// # Errors
    ///
    /// - `AuthFailure::MalformedCredential` -- timestamp or sequence is not
    ///   an integer; the service is not called
    /// - `AuthFailure::Rejected` -- the service declined the credential
    pub fn verify(
        &self,
        client_id: &str,
        timestamp: &str,
        sequence: &str,
        signature: &str,
    ) -> Result<Principal, AuthFailure> {
        let credential = Credential::from_parts(client_id, timestamp, sequence, signature)
            .map_err(AuthFailure::MalformedCredential)?;
        self.verify_credential(&credential)
    }

    /// Verify a typed credential.
    pub fn verify_credential(&self, credential: &Credential) -> Result<Principal, AuthFailure> {
        self.service.authenticate(credential).map_err(|e| {
            tracing::warn!(
                "authentication failed with sdp mechanism, client_id={} timestamp={} sequence={}: {}",
                credential.client_id,
                credential.timestamp,
                credential.sequence,
                e
            );
            AuthFailure::Rejected(e.to_string())
        })
    }
}

impl fmt::Debug for IdentityVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityVerifier").finish_non_exhaustive()
    }
}

/// Identity service backed by a fixed table of principals.
///
/// A credential is accepted when its `client_id` is known and its signature
/// equals the configured secret. Timestamps and sequences are not checked.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityService {
    principals: HashMap<String, StaticPrincipal>,
}

impl StaticIdentityService {
    pub fn new(principals: impl IntoIterator<Item = StaticPrincipal>) -> Self {
        Self {
            principals: principals
                .into_iter()
                .map(|p| (p.client_id.clone(), p))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl IdentityService for StaticIdentityService {
    fn authenticate(&self, credential: &Credential) -> Result<Principal, IdentityServiceError> {
        let entry = self
            .principals
            .get(&credential.client_id)
            .ok_or_else(|| IdentityServiceError::UnknownIdentifier(credential.client_id.clone()))?;

        if entry.secret != credential.signature {
            return Err(IdentityServiceError::InvalidSignature);
        }

        let name = entry.name.as_deref().unwrap_or(&entry.client_id);
        Ok(Principal::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and answers with a fixed result.
    struct CountingService {
        calls: AtomicUsize,
        result: Result<Principal, IdentityServiceError>,
    }

    impl IdentityService for CountingService {
        fn authenticate(&self, _credential: &Credential) -> Result<Principal, IdentityServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn counting(result: Result<Principal, IdentityServiceError>) -> Arc<CountingService> {
        Arc::new(CountingService {
            calls: AtomicUsize::new(0),
            result,
        })
    }

    #[test]
    fn test_verify_success_calls_service_once() {
        let service = counting(Ok(Principal::new("alice")));
        let verifier = IdentityVerifier::new(service.clone());

        let principal = verifier
            .verify("alice", "1700000000", "42", "sig123")
            .expect("verify failed");
        assert_eq!(principal.name, "alice");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_verify_malformed_skips_service() {
        let service = counting(Ok(Principal::new("alice")));
        let verifier = IdentityVerifier::new(service.clone());

        let err = verifier
            .verify("alice", "1700000000", "notanumber", "sig")
            .expect_err("expected malformed credential");
        assert!(matches!(
            err,
            AuthFailure::MalformedCredential(crate::error::ParseError::NumericFormat {
                field: "sequence",
                ..
            })
        ));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_verify_maps_service_failures_to_rejected() {
        for failure in [
            IdentityServiceError::ExpiredSignature,
            IdentityServiceError::UnknownIdentifier("bob".into()),
            IdentityServiceError::Unavailable("connection refused".into()),
        ] {
            let verifier = IdentityVerifier::new(counting(Err(failure.clone())));
            let err = verifier
                .verify("bob", "1", "2", "sig")
                .expect_err("expected rejection");
            assert_eq!(err, AuthFailure::Rejected(failure.to_string()));
        }
    }

    #[test]
    fn test_static_service() {
        let service = StaticIdentityService::new([
            StaticPrincipal {
                client_id: "app-1".into(),
                secret: "s3cret".into(),
                name: Some("Reporting App".into()),
            },
            StaticPrincipal {
                client_id: "app-2".into(),
                secret: "other".into(),
                name: None,
            },
        ]);
        assert_eq!(service.len(), 2);

        let verifier = IdentityVerifier::new(Arc::new(service));
        assert_eq!(
            verifier.verify("app-1", "1", "1", "s3cret"),
            Ok(Principal::new("Reporting App"))
        );
        assert_eq!(
            verifier.verify("app-2", "1", "1", "other"),
            Ok(Principal::new("app-2"))
        );
        assert_eq!(
            verifier.verify("app-1", "1", "1", "wrong"),
            Err(AuthFailure::Rejected("invalid signature".into()))
        );
        assert_eq!(
            verifier.verify("app-3", "1", "1", "s3cret"),
            Err(AuthFailure::Rejected(
                "unknown client identifier: app-3".into()
            ))
        );
    }
}
