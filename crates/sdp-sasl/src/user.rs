// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection user resolution.
//!
//! The user a connection runs as is the first success of:
//!
//! 1. the explicitly requested user
//! 2. the configured [`UserProvider`]
//! 3. the process identity (`USER`, then `USERNAME`)
//! 4. [`DEFAULT_USER`]
//!
//! Blank names count as absent at every step.

use thiserror::Error;

use crate::config::PropertySource;

/// Last-resort user name.
pub const DEFAULT_USER: &str = "rpc";

/// Where a resolved user came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSource {
    Explicit,
    Provider,
    Process,
    Default,
}

/// User a connection runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    name: String,
    source: UserSource,
}

impl User {
    pub fn new(name: impl Into<String>, source: UserSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> UserSource {
        self.source
    }
}

/// User lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserLookupError {
    /// The provider has no user for this process.
    #[error("user not found")]
    NotFound,

    #[error("user provider failed: {0}")]
    Provider(String),
}

/// Supplies the current user from an external directory.
pub trait UserProvider: Send + Sync {
    fn current_user(&self) -> Result<String, UserLookupError>;
}

/// Resolve the connection user.
///
/// Never fails; the chain ends at [`DEFAULT_USER`].
pub fn resolve_user(
    explicit: Option<&str>,
    provider: Option<&dyn UserProvider>,
    env: &impl PropertySource,
) -> User {
    if let Some(name) = non_blank(explicit.map(str::to_string)) {
        tracing::debug!("using explicit user '{}'", name);
        return User::new(name, UserSource::Explicit);
    }

    if let Some(provider) = provider {
        match provider.current_user() {
            Ok(name) => {
                if let Some(name) = non_blank(Some(name)) {
                    tracing::debug!("using user '{}' from provider", name);
                    return User::new(name, UserSource::Provider);
                }
                tracing::warn!("user provider returned a blank name, falling back");
            }
            Err(UserLookupError::NotFound) => {
                tracing::warn!("user provider found no user, falling back to process user");
            }
            Err(e) => {
                tracing::warn!("{}, falling back to process user", e);
            }
        }
    }

    let process_user =
        non_blank(env.property("USER")).or_else(|| non_blank(env.property("USERNAME")));
    if let Some(name) = process_user {
        tracing::info!("using process user '{}'", name);
        return User::new(name, UserSource::Process);
    }

    tracing::info!("no user available, using '{}'", DEFAULT_USER);
    User::new(DEFAULT_USER, UserSource::Default)
}

fn non_blank(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedProvider(Result<String, UserLookupError>);

    impl UserProvider for FixedProvider {
        fn current_user(&self) -> Result<String, UserLookupError> {
            self.0.clone()
        }
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_explicit_user_wins() {
        let provider = FixedProvider(Ok("from-provider".into()));
        let user = resolve_user(Some("alice"), Some(&provider), &env(&[("USER", "proc")]));
        assert_eq!(user.name(), "alice");
        assert_eq!(user.source(), UserSource::Explicit);
    }

    #[test]
    fn test_provider_before_process() {
        let provider = FixedProvider(Ok("from-provider".into()));
        let user = resolve_user(None, Some(&provider), &env(&[("USER", "proc")]));
        assert_eq!(user.name(), "from-provider");
        assert_eq!(user.source(), UserSource::Provider);
    }

    #[test]
    fn test_provider_failures_fall_back() {
        for result in [
            Err(UserLookupError::NotFound),
            Err(UserLookupError::Provider("ldap down".into())),
            Ok("   ".into()),
        ] {
            let provider = FixedProvider(result);
            let user = resolve_user(Some(""), Some(&provider), &env(&[("USER", "proc")]));
            assert_eq!(user.name(), "proc");
            assert_eq!(user.source(), UserSource::Process);
        }
    }

    #[test]
    fn test_username_variable() {
        let user = resolve_user(None, None, &env(&[("USER", ""), ("USERNAME", "winuser")]));
        assert_eq!(user.name(), "winuser");
    }

    #[test]
    fn test_default_user() {
        let user = resolve_user(None, None, &env(&[]));
        assert_eq!(user.name(), DEFAULT_USER);
        assert_eq!(user.source(), UserSource::Default);
    }
}
