// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection implementation registry.
//!
//! Implementations are selected by the `connection_impl` configuration key
//! and built through a constructor registered under that key.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use sdp_sasl::{ConnectionFactory, SaslConfig};
//!
//! let factory = ConnectionFactory::new();
//! let conn = factory
//!     .create_connection(&SaslConfig::default(), &HashMap::new(), None, Some("alice"))
//!     .expect("connection");
//! assert_eq!(conn.user().name(), "alice");
//! ```

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::config::{ConfigError, EnvSource, PropertySource, SaslConfig, SdpAuthKeys};
use crate::user::{resolve_user, User, UserProvider};

/// Key of the built-in implementation.
pub const DEFAULT_CONNECTION_IMPL: &str = "default";

/// Connection construction errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Unknown connection implementation: {0}")]
    UnknownImplementation(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything a connection implementation is built from.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub config: SaslConfig,
    pub auth_keys: SdpAuthKeys,
    pub user: User,
}

/// A configured connection.
pub trait Connection: fmt::Debug + Send {
    /// Implementation key this connection was built under.
    fn implementation(&self) -> &str;

    fn user(&self) -> &User;

    fn auth_keys(&self) -> &SdpAuthKeys;

    fn config(&self) -> &SaslConfig;
}

/// Built-in connection.
#[derive(Debug, Clone)]
pub struct DefaultConnection {
    context: ConnectionContext,
}

impl DefaultConnection {
    pub fn new(context: ConnectionContext) -> Self {
        Self { context }
    }
}

impl Connection for DefaultConnection {
    fn implementation(&self) -> &str {
        DEFAULT_CONNECTION_IMPL
    }

    fn user(&self) -> &User {
        &self.context.user
    }

    fn auth_keys(&self) -> &SdpAuthKeys {
        &self.context.auth_keys
    }

    fn config(&self) -> &SaslConfig {
        &self.context.config
    }
}

/// Constructor registered under an implementation key.
pub type ConnectionConstructor = fn(ConnectionContext) -> Box<dyn Connection>;

fn default_connection(context: ConnectionContext) -> Box<dyn Connection> {
    Box::new(DefaultConnection::new(context))
}

/// Registry of connection constructors.
#[derive(Debug, Clone)]
pub struct ConnectionFactory {
    constructors: HashMap<String, ConnectionConstructor>,
}

impl ConnectionFactory {
    /// Create a factory with the `"default"` implementation registered.
    pub fn new() -> Self {
        let mut factory = Self {
            constructors: HashMap::new(),
        };
        factory.register(DEFAULT_CONNECTION_IMPL, default_connection);
        factory
    }

    /// Register (or replace) the constructor for `key`.
    pub fn register(&mut self, key: impl Into<String>, constructor: ConnectionConstructor) {
        let key = key.into();
        tracing::debug!("registered connection implementation '{}'", key);
        self.constructors.insert(key, constructor);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn implementations(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Build a connection using the process environment.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::Config` -- `config` fails validation
    /// - `ConnectionError::UnknownImplementation` -- no constructor for
    ///   `config.connection_impl`
    pub fn create_connection(
        &self,
        config: &SaslConfig,
        properties: &HashMap<String, String>,
        user_provider: Option<&dyn UserProvider>,
        explicit_user: Option<&str>,
    ) -> Result<Box<dyn Connection>, ConnectionError> {
        self.create_connection_with_env(
            config,
            properties,
            user_provider,
            explicit_user,
            &EnvSource,
        )
    }

    /// Like [`create_connection`](Self::create_connection) with an explicit
    /// environment.
    pub fn create_connection_with_env(
        &self,
        config: &SaslConfig,
        properties: &HashMap<String, String>,
        user_provider: Option<&dyn UserProvider>,
        explicit_user: Option<&str>,
        env: &impl PropertySource,
    ) -> Result<Box<dyn Connection>, ConnectionError> {
        config.validate()?;

        let constructor = self
            .constructors
            .get(&config.connection_impl)
            .ok_or_else(|| {
                ConnectionError::UnknownImplementation(config.connection_impl.clone())
            })?;

        let auth_keys = SdpAuthKeys::resolve(env, properties);
        if !auth_keys.is_complete() {
            tracing::warn!("SDP auth key pair is incomplete");
        }
        let user = resolve_user(explicit_user, user_provider, env);

        tracing::debug!(
            "creating '{}' connection for user '{}'",
            config.connection_impl,
            user.name()
        );

        Ok(constructor(ConnectionContext {
            config: config.clone(),
            auth_keys,
            user,
        }))
    }
}

impl Default for ConnectionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SDP_PRIVATE_KEY, SDP_PUBLIC_KEY};
    use crate::user::{UserLookupError, UserSource};

    #[derive(Debug)]
    struct TracingConnection(ConnectionContext);

    impl Connection for TracingConnection {
        fn implementation(&self) -> &str {
            "tracing"
        }

        fn user(&self) -> &User {
            &self.0.user
        }

        fn auth_keys(&self) -> &SdpAuthKeys {
            &self.0.auth_keys
        }

        fn config(&self) -> &SaslConfig {
            &self.0.config
        }
    }

    fn tracing_connection(context: ConnectionContext) -> Box<dyn Connection> {
        Box::new(TracingConnection(context))
    }

    struct MissingUser;

    impl UserProvider for MissingUser {
        fn current_user(&self) -> Result<String, UserLookupError> {
            Err(UserLookupError::NotFound)
        }
    }

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_implementation_registered() {
        let factory = ConnectionFactory::new();
        assert!(factory.contains(DEFAULT_CONNECTION_IMPL));
        assert_eq!(factory.implementations(), vec![DEFAULT_CONNECTION_IMPL]);
    }

    #[test]
    fn test_create_default_connection() {
        let factory = ConnectionFactory::new();
        let env = map(&[("USER", "proc"), (SDP_PUBLIC_KEY, "env-pub")]);
        let properties = map(&[(SDP_PUBLIC_KEY, "prop-pub"), (SDP_PRIVATE_KEY, "prop-priv")]);

        let conn = factory
            .create_connection_with_env(
                &SaslConfig::default(),
                &properties,
                Some(&MissingUser),
                None,
                &env,
            )
            .expect("create_connection failed");

        assert_eq!(conn.implementation(), DEFAULT_CONNECTION_IMPL);
        assert_eq!(conn.user().name(), "proc");
        assert_eq!(conn.user().source(), UserSource::Process);
        assert_eq!(conn.auth_keys().public_key(), Some("env-pub"));
        assert_eq!(conn.auth_keys().private_key(), Some("prop-priv"));
        assert_eq!(conn.config().server_name, "localhost");
    }

    #[test]
    fn test_custom_implementation() {
        let mut factory = ConnectionFactory::new();
        factory.register("tracing", tracing_connection);

        let config = SaslConfig::default().connection_impl("tracing");
        let conn = factory
            .create_connection_with_env(&config, &HashMap::new(), None, Some("bob"), &map(&[]))
            .expect("create_connection failed");
        assert_eq!(conn.implementation(), "tracing");
        assert_eq!(conn.user().name(), "bob");
    }

    #[test]
    fn test_unknown_implementation() {
        let factory = ConnectionFactory::new();
        let config = SaslConfig::default().connection_impl("com.example.Missing");
        let err = factory
            .create_connection_with_env(&config, &HashMap::new(), None, None, &map(&[]))
            .expect_err("expected unknown implementation");
        assert!(matches!(
            err,
            ConnectionError::UnknownImplementation(ref key) if key == "com.example.Missing"
        ));
    }

    #[test]
    fn test_invalid_config() {
        let factory = ConnectionFactory::new();
        let config = SaslConfig {
            max_frame_size: 0,
            ..Default::default()
        };
        let err = factory
            .create_connection_with_env(&config, &HashMap::new(), None, None, &map(&[]))
            .expect_err("expected config error");
        assert!(matches!(err, ConnectionError::Config(ConfigError::Invalid(_))));
    }
}
