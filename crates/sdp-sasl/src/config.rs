// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mechanism configuration.
//!
//! Supports both programmatic and file-based configuration, plus
//! resolution of the identity service key pair from the environment.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

use crate::transport::DEFAULT_MAX_FRAME_SIZE;

/// Setting holding the identity service public key.
pub const SDP_PUBLIC_KEY: &str = "rpc_security_authentication_sdp_publickey";

/// Setting holding the identity service private key.
pub const SDP_PRIVATE_KEY: &str = "rpc_security_authentication_sdp_privatekey";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// SASL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaslConfig {
    /// Server name handed to mechanism factories.
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Protocol name handed to mechanism factories.
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Largest accepted negotiation frame payload (bytes).
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Connection implementation key.
    #[serde(default = "default_connection_impl")]
    pub connection_impl: String,

    /// Principals for the config-backed identity service.
    #[serde(default)]
    pub identity: IdentityConfig,
}

fn default_server_name() -> String {
    "localhost".to_string()
}

fn default_protocol() -> String {
    "rpc".to_string()
}

fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connection_impl() -> String {
    "default".to_string()
}

impl Default for SaslConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            protocol: default_protocol(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            log_level: default_log_level(),
            connection_impl: default_connection_impl(),
            identity: IdentityConfig::default(),
        }
    }
}

impl SaslConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Example configuration with one static principal.
    pub fn example() -> Self {
        Self::default().principal(StaticPrincipal {
            client_id: "reporting-app".to_string(),
            secret: "change-me".to_string(),
            name: Some("Reporting App".to_string()),
        })
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::Invalid("server_name must not be empty".into()));
        }

        if self.protocol.trim().is_empty() {
            return Err(ConfigError::Invalid("protocol must not be empty".into()));
        }

        if self.max_frame_size == 0 {
            return Err(ConfigError::Invalid(
                "max_frame_size must be greater than zero".into(),
            ));
        }

        if self.connection_impl.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "connection_impl must not be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, principal) in self.identity.principals.iter().enumerate() {
            if principal.client_id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Principal {}: client_id must not be empty",
                    i
                )));
            }
            if !seen.insert(principal.client_id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Principal {}: duplicate client_id '{}'",
                    i, principal.client_id
                )));
            }
        }

        Ok(())
    }

    /// Add a static principal.
    pub fn principal(mut self, principal: StaticPrincipal) -> Self {
        self.identity.principals.push(principal);
        self
    }

    /// Set the server name.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Set the connection implementation key.
    pub fn connection_impl(mut self, key: impl Into<String>) -> Self {
        self.connection_impl = key.into();
        self
    }
}

/// Config-backed identity service settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub principals: Vec<StaticPrincipal>,
}

/// A principal known to the static identity service.
#[derive(Clone, Serialize, Deserialize)]
pub struct StaticPrincipal {
    /// Client identifier carried in the credential tuple.
    pub client_id: String,

    /// Expected signature.
    pub secret: String,

    /// Display name; defaults to `client_id`.
    #[serde(default)]
    pub name: Option<String>,
}

impl fmt::Debug for StaticPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticPrincipal")
            .field("client_id", &self.client_id)
            .field("secret", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// A flat key/value lookup.
pub trait PropertySource {
    fn property(&self, key: &str) -> Option<String>;
}

/// Process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl PropertySource for EnvSource {
    fn property(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl PropertySource for HashMap<String, String> {
    fn property(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Identity service key pair.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SdpAuthKeys {
    public_key: Option<String>,
    private_key: Option<String>,
}

impl SdpAuthKeys {
    /// Resolve both keys, environment first, then `properties`.
    ///
    /// Blank values count as unset.
    pub fn resolve(env: &impl PropertySource, properties: &impl PropertySource) -> Self {
        Self {
            public_key: resolve_key(SDP_PUBLIC_KEY, env, properties),
            private_key: resolve_key(SDP_PRIVATE_KEY, env, properties),
        }
    }

    pub fn public_key(&self) -> Option<&str> {
        self.public_key.as_deref()
    }

    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }

    /// True if both keys are present.
    pub fn is_complete(&self) -> bool {
        self.public_key.is_some() && self.private_key.is_some()
    }
}

fn resolve_key(
    key: &str,
    env: &impl PropertySource,
    properties: &impl PropertySource,
) -> Option<String> {
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    if let Some(value) = present(env.property(key)) {
        tracing::debug!("resolved {} from environment", key);
        return Some(value);
    }
    if let Some(value) = present(properties.property(key)) {
        tracing::debug!("resolved {} from properties", key);
        return Some(value);
    }
    tracing::debug!("{} is not set", key);
    None
}

impl fmt::Debug for SdpAuthKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdpAuthKeys")
            .field("public_key", &self.public_key)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Drop for SdpAuthKeys {
    fn drop(&mut self) {
        if let Some(key) = self.private_key.as_mut() {
            key.zeroize();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = SaslConfig::default();
        assert_eq!(config.server_name, "localhost");
        assert_eq!(config.protocol, "rpc");
        assert_eq!(config.max_frame_size, 64 * 1024);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.connection_impl, "default");
        assert!(config.identity.principals.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: SaslConfig = toml::from_str("").expect("parse failed");
        assert_eq!(config.server_name, "localhost");
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn test_validation() {
        assert!(SaslConfig::default().server_name("").validate().is_err());

        let config = SaslConfig {
            max_frame_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SaslConfig {
            protocol: " ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let principal = StaticPrincipal {
            client_id: "dup".into(),
            secret: "s".into(),
            name: None,
        };
        let config = SaslConfig::default()
            .principal(principal.clone())
            .principal(principal);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = SaslConfig::default().principal(StaticPrincipal {
            client_id: "".into(),
            secret: "s".into(),
            name: None,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"
server_name = "auth.example.com"
max_frame_size = 4096

[[identity.principals]]
client_id = "app-1"
secret = "s3cret"
name = "Reporting App"
"#
        )
        .expect("write failed");

        let config = SaslConfig::from_file(file.path()).expect("from_file failed");
        assert_eq!(config.server_name, "auth.example.com");
        assert_eq!(config.protocol, "rpc");
        assert_eq!(config.max_frame_size, 4096);
        assert_eq!(config.identity.principals.len(), 1);
        assert_eq!(
            config.identity.principals[0].name.as_deref(),
            Some("Reporting App")
        );
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "max_frame_size = 0").expect("write failed");
        assert!(matches!(
            SaslConfig::from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "server_name = [").expect("write failed");
        assert!(matches!(
            SaslConfig::from_file(file.path()),
            Err(ConfigError::Toml(_))
        ));

        assert!(matches!(
            SaslConfig::from_file("/nonexistent/sdp-sasl.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = SaslConfig::example();
        let text = toml::to_string_pretty(&config).expect("serialize failed");
        let parsed: SaslConfig = toml::from_str(&text).expect("parse failed");
        assert_eq!(parsed.identity.principals.len(), 1);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_auth_keys_env_takes_precedence() {
        let env = props(&[(SDP_PUBLIC_KEY, "env-pub")]);
        let properties = props(&[(SDP_PUBLIC_KEY, "prop-pub"), (SDP_PRIVATE_KEY, "prop-priv")]);

        let keys = SdpAuthKeys::resolve(&env, &properties);
        assert_eq!(keys.public_key(), Some("env-pub"));
        assert_eq!(keys.private_key(), Some("prop-priv"));
        assert!(keys.is_complete());
    }

    #[test]
    fn test_auth_keys_blank_is_unset() {
        let env = props(&[(SDP_PRIVATE_KEY, "  ")]);
        let keys = SdpAuthKeys::resolve(&env, &HashMap::<String, String>::new());
        assert_eq!(keys.public_key(), None);
        assert_eq!(keys.private_key(), None);
        assert!(!keys.is_complete());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let properties = props(&[(SDP_PUBLIC_KEY, "pub"), (SDP_PRIVATE_KEY, "topsecret")]);
        let keys = SdpAuthKeys::resolve(&HashMap::<String, String>::new(), &properties);
        assert!(!format!("{:?}", keys).contains("topsecret"));

        let principal = StaticPrincipal {
            client_id: "app".into(),
            secret: "topsecret".into(),
            name: None,
        };
        assert!(!format!("{:?}", principal).contains("topsecret"));
    }
}
