// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mechanism provider registry.
//!
//! Two append-only tables keyed by upper-cased mechanism name: one for
//! server factories and one for client factories. The registry is an
//! ordinary value; construct it once at startup and share it behind an
//! `Arc` with every acceptor and connector.
//!
//! # Concurrency
//!
//! - Reads: lock-free snapshot via `ArcSwap::load`
//! - Writes: copy-on-write via `ArcSwap::rcu`; concurrent identical
//!   registrations converge on the same table (last write wins)

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::mechanism::{SaslClientFactory, SaslServerFactory};

type ServerTable = HashMap<String, Arc<dyn SaslServerFactory>>;
type ClientTable = HashMap<String, Arc<dyn SaslClientFactory>>;

/// Registry of SASL mechanism factories.
pub struct MechanismRegistry {
    servers: ArcSwap<ServerTable>,
    clients: ArcSwap<ClientTable>,
}

impl MechanismRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            servers: ArcSwap::from_pointee(HashMap::new()),
            clients: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Register a server factory under every name it advertises.
    ///
    /// Safe to call repeatedly; re-registering a name replaces the entry.
    pub fn register_server(&self, factory: Arc<dyn SaslServerFactory>) {
        for name in factory.mechanism_names() {
            let key = normalize(name);
            self.servers.rcu(|table| {
                let mut next = ServerTable::clone(table);
                next.insert(key.clone(), Arc::clone(&factory));
                next
            });
            tracing::debug!("registered SASL server mechanism '{}'", key);
        }
    }

    /// Register a client factory under every name it advertises.
    pub fn register_client(&self, factory: Arc<dyn SaslClientFactory>) {
        for name in factory.mechanism_names() {
            let key = normalize(name);
            self.clients.rcu(|table| {
                let mut next = ClientTable::clone(table);
                next.insert(key.clone(), Arc::clone(&factory));
                next
            });
            tracing::debug!("registered SASL client mechanism '{}'", key);
        }
    }

    /// Server factory for `mechanism` (case-insensitive).
    pub fn server_factory(&self, mechanism: &str) -> Option<Arc<dyn SaslServerFactory>> {
        self.servers.load().get(&normalize(mechanism)).cloned()
    }

    /// Client factory for `mechanism` (case-insensitive).
    pub fn client_factory(&self, mechanism: &str) -> Option<Arc<dyn SaslClientFactory>> {
        self.clients.load().get(&normalize(mechanism)).cloned()
    }

    /// Registered server mechanism names, sorted.
    pub fn server_mechanisms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered client mechanism names, sorted.
    pub fn client_mechanisms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.clients.load().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for MechanismRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MechanismRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MechanismRegistry")
            .field("servers", &self.server_mechanisms())
            .field("clients", &self.client_mechanisms())
            .finish()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}
