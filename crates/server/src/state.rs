// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::dispatch::JobDispatcher;
use crate::registry::ResponderRegistry;
use crate::store::memory::MemoryStore;

/// Shared authority state handed to every request handler.
pub struct AirState {
    pub registry: Arc<ResponderRegistry>,
    pub dispatcher: JobDispatcher,
    pub shutdown: CancellationToken,
}

impl AirState {
    /// Wire registry and dispatcher over one store serving both tables.
    pub fn new(config: &ServerConfig, store: Arc<MemoryStore>, shutdown: CancellationToken) -> Self {
        let registry = Arc::new(ResponderRegistry::new(
            store.clone(),
            config.healthy_probability,
            config.seed,
        ));
        let dispatcher =
            JobDispatcher::new(store, Arc::clone(&registry), config.job_description.clone());
        Self { registry, dispatcher, shutdown }
    }

    /// State backed by a fresh in-memory store.
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(&config, Arc::new(MemoryStore::new()), CancellationToken::new())
    }
}
