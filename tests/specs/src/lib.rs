// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end scenarios.
//!
//! Runs a real authority on a loopback port inside the test process and
//! drives it with real agents over HTTP.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use airagent::agent::AgentSnapshot;
use airagent::client::{ensure_crypto, AuthorityClient};
use airagent::config::AgentConfig;
use airserver::config::ServerConfig;
use airserver::state::AirState;
use airserver::store::memory::MemoryStore;
use airserver::wire::ResponderInfo;

/// Server config for tests: loopback, ephemeral port, fixed seed.
pub fn server_config(healthy_probability: f64) -> ServerConfig {
    ServerConfig {
        port: 0,
        healthy_probability,
        seed: Some(7),
        ..ServerConfig::default()
    }
}

/// Agent config with short timings suitable for tests.
pub fn agent_config(server_url: &str) -> AgentConfig {
    AgentConfig {
        poll_ms: 50,
        work_min_ms: 20,
        work_max_ms: 40,
        shutdown_grace_ms: 2000,
        ..AgentConfig::new(server_url)
    }
}

/// An authority serving on loopback. Shut down on drop.
pub struct Authority {
    state: Arc<AirState>,
    base_url: String,
    task: JoinHandle<anyhow::Result<()>>,
}

impl Authority {
    /// Start an in-memory authority.
    pub async fn start(config: ServerConfig) -> anyhow::Result<Self> {
        Self::serve(AirState::in_memory(config)).await
    }

    /// Start an authority persisting to `path`.
    pub async fn start_persistent(config: ServerConfig, path: &Path) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::open(path)?);
        let state = AirState::new(&config, store, Default::default());
        Self::serve(state).await
    }

    async fn serve(state: AirState) -> anyhow::Result<Self> {
        ensure_crypto();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(state);
        let task = tokio::spawn(airserver::serve(listener, Arc::clone(&state)));
        Ok(Self { state, base_url: format!("http://{addr}/api"), task })
    }

    /// API base URL, e.g. `http://127.0.0.1:PORT/api`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn state(&self) -> &AirState {
        &self.state
    }

    /// Stop serving and wait for the listener to close.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        self.state.shutdown.cancel();
        let task = tokio::time::timeout(Duration::from_secs(5), &mut self.task).await?;
        task?
    }

    /// Registered responders as the dashboard sees them.
    pub async fn active(&self) -> anyhow::Result<Vec<ResponderInfo>> {
        let client = AuthorityClient::new(&self.base_url, Duration::from_secs(5))?;
        Ok(client.list_responders().await?)
    }
}

impl Drop for Authority {
    fn drop(&mut self) {
        self.state.shutdown.cancel();
    }
}

/// Wait until the agent's published state satisfies `pred`.
pub async fn wait_for(
    rx: &mut watch::Receiver<AgentSnapshot>,
    timeout: Duration,
    pred: impl FnMut(&AgentSnapshot) -> bool,
) -> anyhow::Result<AgentSnapshot> {
    let reached =
        tokio::time::timeout(timeout, rx.wait_for(pred)).await.map(|r| r.map(|s| s.clone()));
    match reached {
        Ok(Ok(snapshot)) => Ok(snapshot),
        Ok(Err(_)) => anyhow::bail!("agent stopped before reaching the expected state"),
        Err(_) => {
            let last = rx.borrow().clone();
            anyhow::bail!("timed out waiting for agent state, last: {last:?}")
        }
    }
}
