// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns the console's own agent plus any spawned child agents.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::agent::{spawn_agent, AgentCommand, AgentHandle};
use crate::client::AuthorityClient;
use crate::config::AgentConfig;
use crate::console::ConsoleCommand;
use crate::platform::Platform;

/// Label of the console's own agent.
pub const OWN_LABEL: &str = "Main";

/// Whether the console should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Supervisor {
    config: Arc<AgentConfig>,
    client: AuthorityClient,
    platform: Platform,
    own: AgentHandle,
    children: Vec<AgentHandle>,
    next_index: usize,
    /// Tasks told to stop but not yet joined.
    retired: Vec<JoinHandle<()>>,
}

impl Supervisor {
    pub fn new(config: AgentConfig, platform: Platform) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let client = AuthorityClient::new(&config.server_url, config.request_timeout())?;
        let own = spawn_agent(OWN_LABEL, client.clone(), Arc::clone(&config), platform.clone());
        Ok(Self {
            config,
            client,
            platform,
            own,
            children: Vec::new(),
            next_index: 1,
            retired: Vec::new(),
        })
    }

    pub fn children(&self) -> &[AgentHandle] {
        &self.children
    }

    pub fn execute(&mut self, cmd: ConsoleCommand) -> Flow {
        match cmd {
            ConsoleCommand::Register => self.register_self(),
            ConsoleCommand::Deregister => self.deregister_self(),
            ConsoleCommand::Spawn(n) => self.spawn_many(n),
            ConsoleCommand::DeregisterAll => self.deregister_all(),
            ConsoleCommand::Exit => return Flow::Exit,
        }
        Flow::Continue
    }

    pub fn register_self(&self) {
        self.send_own(AgentCommand::Register);
    }

    pub fn deregister_self(&self) {
        self.send_own(AgentCommand::Deregister);
    }

    /// Spawn `n` agents, each registering immediately.
    pub fn spawn_many(&mut self, n: usize) {
        for _ in 0..n {
            let label = format!("Responder {}", self.next_index);
            self.next_index += 1;
            let handle = spawn_agent(
                label,
                self.client.clone(),
                Arc::clone(&self.config),
                self.platform.clone(),
            );
            handle.send(AgentCommand::Register);
            self.children.push(handle);
        }
        tracing::info!(spawned = n, total = self.children.len(), "spawned responders");
    }

    /// Deregister and stop every spawned agent. The own agent is untouched.
    pub fn deregister_all(&mut self) {
        if self.children.is_empty() {
            tracing::warn!("no spawned responders to deregister");
            return;
        }
        let count = self.children.len();
        for handle in self.children.drain(..) {
            handle.send(AgentCommand::Deregister);
            handle.send(AgentCommand::Exit);
            self.retired.push(handle.into_task());
        }
        self.retired.retain(|task| !task.is_finished());
        tracing::info!(count, "deregistering all spawned responders");
    }

    /// Stop everything, waiting up to the configured grace period for
    /// agents to deregister. Stragglers are aborted.
    pub async fn shutdown(mut self) {
        self.send_own(AgentCommand::Exit);
        if !self.children.is_empty() {
            self.deregister_all();
        }

        let mut tasks = std::mem::take(&mut self.retired);
        tasks.push(self.own.into_task());

        let deadline = tokio::time::Instant::now() + self.config.shutdown_grace();
        for mut task in tasks {
            if tokio::time::timeout_at(deadline, &mut task).await.is_err() {
                tracing::warn!("agent did not stop within the grace period, aborting");
                task.abort();
            }
        }
    }

    fn send_own(&self, cmd: AgentCommand) {
        if !self.own.send(cmd) {
            tracing::warn!(?cmd, "console responder has stopped");
        }
    }
}
