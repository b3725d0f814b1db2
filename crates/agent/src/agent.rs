// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responder agent: one identity, one sequential job loop.
//!
//! ```text
//! Idle → Registering → {Healthy, Unhealthy} → Deregistering → Idle
//! Healthy: RequestingJob → Processing → Reporting → RequestingJob …
//! ```
//!
//! Commands arrive over an mpsc channel and are handled at checkpoints: while
//! idle, between job steps once an outbound call has returned, and during the
//! simulated processing delay. A job interrupted mid-processing stays pending
//! on the authority and is picked up again by the next pending lookup.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use airserver::error::AirError;
use airserver::model::{JobId, ResponderId, ResponderStatus};
use airserver::wire::{CompleteRequest, PendingResponse};

use crate::client::AuthorityClient;
use crate::config::AgentConfig;
use crate::platform::Platform;

/// Result text reported for every simulated job.
pub const JOB_RESULT: &str = "Completed successfully";

/// Control messages accepted by a running agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentCommand {
    Register,
    Deregister,
    /// Deregister, then stop the agent task.
    Exit,
}

/// Where the agent is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AgentPhase {
    #[default]
    Idle,
    Registering,
    Healthy,
    Unhealthy,
    Deregistering,
    Stopped,
}

/// Observable agent state, published on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentSnapshot {
    pub phase: AgentPhase,
    pub responder_id: Option<ResponderId>,
    pub name: Option<String>,
    pub jobs_completed: u64,
    /// Job currently being processed, if any.
    pub current_job: Option<JobId>,
}

/// Handle to a spawned agent task.
pub struct AgentHandle {
    label: String,
    tx: mpsc::UnboundedSender<AgentCommand>,
    state: watch::Receiver<AgentSnapshot>,
    task: JoinHandle<()>,
}

impl AgentHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Queue a command. Fire-and-forget: returns false only if the agent
    /// has already stopped.
    pub fn send(&self, cmd: AgentCommand) -> bool {
        self.tx.send(cmd).is_ok()
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AgentSnapshot> {
        self.state.clone()
    }

    /// Give up the handle, keeping only the task to await or abort.
    pub fn into_task(self) -> JoinHandle<()> {
        self.task
    }
}

/// Spawn an idle agent task labelled `label`.
pub fn spawn_agent(
    label: impl Into<String>,
    client: AuthorityClient,
    config: Arc<AgentConfig>,
    platform: Platform,
) -> AgentHandle {
    let label = label.into();
    let (tx, rx) = mpsc::unbounded_channel();
    let (state_tx, state) = watch::channel(AgentSnapshot::default());

    let agent = ResponderAgent {
        client,
        config,
        platform,
        token: None,
        responder_id: None,
        state: state_tx,
        rng: StdRng::from_os_rng(),
    };
    let span = tracing::info_span!("responder", label = %label);
    let task = tokio::spawn(agent.run(rx).instrument(span));

    AgentHandle { label, tx, state, task }
}

struct ResponderAgent {
    client: AuthorityClient,
    config: Arc<AgentConfig>,
    platform: Platform,
    /// Last token issued to us. Kept after deregistration so that a later
    /// `register` re-activates the same identity.
    token: Option<String>,
    /// Id confirmed by the last registration or completion.
    responder_id: Option<ResponderId>,
    state: watch::Sender<AgentSnapshot>,
    rng: StdRng,
}

impl ResponderAgent {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<AgentCommand>) {
        let mut poll = tokio::time::interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut deferred: Option<AgentCommand> = None;

        loop {
            let cmd = match deferred.take() {
                Some(cmd) => Some(cmd),
                None => {
                    let healthy = self.phase() == AgentPhase::Healthy;
                    tokio::select! {
                        biased;
                        // A closed channel means the owner is gone: leave cleanly.
                        cmd = rx.recv() => Some(cmd.unwrap_or(AgentCommand::Exit)),
                        _ = poll.tick(), if healthy => None,
                    }
                }
            };

            match cmd {
                Some(AgentCommand::Register) => {
                    self.register().await;
                    if self.phase() == AgentPhase::Healthy {
                        poll.reset_immediately();
                    }
                }
                Some(AgentCommand::Deregister) => self.deregister().await,
                Some(AgentCommand::Exit) => {
                    self.deregister().await;
                    break;
                }
                None => deferred = self.work(&mut rx).await,
            }
        }

        self.set_phase(AgentPhase::Stopped);
        tracing::debug!("agent stopped");
    }

    fn phase(&self) -> AgentPhase {
        self.state.borrow().phase
    }

    fn set_phase(&self, phase: AgentPhase) {
        self.state.send_modify(|s| s.phase = phase);
    }

    async fn register(&mut self) {
        let previous = self.phase();
        self.set_phase(AgentPhase::Registering);
        let name = self.config.name.clone();

        let mut result = self.client.register(self.token.as_deref(), name.as_deref()).await;
        if let Err(ref e) = result {
            if e.is(&AirError::UnknownToken) {
                tracing::info!("stored token is unknown to the authority, registering fresh");
                self.token = None;
                result = self.client.register(None, name.as_deref()).await;
            }
        }

        match result {
            Ok(resp) => {
                let phase = match resp.status {
                    ResponderStatus::Healthy => AgentPhase::Healthy,
                    ResponderStatus::Unhealthy => AgentPhase::Unhealthy,
                };
                tracing::info!(
                    responder_id = resp.id,
                    status = %resp.status,
                    "'{}' registered successfully",
                    resp.name
                );
                self.token = Some(resp.token);
                self.responder_id = Some(resp.id);
                self.state.send_modify(|s| {
                    s.phase = phase;
                    s.responder_id = Some(resp.id);
                    s.name = Some(resp.name);
                });
            }
            Err(e) => {
                if e.is(&AirError::AlreadyRegistered) {
                    tracing::warn!("registration failed: responder already registered");
                } else {
                    tracing::warn!(err = %e, "registration failed");
                }
                self.set_phase(previous);
            }
        }
    }

    async fn deregister(&mut self) {
        let active = matches!(self.phase(), AgentPhase::Healthy | AgentPhase::Unhealthy);
        let token = match self.token.clone() {
            Some(token) if active => token,
            _ => {
                tracing::info!("no active responder session to deregister");
                self.set_phase(AgentPhase::Idle);
                return;
            }
        };

        self.set_phase(AgentPhase::Deregistering);
        match self.client.deregister(&token).await {
            Ok(_) => tracing::info!("responder deregistered successfully"),
            Err(e) if e.is(&AirError::AlreadyDeregistered) => {
                tracing::info!("responder is already deregistered");
            }
            Err(e) => tracing::warn!(err = %e, "deregistration failed"),
        }
        self.state.send_modify(|s| {
            s.phase = AgentPhase::Idle;
            s.current_job = None;
        });
    }

    /// Job sub-loop. Runs until no job is available, a call fails, or a
    /// command arrives; the interrupting command is returned.
    async fn work(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<AgentCommand>,
    ) -> Option<AgentCommand> {
        loop {
            let job_id = self.request_job().await?;
            if let Some(cmd) = checkpoint(rx) {
                return Some(cmd);
            }

            tracing::info!(job_id, "processing job");
            self.state.send_modify(|s| s.current_job = Some(job_id));
            let duration = self.work_duration();
            tokio::select! {
                biased;
                cmd = rx.recv() => {
                    tracing::info!(job_id, "job interrupted, leaving it pending");
                    self.state.send_modify(|s| s.current_job = None);
                    return Some(cmd.unwrap_or(AgentCommand::Exit));
                }
                _ = tokio::time::sleep(duration) => {}
            }

            let reported = self.report(job_id).await;
            self.state.send_modify(|s| s.current_job = None);
            if !reported {
                return None;
            }
            if let Some(cmd) = checkpoint(rx) {
                return Some(cmd);
            }
        }
    }

    /// Find work: our pending job if there is one, else (optionally) a fresh
    /// self-assignment.
    async fn request_job(&mut self) -> Option<JobId> {
        let token = self.token.clone()?;
        let id = self.responder_id?;

        match self.client.pending(&token).await {
            Ok(PendingResponse::Job { job_id, .. }) => return Some(job_id),
            Ok(PendingResponse::Empty { .. }) => {}
            Err(e) => {
                tracing::warn!(err = %e, "error checking for pending jobs");
                return None;
            }
        }
        if !self.config.self_assign {
            tracing::debug!("no pending jobs");
            return None;
        }

        match self.client.assign(id).await {
            Ok(resp) => Some(resp.job_id),
            Err(e) => match e.conflicting_job() {
                Some(job_id) => Some(job_id),
                None => {
                    tracing::warn!(err = %e, "error requesting job assignment");
                    None
                }
            },
        }
    }

    /// Report completion. Returns false if the authority did not accept it.
    async fn report(&mut self, job_id: JobId) -> bool {
        let Some(token) = self.token.clone() else {
            return false;
        };
        let req = CompleteRequest {
            token,
            result: JOB_RESULT.to_owned(),
            ip_address: self.platform.ip_address.clone(),
            operating_system: self.platform.operating_system.clone(),
        };

        match self.client.complete(&req).await {
            Ok(resp) => {
                tracing::info!(
                    job_id = resp.job_id,
                    "job completed successfully, system details updated"
                );
                // Follow-up requests use the id the authority just confirmed.
                self.responder_id = Some(resp.responder_id);
                self.state.send_modify(|s| {
                    s.jobs_completed += 1;
                    s.responder_id = Some(resp.responder_id);
                });
                true
            }
            Err(e) => {
                tracing::warn!(job_id, err = %e, "error completing job");
                false
            }
        }
    }

    fn work_duration(&mut self) -> Duration {
        let (lo, hi) = (self.config.work_min_ms, self.config.work_max_ms);
        let ms = if lo >= hi { lo } else { self.rng.random_range(lo..=hi) };
        Duration::from_millis(ms)
    }
}

/// Non-blocking check for a queued command.
fn checkpoint(rx: &mut mpsc::UnboundedReceiver<AgentCommand>) -> Option<AgentCommand> {
    match rx.try_recv() {
        Ok(cmd) => Some(cmd),
        Err(mpsc::error::TryRecvError::Empty) => None,
        Err(mpsc::error::TryRecvError::Disconnected) => Some(AgentCommand::Exit),
    }
}
