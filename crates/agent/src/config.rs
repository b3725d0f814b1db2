// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Responder agent console: registers agents with an AIR authority and runs
/// their job loops.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "air-agent", version, about)]
pub struct AgentConfig {
    /// Base URL of the authority API.
    #[arg(long, default_value = "http://localhost:5001/api", env = "AIR_SERVER_URL")]
    pub server_url: String,

    /// Display name sent on registration. The authority generates one if unset.
    #[arg(long, env = "AIR_AGENT_NAME")]
    pub name: Option<String>,

    /// Interval between job polls while registered and healthy, in milliseconds.
    #[arg(long, default_value_t = 5000, env = "AIR_POLL_MS")]
    pub poll_ms: u64,

    /// Lower bound of simulated job duration in milliseconds.
    #[arg(long, default_value_t = 15000, env = "AIR_WORK_MIN_MS")]
    pub work_min_ms: u64,

    /// Upper bound of simulated job duration in milliseconds.
    #[arg(long, default_value_t = 30000, env = "AIR_WORK_MAX_MS")]
    pub work_max_ms: u64,

    /// Assign a job to ourselves when none is pending.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, env = "AIR_SELF_ASSIGN")]
    pub self_assign: bool,

    /// Per-request HTTP timeout in milliseconds.
    #[arg(long, default_value_t = 10000, env = "AIR_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// How long `exit` waits for agents to deregister, in milliseconds.
    #[arg(long, default_value_t = 5000, env = "AIR_SHUTDOWN_GRACE_MS")]
    pub shutdown_grace_ms: u64,

    /// Spawn this many agents before the console opens.
    #[arg(long, default_value_t = 0)]
    pub spawn: usize,

    /// Log filter directive (e.g. "info", "airagent=debug").
    #[arg(long, default_value = "info", env = "AIR_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format: "text" or "json".
    #[arg(long, default_value = "text", env = "AIR_LOG_FORMAT")]
    pub log_format: String,
}

impl AgentConfig {
    /// Config pointing at `server_url` with defaults everywhere else.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            name: None,
            poll_ms: 5000,
            work_min_ms: 15000,
            work_max_ms: 30000,
            self_assign: true,
            request_timeout_ms: 10000,
            shutdown_grace_ms: 5000,
            spawn: 0,
            log_level: "info".to_owned(),
            log_format: "text".to_owned(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.work_min_ms > self.work_max_ms {
            anyhow::bail!(
                "--work-min-ms ({}) exceeds --work-max-ms ({})",
                self.work_min_ms,
                self.work_max_ms
            );
        }
        if self.poll_ms == 0 {
            anyhow::bail!("--poll-ms must be positive");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
