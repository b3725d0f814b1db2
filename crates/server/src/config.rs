// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Description given to every job created by the dispatcher.
pub const DEFAULT_JOB_DESCRIPTION: &str = "Automated system checkup task";

/// Configuration for the AIR authority (responder registry + job dispatcher).
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "air-server", version, about)]
pub struct ServerConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "AIR_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 5001, env = "AIR_PORT")]
    pub port: u16,

    /// JSON snapshot file for responder and job tables. In-memory only if unset.
    #[arg(long, env = "AIR_STATE_FILE")]
    pub state_file: Option<PathBuf>,

    /// Probability that a newly created responder starts out healthy.
    #[arg(long, default_value_t = 0.75, env = "AIR_HEALTHY_PROBABILITY")]
    pub healthy_probability: f64,

    /// Seed for name, token and health generation. Random if unset.
    #[arg(long, env = "AIR_SEED")]
    pub seed: Option<u64>,

    /// Description text attached to assigned jobs.
    #[arg(long, default_value = DEFAULT_JOB_DESCRIPTION, env = "AIR_JOB_DESCRIPTION")]
    pub job_description: String,

    /// Log filter directive (e.g. "info", "airserver=debug").
    #[arg(long, default_value = "info", env = "AIR_LOG_LEVEL")]
    pub log_level: String,

    /// Log output format: "text" or "json".
    #[arg(long, default_value = "text", env = "AIR_LOG_FORMAT")]
    pub log_format: String,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject values clap cannot check on its own.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.healthy_probability) {
            anyhow::bail!(
                "--healthy-probability must be within [0, 1], got {}",
                self.healthy_probability
            );
        }
        if self.job_description.trim().is_empty() {
            anyhow::bail!("--job-description must not be empty");
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 5001,
            state_file: None,
            healthy_probability: 0.75,
            seed: None,
            job_description: DEFAULT_JOB_DESCRIPTION.to_owned(),
            log_level: "info".to_owned(),
            log_format: "text".to_owned(),
        }
    }
}
