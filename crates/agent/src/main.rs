// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use airagent::config::AgentConfig;
use airagent::console::{self, HELP};
use airagent::platform::Platform;
use airagent::supervisor::{Flow, Supervisor};

#[tokio::main]
async fn main() {
    let config = AgentConfig::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        std::process::exit(2);
    }

    init_tracing(&config);

    if let Err(e) = run(config).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: AgentConfig) -> anyhow::Result<()> {
    let url = config.server_url.clone();
    let platform = tokio::task::spawn_blocking(move || Platform::detect(&url)).await?;
    tracing::info!(
        server = %config.server_url,
        ip = %platform.ip_address,
        os = %platform.operating_system,
        "agent console starting"
    );

    let spawn = config.spawn;
    let mut supervisor = Supervisor::new(config, platform)?;
    if spawn > 0 {
        supervisor.spawn_many(spawn);
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        };
        // EOF on stdin behaves like `exit`.
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match console::parse(&line) {
            Ok(cmd) => {
                if supervisor.execute(cmd) == Flow::Exit {
                    break;
                }
            }
            Err(e) => eprintln!("{e}"),
        }
    }

    tracing::info!("shutting down");
    supervisor.shutdown().await;
    Ok(())
}

fn init_tracing(config: &AgentConfig) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_target(false).init();
        }
    }
}
