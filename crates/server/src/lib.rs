// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AIR authority: responder registry and job dispatcher over HTTP.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod registry;
pub mod state;
pub mod store;
pub mod transport;
pub mod wire;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::state::AirState;
use crate::store::memory::MemoryStore;
use crate::transport::build_router;

/// Run the authority until ctrl-c.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let shutdown = CancellationToken::new();

    let store = match config.state_file {
        Some(ref path) => Arc::new(MemoryStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    let state = Arc::new(AirState::new(&config, store, shutdown.clone()));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, shutting down");
            }
            shutdown.cancel();
        });
    }

    let listener = TcpListener::bind(&addr).await?;
    if config.state_file.is_some() {
        tracing::info!("air-server listening on {addr} (persistent)");
    } else {
        tracing::info!("air-server listening on {addr}");
    }
    serve(listener, state).await
}

/// Serve the authority on an already-bound listener until the state's
/// shutdown token fires.
pub async fn serve(listener: TcpListener, state: Arc<AirState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let router = build_router(state);
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;
    Ok(())
}
