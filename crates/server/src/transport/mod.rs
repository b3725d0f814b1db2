// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the authority.

pub mod http;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AirState;

/// Build the axum `Router` with all authority routes.
pub fn build_router(state: Arc<AirState>) -> Router {
    Router::new()
        .route("/api/health", get(http::health))
        // Responder registry
        .route("/api/responders", get(http::list_responders))
        .route("/api/responders/register", post(http::register))
        .route("/api/responders/deregister", post(http::deregister))
        // Job dispatch
        .route("/api/jobs/assign", post(http::assign_job))
        .route("/api/jobs/pending", post(http::pending_job))
        .route("/api/jobs/complete", post(http::complete_job))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
