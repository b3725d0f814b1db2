// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the responder registry and job dispatcher.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AirError;
use crate::state::AirState;
use crate::wire::{
    AssignRequest, AssignResponse, CompleteRequest, CompleteResponse, HealthResponse,
    MessageResponse, PendingResponse, RegisterRequest, RegisterResponse, ResponderInfo,
    TokenRequest, MSG_DEREGISTERED, MSG_JOB_COMPLETED, MSG_NO_PENDING_JOBS, MSG_REGISTERED,
};

/// `GET /api/health`
pub async fn health(State(s): State<Arc<AirState>>) -> Result<impl IntoResponse, AirError> {
    let responders = s.registry.count()?;
    let active = s.registry.list_active()?.len();
    Ok(Json(HealthResponse { status: "running".to_owned(), responders, active }))
}

/// `POST /api/responders/register`: 200 for a new identity, 201 for a rotation.
pub async fn register(
    State(s): State<Arc<AirState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AirError> {
    let reg = s.registry.register(req.token.as_deref(), req.name.as_deref())?;
    let code = if reg.rotated { StatusCode::CREATED } else { StatusCode::OK };
    let r = reg.responder;
    let body = RegisterResponse {
        id: r.id,
        name: r.name,
        token: r.token,
        status: r.status,
        message: MSG_REGISTERED.to_owned(),
    };
    Ok((code, Json(body)))
}

/// `POST /api/responders/deregister`
pub async fn deregister(
    State(s): State<Arc<AirState>>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, AirError> {
    s.registry.deregister(&req.token)?;
    Ok(Json(MessageResponse { message: MSG_DEREGISTERED.to_owned() }))
}

/// `GET /api/responders`: registered responders for the dashboard.
pub async fn list_responders(
    State(s): State<Arc<AirState>>,
) -> Result<impl IntoResponse, AirError> {
    let list: Vec<ResponderInfo> =
        s.registry.list_active()?.into_iter().map(ResponderInfo::from).collect();
    Ok(Json(list))
}

/// `POST /api/jobs/assign`
pub async fn assign_job(
    State(s): State<Arc<AirState>>,
    Json(req): Json<AssignRequest>,
) -> Result<impl IntoResponse, AirError> {
    let job_id = s.dispatcher.assign(req.responder_id).inspect_err(|e| {
        if !matches!(e, AirError::JobConflict { .. }) {
            tracing::warn!(responder_id = req.responder_id, err = %e, "error assigning new job");
        }
    })?;
    Ok(Json(AssignResponse { job_id }))
}

/// `POST /api/jobs/pending`
pub async fn pending_job(
    State(s): State<Arc<AirState>>,
    Json(req): Json<TokenRequest>,
) -> Result<impl IntoResponse, AirError> {
    let body = match s.dispatcher.pending(&req.token)? {
        Some(job) => PendingResponse::Job { job_id: job.id, description: job.description },
        None => PendingResponse::Empty { message: MSG_NO_PENDING_JOBS.to_owned() },
    };
    Ok(Json(body))
}

/// `POST /api/jobs/complete`
pub async fn complete_job(
    State(s): State<Arc<AirState>>,
    Json(req): Json<CompleteRequest>,
) -> Result<impl IntoResponse, AirError> {
    let done =
        s.dispatcher.complete(&req.token, &req.result, &req.ip_address, &req.operating_system)?;
    Ok(Json(CompleteResponse {
        responder_id: done.responder_id,
        job_id: done.job.id,
        message: MSG_JOB_COMPLETED.to_owned(),
    }))
}
