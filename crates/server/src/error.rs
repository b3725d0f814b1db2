// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::JobId;

/// Errors surfaced by the registry and dispatcher.
///
/// Every variant maps to exactly one HTTP status and one machine-readable
/// code; the transport layer never invents its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AirError {
    /// The bearer token does not resolve to any responder.
    Unauthorized,
    /// Registration attempted with the token of a registered responder.
    AlreadyRegistered,
    /// Deregistration attempted on an already retired responder.
    AlreadyDeregistered,
    /// No responder matches the given token or id.
    NotFound,
    /// Registration supplied a token nobody holds.
    UnknownToken,
    /// Work was assigned to a responder that is not registered.
    NotRegistered,
    /// Completion reported without an outstanding job.
    NoPendingJob,
    /// The responder already has a pending job.
    JobConflict { job_id: JobId },
    Internal(String),
}

impl AirError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::AlreadyRegistered
            | Self::AlreadyDeregistered
            | Self::NotRegistered
            | Self::NoPendingJob => 400,
            Self::NotFound | Self::UnknownToken => 404,
            Self::JobConflict { .. } => 409,
            Self::Internal(_) => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::AlreadyDeregistered => "ALREADY_DEREGISTERED",
            Self::NotFound => "NOT_FOUND",
            Self::UnknownToken => "UNKNOWN_TOKEN",
            Self::NotRegistered => "NOT_REGISTERED",
            Self::NoPendingJob => "NO_PENDING_JOB",
            Self::JobConflict { .. } => "JOB_CONFLICT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Human-readable message for the error envelope.
    pub fn message(&self) -> String {
        match self {
            Self::Unauthorized => "Unauthorized responder".to_owned(),
            Self::AlreadyRegistered => "Responder already registered.".to_owned(),
            Self::AlreadyDeregistered => "Responder already deregistered".to_owned(),
            Self::NotFound => "Responder not found".to_owned(),
            Self::UnknownToken => "Token does not belong to any responder".to_owned(),
            Self::NotRegistered => "Responder is not registered".to_owned(),
            Self::NoPendingJob => "No pending job for this responder.".to_owned(),
            Self::JobConflict { job_id } => {
                format!("Responder already has pending job {job_id}")
            }
            Self::Internal(_) => "Internal Server Error".to_owned(),
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        let details = match self {
            Self::JobConflict { job_id } => Some(serde_json::json!({ "jobId": job_id })),
            _ => None,
        };
        ErrorBody { code: self.as_str().to_owned(), message: self.message(), details }
    }

    pub fn to_http_response(&self) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse { error: self.to_error_body() }))
    }
}

impl fmt::Display for AirError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal(detail) => write!(f, "{}: {detail}", self.as_str()),
            _ => f.write_str(self.as_str()),
        }
    }
}

impl std::error::Error for AirError {}

impl IntoResponse for AirError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref detail) = self {
            tracing::error!(err = %detail, "request failed");
        }
        self.to_http_response().into_response()
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
