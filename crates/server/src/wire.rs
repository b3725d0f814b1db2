// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON request/response bodies shared by the authority and its agents.

use serde::{Deserialize, Serialize};

use crate::model::{JobId, Responder, ResponderId, ResponderStatus};

pub const MSG_REGISTERED: &str = "Registered with new token";
pub const MSG_DEREGISTERED: &str = "Responder deregistered successfully";
pub const MSG_NO_PENDING_JOBS: &str = "No pending jobs";
pub const MSG_JOB_COMPLETED: &str = "Job completed, responder updated as healthy";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: ResponderId,
    pub name: String,
    pub token: String,
    pub status: ResponderStatus,
    pub message: String,
}

/// Body for calls that identify the caller by token only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public view of a responder. Never carries the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderInfo {
    pub id: ResponderId,
    pub name: String,
    pub ip_address: Option<String>,
    pub operating_system: Option<String>,
    pub status: ResponderStatus,
    pub last_seen: u64,
}

impl From<Responder> for ResponderInfo {
    fn from(r: Responder) -> Self {
        Self {
            id: r.id,
            name: r.name,
            ip_address: r.ip_address,
            operating_system: r.operating_system,
            status: r.status,
            last_seen: r.last_seen,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub responder_id: ResponderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignResponse {
    pub job_id: JobId,
}

/// Either the caller's pending job or a "No pending jobs" message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PendingResponse {
    #[serde(rename_all = "camelCase")]
    Job { job_id: JobId, description: String },
    Empty { message: String },
}

impl PendingResponse {
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Self::Job { job_id, .. } => Some(*job_id),
            Self::Empty { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub operating_system: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub responder_id: ResponderId,
    pub job_id: JobId,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Every responder ever created.
    pub responders: usize,
    /// Currently registered responders.
    pub active: usize,
}
