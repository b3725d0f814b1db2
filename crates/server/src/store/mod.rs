// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage seams for responder and job records.
//!
//! The authority treats storage as an external system of record that offers
//! atomic point reads and conditional updates. Each trait method is one such
//! atomic operation; callers never hold a lock across two of them.

pub mod memory;
pub mod persist;

use std::fmt;

use crate::error::AirError;
use crate::model::{Job, JobId, Responder, ResponderId, ResponderStatus};

/// Fields supplied when a responder row is created.
#[derive(Debug, Clone)]
pub struct NewResponder {
    pub name: String,
    pub token: String,
    pub status: ResponderStatus,
    pub now: u64,
}

/// Fields supplied when a job row is created.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub description: String,
    pub assigned_to: ResponderId,
    pub now: u64,
}

/// Result of a conditional pending-job insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Job),
    /// The responder already holds this pending job; nothing was written.
    Conflict(JobId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Token uniqueness constraint violated on insert.
    DuplicateToken,
    /// The backing store could not complete the operation.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateToken => f.write_str("duplicate token"),
            Self::Unavailable(e) => write!(f, "store unavailable: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for AirError {
    fn from(e: StoreError) -> Self {
        AirError::Internal(e.to_string())
    }
}

/// Durable table of responder records.
pub trait IdentityStore: Send + Sync {
    /// Insert a registered responder, assigning the next id.
    fn insert_responder(&self, new: NewResponder) -> Result<Responder, StoreError>;

    fn responder_by_token(&self, token: &str) -> Result<Option<Responder>, StoreError>;

    fn responder_by_id(&self, id: ResponderId) -> Result<Option<Responder>, StoreError>;

    /// Rotate the token of a *deregistered* responder and mark it registered
    /// and healthy. Returns `None` when no deregistered row holds `token`.
    fn reactivate(
        &self,
        token: &str,
        new_token: &str,
        now: u64,
    ) -> Result<Option<Responder>, StoreError>;

    /// Retire a *registered* responder. Returns `None` when no registered row
    /// holds `token`.
    fn deactivate(&self, token: &str, now: u64) -> Result<Option<Responder>, StoreError>;

    /// Mark healthy and store reported network facts. Returns false if the id
    /// is unknown.
    fn record_heartbeat(
        &self,
        id: ResponderId,
        ip_address: &str,
        operating_system: &str,
        now: u64,
    ) -> Result<bool, StoreError>;

    /// All registered responders ordered by id.
    fn registered_responders(&self) -> Result<Vec<Responder>, StoreError>;

    fn responder_count(&self) -> Result<usize, StoreError>;
}

/// Durable table of job records.
pub trait JobStore: Send + Sync {
    /// Insert a pending job unless the responder already has one.
    fn insert_pending_if_absent(&self, new: NewJob) -> Result<InsertOutcome, StoreError>;

    /// Oldest (lowest id) pending job assigned to `responder`.
    fn oldest_pending(&self, responder: ResponderId) -> Result<Option<Job>, StoreError>;

    /// Atomically complete the oldest pending job of `responder`. Returns
    /// `None`, writing nothing, when there is no pending job.
    fn complete_oldest_pending(
        &self,
        responder: ResponderId,
        result: &str,
        now: u64,
    ) -> Result<Option<Job>, StoreError>;

    fn job(&self, id: JobId) -> Result<Option<Job>, StoreError>;
}
