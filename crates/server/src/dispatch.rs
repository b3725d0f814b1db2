// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job dispatcher: assignment, pending lookup, and completion.

use std::sync::Arc;

use crate::error::AirError;
use crate::model::{epoch_ms, Job, JobId, Responder, ResponderId};
use crate::registry::ResponderRegistry;
use crate::store::{InsertOutcome, JobStore, NewJob};

/// Result of a successful completion report.
#[derive(Debug, Clone)]
pub struct Completion {
    pub responder_id: ResponderId,
    pub job: Job,
}

/// Owns job lifecycle. Resolves tokens through the shared registry.
pub struct JobDispatcher {
    jobs: Arc<dyn JobStore>,
    registry: Arc<ResponderRegistry>,
    description: String,
}

impl JobDispatcher {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        registry: Arc<ResponderRegistry>,
        description: impl Into<String>,
    ) -> Self {
        Self { jobs, registry, description: description.into() }
    }

    /// Create a pending job for a registered responder.
    ///
    /// Fails with [`AirError::JobConflict`] if one is already pending.
    pub fn assign(&self, responder_id: ResponderId) -> Result<JobId, AirError> {
        let responder = self.registry.by_id(responder_id)?.ok_or(AirError::NotFound)?;
        if !responder.is_registered {
            return Err(AirError::NotRegistered);
        }

        let new =
            NewJob { description: self.description.clone(), assigned_to: responder_id, now: epoch_ms() };
        match self.jobs.insert_pending_if_absent(new)? {
            InsertOutcome::Inserted(job) => {
                tracing::info!(responder_id, job_id = job.id, "new job assigned");
                Ok(job.id)
            }
            InsertOutcome::Conflict(job_id) => {
                tracing::debug!(responder_id, job_id, "responder already has a pending job");
                Err(AirError::JobConflict { job_id })
            }
        }
    }

    /// Oldest pending job for the responder holding `token`, if any.
    pub fn pending(&self, token: &str) -> Result<Option<Job>, AirError> {
        let responder = self.authorize(token)?;
        Ok(self.jobs.oldest_pending(responder.id)?)
    }

    /// Record completion of the caller's pending job and refresh its health.
    ///
    /// The job transition and the heartbeat are separate writes. If the
    /// heartbeat fails the job stays completed and the call still succeeds.
    pub fn complete(
        &self,
        token: &str,
        result: &str,
        ip_address: &str,
        operating_system: &str,
    ) -> Result<Completion, AirError> {
        let responder = self.authorize(token)?;
        let job = self
            .jobs
            .complete_oldest_pending(responder.id, result, epoch_ms())?
            .ok_or(AirError::NoPendingJob)?;

        if let Err(e) = self.registry.record_heartbeat(responder.id, ip_address, operating_system)
        {
            tracing::warn!(
                responder_id = responder.id,
                job_id = job.id,
                err = %e,
                "job completed but responder heartbeat was not recorded"
            );
        }

        tracing::info!(responder_id = responder.id, job_id = job.id, "job completed, responder healthy");
        Ok(Completion { responder_id: responder.id, job })
    }

    pub fn job(&self, id: JobId) -> Result<Option<Job>, AirError> {
        Ok(self.jobs.job(id)?)
    }

    fn authorize(&self, token: &str) -> Result<Responder, AirError> {
        match self.registry.resolve(token) {
            Ok(responder) => Ok(responder),
            Err(AirError::NotFound) => Err(AirError::Unauthorized),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
