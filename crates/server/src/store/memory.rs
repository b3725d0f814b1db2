// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process store backing both tables, with optional snapshot persistence.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::model::{Job, JobId, JobStatus, Responder, ResponderId, ResponderStatus};
use crate::store::persist::{self, Snapshot};
use crate::store::{IdentityStore, InsertOutcome, JobStore, NewJob, NewResponder, StoreError};

#[derive(Debug, Default, Clone)]
struct Tables {
    last_responder_id: ResponderId,
    last_job_id: JobId,
    responders: BTreeMap<ResponderId, Responder>,
    jobs: BTreeMap<JobId, Job>,
    /// Unique index over `responders[*].token`.
    tokens: HashMap<String, ResponderId>,
}

impl Tables {
    fn from_snapshot(snapshot: Snapshot) -> anyhow::Result<Self> {
        let mut tables = Tables {
            last_responder_id: snapshot.last_responder_id,
            last_job_id: snapshot.last_job_id,
            ..Default::default()
        };
        for responder in snapshot.responders {
            if tables.tokens.insert(responder.token.clone(), responder.id).is_some() {
                anyhow::bail!("snapshot holds duplicate token for responder {}", responder.id);
            }
            tables.last_responder_id = tables.last_responder_id.max(responder.id);
            tables.responders.insert(responder.id, responder);
        }
        for job in snapshot.jobs {
            tables.last_job_id = tables.last_job_id.max(job.id);
            tables.jobs.insert(job.id, job);
        }
        Ok(tables)
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            last_responder_id: self.last_responder_id,
            last_job_id: self.last_job_id,
            responders: self.responders.values().cloned().collect(),
            jobs: self.jobs.values().cloned().collect(),
        }
    }

    fn by_token_mut(&mut self, token: &str) -> Option<&mut Responder> {
        let id = *self.tokens.get(token)?;
        self.responders.get_mut(&id)
    }

    fn oldest_pending_id(&self, responder: ResponderId) -> Option<JobId> {
        // BTreeMap iterates in id order, so the first match is the oldest.
        self.jobs
            .values()
            .find(|j| j.assigned_to == Some(responder) && j.status == JobStatus::Pending)
            .map(|j| j.id)
    }
}

/// Mutex-guarded responder and job tables.
///
/// Every trait operation runs under one lock, which serialises conflicting
/// writes. With a snapshot path, writes are applied to a copy, saved, and only
/// then published, so a failed save leaves the tables untouched.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { tables: Mutex::new(Tables::default()), snapshot_path: None }
    }

    /// Open a store persisted at `path`, loading any existing snapshot.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let tables = Tables::from_snapshot(persist::load(path)?)?;
        tracing::info!(
            path = %path.display(),
            responders = tables.responders.len(),
            jobs = tables.jobs.len(),
            "loaded store snapshot"
        );
        Ok(Self { tables: Mutex::new(tables), snapshot_path: Some(path.to_path_buf()) })
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        f(&self.tables.lock())
    }

    /// Run a mutation atomically. `f` reports whether it changed anything.
    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> (T, bool)) -> Result<T, StoreError> {
        let mut tables = self.tables.lock();
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(f(&mut tables).0);
        };

        let mut next = tables.clone();
        let (out, changed) = f(&mut next);
        if changed {
            persist::save(path, &next.to_snapshot())
                .map_err(|e| StoreError::Unavailable(format!("{e:#}")))?;
            *tables = next;
        }
        Ok(out)
    }
}

impl IdentityStore for MemoryStore {
    fn insert_responder(&self, new: NewResponder) -> Result<Responder, StoreError> {
        self.write(|t| {
            if t.tokens.contains_key(&new.token) {
                return (Err(StoreError::DuplicateToken), false);
            }
            t.last_responder_id += 1;
            let responder = Responder {
                id: t.last_responder_id,
                name: new.name,
                token: new.token,
                status: new.status,
                ip_address: None,
                operating_system: None,
                last_seen: new.now,
                is_registered: true,
            };
            t.tokens.insert(responder.token.clone(), responder.id);
            t.responders.insert(responder.id, responder.clone());
            (Ok(responder), true)
        })?
    }

    fn responder_by_token(&self, token: &str) -> Result<Option<Responder>, StoreError> {
        Ok(self.read(|t| t.tokens.get(token).and_then(|id| t.responders.get(id)).cloned()))
    }

    fn responder_by_id(&self, id: ResponderId) -> Result<Option<Responder>, StoreError> {
        Ok(self.read(|t| t.responders.get(&id).cloned()))
    }

    fn reactivate(
        &self,
        token: &str,
        new_token: &str,
        now: u64,
    ) -> Result<Option<Responder>, StoreError> {
        self.write(|t| {
            if t.tokens.contains_key(new_token) {
                return (Err(StoreError::DuplicateToken), false);
            }
            let Some(r) = t.by_token_mut(token) else {
                return (Ok(None), false);
            };
            if r.is_registered {
                return (Ok(None), false);
            }
            r.token = new_token.to_owned();
            r.status = ResponderStatus::Healthy;
            r.last_seen = now;
            r.is_registered = true;
            let updated = r.clone();
            t.tokens.remove(token);
            t.tokens.insert(updated.token.clone(), updated.id);
            (Ok(Some(updated)), true)
        })?
    }

    fn deactivate(&self, token: &str, now: u64) -> Result<Option<Responder>, StoreError> {
        self.write(|t| match t.by_token_mut(token) {
            Some(r) if r.is_registered => {
                r.is_registered = false;
                r.last_seen = now;
                (Some(r.clone()), true)
            }
            _ => (None, false),
        })
    }

    fn record_heartbeat(
        &self,
        id: ResponderId,
        ip_address: &str,
        operating_system: &str,
        now: u64,
    ) -> Result<bool, StoreError> {
        self.write(|t| match t.responders.get_mut(&id) {
            Some(r) => {
                r.status = ResponderStatus::Healthy;
                r.ip_address = Some(ip_address.to_owned());
                r.operating_system = Some(operating_system.to_owned());
                r.last_seen = now;
                (true, true)
            }
            None => (false, false),
        })
    }

    fn registered_responders(&self) -> Result<Vec<Responder>, StoreError> {
        Ok(self.read(|t| t.responders.values().filter(|r| r.is_registered).cloned().collect()))
    }

    fn responder_count(&self) -> Result<usize, StoreError> {
        Ok(self.read(|t| t.responders.len()))
    }
}

impl JobStore for MemoryStore {
    fn insert_pending_if_absent(&self, new: NewJob) -> Result<InsertOutcome, StoreError> {
        self.write(|t| {
            if let Some(existing) = t.oldest_pending_id(new.assigned_to) {
                return (InsertOutcome::Conflict(existing), false);
            }
            t.last_job_id += 1;
            let job = Job {
                id: t.last_job_id,
                description: new.description,
                assigned_to: Some(new.assigned_to),
                status: JobStatus::Pending,
                result: None,
                created_at: new.now,
                completed_at: None,
            };
            t.jobs.insert(job.id, job.clone());
            (InsertOutcome::Inserted(job), true)
        })
    }

    fn oldest_pending(&self, responder: ResponderId) -> Result<Option<Job>, StoreError> {
        Ok(self.read(|t| t.oldest_pending_id(responder).and_then(|id| t.jobs.get(&id)).cloned()))
    }

    fn complete_oldest_pending(
        &self,
        responder: ResponderId,
        result: &str,
        now: u64,
    ) -> Result<Option<Job>, StoreError> {
        self.write(|t| {
            let Some(id) = t.oldest_pending_id(responder) else {
                return (None, false);
            };
            let Some(job) = t.jobs.get_mut(&id) else {
                return (None, false);
            };
            job.status = JobStatus::Completed;
            job.result = Some(result.to_owned());
            job.completed_at = Some(now);
            (Some(job.clone()), true)
        })
    }

    fn job(&self, id: JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.read(|t| t.jobs.get(&id).cloned()))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
