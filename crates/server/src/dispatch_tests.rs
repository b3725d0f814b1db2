// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::{JobStatus, ResponderStatus};
use crate::store::memory::MemoryStore;
use crate::store::{IdentityStore, NewResponder, StoreError};

struct Fixture {
    registry: Arc<ResponderRegistry>,
    dispatcher: JobDispatcher,
}

fn fixture(healthy_probability: f64) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(ResponderRegistry::new(store.clone(), healthy_probability, Some(3)));
    let dispatcher = JobDispatcher::new(store, Arc::clone(&registry), "Automated system checkup task");
    Fixture { registry, dispatcher }
}

#[test]
fn assign_then_pending_then_complete() -> anyhow::Result<()> {
    let f = fixture(1.0);
    let r = f.registry.register(None, None)?.responder;

    let job_id = f.dispatcher.assign(r.id)?;
    let pending = f.dispatcher.pending(&r.token)?.ok_or_else(|| anyhow::anyhow!("no job"))?;
    assert_eq!(pending.id, job_id);
    assert_eq!(pending.description, "Automated system checkup task");
    assert_eq!(pending.status, JobStatus::Pending);

    let done = f.dispatcher.complete(&r.token, "Completed successfully", "10.1.1.1", "Linux")?;
    assert_eq!(done.responder_id, r.id);
    assert_eq!(done.job.id, job_id);
    assert_eq!(done.job.status, JobStatus::Completed);
    assert_eq!(done.job.result.as_deref(), Some("Completed successfully"));
    assert!(done.job.completed_at.is_some());

    assert!(f.dispatcher.pending(&r.token)?.is_none());
    Ok(())
}

#[test]
fn completion_heals_unhealthy_responder() -> anyhow::Result<()> {
    let f = fixture(0.0);
    let r = f.registry.register(None, None)?.responder;
    assert_eq!(r.status, ResponderStatus::Unhealthy);

    f.dispatcher.assign(r.id)?;
    f.dispatcher.complete(&r.token, "ok", "192.168.0.4", "MacOS")?;

    let after = f.registry.resolve(&r.token)?;
    assert_eq!(after.status, ResponderStatus::Healthy);
    assert_eq!(after.ip_address.as_deref(), Some("192.168.0.4"));
    assert_eq!(after.operating_system.as_deref(), Some("MacOS"));
    assert!(after.last_seen >= r.last_seen);
    Ok(())
}

#[test]
fn second_assign_conflicts() -> anyhow::Result<()> {
    let f = fixture(1.0);
    let r = f.registry.register(None, None)?.responder;
    let first = f.dispatcher.assign(r.id)?;
    assert_eq!(f.dispatcher.assign(r.id).err(), Some(AirError::JobConflict { job_id: first }));
    Ok(())
}

#[test]
fn assign_requires_registered_responder() -> anyhow::Result<()> {
    let f = fixture(1.0);
    assert_eq!(f.dispatcher.assign(77).err(), Some(AirError::NotFound));

    let r = f.registry.register(None, None)?.responder;
    f.registry.deregister(&r.token)?;
    assert_eq!(f.dispatcher.assign(r.id).err(), Some(AirError::NotRegistered));
    Ok(())
}

#[test]
fn unknown_token_is_unauthorized() -> anyhow::Result<()> {
    let f = fixture(1.0);
    assert_eq!(f.dispatcher.pending("bogus").err(), Some(AirError::Unauthorized));
    assert_eq!(
        f.dispatcher.complete("bogus", "ok", "1.1.1.1", "Linux").err(),
        Some(AirError::Unauthorized)
    );
    Ok(())
}

#[test]
fn complete_without_pending_job_mutates_nothing() -> anyhow::Result<()> {
    let f = fixture(0.0);
    let r = f.registry.register(None, None)?.responder;

    let err = f.dispatcher.complete(&r.token, "ok", "1.1.1.1", "Linux").err();
    assert_eq!(err, Some(AirError::NoPendingJob));

    let after = f.registry.resolve(&r.token)?;
    assert_eq!(after, r);
    Ok(())
}

#[test]
fn concurrent_completions_finish_one_job_once() -> anyhow::Result<()> {
    let f = fixture(1.0);
    let r = f.registry.register(None, None)?.responder;
    let job_id = f.dispatcher.assign(r.id)?;

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| f.dispatcher.complete(&r.token, "ok", "1.1.1.1", "Linux")))
            .collect();
        handles.into_iter().filter_map(|h| h.join().ok()).collect()
    });

    let won: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(won.len(), 1);
    assert_eq!(won[0].job.id, job_id);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == AirError::NoPendingJob));
    Ok(())
}

#[test]
fn pending_works_after_token_rotation() -> anyhow::Result<()> {
    let f = fixture(1.0);
    let r = f.registry.register(None, None)?.responder;
    let job_id = f.dispatcher.assign(r.id)?;
    f.registry.deregister(&r.token)?;
    let rotated = f.registry.register(Some(&r.token), None)?.responder;

    assert_eq!(f.dispatcher.pending(&r.token).err(), Some(AirError::Unauthorized));
    assert_eq!(f.dispatcher.pending(&rotated.token)?.map(|j| j.id), Some(job_id));
    Ok(())
}

/// Identity table whose heartbeat writes always fail.
struct HeartbeatDown(Arc<MemoryStore>);

impl IdentityStore for HeartbeatDown {
    fn insert_responder(&self, new: NewResponder) -> Result<Responder, StoreError> {
        self.0.insert_responder(new)
    }

    fn responder_by_token(&self, token: &str) -> Result<Option<Responder>, StoreError> {
        self.0.responder_by_token(token)
    }

    fn responder_by_id(&self, id: ResponderId) -> Result<Option<Responder>, StoreError> {
        self.0.responder_by_id(id)
    }

    fn reactivate(
        &self,
        token: &str,
        new_token: &str,
        now: u64,
    ) -> Result<Option<Responder>, StoreError> {
        self.0.reactivate(token, new_token, now)
    }

    fn deactivate(&self, token: &str, now: u64) -> Result<Option<Responder>, StoreError> {
        self.0.deactivate(token, now)
    }

    fn record_heartbeat(
        &self,
        _id: ResponderId,
        _ip_address: &str,
        _operating_system: &str,
        _now: u64,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("disk full".to_owned()))
    }

    fn registered_responders(&self) -> Result<Vec<Responder>, StoreError> {
        self.0.registered_responders()
    }

    fn responder_count(&self) -> Result<usize, StoreError> {
        self.0.responder_count()
    }
}

#[test]
fn completion_survives_failed_heartbeat() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let identities = Arc::new(HeartbeatDown(Arc::clone(&store)));
    let registry = Arc::new(ResponderRegistry::new(identities, 0.0, Some(5)));
    let dispatcher = JobDispatcher::new(store, Arc::clone(&registry), "checkup");

    let r = registry.register(None, None)?.responder;
    let job_id = dispatcher.assign(r.id)?;

    let done = dispatcher.complete(&r.token, "ok", "10.0.0.9", "Linux")?;
    assert_eq!(done.job.id, job_id);
    assert_eq!(dispatcher.job(job_id)?.map(|j| j.status), Some(JobStatus::Completed));

    let after = registry.resolve(&r.token)?;
    assert_eq!(after.status, ResponderStatus::Unhealthy);
    assert_eq!(after.ip_address, None);
    assert_eq!(after.operating_system, None);
    Ok(())
}
