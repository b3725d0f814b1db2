// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn new_responder(token: &str) -> NewResponder {
    NewResponder {
        name: format!("Responder-{token}"),
        token: token.to_owned(),
        status: ResponderStatus::Unhealthy,
        now: 1,
    }
}

fn new_job(responder: ResponderId) -> NewJob {
    NewJob { description: "check".to_owned(), assigned_to: responder, now: 2 }
}

#[test]
fn ids_are_sequential_and_tokens_unique() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let a = store.insert_responder(new_responder("a"))?;
    let b = store.insert_responder(new_responder("b"))?;
    assert_eq!((a.id, b.id), (1, 2));
    assert!(a.is_registered);

    let dup = store.insert_responder(new_responder("a"));
    assert_eq!(dup, Err(StoreError::DuplicateToken));
    assert_eq!(store.responder_count()?, 2);
    Ok(())
}

#[test]
fn reactivate_only_matches_deregistered_rows() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let r = store.insert_responder(new_responder("old"))?;

    assert_eq!(store.reactivate("old", "new", 5)?, None);

    store.deactivate("old", 3)?;
    let updated = store.reactivate("old", "new", 5)?;
    let updated = updated.ok_or_else(|| anyhow::anyhow!("expected reactivation"))?;
    assert_eq!(updated.id, r.id);
    assert_eq!(updated.token, "new");
    assert_eq!(updated.status, ResponderStatus::Healthy);
    assert_eq!(updated.last_seen, 5);
    assert!(updated.is_registered);

    assert_eq!(store.responder_by_token("old")?, None);
    assert_eq!(store.responder_by_token("new")?.map(|r| r.id), Some(r.id));
    Ok(())
}

#[test]
fn deactivate_is_conditional_on_registration() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.insert_responder(new_responder("t"))?;
    assert!(store.deactivate("t", 9)?.is_some());
    assert!(store.deactivate("t", 10)?.is_none());
    assert!(store.deactivate("missing", 10)?.is_none());
    assert_eq!(store.responder_by_token("t")?.map(|r| r.last_seen), Some(9));
    Ok(())
}

#[test]
fn registered_listing_excludes_retired() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.insert_responder(new_responder("a"))?;
    store.insert_responder(new_responder("b"))?;
    store.insert_responder(new_responder("c"))?;
    store.deactivate("b", 4)?;

    let ids: Vec<_> = store.registered_responders()?.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3]);
    Ok(())
}

#[test]
fn pending_insert_conflicts_until_completed() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let first = match store.insert_pending_if_absent(new_job(1))? {
        InsertOutcome::Inserted(job) => job,
        InsertOutcome::Conflict(id) => anyhow::bail!("unexpected conflict with {id}"),
    };
    assert_eq!(store.insert_pending_if_absent(new_job(1))?, InsertOutcome::Conflict(first.id));

    // Another responder is unaffected.
    assert!(matches!(store.insert_pending_if_absent(new_job(2))?, InsertOutcome::Inserted(_)));

    let done = store.complete_oldest_pending(1, "ok", 7)?;
    assert_eq!(done.as_ref().map(|j| j.id), Some(first.id));
    assert!(matches!(store.insert_pending_if_absent(new_job(1))?, InsertOutcome::Inserted(_)));
    Ok(())
}

#[test]
fn complete_without_pending_writes_nothing() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    assert_eq!(store.complete_oldest_pending(1, "ok", 7)?, None);
    assert_eq!(store.job(1)?, None);
    Ok(())
}

#[test]
fn heartbeat_marks_healthy() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let r = store.insert_responder(new_responder("hb"))?;
    assert!(store.record_heartbeat(r.id, "10.0.0.7", "Linux", 11)?);
    assert!(!store.record_heartbeat(99, "10.0.0.7", "Linux", 11)?);

    let r = store.responder_by_id(r.id)?.ok_or_else(|| anyhow::anyhow!("missing"))?;
    assert_eq!(r.status, ResponderStatus::Healthy);
    assert_eq!(r.ip_address.as_deref(), Some("10.0.0.7"));
    assert_eq!(r.operating_system.as_deref(), Some("Linux"));
    assert_eq!(r.last_seen, 11);
    Ok(())
}

#[test]
fn snapshot_survives_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("air/state.json");
    {
        let store = MemoryStore::open(&path)?;
        store.insert_responder(new_responder("persisted"))?;
        store.insert_pending_if_absent(new_job(1))?;
        store.deactivate("persisted", 3)?;
    }

    let store = MemoryStore::open(&path)?;
    let r = store.responder_by_token("persisted")?.ok_or_else(|| anyhow::anyhow!("missing"))?;
    assert!(!r.is_registered);
    assert_eq!(store.oldest_pending(r.id)?.map(|j| j.id), Some(1));

    // Ids continue after the persisted high-water mark.
    let next = store.insert_responder(new_responder("fresh"))?;
    assert_eq!(next.id, 2);
    Ok(())
}

#[test]
fn failed_save_leaves_tables_untouched() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    // A directory at the snapshot path makes the final rename fail.
    let path = dir.path().join("state.json");
    std::fs::create_dir_all(path.join("blocker"))?;
    let store = MemoryStore { tables: Mutex::new(Tables::default()), snapshot_path: Some(path) };

    let result = store.insert_responder(new_responder("x"));
    assert!(matches!(result, Err(StoreError::Unavailable(_))));
    assert_eq!(store.responder_count()?, 0);
    Ok(())
}
