// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Table snapshots: load/save to a JSON file with atomic writes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{Job, JobId, Responder, ResponderId};

/// On-disk form of both tables.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Highest responder id ever issued. Ids are never reused.
    #[serde(default)]
    pub last_responder_id: ResponderId,
    #[serde(default)]
    pub last_job_id: JobId,
    #[serde(default)]
    pub responders: Vec<Responder>,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// Load a snapshot, or an empty one if the file does not exist yet.
pub fn load(path: &Path) -> anyhow::Result<Snapshot> {
    if !path.exists() {
        return Ok(Snapshot::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&contents)?;
    Ok(snapshot)
}

/// Save a snapshot atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) so concurrent saves never
/// share a `.tmp` file.
pub fn save(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
