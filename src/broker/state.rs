use std::collections::{BTreeMap, HashMap};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::report::TaskPatch;

/// Latest known state of one task. Unseen fields default to empty / 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub title: String,
    pub description: String,
    pub progress: f64,
}

impl TaskRecord {
    /// Overwrite only the supplied fields, last write wins.
    fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
    }
}

/// The shared task table. Records live for the lifetime of the process and
/// are never deleted; each applied update broadcasts the full snapshot (not a
/// diff) to every subscriber.
pub struct Broker {
    tasks: DashMap<String, TaskRecord>,
    changes: broadcast::Sender<String>,
}

impl Broker {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            tasks: DashMap::new(),
            changes,
        }
    }

    /// Apply a partial update to one task, creating the record if unseen.
    pub fn apply(&self, id: &str, patch: &TaskPatch) {
        self.tasks.entry(id.to_string()).or_default().apply(patch);
        debug!(id, "task updated");
        self.broadcast();
    }

    /// Apply a batch of partial updates (the WebSocket ingress shape), then
    /// broadcast once.
    pub fn apply_many(&self, updates: &HashMap<String, TaskPatch>) {
        for (id, patch) in updates {
            self.tasks.entry(id.clone()).or_default().apply(patch);
        }
        self.broadcast();
    }

    pub fn get(&self, id: &str) -> Option<TaskRecord> {
        self.tasks.get(id).map(|record| record.clone())
    }

    /// Full task table as a JSON object keyed by task id.
    pub fn snapshot_json(&self) -> String {
        let table: BTreeMap<String, TaskRecord> = self
            .tasks
            .iter()
            .map(|record| (record.key().clone(), record.value().clone()))
            .collect();
        serde_json::to_string(&table).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }

    fn broadcast(&self) {
        // Send only fails when nobody is listening, which is fine.
        let _ = self.changes.send(self.snapshot_json());
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}
