use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::action::{Action, Outcome};
use crate::host::HostEnv;
use crate::report::{ProgressSink, TaskPatch};

/// An ordered list of actions executed strictly one after another.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flow {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Flow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// Append a fresh action (enabled, object-operator kind) and return it
    /// for configuration.
    pub fn add_action(&mut self) -> &mut Action {
        self.actions.push(Action::default());
        self.actions.last_mut().unwrap()
    }

    /// Remove the action at `index`. Returns false when out of bounds.
    pub fn remove_action(&mut self, index: usize) -> bool {
        if index >= self.actions.len() {
            return false;
        }
        self.actions.remove(index);
        true
    }

    /// Move the action at `from` to `to`. Callers compute `to` as an adjacent
    /// index (`from ± 1`); any destination outside the sequence bounds is
    /// rejected and the list stays unchanged.
    pub fn move_action(&mut self, from: usize, to: isize) -> bool {
        if from >= self.actions.len() || to < 0 || to as usize >= self.actions.len() {
            return false;
        }
        let action = self.actions.remove(from);
        self.actions.insert(to as usize, action);
        true
    }

    /// Run all actions in order, emitting a progress event before each step
    /// and a summary event at the end. Action `i + 1` never starts before
    /// action `i` has resolved. An empty flow returns without emitting
    /// anything.
    pub async fn run(&self, env: &dyn HostEnv, sink: &dyn ProgressSink) {
        if self.actions.is_empty() {
            return;
        }

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let count = self.actions.len();
        info!(%run_id, flow = %self.name, actions = count, "flow started");

        sink.update(TaskPatch::new().title(&self.name).progress(0.0));

        for (index, action) in self.actions.iter().enumerate() {
            sink.update(
                TaskPatch::new()
                    .description(format!("Task {}/{}", index + 1, count))
                    .progress(index as f64 / count as f64),
            );

            if action.run(env).await == Outcome::Skipped {
                debug!(%run_id, index, "action skipped");
            }
        }

        let elapsed = format_elapsed(started.elapsed().as_secs());
        info!(%run_id, flow = %self.name, %elapsed, "flow finished");
        sink.update(
            TaskPatch::new()
                .description(format!(
                    "All actions of flow \"{}\" have finished in {}!",
                    self.name, elapsed
                ))
                .progress(1.0),
        );
    }
}

/// Wall-clock summary as minutes and seconds.
pub fn format_elapsed(total_seconds: u64) -> String {
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    if minutes > 0 {
        format!("{minutes} minutes, {seconds} seconds")
    } else {
        format!("{seconds} seconds")
    }
}
