use serde::{Deserialize, Serialize};

use crate::engine::flow::Flow;
use crate::error::SettingsError;

pub const DEFAULT_FLOW_NAME: &str = "Flow";

/// The set of named flows plus the currently selected one.
///
/// Invariant: there is always at least one flow; removing the last one is
/// rejected.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "SettingsFile")]
pub struct Settings {
    flows: Vec<Flow>,
    active: usize,
}

/// On-disk shape. The conversion re-establishes the invariants, so a
/// deserialized `Settings` is always valid.
#[derive(Deserialize)]
struct SettingsFile {
    #[serde(default)]
    flows: Vec<Flow>,
    #[serde(default)]
    active: usize,
}

impl TryFrom<SettingsFile> for Settings {
    type Error = SettingsError;

    fn try_from(file: SettingsFile) -> Result<Self, Self::Error> {
        let mut settings = Self {
            flows: file.flows,
            active: file.active,
        };
        settings.normalize()?;
        Ok(settings)
    }
}

impl Settings {
    pub fn new() -> Self {
        Self {
            flows: vec![Flow::new(DEFAULT_FLOW_NAME)],
            active: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    /// Append a fresh flow and select it.
    pub fn add_flow(&mut self) -> &mut Flow {
        self.flows.push(Flow::new(DEFAULT_FLOW_NAME));
        self.active = self.flows.len() - 1;
        self.flows.last_mut().unwrap()
    }

    pub fn remove_flow(&mut self, index: usize) -> Result<(), SettingsError> {
        if index >= self.flows.len() {
            return Err(SettingsError::OutOfBounds(index));
        }
        if self.flows.len() == 1 {
            return Err(SettingsError::LastFlow);
        }
        self.flows.remove(index);
        if self.active >= self.flows.len() {
            self.active = self.flows.len() - 1;
        }
        Ok(())
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.flows.len() {
            return false;
        }
        self.active = index;
        true
    }

    pub fn active_flow(&self) -> &Flow {
        &self.flows[self.active]
    }

    pub fn active_flow_mut(&mut self) -> &mut Flow {
        &mut self.flows[self.active]
    }

    /// At least one flow, active index inside bounds.
    fn normalize(&mut self) -> Result<(), SettingsError> {
        if self.flows.is_empty() {
            return Err(SettingsError::Empty);
        }
        if self.active >= self.flows.len() {
            self.active = self.flows.len() - 1;
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}
