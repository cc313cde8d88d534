use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::engine::flow::Flow;
use crate::engine::settings::Settings;

pub fn load_flow_from_yaml(path: impl AsRef<Path>) -> Result<Flow> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read flow definition from {}", path.display()))?;

    let flow: Flow = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to deserialize flow definition from {}", path.display()))?;

    Ok(flow)
}

pub fn load_settings_from_yaml(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;

    let settings: Settings = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to deserialize settings from {}", path.display()))?;

    Ok(settings)
}
