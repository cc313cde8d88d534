//! Task progress reporting.
//!
//! The engine pushes title/description/progress updates for the running flow
//! to the broker. Delivery is best effort: a missing or slow broker must never
//! hold up the pipeline, so the HTTP transport is fire-and-forget and a missed
//! update is simply superseded by the next one.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Broker ingress endpoint the engine reports to by default.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:2048/update/blender-butler";

/// Partial task update. Absent fields are omitted on the wire, not cleared.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.progress.is_none()
    }

    fn query_params(self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(title) = self.title {
            params.push(("title", title));
        }
        if let Some(description) = self.description {
            params.push(("description", description));
        }
        if let Some(progress) = self.progress {
            params.push(("progress", progress.to_string()));
        }
        params
    }
}

/// Seam between the engine and the progress transport.
pub trait ProgressSink: Send + Sync {
    fn update(&self, patch: TaskPatch);
}

/// Fire-and-forget reporter over the broker's pull-style ingress
/// (`GET /update/{id}?title=&description=&progress=`).
pub struct HttpReporter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReporter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Deliver one update and surface the transport error, for callers that
    /// want confirmation (the CLI does; the engine does not).
    pub async fn send(&self, patch: TaskPatch) -> Result<()> {
        self.client
            .get(&self.endpoint)
            .query(&patch.query_params())
            .send()
            .await
            .with_context(|| format!("failed to reach broker at {}", self.endpoint))?
            .error_for_status()
            .context("broker rejected the update")?;
        Ok(())
    }
}

impl Default for HttpReporter {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl ProgressSink for HttpReporter {
    fn update(&self, patch: TaskPatch) {
        if patch.is_empty() {
            return;
        }
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            if let Err(err) = client.get(&endpoint).query(&patch.query_params()).send().await {
                debug!(%err, "progress update dropped");
            }
        });
    }
}

/// Discards every update; used when reporting is disabled.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn update(&self, _patch: TaskPatch) {}
}
