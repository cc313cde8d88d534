use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::poll::{self, DEFAULT_INTERVAL, FLUID_FREE_INTERVAL};
use crate::host::{FluidDomain, FrameSpan, HostEnv, ModifierFamily, PaintCanvas, SimCache};

/// Kind tag of an [`Action`]. The kind only selects which parameter fields
/// are read; the fields themselves all live on the action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ObjectOperator,
    ScriptedOperator,
    Render,
    Bake,
}

/// Frame-range selection for render actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderRange {
    Scene,
    Preview,
    Custom { start: i32, end: i32 },
}

/// One configured step in a flow.
///
/// Parameters of inactive kinds are kept, not cleared: switching the kind away
/// and back restores the previous configuration. This is deliberate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub enabled: bool,
    pub kind: ActionKind,

    /// Target object, shared by the operator and bake kinds.
    pub target: String,
    pub operator: String,
    pub script: String,
    pub render_range: RenderRange,
    pub bake_modifier: String,
    pub paint_surface: String,
    /// Bake even if a valid cache already exists.
    pub rebake: bool,
    pub bake_fluid_mesh: bool,
}

impl Default for Action {
    fn default() -> Self {
        Self {
            enabled: true,
            kind: ActionKind::ObjectOperator,
            target: String::new(),
            operator: String::new(),
            script: String::new(),
            render_range: RenderRange::Scene,
            bake_modifier: String::new(),
            paint_surface: String::new(),
            rebake: false,
            bake_fluid_mesh: true,
        }
    }
}

/// What an action run amounted to. The pipeline advances either way; a skip
/// is observable but never fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Skipped,
}

impl Action {
    /// Execute this action against the host and resolve when its effect is
    /// complete. Disabled actions and unresolvable references resolve
    /// immediately as [`Outcome::Skipped`]; no configuration raises an error.
    pub async fn run(&self, env: &dyn HostEnv) -> Outcome {
        if !self.enabled {
            return Outcome::Skipped;
        }
        debug!(kind = ?self.kind, "running action");

        match self.kind {
            ActionKind::ObjectOperator => self.run_object_operator(env),
            ActionKind::ScriptedOperator => self.run_script(env),
            ActionKind::Render => self.run_render(env).await,
            ActionKind::Bake => self.run_bake(env).await,
        }
    }

    fn run_object_operator(&self, env: &dyn HostEnv) -> Outcome {
        if !env.has_object(&self.target) {
            debug!(object = %self.target, "operator target not found, skipping");
            return Outcome::Skipped;
        }

        match env.run_object_operator(&self.target, &self.operator) {
            Ok(()) => Outcome::Completed,
            Err(err) => {
                warn!(object = %self.target, operator = %self.operator, %err, "operator failed");
                Outcome::Skipped
            }
        }
    }

    fn run_script(&self, env: &dyn HostEnv) -> Outcome {
        match env.run_script(&self.script) {
            Ok(()) => Outcome::Completed,
            Err(err) => {
                warn!(%err, "script failed");
                Outcome::Skipped
            }
        }
    }

    fn render_span(&self, env: &dyn HostEnv) -> FrameSpan {
        match self.render_range {
            RenderRange::Scene => env.scene_frame_range(),
            RenderRange::Preview => env.preview_frame_range(),
            RenderRange::Custom { start, end } => FrameSpan::new(start, end),
        }
    }

    async fn run_render(&self, env: &dyn HostEnv) -> Outcome {
        let original = env.scene_frame_range();
        let span = self.render_span(env);
        env.set_scene_frame_range(span);

        if let Err(err) = env.trigger_render() {
            warn!(%err, "render trigger failed");
            env.set_scene_frame_range(original);
            return Outcome::Skipped;
        }

        // The render is done once the output of the final frame lands on disk
        // with a fresh modification time.
        let last_frame = env.frame_output_path(span.end);
        debug!(path = %last_frame.display(), "waiting for final rendered frame");
        poll::await_file_write(&last_frame, DEFAULT_INTERVAL).await;

        env.dismiss_render_preview();
        env.play_rendered_sequence();
        env.set_scene_frame_range(original);
        Outcome::Completed
    }

    async fn run_bake(&self, env: &dyn HostEnv) -> Outcome {
        let Some(modifier) = env.modifier(&self.target, &self.bake_modifier) else {
            debug!(
                object = %self.target,
                modifier = %self.bake_modifier,
                "bake target not found, skipping"
            );
            return Outcome::Skipped;
        };

        match modifier.family() {
            ModifierFamily::Cache(cache) => {
                self.bake_cache(cache.as_ref()).await;
                Outcome::Completed
            }
            ModifierFamily::Fluid(domain) => {
                self.bake_fluid(domain.as_ref()).await;
                Outcome::Completed
            }
            ModifierFamily::Paint(canvas) => self.bake_paint(canvas.as_ref()).await,
        }
    }

    async fn bake_cache(&self, cache: &dyn SimCache) {
        if self.rebake || !cache.is_baked() {
            cache.free();
            cache.bake();
            poll::await_interval(|| cache.is_baked(), DEFAULT_INTERVAL).await;
        }
    }

    async fn bake_fluid(&self, domain: &dyn FluidDomain) {
        let span = domain.cache_span();
        let do_mesh = self.bake_fluid_mesh && domain.supports_mesh_bake();

        if self.rebake {
            domain.free_all();
            poll::await_interval(|| domain.data_frame() <= span.start, FLUID_FREE_INTERVAL).await;
            domain.bake_data();
            poll::await_interval(|| domain.data_frame() >= span.end, DEFAULT_INTERVAL).await;
        } else if domain.data_frame() < span.end {
            domain.bake_data();
            poll::await_interval(|| domain.data_frame() >= span.end, DEFAULT_INTERVAL).await;
        }

        if do_mesh {
            debug!("fluid data baked, starting mesh pass");
            domain.bake_mesh();
            poll::await_interval(|| domain.mesh_frame() >= span.end, DEFAULT_INTERVAL).await;
        }
    }

    async fn bake_paint(&self, canvas: &dyn PaintCanvas) -> Outcome {
        let Some(surface) = canvas.surface(&self.paint_surface) else {
            debug!(surface = %self.paint_surface, "paint surface not found, skipping");
            return Outcome::Skipped;
        };

        if !surface.is_image_sequence() {
            self.bake_cache(surface.cache().as_ref()).await;
            return Outcome::Completed;
        }

        let outputs = surface.enabled_outputs();
        let Some(last_output) = outputs.last() else {
            warn!("skipped paint bake: no output channels enabled");
            return Outcome::Skipped;
        };

        // Last channel of the last frame is the final file the bake writes.
        let filename = format!(
            "{}{:04}{}",
            last_output,
            surface.end_frame(),
            surface.file_extension()
        );
        let path = surface.output_dir().join(filename);
        debug!(path = %path.display(), "waiting for paint bake output");

        surface.bake();
        poll::await_file_write(&path, DEFAULT_INTERVAL).await;
        Outcome::Completed
    }
}
