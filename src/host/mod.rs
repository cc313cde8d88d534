use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Inclusive frame range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSpan {
    pub start: i32,
    pub end: i32,
}

impl FrameSpan {
    pub fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }
}

/// 宿主环境接口：引擎依赖的全部宿主能力
///
/// The host application (scene graph, render trigger, simulation caches)
/// implements this; the engine never talks to the host any other way.
/// None of these calls block: triggers only start a background job, and the
/// engine infers completion by polling (see [`crate::engine::poll`]).
pub trait HostEnv: Send + Sync {
    fn has_object(&self, name: &str) -> bool;

    /// Look up a simulation modifier on a named object.
    fn modifier(&self, object: &str, modifier: &str) -> Option<Arc<dyn SimModifier>>;

    fn scene_frame_range(&self) -> FrameSpan;
    fn set_scene_frame_range(&self, span: FrameSpan);
    fn preview_frame_range(&self) -> FrameSpan;

    /// Start an animation render over the current scene frame range.
    fn trigger_render(&self) -> Result<()>;

    /// On-disk output path for one rendered frame.
    fn frame_output_path(&self, frame: i32) -> PathBuf;

    /// Close the transient render-preview window, if one is open.
    fn dismiss_render_preview(&self);
    fn play_rendered_sequence(&self);

    fn run_object_operator(&self, object: &str, operator: &str) -> Result<()>;
    fn run_script(&self, code: &str) -> Result<()>;

    /// Handle for the host's "state refreshed" notification.
    fn refresh_notify(&self) -> Arc<Notify>;
}

/// One simulation modifier attached to a host object.
pub trait SimModifier: Send + Sync {
    fn family(&self) -> ModifierFamily;
}

/// Closed dispatch over the modifier families the engine knows how to bake.
pub enum ModifierFamily {
    /// Point-cache simulations (cloth, soft body, ...).
    Cache(Arc<dyn SimCache>),
    /// Domain-type fluid simulation with separate data and mesh passes.
    Fluid(Arc<dyn FluidDomain>),
    /// Canvas-type dynamic paint with named surfaces.
    Paint(Arc<dyn PaintCanvas>),
}

pub trait SimCache: Send + Sync {
    fn is_baked(&self) -> bool;
    fn free(&self);
    /// Start a bake; completion is observed through [`SimCache::is_baked`].
    fn bake(&self);
}

pub trait FluidDomain: Send + Sync {
    fn cache_span(&self) -> FrameSpan;
    /// Last frame the data cache has reached.
    fn data_frame(&self) -> i32;
    /// Last frame the mesh cache has reached.
    fn mesh_frame(&self) -> i32;
    fn free_all(&self);
    fn bake_data(&self);
    fn bake_mesh(&self);
    /// Liquid domain with mesh output and a modular, resumable cache.
    fn supports_mesh_bake(&self) -> bool;
}

pub trait PaintCanvas: Send + Sync {
    fn surface(&self, name: &str) -> Option<Arc<dyn PaintSurface>>;
}

pub trait PaintSurface: Send + Sync {
    /// True when the surface writes an image sequence instead of a point cache.
    fn is_image_sequence(&self) -> bool;
    /// Names of the enabled output channels, in output order.
    fn enabled_outputs(&self) -> Vec<String>;
    fn end_frame(&self) -> i32;
    /// Extension of the image outputs, with the leading dot (".png" / ".exr").
    fn file_extension(&self) -> String;
    fn output_dir(&self) -> PathBuf;
    fn bake(&self);
    /// Point cache used when the surface is not an image sequence.
    fn cache(&self) -> Arc<dyn SimCache>;
}
