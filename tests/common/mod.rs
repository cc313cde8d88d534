#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::Notify;

use butler::host::{
    FluidDomain, FrameSpan, HostEnv, ModifierFamily, PaintCanvas, PaintSurface, SimCache,
    SimModifier,
};
use butler::report::{ProgressSink, TaskPatch};

/// Scriptable stand-in for the host application. Render and paint bakes
/// complete from a background thread after a short delay, so the engine's
/// polling paths are exercised for real.
pub struct MockHost {
    objects: Mutex<HashSet<String>>,
    modifiers: Mutex<HashMap<(String, String), Arc<dyn SimModifier>>>,
    scene_span: Mutex<FrameSpan>,
    preview_span: Mutex<FrameSpan>,
    render_dir: PathBuf,
    pub render_delay: Duration,
    pub fail_render: AtomicBool,
    pub fail_operators: AtomicBool,
    pub fail_scripts: AtomicBool,
    pub renders: AtomicUsize,
    pub preview_dismissed: AtomicBool,
    pub playback_started: AtomicBool,
    pub operator_log: Mutex<Vec<(String, String)>>,
    pub script_log: Mutex<Vec<String>>,
    refresh: Arc<Notify>,
}

impl MockHost {
    pub fn new(render_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            objects: Mutex::new(HashSet::new()),
            modifiers: Mutex::new(HashMap::new()),
            scene_span: Mutex::new(FrameSpan::new(1, 250)),
            preview_span: Mutex::new(FrameSpan::new(1, 50)),
            render_dir,
            render_delay: Duration::from_millis(30),
            fail_render: AtomicBool::new(false),
            fail_operators: AtomicBool::new(false),
            fail_scripts: AtomicBool::new(false),
            renders: AtomicUsize::new(0),
            preview_dismissed: AtomicBool::new(false),
            playback_started: AtomicBool::new(false),
            operator_log: Mutex::new(Vec::new()),
            script_log: Mutex::new(Vec::new()),
            refresh: Arc::new(Notify::new()),
        })
    }

    pub fn add_object(&self, name: &str) {
        self.objects.lock().unwrap().insert(name.to_string());
    }

    pub fn add_modifier(&self, object: &str, modifier: &str, instance: Arc<dyn SimModifier>) {
        self.add_object(object);
        self.modifiers
            .lock()
            .unwrap()
            .insert((object.to_string(), modifier.to_string()), instance);
    }
}

impl HostEnv for MockHost {
    fn has_object(&self, name: &str) -> bool {
        self.objects.lock().unwrap().contains(name)
    }

    fn modifier(&self, object: &str, modifier: &str) -> Option<Arc<dyn SimModifier>> {
        self.modifiers
            .lock()
            .unwrap()
            .get(&(object.to_string(), modifier.to_string()))
            .cloned()
    }

    fn scene_frame_range(&self) -> FrameSpan {
        *self.scene_span.lock().unwrap()
    }

    fn set_scene_frame_range(&self, span: FrameSpan) {
        *self.scene_span.lock().unwrap() = span;
    }

    fn preview_frame_range(&self) -> FrameSpan {
        *self.preview_span.lock().unwrap()
    }

    fn trigger_render(&self) -> Result<()> {
        if self.fail_render.load(Ordering::SeqCst) {
            bail!("render backend unavailable");
        }
        self.renders.fetch_add(1, Ordering::SeqCst);

        let path = self.frame_output_path(self.scene_frame_range().end);
        let delay = self.render_delay;
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let _ = std::fs::write(path, b"frame");
        });
        Ok(())
    }

    fn frame_output_path(&self, frame: i32) -> PathBuf {
        self.render_dir.join(format!("frame_{frame:04}.png"))
    }

    fn dismiss_render_preview(&self) {
        self.preview_dismissed.store(true, Ordering::SeqCst);
    }

    fn play_rendered_sequence(&self) {
        self.playback_started.store(true, Ordering::SeqCst);
    }

    fn run_object_operator(&self, object: &str, operator: &str) -> Result<()> {
        if self.fail_operators.load(Ordering::SeqCst) {
            bail!("operator raised");
        }
        self.operator_log
            .lock()
            .unwrap()
            .push((object.to_string(), operator.to_string()));
        Ok(())
    }

    fn run_script(&self, code: &str) -> Result<()> {
        if self.fail_scripts.load(Ordering::SeqCst) {
            bail!("script raised");
        }
        self.script_log.lock().unwrap().push(code.to_string());
        Ok(())
    }

    fn refresh_notify(&self) -> Arc<Notify> {
        self.refresh.clone()
    }
}

/// Point cache whose bake completes instantly.
pub struct MockCache {
    baked: AtomicBool,
    pub frees: AtomicUsize,
    pub bakes: AtomicUsize,
}

impl MockCache {
    pub fn new(baked: bool) -> Arc<Self> {
        Arc::new(Self {
            baked: AtomicBool::new(baked),
            frees: AtomicUsize::new(0),
            bakes: AtomicUsize::new(0),
        })
    }
}

impl SimCache for MockCache {
    fn is_baked(&self) -> bool {
        self.baked.load(Ordering::SeqCst)
    }

    fn free(&self) {
        self.frees.fetch_add(1, Ordering::SeqCst);
        self.baked.store(false, Ordering::SeqCst);
    }

    fn bake(&self) {
        self.bakes.fetch_add(1, Ordering::SeqCst);
        self.baked.store(true, Ordering::SeqCst);
    }
}

pub struct CacheModifier(pub Arc<MockCache>);

impl SimModifier for CacheModifier {
    fn family(&self) -> ModifierFamily {
        ModifierFamily::Cache(self.0.clone())
    }
}

/// Fluid domain whose passes complete instantly; the call log records the
/// order of free/bake triggers.
pub struct MockFluid {
    span: FrameSpan,
    data_frame: AtomicI32,
    mesh_frame: AtomicI32,
    supports_mesh: bool,
    pub calls: Mutex<Vec<&'static str>>,
}

impl MockFluid {
    pub fn new(span: FrameSpan, cached_to: i32, supports_mesh: bool) -> Arc<Self> {
        Arc::new(Self {
            span,
            data_frame: AtomicI32::new(cached_to),
            mesh_frame: AtomicI32::new(span.start),
            supports_mesh,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl FluidDomain for MockFluid {
    fn cache_span(&self) -> FrameSpan {
        self.span
    }

    fn data_frame(&self) -> i32 {
        self.data_frame.load(Ordering::SeqCst)
    }

    fn mesh_frame(&self) -> i32 {
        self.mesh_frame.load(Ordering::SeqCst)
    }

    fn free_all(&self) {
        self.calls.lock().unwrap().push("free_all");
        self.data_frame.store(self.span.start, Ordering::SeqCst);
        self.mesh_frame.store(self.span.start, Ordering::SeqCst);
    }

    fn bake_data(&self) {
        self.calls.lock().unwrap().push("bake_data");
        self.data_frame.store(self.span.end, Ordering::SeqCst);
    }

    fn bake_mesh(&self) {
        self.calls.lock().unwrap().push("bake_mesh");
        self.mesh_frame.store(self.span.end, Ordering::SeqCst);
    }

    fn supports_mesh_bake(&self) -> bool {
        self.supports_mesh
    }
}

pub struct FluidModifier(pub Arc<MockFluid>);

impl SimModifier for FluidModifier {
    fn family(&self) -> ModifierFamily {
        ModifierFamily::Fluid(self.0.clone())
    }
}

/// Paint surface; an image-sequence bake writes its output files from a
/// background thread after a short delay.
pub struct MockSurface {
    image_sequence: bool,
    outputs: Vec<String>,
    end_frame: i32,
    extension: String,
    output_dir: PathBuf,
    bake_delay: Duration,
    pub bakes: AtomicUsize,
    cache: Arc<MockCache>,
}

impl MockSurface {
    pub fn image(outputs: &[&str], end_frame: i32, output_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            image_sequence: true,
            outputs: outputs.iter().map(|name| name.to_string()).collect(),
            end_frame,
            extension: ".png".to_string(),
            output_dir,
            bake_delay: Duration::from_millis(30),
            bakes: AtomicUsize::new(0),
            cache: MockCache::new(false),
        })
    }

    pub fn cached(cache: Arc<MockCache>) -> Arc<Self> {
        Arc::new(Self {
            image_sequence: false,
            outputs: Vec::new(),
            end_frame: 0,
            extension: ".png".to_string(),
            output_dir: PathBuf::new(),
            bake_delay: Duration::ZERO,
            bakes: AtomicUsize::new(0),
            cache,
        })
    }
}

impl PaintSurface for MockSurface {
    fn is_image_sequence(&self) -> bool {
        self.image_sequence
    }

    fn enabled_outputs(&self) -> Vec<String> {
        self.outputs.clone()
    }

    fn end_frame(&self) -> i32 {
        self.end_frame
    }

    fn file_extension(&self) -> String {
        self.extension.clone()
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    fn bake(&self) {
        self.bakes.fetch_add(1, Ordering::SeqCst);
        let dir = self.output_dir.clone();
        let extension = self.extension.clone();
        let end_frame = self.end_frame;
        let outputs = self.outputs.clone();
        let delay = self.bake_delay;
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            for name in outputs {
                let _ = std::fs::write(dir.join(format!("{name}{end_frame:04}{extension}")), b"px");
            }
        });
    }

    fn cache(&self) -> Arc<dyn SimCache> {
        self.cache.clone()
    }
}

pub struct MockCanvas {
    surfaces: Mutex<HashMap<String, Arc<MockSurface>>>,
}

impl MockCanvas {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            surfaces: Mutex::new(HashMap::new()),
        })
    }

    pub fn add_surface(&self, name: &str, surface: Arc<MockSurface>) {
        self.surfaces
            .lock()
            .unwrap()
            .insert(name.to_string(), surface);
    }
}

impl PaintCanvas for MockCanvas {
    fn surface(&self, name: &str) -> Option<Arc<dyn PaintSurface>> {
        self.surfaces
            .lock()
            .unwrap()
            .get(name)
            .map(|surface| surface.clone() as Arc<dyn PaintSurface>)
    }
}

pub struct PaintModifier(pub Arc<MockCanvas>);

impl SimModifier for PaintModifier {
    fn family(&self) -> ModifierFamily {
        ModifierFamily::Paint(self.0.clone())
    }
}

/// Captures every progress event in order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TaskPatch>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<TaskPatch> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn update(&self, patch: TaskPatch) {
        self.events.lock().unwrap().push(patch);
    }
}
