//! Frame loop: input, projection, banded rasterization, overlay, presentation.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use image::{ImageFormat, RgbImage};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::Camera;
use crate::geometry::{DepthInterpolation, RasterOptions};
use crate::model::{DrawContext, Model, draw_projected};
use crate::overlay::draw_text_lines;
use crate::rectangle::split_rows;
use crate::screen::{FrameBuffers, PixelBuffer};
use crate::transform::Mat4;
use crate::triangle::ScreenTriangle;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Running,
    Closed,
}

/// Discrete input the scene understands. At most one is applied per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputEvent {
    Quit,
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    RotateUp,
    RotateDown,
    RotateLeft,
    RotateRight,
    ToggleFps,
    ToggleDepthView,
    ToggleWireframe,
    ToggleCull,
    ToggleWinding,
    ToggleDepthTest,
    ToggleTriangleCount,
    Screenshot,
}

pub trait InputSource {
    /// The pending event for `frame`, if any.
    fn poll(&mut self, frame: u64) -> Option<InputEvent>;
}

/// Never produces an event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _frame: u64) -> Option<InputEvent> {
        None
    }
}

/// Replays events keyed by frame number. Events scheduled for the same frame
/// are delivered on consecutive ticks, one per tick.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    events: VecDeque<(u64, InputEvent)>,
}

impl ScriptedInput {
    pub fn new(mut events: Vec<(u64, InputEvent)>) -> Self {
        events.sort_by_key(|(frame, _)| *frame);
        Self { events: events.into() }
    }

    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, frame: u64) -> Option<InputEvent> {
        match self.events.front() {
            Some((due, _)) if *due <= frame => self.events.pop_front().map(|(_, event)| event),
            _ => None,
        }
    }
}

/// Which buffer a presentation sink is handed.
#[derive(Debug, Clone, Copy)]
pub enum FrameView<'a> {
    Color(&'a PixelBuffer),
    Depth(&'a PixelBuffer),
}

impl FrameView<'_> {
    pub fn to_rgb8(&self) -> RgbImage {
        match self {
            FrameView::Color(buf) => buf.to_rgb8(),
            FrameView::Depth(buf) => buf.depth_to_rgb8(),
        }
    }
}

pub trait PresentationSink {
    fn present(&mut self, frame: FrameView<'_>, stats: &FrameStats) -> Result<(), RenderError>;
}

/// Discards frames, counting them.
#[derive(Debug, Default)]
pub struct NullSink {
    pub frames: u64,
}

impl PresentationSink for NullSink {
    fn present(&mut self, _frame: FrameView<'_>, _stats: &FrameStats) -> Result<(), RenderError> {
        self.frames += 1;
        Ok(())
    }
}

/// Writes every `every`-th frame to `dir/frame_NNNNN.png`.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    every: u64,
    written: Vec<PathBuf>,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> Result<Self, RenderError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| RenderError::Io { path: dir.clone(), source })?;
        Ok(Self { dir, every: every.max(1), written: Vec::new() })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl PresentationSink for PngSequenceSink {
    fn present(&mut self, frame: FrameView<'_>, stats: &FrameStats) -> Result<(), RenderError> {
        if stats.frame % self.every != 0 {
            return Ok(());
        }
        let path = self.dir.join(format!("frame_{:05}.png", stats.frame));
        frame.to_rgb8().save_with_format(&path, ImageFormat::Png).map_err(|source| RenderError::Image { path: path.clone(), source })?;
        self.written.push(path);
        Ok(())
    }
}

/// Saves images as `screenshot_N.png`, taking the lowest N not yet on disk.
/// Existing files are never replaced.
#[derive(Debug)]
pub struct ScreenshotWriter {
    dir: PathBuf,
    next: u32,
}

impl ScreenshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), next: 0 }
    }

    pub fn save(&mut self, image: &RgbImage) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.dir).map_err(|source| RenderError::Io { path: self.dir.clone(), source })?;
        loop {
            let path = self.dir.join(format!("screenshot_{}.png", self.next));
            self.next += 1;
            // create_new fails if the name is taken, even if it appeared after a previous scan.
            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(RenderError::Io { path, source }),
            };
            if let Err(source) = write_png(file, image) {
                // Leave no truncated file behind to hold the name.
                let _ = fs::remove_file(&path);
                return Err(RenderError::Image { path, source });
            }
            return Ok(path);
        }
    }
}

fn write_png(file: File, image: &RgbImage) -> Result<(), image::ImageError> {
    let mut writer = BufWriter::new(file);
    image.write_to(&mut writer, ImageFormat::Png)
}

/// Render toggles. Only the scene's own tick thread changes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderFlags {
    pub wireframe: bool,
    pub cull_face: bool,
    /// Counter-clockwise screen winding is the front face.
    pub front_face_ccw: bool,
    pub depth_test: bool,
    pub show_fps: bool,
    /// Present the depth buffer instead of the colour buffer.
    pub show_depth: bool,
    pub show_triangle_count: bool,
    pub interpolation: DepthInterpolation,
}

impl Default for RenderFlags {
    fn default() -> Self {
        Self {
            wireframe: false,
            cull_face: true,
            front_face_ccw: false,
            depth_test: true,
            show_fps: false,
            show_depth: false,
            show_triangle_count: false,
            interpolation: DepthInterpolation::Edge01,
        }
    }
}

impl RenderFlags {
    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions { wireframe: self.wireframe, depth_test: self.depth_test, interpolation: self.interpolation }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub frame: u64,
    pub triangles: u32,
    pub draw_time: Duration,
    pub fps: f32,
}

const OVERLAY_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

pub struct Scene {
    pub camera: Camera,
    pub flags: RenderFlags,
    models: Vec<Model>,
    buffers: FrameBuffers,
    projection: Mat4,
    pool: rayon::ThreadPool,
    bands: usize,
    frame_count: u64,
    state: SceneState,
    screenshots: ScreenshotWriter,
    last_stats: FrameStats,
}

impl Scene {
    /// A scene rendering `width` x `height` frames on a pool of `threads` workers.
    pub fn new(width: usize, height: usize, projection: Mat4, threads: usize) -> Result<Self, RenderError> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        // Extra strips let idle workers pick up slack from busy regions of the screen.
        let bands = threads * 4;
        debug!("raster strips: {:?}", split_rows(width, height, bands));

        Ok(Self {
            camera: Camera::default(),
            flags: RenderFlags::default(),
            models: Vec::new(),
            buffers: FrameBuffers::new(width, height),
            projection,
            pool,
            bands,
            frame_count: 0,
            state: SceneState::Running,
            screenshots: ScreenshotWriter::new("."),
            last_stats: FrameStats::default(),
        })
    }

    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshots = ScreenshotWriter::new(dir);
        self
    }

    pub fn add_model(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut [Model] {
        &mut self.models
    }

    pub fn buffers(&self) -> &FrameBuffers {
        &self.buffers
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Writes the current colour buffer as the next free screenshot.
    pub fn screenshot(&mut self) -> Result<PathBuf, RenderError> {
        let path = self.screenshots.save(&self.buffers.color.to_rgb8())?;
        info!("saved screenshot {}", path.display());
        Ok(path)
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Quit => self.state = SceneState::Closed,
            InputEvent::MoveForward => self.camera.move_forward(),
            InputEvent::MoveBack => self.camera.move_back(),
            InputEvent::MoveLeft => self.camera.move_left(),
            InputEvent::MoveRight => self.camera.move_right(),
            InputEvent::RotateUp => self.camera.rotate_up(),
            InputEvent::RotateDown => self.camera.rotate_down(),
            InputEvent::RotateLeft => self.camera.rotate_left(),
            InputEvent::RotateRight => self.camera.rotate_right(),
            InputEvent::ToggleFps => self.flags.show_fps = !self.flags.show_fps,
            InputEvent::ToggleDepthView => self.flags.show_depth = !self.flags.show_depth,
            InputEvent::ToggleWireframe => self.flags.wireframe = !self.flags.wireframe,
            InputEvent::ToggleCull => self.flags.cull_face = !self.flags.cull_face,
            InputEvent::ToggleWinding => self.flags.front_face_ccw = !self.flags.front_face_ccw,
            InputEvent::ToggleDepthTest => self.flags.depth_test = !self.flags.depth_test,
            InputEvent::ToggleTriangleCount => self.flags.show_triangle_count = !self.flags.show_triangle_count,
            InputEvent::Screenshot => {
                if let Err(e) = self.screenshot() {
                    warn!("screenshot failed: {e}");
                }
            }
        }
    }

    /// Runs one frame. Does nothing once the scene is closed.
    pub fn tick(&mut self, input: &mut dyn InputSource, sink: &mut dyn PresentationSink) -> Result<SceneState, RenderError> {
        if self.state == SceneState::Closed {
            return Ok(SceneState::Closed);
        }
        let frame_start = Instant::now();

        self.camera.update();
        if let Some(event) = input.poll(self.frame_count) {
            debug!("frame {}: {:?}", self.frame_count, event);
            self.apply(event);
            if self.state == SceneState::Closed {
                info!("scene closed after {} frames", self.frame_count);
                return Ok(SceneState::Closed);
            }
            // Movement and rotation take effect in this frame's view.
            self.camera.update();
        }

        self.buffers.clear();
        let draw_start = Instant::now();
        let triangles = self.rasterize();
        let draw_time = draw_start.elapsed();

        let frame_time = frame_start.elapsed().as_secs_f32();
        let stats = FrameStats {
            frame: self.frame_count,
            triangles,
            draw_time,
            fps: if frame_time > 0.0 { 1.0 / frame_time } else { 0.0 },
        };
        debug!("frame {}: {} triangles in {:?}", stats.frame, stats.triangles, stats.draw_time);

        self.draw_overlay(&stats);
        let view = if self.flags.show_depth {
            FrameView::Depth(&self.buffers.depth)
        } else {
            FrameView::Color(&self.buffers.color)
        };
        sink.present(view, &stats)?;

        self.last_stats = stats;
        self.frame_count += 1;
        Ok(self.state)
    }

    /// Ticks until closed or until `max_frames` frames have been presented.
    /// Returns the number of frames presented.
    pub fn run(&mut self, input: &mut dyn InputSource, sink: &mut dyn PresentationSink, max_frames: Option<u64>) -> Result<u64, RenderError> {
        let mut presented = 0;
        while max_frames.is_none_or(|max| presented < max) {
            if self.tick(input, sink)? == SceneState::Closed {
                break;
            }
            presented += 1;
        }
        Ok(presented)
    }

    /// Projects every model in parallel, then rasterizes all of them into each
    /// row strip in parallel. Models are drawn in order within a strip.
    fn rasterize(&mut self) -> u32 {
        let ctx = DrawContext {
            view_projection: self.projection * self.camera.view_matrix(),
            width: self.buffers.width(),
            height: self.buffers.height(),
            frame_count: self.frame_count,
            flags: self.flags,
        };
        let options = self.flags.raster_options();
        let models = &self.models;
        let buffers = &mut self.buffers;
        let bands = self.bands;

        self.pool.install(|| {
            let projected: Vec<Vec<ScreenTriangle>> = models.par_iter().map(|m| m.project(&ctx)).collect();
            buffers
                .bands(bands)
                .into_par_iter()
                .map(|mut band| projected.iter().map(|tris| draw_projected(&mut band, tris, &options)).sum::<u32>())
                .sum()
        })
    }

    fn draw_overlay(&mut self, stats: &FrameStats) {
        let mut lines = Vec::new();
        if self.flags.show_fps {
            lines.push(format!("FPS: {:.1}", stats.fps));
        }
        if self.flags.show_triangle_count {
            lines.push(format!("TRIANGLES: {}", stats.triangles));
        }
        if !lines.is_empty() {
            draw_text_lines(&mut self.buffers.color, &lines, 4, 4, OVERLAY_COLOR);
        }
    }
}
