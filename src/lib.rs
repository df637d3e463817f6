//! CPU software rasterizer: line walkers, scanline triangle fill with a depth
//! buffer, and a small frame loop that renders models in parallel row strips.

pub mod camera;
pub mod config;
pub mod geometry;
pub mod line;
pub mod linebench;
pub mod material;
pub mod model;
pub mod obj;
pub mod overlay;
pub mod point2d;
pub mod point3d;
pub mod rectangle;
pub mod scene;
pub mod screen;
pub mod transform;
pub mod triangle;

pub use camera::Camera;
pub use config::{ConfigError, SceneConfig};
pub use geometry::{DepthInterpolation, RasterOptions, draw_triangle};
pub use line::{Line, LineAlgorithm, draw_line};
pub use material::Material;
pub use model::{DrawContext, Model};
pub use obj::{LoadError, load_obj};
pub use point2d::Point2D;
pub use point3d::Point3D;
pub use scene::{
    FrameStats, InputEvent, InputSource, NoInput, NullSink, PngSequenceSink, PresentationSink, RenderError, RenderFlags,
    Scene, SceneState, ScreenshotWriter, ScriptedInput,
};
pub use screen::{Canvas, FrameBuffers, PixelBuffer, Rgb};
pub use transform::{Mat4, Transform};
