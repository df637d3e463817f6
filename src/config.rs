use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::Camera;
use crate::material::Material;
use crate::model::Model;
use crate::obj::{LoadError, load_obj};
use crate::point3d::Point3D;
use crate::scene::{InputEvent, RenderError, RenderFlags, Scene, ScriptedInput};
use crate::screen::Rgb;
use crate::transform::{Mat4, Transform};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Point3D,
    pub front: Point3D,
    pub speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { position: Point3D::ZERO, front: Point3D::new(0.0, 0.0, -1.0), speed: 0.01 }
    }
}

/// Where a model's triangles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MeshSource {
    Cube,
    Obj { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    pub name: String,
    pub diffuse: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub mesh: MeshSource,
    #[serde(default)]
    pub transform: Transform,
    /// Materials `usemtl` names are resolved against. Ignored for the cube.
    #[serde(default)]
    pub materials: Vec<MaterialConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub frame: u64,
    pub event: InputEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub width: usize,
    pub height: usize,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Worker threads; all logical cores when unset.
    pub threads: Option<usize>,
    pub flags: RenderFlags,
    pub camera: CameraConfig,
    pub models: Vec<ModelConfig>,
    pub input: Vec<ScriptedEvent>,
    pub screenshot_dir: PathBuf,
    /// Directory relative mesh paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for SceneConfig {
    /// A single spinning cube in front of the camera.
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            threads: None,
            flags: RenderFlags::default(),
            camera: CameraConfig::default(),
            models: vec![ModelConfig {
                mesh: MeshSource::Cube,
                transform: Transform {
                    position: Point3D::new(0.0, 0.0, -0.8),
                    rotation: Point3D::new(0.5, 1.0, 0.0),
                    scale: 0.2,
                },
                materials: Vec::new(),
            }],
            input: Vec::new(),
            screenshot_dir: PathBuf::from("."),
            base_dir: PathBuf::from("."),
        }
    }
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let mut config: SceneConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        config.validate()?;
        info!("loaded config {} ({} models)", path.display(), config.models.len());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.width == 0 || self.height == 0 {
            return invalid(format!("frame size must be positive, got {}x{}", self.width, self.height));
        }
        if self.models.is_empty() {
            return invalid("at least one model is required".into());
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return invalid(format!("fov_degrees must be in (0, 180), got {}", self.fov_degrees));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return invalid(format!("need 0 < near < far, got near {} far {}", self.near, self.far));
        }
        if self.threads == Some(0) {
            return invalid("threads must be at least 1".into());
        }
        for (i, model) in self.models.iter().enumerate() {
            let s = model.transform.scale;
            if s == 0.0 || !s.is_finite() {
                return invalid(format!("model {i}: scale must be finite and non-zero, got {s}"));
            }
        }
        Ok(())
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective(self.fov_degrees.to_radians(), self.width as f32 / self.height as f32, self.near, self.far)
    }

    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }

    pub fn scripted_input(&self) -> ScriptedInput {
        ScriptedInput::new(self.input.iter().map(|e| (e.frame, e.event)).collect())
    }

    fn load_model(&self, config: &ModelConfig) -> Result<Model, ConfigError> {
        let model = match &config.mesh {
            MeshSource::Cube => Model::cube(),
            MeshSource::Obj { path } => {
                let materials = config.materials.iter().map(|m| Material::with_diffuse(m.name.clone(), m.diffuse)).collect();
                load_obj(self.base_dir.join(path), materials)?
            }
        };
        Ok(model.with_transform(config.transform))
    }

    /// Validates, loads every mesh and assembles a ready-to-run scene.
    pub fn build_scene(&self) -> Result<Scene, ConfigError> {
        self.validate()?;
        let mut scene = Scene::new(self.width, self.height, self.projection(), self.thread_count())?
            .with_screenshot_dir(self.screenshot_dir.clone());
        scene.camera = Camera::new(self.camera.position, self.camera.front, self.camera.speed);
        scene.flags = self.flags;
        for model in &self.models {
            scene.add_model(self.load_model(model)?);
        }
        info!("scene ready: {}x{}, {} models, {} threads", self.width, self.height, scene.models().len(), scene.threads());
        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_is_valid() {
        let config = SceneConfig::default();
        config.validate().unwrap();
        assert_eq!(config.models.len(), 1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{
            "width": 320,
            "height": 200,
            "flags": { "wireframe": true },
            "models": [
                { "mesh": { "kind": "cube" }, "transform": { "position": { "x": 0, "y": 0, "z": -1 }, "rotation": { "x": 0, "y": 0, "z": 0 }, "scale": 0.5 } }
            ],
            "input": [ { "frame": 2, "event": "toggle_wireframe" } ]
        }"#;
        let config: SceneConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        assert_eq!((config.width, config.height), (320, 200));
        assert_eq!(config.fov_degrees, 45.0);
        assert!(config.flags.wireframe);
        assert!(config.flags.cull_face);
        assert_eq!(config.models[0].transform.scale, 0.5);
        assert_eq!(config.input[0].event, InputEvent::ToggleWireframe);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = SceneConfig { width: 0, ..SceneConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.width = 10;
        config.models[0].transform.scale = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.models.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        let config = SceneConfig { near: 1.0, far: 0.5, ..SceneConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_mesh_fails_scene_build() {
        let config = SceneConfig {
            threads: Some(1),
            models: vec![ModelConfig {
                mesh: MeshSource::Obj { path: PathBuf::from("no/such/mesh.obj") },
                transform: Transform::default(),
                materials: Vec::new(),
            }],
            ..SceneConfig::default()
        };
        assert!(matches!(config.build_scene(), Err(ConfigError::Load(LoadError::NotFound(_)))));
    }

    #[test]
    fn builds_default_scene() {
        let config = SceneConfig { threads: Some(2), ..SceneConfig::default() };
        let scene = config.build_scene().unwrap();
        assert_eq!(scene.models().len(), 1);
        assert_eq!(scene.threads(), 2);
    }
}
