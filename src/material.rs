use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::screen::Rgb;

/// Flat colour of a surface with no material assigned.
pub const DEFAULT_DIFFUSE: Rgb = [0.2; 3];

/// What a texture map is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureKind {
    Diffuse,
    Specular,
    Ambient,
    Emissive,
    Normal,
    Shininess,
    Opacity,
    Displacement,
    Reflection,
}

#[derive(Debug, Clone)]
pub struct MaterialTexture {
    pub kind: TextureKind,
    pub image: RgbImage,
}

/// Surface description looked up by `Triangle::material_index`.
///
/// Only `diffuse` feeds the rasterizer; the rest rides along for consumers
/// that shade.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub diffuse: Rgb,
    pub specular: Rgb,
    pub emission: Rgb,
    pub ambient: Rgb,
    pub roughness: f32,
    pub metalness: f32,
    pub ior: f32,
    pub opacity: f32,
    pub kind: u32,
    pub textures: Vec<MaterialTexture>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: DEFAULT_DIFFUSE,
            specular: [1.0; 3],
            emission: [0.0; 3],
            ambient: [0.0; 3],
            roughness: 9999.0,
            metalness: 0.0,
            ior: 0.0,
            opacity: 1.0,
            kind: 2,
            textures: Vec::new(),
        }
    }
}

impl Material {
    pub fn with_diffuse(name: impl Into<String>, diffuse: Rgb) -> Self {
        Self { name: name.into(), diffuse, ..Self::default() }
    }

    pub fn texture(&self, kind: TextureKind) -> Option<&RgbImage> {
        self.textures.iter().find(|t| t.kind == kind).map(|t| &t.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_unassigned_surface() {
        let m = Material::default();
        assert_eq!(m.diffuse, [0.2; 3]);
        assert_eq!(m.specular, [1.0; 3]);
        assert_eq!(m.opacity, 1.0);
        assert_eq!(m.kind, 2);
    }

    #[test]
    fn texture_lookup_by_kind() {
        let mut m = Material::with_diffuse("brick", [0.6, 0.3, 0.2]);
        m.textures.push(MaterialTexture { kind: TextureKind::Normal, image: RgbImage::new(2, 2) });
        assert!(m.texture(TextureKind::Normal).is_some());
        assert!(m.texture(TextureKind::Diffuse).is_none());
    }
}
