//! Triangle representations for each stage of the pipeline.
//!
//! Object-space [`Triangle`]s are owned by a model and never mutated while
//! drawing. Projection produces a [`ProjectedTriangle`] and pixel conversion a
//! [`ScreenTriangle`]; both are rebuilt every frame.

use crate::point2d::Point2D;
use crate::point3d::{Point3D, cross};
use crate::screen::Rgb;
use crate::transform::Mat4;

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vertex {
    pub position: Point3D,
    /// (u, v, 0)
    pub texcoord: Point3D,
    pub normal: Point3D,
    pub tangent_s: Point3D,
    pub tangent_t: Point3D,
}

impl Vertex {
    pub fn new(position: Point3D, texcoord: [f32; 2], normal: Point3D) -> Self {
        Self {
            position,
            texcoord: Point3D::new(texcoord[0], texcoord[1], 0.0),
            normal,
            ..Self::default()
        }
    }

    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self { position: Point3D::new(x, y, z), ..Self::default() }
    }
}

/// Object-space triangle, counter-clockwise as supplied by the mesh.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    /// `None` when the mesh never assigned a material.
    pub material_index: Option<usize>,
}

impl Triangle {
    pub fn new(a: Vertex, b: Vertex, c: Vertex, material_index: Option<usize>) -> Self {
        Self { vertices: [a, b, c], material_index }
    }
}

/// Inside the canonical view box: x, y in [-1, 1] and z in [0, 1].
pub fn in_ndc_box(p: Point3D) -> bool {
    (-1.0..=1.0).contains(&p.x) && (-1.0..=1.0).contains(&p.y) && (0.0..=1.0).contains(&p.z)
}

/// Triangle after the perspective divide.
///
/// x and y have been divided by clip z; z itself is the raw clip value and is
/// what the depth buffer compares.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectedTriangle {
    pub ndc: [Point3D; 3],
    /// Which vertices lie in the view box this frame.
    pub in_view: [bool; 3],
}

impl ProjectedTriangle {
    pub fn new(ndc: [Point3D; 3]) -> Self {
        Self { ndc, in_view: ndc.map(in_ndc_box) }
    }

    pub fn project(triangle: &Triangle, mvp: &Mat4) -> Self {
        Self::new(triangle.vertices.map(|v| {
            let [x, y, z, _w] = mvp.transform_point(v.position);
            Point3D::new(x / z, y / z, z)
        }))
    }

    /// At least one vertex falls in the view box.
    pub fn is_visible(&self) -> bool {
        self.in_view.iter().any(|&inside| inside)
    }

    /// Counter-clockwise winding, judged by the z of the edge cross product.
    pub fn is_ccw(&self) -> bool {
        let [a, b, c] = self.ndc;
        cross(b - a, c - a).z > 0.0
    }

    /// Whether the triangle survives face culling with the given front-face winding.
    pub fn faces_front(&self, front_face_ccw: bool) -> bool {
        self.is_ccw() == front_face_ccw
    }

    /// Maps x/y from [-1, 1] to pixel coordinates on a `width` x `height` frame.
    pub fn to_screen(&self, width: usize, height: usize, color: Rgb) -> ScreenTriangle {
        let (w, h) = (width as f32, height as f32);
        ScreenTriangle {
            vertices: self.ndc.map(|p| ScreenVertex {
                pixel: Point2D::new(((p.x + 1.0) * 0.5 * w) as i32, ((p.y + 1.0) * 0.5 * h) as i32),
                depth: p.z,
            }),
            color,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenVertex {
    pub pixel: Point2D,
    pub depth: f32,
}

/// Pixel-space triangle ready for scan conversion, carrying its flat colour.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenTriangle {
    pub vertices: [ScreenVertex; 3],
    pub color: Rgb,
}

impl ScreenTriangle {
    pub fn new(points: [(i32, i32, f32); 3], color: Rgb) -> Self {
        Self {
            vertices: points.map(|(x, y, depth)| ScreenVertex { pixel: Point2D::new(x, y), depth }),
            color,
        }
    }

    pub fn min_depth(&self) -> f32 {
        self.vertices.iter().map(|v| v.depth).fold(f32::INFINITY, f32::min)
    }

    /// Unclamped (min x, min y, max x, max y) of the vertices.
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        let xs = self.vertices.map(|v| v.pixel.x);
        let ys = self.vertices.map(|v| v.pixel.y);
        (
            xs.iter().copied().min().unwrap_or(0),
            ys.iter().copied().min().unwrap_or(0),
            xs.iter().copied().max().unwrap_or(0),
            ys.iter().copied().max().unwrap_or(0),
        )
    }

    /// Every vertex lies within a band of `GUARD_BAND` frames around the screen.
    /// Edge walking is linear in edge length, so wilder triangles are dropped.
    pub fn within_guard_band(&self, width: usize, height: usize) -> bool {
        let limit = GUARD_BAND * width.max(height) as i64;
        self.vertices.iter().all(|v| {
            let (x, y) = (v.pixel.x as i64, v.pixel.y as i64);
            x.abs() <= limit && y.abs() <= limit && v.depth.is_finite()
        })
    }
}

pub const GUARD_BAND: i64 = 16;

#[cfg(test)]
mod tests {
    use super::*;

    fn culling_case() -> ProjectedTriangle {
        ProjectedTriangle::new([
            Point3D::new(0.0, 0.0, -1.0),
            Point3D::new(1.0, 0.0, -1.0),
            Point3D::new(0.0, 1.0, -1.0),
        ])
    }

    #[test]
    fn ccw_triangle_is_culled_when_front_is_cw() {
        let tri = culling_case();
        assert!(tri.is_ccw());
        assert!(!tri.faces_front(false));
        assert!(tri.faces_front(true));
    }

    #[test]
    fn in_view_flags_follow_ndc_box() {
        let tri = ProjectedTriangle::new([
            Point3D::new(0.0, 0.0, 0.5),
            Point3D::new(1.5, 0.0, 0.5),
            Point3D::new(0.0, 0.0, -0.1),
        ]);
        assert_eq!(tri.in_view, [true, false, false]);
        assert!(tri.is_visible());
        assert!(!culling_case().is_visible());
    }

    #[test]
    fn projection_divides_xy_but_keeps_z() {
        let tri = Triangle::new(Vertex::at(1.0, 2.0, 4.0), Vertex::at(0.0, 0.0, 2.0), Vertex::at(3.0, 3.0, 1.0), None);
        let p = ProjectedTriangle::project(&tri, &Mat4::IDENTITY);
        assert_eq!(p.ndc[0], Point3D::new(0.25, 0.5, 4.0));
        assert_eq!(p.ndc[2], Point3D::new(3.0, 3.0, 1.0));
    }

    #[test]
    fn ndc_to_pixels() {
        let tri = ProjectedTriangle::new([
            Point3D::new(-1.0, -1.0, 0.5),
            Point3D::new(1.0, -1.0, 0.5),
            Point3D::new(0.0, 1.0, 0.25),
        ]);
        let s = tri.to_screen(100, 50, [1.0; 3]);
        assert_eq!(s.vertices[0].pixel, Point2D::new(0, 0));
        assert_eq!(s.vertices[1].pixel, Point2D::new(100, 0));
        assert_eq!(s.vertices[2].pixel, Point2D::new(50, 50));
        assert_eq!(s.min_depth(), 0.25);
        assert_eq!(s.bounds(), (0, 0, 100, 50));
    }

    #[test]
    fn guard_band_rejects_runaway_vertices() {
        let ok = ScreenTriangle::new([(0, 0, 0.5), (10, 0, 0.5), (0, 10, 0.5)], [1.0; 3]);
        assert!(ok.within_guard_band(64, 64));
        let wild = ScreenTriangle::new([(0, 0, 0.5), (i32::MAX, 0, 0.5), (0, 10, 0.5)], [1.0; 3]);
        assert!(!wild.within_guard_band(64, 64));
    }
}
