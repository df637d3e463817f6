use rayon::prelude::*;

use crate::geometry::{RasterOptions, draw_triangle};
use crate::material::{DEFAULT_DIFFUSE, Material};
use crate::point3d::Point3D;
use crate::scene::RenderFlags;
use crate::screen::{FrameBuffers, Rgb, ScreenSpace};
use crate::transform::{Mat4, Transform};
use crate::triangle::{ProjectedTriangle, ScreenTriangle, Triangle, Vertex};

/// Axis-aligned box around the object-space vertices.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub min: Point3D,
    pub max: Point3D,
}

/// Read-only per-frame inputs to a model draw.
#[derive(Debug, Copy, Clone)]
pub struct DrawContext {
    /// Projection times view.
    pub view_projection: Mat4,
    pub width: usize,
    pub height: usize,
    pub frame_count: u64,
    pub flags: RenderFlags,
}

#[derive(Debug)]
pub struct Model {
    pub name: String,
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    bounds: Bounds,
    pub transform: Transform,
}

impl Model {
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>, materials: Vec<Material>) -> Self {
        let bounds = triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position))
            .fold(None, |acc: Option<Bounds>, p| match acc {
                None => Some(Bounds { min: p, max: p }),
                Some(b) => Some(Bounds { min: b.min.min(p), max: b.max.max(p) }),
            })
            .unwrap_or(Bounds { min: Point3D::ZERO, max: Point3D::ZERO });

        Self { name: name.into(), triangles, materials, bounds, transform: Transform::default() }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Unit cube centred on the origin, one material per face.
    pub fn cube() -> Self {
        const FACES: [([[f32; 3]; 4], [f32; 3], Rgb); 6] = [
            ([[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]], [0.0, 0.0, 1.0], [0.9, 0.2, 0.2]),
            ([[0.5, -0.5, -0.5], [-0.5, -0.5, -0.5], [-0.5, 0.5, -0.5], [0.5, 0.5, -0.5]], [0.0, 0.0, -1.0], [0.2, 0.9, 0.2]),
            ([[0.5, -0.5, 0.5], [0.5, -0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5]], [1.0, 0.0, 0.0], [0.2, 0.2, 0.9]),
            ([[-0.5, -0.5, -0.5], [-0.5, -0.5, 0.5], [-0.5, 0.5, 0.5], [-0.5, 0.5, -0.5]], [-1.0, 0.0, 0.0], [0.9, 0.9, 0.2]),
            ([[-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [-0.5, 0.5, -0.5]], [0.0, 1.0, 0.0], [0.2, 0.9, 0.9]),
            ([[-0.5, -0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5]], [0.0, -1.0, 0.0], [0.9, 0.2, 0.9]),
        ];
        const UV: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

        let mut triangles = Vec::with_capacity(12);
        let mut materials = Vec::with_capacity(6);
        for (index, (corners, normal, color)) in FACES.iter().enumerate() {
            let n = Point3D::new(normal[0], normal[1], normal[2]);
            let v: Vec<Vertex> = corners
                .iter()
                .zip(UV.iter())
                .map(|(c, uv)| Vertex::new(Point3D::new(c[0], c[1], c[2]), *uv, n))
                .collect();
            triangles.push(Triangle::new(v[0], v[1], v[2], Some(index)));
            triangles.push(Triangle::new(v[0], v[2], v[3], Some(index)));
            materials.push(Material::with_diffuse(format!("face{index}"), *color));
        }
        Model::new("cube", triangles, materials)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Flat colour for a triangle. Unassigned or dangling indices get the default surface.
    pub fn material_color(&self, index: Option<usize>) -> Rgb {
        index.and_then(|i| self.materials.get(i)).map_or(DEFAULT_DIFFUSE, |m| m.diffuse)
    }

    /// Transforms, view-box tests, culls and converts every triangle to pixels.
    /// Triangle order is preserved.
    pub fn project(&self, ctx: &DrawContext) -> Vec<ScreenTriangle> {
        let mvp = ctx.view_projection * self.transform.model_matrix(ctx.frame_count);
        let flags = ctx.flags;

        self.triangles
            .par_iter()
            .filter_map(|tri| {
                let projected = ProjectedTriangle::project(tri, &mvp);
                if !projected.is_visible() {
                    return None;
                }
                if flags.cull_face && !projected.faces_front(flags.front_face_ccw) {
                    return None;
                }
                let screen = projected.to_screen(ctx.width, ctx.height, self.material_color(tri.material_index));
                screen.within_guard_band(ctx.width, ctx.height).then_some(screen)
            })
            .collect()
    }

    /// Projects and rasterizes this model alone into the whole frame.
    pub fn draw(&self, buffers: &mut FrameBuffers, ctx: &DrawContext) -> u32 {
        let triangles = self.project(ctx);
        draw_projected(&mut buffers.full(), &triangles, &ctx.flags.raster_options())
    }
}

/// The three vertex pixels already hold something nearer than the triangle's
/// nearest point. Only vertices inside `target` are consulted, so a triangle
/// can only be rejected by the strip that holds all of it.
fn occluded(target: &ScreenSpace<'_>, tri: &ScreenTriangle) -> bool {
    let min_z = tri.min_depth();
    tri.vertices
        .iter()
        .filter_map(|v| target.depth(v.pixel.x, v.pixel.y))
        .filter(|&stored| stored < min_z)
        .count()
        >= 3
}

/// Rasterizes `triangles` into the rows `target` owns and returns how many
/// triangles were rendered. A triangle spanning several strips is counted by
/// the strip holding its top row only.
pub fn draw_projected(target: &mut ScreenSpace<'_>, triangles: &[ScreenTriangle], options: &RasterOptions) -> u32 {
    let rect = target.rect;
    let last_row = target.frame_height().saturating_sub(1) as i32;
    let mut rendered = 0;

    for tri in triangles {
        let (_, min_y, _, max_y) = tri.bounds();
        if max_y < rect.min_y as i32 || min_y >= rect.max_y as i32 {
            continue;
        }
        if options.depth_test && occluded(target, tri) {
            continue;
        }
        draw_triangle(target, tri, tri.color, options);
        if target.owns_row(min_y.clamp(0, last_row)) {
            rendered += 1;
        }
    }
    rendered
}
