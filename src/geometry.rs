//! Triangle scan conversion.
//!
//! Each triangle is reduced to per-row `[min_x, max_x]` spans by walking its
//! three edges with an integer stepper, then every span is filled through the
//! depth test.

use serde::{Deserialize, Serialize};

use crate::point2d::Point2D;
use crate::screen::{Rgb, ScreenSpace};
use crate::triangle::ScreenTriangle;

/// How a fragment's depth is derived from the vertex depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthInterpolation {
    /// Hyperbolic blend along the screen x of vertices 0 and 1 only.
    /// Vertex 2 is ignored, so accuracy drops as depth varies along edge 0-2.
    #[default]
    Edge01,
    /// Perspective-correct barycentric blend of all three vertices.
    Barycentric,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Only the two ends of every span are written.
    pub wireframe: bool,
    pub depth_test: bool,
    pub interpolation: DepthInterpolation,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self { wireframe: false, depth_test: true, interpolation: DepthInterpolation::Edge01 }
    }
}

/// Horizontal extents of a triangle over a window of rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spans {
    pub min_y: i32,
    /// `(min_x, max_x)` for row `min_y + i`; `min_x > max_x` marks a row no edge reached.
    pub rows: Vec<(i32, i32)>,
}

impl Spans {
    /// Walks the three edges of `tri`, recording extrema for rows in
    /// `[row_lo, row_hi]` intersected with the triangle's own rows.
    pub fn walk(tri: &ScreenTriangle, row_lo: i32, row_hi: i32) -> Spans {
        let (_, min_y, _, max_y) = tri.bounds();
        let lo = min_y.max(row_lo);
        let hi = max_y.min(row_hi);
        if lo > hi {
            return Spans { min_y: lo, rows: Vec::new() };
        }

        let mut rows = vec![(i32::MAX, i32::MIN); (hi - lo + 1) as usize];
        for edge in 0..3 {
            let a = tri.vertices[edge].pixel;
            let b = tri.vertices[(edge + 1) % 3].pixel;
            walk_edge(a, b, |x, y| {
                if y >= lo && y <= hi {
                    let row = &mut rows[(y - lo) as usize];
                    row.0 = row.0.min(x);
                    row.1 = row.1.max(x);
                }
            });
        }
        Spans { min_y: lo, rows }
    }

    /// Non-empty rows as `(y, min_x, max_x)`.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, i32)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, (min_x, max_x))| min_x <= max_x)
            .map(move |(i, &(min_x, max_x))| (self.min_y + i as i32, min_x, max_x))
    }
}

/// Integer edge stepper visiting every pixel from `a` to `b` inclusive.
/// Steps along the major axis and takes a diagonal step whenever the error
/// accumulator overflows.
fn walk_edge(a: Point2D, b: Point2D, mut visit: impl FnMut(i32, i32)) {
    let sx = (b.x - a.x) as i64;
    let sy = (b.y - a.y) as i64;
    let dx1 = sx.signum();
    let dy1 = sy.signum();

    let mut m = sx.abs();
    let mut n = sy.abs();
    let (mut dx2, mut dy2) = (dx1, 0);
    if m < n {
        std::mem::swap(&mut m, &mut n);
        dx2 = 0;
        dy2 = dy1;
    }

    let (mut x, mut y) = (a.x as i64, a.y as i64);
    let mut k = n / 2;
    for _ in 0..=m {
        visit(x as i32, y as i32);
        k += n;
        if k < m {
            x += dx2;
            y += dy2;
        } else {
            k -= m;
            x += dx1;
            y += dy1;
        }
    }
}

/// Depth at pixel column `x` using only vertices 0 and 1:
/// `1 / ((1 - t) / z0 + t / z1)` with `t = clamp((x - x0) / (x1 - x0), 0, 1)`.
pub fn edge01_depth(tri: &ScreenTriangle, x: i32) -> f32 {
    let [v0, v1, _] = tri.vertices;
    let (x0, x1) = (v0.pixel.x, v1.pixel.x);
    let t = if x1 == x0 { 0.0 } else { ((x - x0) as f32 / (x1 - x0) as f32).clamp(0.0, 1.0) };
    1.0 / ((1.0 - t) / v0.depth + t / v1.depth)
}

fn signed_triangle_area(a: Point2D, b: Point2D, p: Point2D) -> f32 {
    let ap = ((p.x - a.x) as f32, (p.y - a.y) as f32);
    let ab = ((b.x - a.x) as f32, (b.y - a.y) as f32);
    (ab.0 * ap.1 - ab.1 * ap.0) / 2.0
}

/// Perspective-correct depth at `(x, y)`. Weights are clamped to the triangle
/// so edge pixels just outside the exact boundary stay in range. Degenerate
/// triangles fall back to [`edge01_depth`].
pub fn barycentric_depth(tri: &ScreenTriangle, x: i32, y: i32) -> f32 {
    let [a, b, c] = tri.vertices.map(|v| v.pixel);
    let area = signed_triangle_area(a, b, c);
    if area == 0.0 {
        return edge01_depth(tri, x);
    }
    let p = Point2D::new(x, y);
    let weights = [
        signed_triangle_area(b, c, p) / area,
        signed_triangle_area(c, a, p) / area,
        signed_triangle_area(a, b, p) / area,
    ]
    .map(|w| w.clamp(0.0, 1.0));
    let total: f32 = weights.iter().sum();
    if total == 0.0 {
        return edge01_depth(tri, x);
    }
    let inv: f32 = weights.iter().zip(tri.vertices.iter()).map(|(w, v)| w / total / v.depth).sum();
    1.0 / inv
}

fn fragment_depth(tri: &ScreenTriangle, x: i32, y: i32, interpolation: DepthInterpolation) -> f32 {
    match interpolation {
        DepthInterpolation::Edge01 => edge01_depth(tri, x),
        DepthInterpolation::Barycentric => barycentric_depth(tri, x, y),
    }
}

/// Scan-converts `tri` into the rows `target` owns, writing `color` through the
/// depth test. Returns the number of fragments written.
pub fn draw_triangle(target: &mut ScreenSpace<'_>, tri: &ScreenTriangle, color: Rgb, options: &RasterOptions) -> usize {
    let rect = target.rect;
    let spans = Spans::walk(tri, rect.min_y as i32, rect.max_y as i32 - 1);
    let last_x = rect.max_x as i32 - 1;
    let mut written = 0;

    let mut shade = |target: &mut ScreenSpace<'_>, x: i32, y: i32| {
        let depth = fragment_depth(tri, x, y, options.interpolation);
        if target.write_fragment(x, y, color, depth, options.depth_test) {
            written += 1;
        }
    };

    for (y, min_x, max_x) in spans.iter() {
        if options.wireframe {
            shade(target, min_x, y);
            if max_x != min_x {
                shade(target, max_x, y);
            }
        } else {
            for x in min_x.max(0)..=max_x.min(last_x) {
                shade(target, x, y);
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::FrameBuffers;

    const RED: Rgb = [1.0, 0.0, 0.0];
    const BLUE: Rgb = [0.0, 0.0, 1.0];

    fn flat(points: [(i32, i32); 3], depth: f32, color: Rgb) -> ScreenTriangle {
        ScreenTriangle::new(points.map(|(x, y)| (x, y, depth)), color)
    }

    fn lit(fb: &FrameBuffers) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..fb.height() as i32 {
            for x in 0..fb.width() as i32 {
                if fb.color.get(x, y) != Some([0.0; 3]) {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn spans_of_right_triangle() {
        let tri = flat([(0, 0), (4, 0), (0, 4)], 0.5, RED);
        let spans = Spans::walk(&tri, 0, 100);
        let rows: Vec<_> = spans.iter().collect();
        assert_eq!(rows, vec![(0, 0, 4), (1, 0, 3), (2, 0, 2), (3, 0, 1), (4, 0, 0)]);
    }

    #[test]
    fn spans_respect_row_window() {
        let tri = flat([(0, 0), (4, 0), (0, 4)], 0.5, RED);
        let spans = Spans::walk(&tri, 2, 3);
        let rows: Vec<_> = spans.iter().map(|(y, _, _)| y).collect();
        assert_eq!(rows, vec![2, 3]);
        assert!(Spans::walk(&tri, 10, 20).iter().next().is_none());
    }

    #[test]
    fn degenerate_triangle_is_a_thin_strip() {
        let tri = flat([(0, 0), (5, 5), (10, 10)], 0.5, RED);
        let spans = Spans::walk(&tri, 0, 100);
        assert!(spans.iter().all(|(y, min_x, max_x)| min_x == y && max_x == y));
    }

    #[test]
    fn fill_stays_inside_bounding_box() {
        let mut fb = FrameBuffers::new(32, 32);
        let tri = flat([(3, 5), (27, 9), (11, 30)], 0.5, RED);
        let n = draw_triangle(&mut fb.full(), &tri, RED, &RasterOptions::default());
        let pixels = lit(&fb);
        assert_eq!(n, pixels.len());
        assert!(!pixels.is_empty());
        assert!(pixels.iter().all(|&(x, y)| (3..=27).contains(&x) && (5..=30).contains(&y)));
        // Vertices are always covered.
        for (x, y) in [(3, 5), (27, 9), (11, 30)] {
            assert!(pixels.contains(&(x, y)));
        }
    }

    #[test]
    fn offscreen_parts_are_clipped_to_buffer() {
        let mut fb = FrameBuffers::new(16, 16);
        let tri = flat([(-40, -3), (50, 2), (8, 40)], 0.5, RED);
        draw_triangle(&mut fb.full(), &tri, RED, &RasterOptions::default());
        assert!(!lit(&fb).is_empty());
    }

    #[test]
    fn wireframe_writes_span_ends_only() {
        let mut fb = FrameBuffers::new(16, 16);
        let tri = flat([(0, 0), (10, 0), (0, 10)], 0.5, RED);
        let opts = RasterOptions { wireframe: true, ..RasterOptions::default() };
        draw_triangle(&mut fb.full(), &tri, RED, &opts);
        assert_eq!(fb.color.get(0, 3), Some(RED));
        assert_eq!(fb.color.get(7, 3), Some(RED));
        assert_eq!(fb.color.get(3, 3), Some([0.0; 3]));
    }

    #[test]
    fn nearer_triangle_wins_in_either_order() {
        let near = flat([(0, 0), (20, 0), (0, 20)], 0.3, RED);
        let far = flat([(2, 2), (22, 2), (2, 22)], 0.6, BLUE);
        let opts = RasterOptions::default();

        let mut a = FrameBuffers::new(24, 24);
        draw_triangle(&mut a.full(), &near, near.color, &opts);
        draw_triangle(&mut a.full(), &far, far.color, &opts);

        let mut b = FrameBuffers::new(24, 24);
        draw_triangle(&mut b.full(), &far, far.color, &opts);
        draw_triangle(&mut b.full(), &near, near.color, &opts);

        assert_eq!(a.color, b.color);
        assert_eq!(a.color.get(5, 5), Some(RED));
        assert_eq!(a.color.get(12, 9), Some(BLUE));
    }

    #[test]
    fn depth_test_off_draws_in_submission_order() {
        let near = flat([(0, 0), (20, 0), (0, 20)], 0.3, RED);
        let far = flat([(0, 0), (20, 0), (0, 20)], 0.6, BLUE);
        let opts = RasterOptions { depth_test: false, ..RasterOptions::default() };
        let mut fb = FrameBuffers::new(24, 24);
        draw_triangle(&mut fb.full(), &near, near.color, &opts);
        draw_triangle(&mut fb.full(), &far, far.color, &opts);
        assert_eq!(fb.color.get(5, 5), Some(BLUE));
        assert_eq!(fb.depth.get(5, 5).map(|d| d[2]), Some(0.6));
    }

    #[test]
    fn edge01_depth_is_hyperbolic_between_first_two_vertices() {
        let tri = ScreenTriangle::new([(0, 0, 0.25), (10, 0, 0.5), (0, 10, 0.9)], RED);
        assert!((edge01_depth(&tri, 0) - 0.25).abs() < 1e-6);
        assert!((edge01_depth(&tri, 10) - 0.5).abs() < 1e-6);
        // Halfway in screen space: 1 / (0.5 / 0.25 + 0.5 / 0.5) = 1/3.
        assert!((edge01_depth(&tri, 5) - 1.0 / 3.0).abs() < 1e-6);
        // Clamped outside the 0-1 edge and blind to vertex 2.
        assert!((edge01_depth(&tri, -4) - 0.25).abs() < 1e-6);
        assert!((edge01_depth(&tri, 40) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn barycentric_depth_hits_every_vertex() {
        let tri = ScreenTriangle::new([(0, 0, 0.25), (10, 0, 0.5), (0, 10, 0.9)], RED);
        assert!((barycentric_depth(&tri, 0, 0) - 0.25).abs() < 1e-6);
        assert!((barycentric_depth(&tri, 10, 0) - 0.5).abs() < 1e-6);
        assert!((barycentric_depth(&tri, 0, 10) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn bands_render_the_same_image_as_one_view() {
        let tris = [
            ScreenTriangle::new([(1, 1, 0.4), (30, 4, 0.6), (9, 28, 0.2)], RED),
            ScreenTriangle::new([(5, 20, 0.3), (31, 10, 0.3), (20, 31, 0.5)], BLUE),
        ];
        let opts = RasterOptions::default();

        let mut whole = FrameBuffers::new(32, 32);
        for t in &tris {
            draw_triangle(&mut whole.full(), t, t.color, &opts);
        }

        let mut split = FrameBuffers::new(32, 32);
        for mut band in split.bands(5) {
            for t in &tris {
                draw_triangle(&mut band, t, t.color, &opts);
            }
        }
        assert_eq!(whole.color, split.color);
        assert_eq!(whole.depth, split.depth);
    }
}
