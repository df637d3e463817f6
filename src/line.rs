//! Line rasterization.
//!
//! Five interchangeable pixel walkers share one contract: both endpoints are
//! written, output depends only on the inputs, and pixels outside the canvas
//! are dropped silently. Axis-aligned and zero-length segments never reach the
//! walkers; they are drawn directly.
//!
//! Walkers adapted from the edepot.com line algorithm collection.

use clap::ValueEnum;

use crate::point2d::Point2D;
use crate::screen::{Canvas, Rgb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum LineAlgorithm {
    #[default]
    Bresenham,
    /// Extremely fast line algorithm: one float ratio, no error term.
    Efla,
    /// EFLA walked from both ends towards the middle.
    Efla2,
    /// Wu's double-step walker, two or four pixels per iteration.
    Wu,
    /// Floating point digital differential analyzer.
    Dda,
}

impl LineAlgorithm {
    pub const ALL: [LineAlgorithm; 5] = [
        LineAlgorithm::Bresenham,
        LineAlgorithm::Efla,
        LineAlgorithm::Efla2,
        LineAlgorithm::Wu,
        LineAlgorithm::Dda,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LineAlgorithm::Bresenham => "bresenham",
            LineAlgorithm::Efla => "efla",
            LineAlgorithm::Efla2 => "efla2",
            LineAlgorithm::Wu => "wu",
            LineAlgorithm::Dda => "dda",
        }
    }
}

/// How the DDA walker picks the axis it thickens along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DdaOrientation {
    /// Compare the running x and y of every step (`x >= y` thickens along x).
    #[default]
    PerStep,
    /// Use the dominant axis of the whole segment, like the other walkers.
    WholeLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub p1: Point2D,
    pub p2: Point2D,
}

impl Line {
    /// Endpoints are stored so that `p1.y <= p2.y`.
    pub fn new(a: Point2D, b: Point2D) -> Self {
        if a.y <= b.y { Self { p1: a, p2: b } } else { Self { p1: b, p2: a } }
    }

    pub fn draw<C: Canvas + ?Sized>(&self, canvas: &mut C, color: Rgb, thickness: u32, algorithm: LineAlgorithm) {
        self.draw_oriented(canvas, color, thickness, algorithm, DdaOrientation::PerStep);
    }

    /// Same as [`Line::draw`] with an explicit thickening rule for the DDA walker.
    pub fn draw_oriented<C: Canvas + ?Sized>(
        &self,
        canvas: &mut C,
        color: Rgb,
        thickness: u32,
        algorithm: LineAlgorithm,
        orientation: DdaOrientation,
    ) {
        let (width, height) = (canvas.width(), canvas.height());
        let Some((p1, p2)) = clip_to_guard(self.p1, self.p2, width, height, guard_margin(width, height, thickness)) else {
            return;
        };

        if p1 == p2 {
            set_pixel(canvas, p1.x, p1.y, color, thickness, false);
            return;
        }
        if p1.x == p2.x {
            for y in p1.y..=p2.y {
                set_pixel(canvas, p1.x, y, color, thickness, true);
            }
            return;
        }
        if p1.y == p2.y {
            for x in p1.x.min(p2.x)..=p1.x.max(p2.x) {
                set_pixel(canvas, x, p1.y, color, thickness, false);
            }
            return;
        }

        match algorithm {
            LineAlgorithm::Bresenham => bresenham(canvas, p1, p2, color, thickness),
            LineAlgorithm::Efla => efla(canvas, p1, p2, color, thickness),
            LineAlgorithm::Efla2 => efla2(canvas, p1, p2, color, thickness),
            LineAlgorithm::Wu => wu(canvas, p1, p2, color, thickness),
            LineAlgorithm::Dda => dda(canvas, p1, p2, color, thickness, orientation),
        }
    }
}

/// How far off the canvas the walkers may go: one canvas size plus the band thickness.
/// Segments ending closer than that are walked unclipped.
fn guard_margin(width: usize, height: usize, thickness: u32) -> i64 {
    let span = width.max(height) as i64;
    (span + thickness.max(1) as i64).min(span + (1 << 24))
}

/// Clips the segment to the canvas grown by `margin` on every side. Segments
/// already inside are returned untouched; `None` when nothing is left.
fn clip_to_guard(p1: Point2D, p2: Point2D, width: usize, height: usize, margin: i64) -> Option<(Point2D, Point2D)> {
    let (lo_x, lo_y) = (-margin, -margin);
    let (hi_x, hi_y) = (width as i64 - 1 + margin, height as i64 - 1 + margin);
    let inside = |p: Point2D| (lo_x..=hi_x).contains(&(p.x as i64)) && (lo_y..=hi_y).contains(&(p.y as i64));
    if inside(p1) && inside(p2) {
        return Some((p1, p2));
    }

    // Liang-Barsky against the guard rectangle.
    let (x0, y0) = (p1.x as f64, p1.y as f64);
    let (dx, dy) = (p2.x as f64 - x0, p2.y as f64 - y0);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [(-dx, x0 - lo_x as f64), (dx, hi_x as f64 - x0), (-dy, y0 - lo_y as f64), (dy, hi_y as f64 - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| Point2D::new((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

pub fn draw_line<C: Canvas + ?Sized>(
    canvas: &mut C,
    p1: Point2D,
    p2: Point2D,
    color: Rgb,
    thickness: u32,
    algorithm: LineAlgorithm,
) {
    Line::new(p1, p2).draw(canvas, color, thickness, algorithm);
}

/// Plots `(x, y)` and its neighbours across a band `thickness` pixels wide,
/// running along x when `vertical` and along y otherwise.
pub(crate) fn set_pixel<C: Canvas + ?Sized>(canvas: &mut C, x: i32, y: i32, color: Rgb, thickness: u32, vertical: bool) {
    let (w, h) = (canvas.width() as i64, canvas.height() as i64);
    if x < 0 || y < 0 || x as i64 >= w || y as i64 >= h {
        return;
    }
    let t = thickness.max(1) as i64;
    let center = if vertical { x as i64 } else { y as i64 };
    let start = center - (t - 1) / 2;
    for i in start..start + t {
        if vertical {
            if (0..w).contains(&i) {
                canvas.put(i as usize, y as usize, color);
            }
        } else if (0..h).contains(&i) {
            canvas.put(x as usize, i as usize, color);
        }
    }
}

fn bresenham<C: Canvas + ?Sized>(canvas: &mut C, p1: Point2D, p2: Point2D, color: Rgb, thickness: u32) {
    let dx = (p2.x - p1.x).abs();
    let dy = (p2.y - p1.y).abs();
    let incx = if p2.x < p1.x { -1 } else { 1 };
    let incy = if p2.y < p1.y { -1 } else { 1 };
    let (mut x, mut y) = (p1.x, p1.y);

    if dx > dy {
        set_pixel(canvas, x, y, color, thickness, false);
        let mut e = 2 * dy - dx;
        let inc1 = 2 * (dy - dx);
        let inc2 = 2 * dy;
        for _ in 0..dx {
            if e >= 0 {
                y += incy;
                e += inc1;
            } else {
                e += inc2;
            }
            x += incx;
            set_pixel(canvas, x, y, color, thickness, false);
        }
    } else {
        set_pixel(canvas, x, y, color, thickness, true);
        let mut e = 2 * dx - dy;
        let inc1 = 2 * (dx - dy);
        let inc2 = 2 * dx;
        for _ in 0..dy {
            if e >= 0 {
                x += incx;
                e += inc1;
            } else {
                e += inc2;
            }
            y += incy;
            set_pixel(canvas, x, y, color, thickness, true);
        }
    }
}

/// Shared stepping state for both EFLA variants.
struct Efla {
    origin: Point2D,
    long_len: i32,
    short_len: i32,
    div_diff: f64,
    increment: i32,
    y_longer: bool,
}

impl Efla {
    fn new(p1: Point2D, p2: Point2D) -> Self {
        let mut short_len = p2.y - p1.y;
        let mut long_len = p2.x - p1.x;
        let mut y_longer = false;
        if short_len.abs() > long_len.abs() {
            std::mem::swap(&mut short_len, &mut long_len);
            y_longer = true;
        }
        let increment = if long_len < 0 { -1 } else { 1 };
        let div_diff = if short_len == 0 { long_len as f64 } else { long_len as f64 / short_len as f64 };
        Self { origin: p1, long_len, short_len, div_diff, increment, y_longer }
    }

    /// Number of steps between the endpoints along the major axis.
    fn steps(&self) -> i32 {
        self.long_len.abs()
    }

    /// Pixel `k` steps from the origin, `0..=steps()`. The last step lands on the far endpoint exactly.
    fn at(&self, k: i32) -> Point2D {
        let i = k * self.increment;
        let minor = if i == self.long_len {
            self.short_len
        } else if self.short_len == 0 {
            0
        } else {
            (i as f64 / self.div_diff) as i32
        };
        if self.y_longer {
            Point2D::new(self.origin.x + minor, self.origin.y + i)
        } else {
            Point2D::new(self.origin.x + i, self.origin.y + minor)
        }
    }
}

fn efla<C: Canvas + ?Sized>(canvas: &mut C, p1: Point2D, p2: Point2D, color: Rgb, thickness: u32) {
    let walk = Efla::new(p1, p2);
    for k in 0..=walk.steps() {
        let p = walk.at(k);
        set_pixel(canvas, p.x, p.y, color, thickness, walk.y_longer);
    }
}

fn efla2<C: Canvas + ?Sized>(canvas: &mut C, p1: Point2D, p2: Point2D, color: Rgb, thickness: u32) {
    let walk = Efla::new(p1, p2);
    let steps = walk.steps();
    let count = steps + 1;
    for k in 0..count / 2 {
        let near = walk.at(k);
        let far = walk.at(steps - k);
        set_pixel(canvas, near.x, near.y, color, thickness, walk.y_longer);
        set_pixel(canvas, far.x, far.y, color, thickness, walk.y_longer);
    }
    // Odd pixel count: the middle one is left over.
    if count % 2 == 1 {
        let mid = walk.at(count / 2);
        set_pixel(canvas, mid.x, mid.y, color, thickness, walk.y_longer);
    }
}

fn wu<C: Canvas + ?Sized>(canvas: &mut C, p1: Point2D, p2: Point2D, color: Rgb, thickness: u32) {
    let (mut x0, mut y0, mut x1, mut y1) = (p1.x, p1.y, p2.x, p2.y);
    let (mut dy, mut dx) = (y1 - y0, x1 - x0);
    let stepy = if dy < 0 { dy = -dy; -1 } else { 1 };
    let stepx = if dx < 0 { dx = -dx; -1 } else { 1 };
    let vertical = dx <= dy;
    let mut plot = |x: i32, y: i32| set_pixel(canvas, x, y, color, thickness, vertical);

    plot(x0, y0);
    plot(x1, y1);

    if dx > dy {
        let length = (dx - 1) >> 2;
        let extras = (dx - 1) & 3;
        let incr2 = (dy << 2) - (dx << 1);
        if incr2 < 0 {
            let c = dy << 1;
            let incr1 = c << 1;
            let mut d = incr1 - dx;
            for _ in 0..length {
                x0 += stepx;
                x1 -= stepx;
                if d < 0 {
                    // x o o
                    plot(x0, y0);
                    x0 += stepx;
                    plot(x0, y0);
                    plot(x1, y1);
                    x1 -= stepx;
                    plot(x1, y1);
                    d += incr1;
                } else {
                    if d < c {
                        //     o
                        // x o
                        plot(x0, y0);
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                        plot(x1, y1);
                        x1 -= stepx;
                        y1 -= stepy;
                        plot(x1, y1);
                    } else {
                        //   o o
                        // x
                        y0 += stepy;
                        plot(x0, y0);
                        x0 += stepx;
                        plot(x0, y0);
                        y1 -= stepy;
                        plot(x1, y1);
                        x1 -= stepx;
                        plot(x1, y1);
                    }
                    d += incr2;
                }
            }
            if extras > 0 {
                if d < 0 {
                    x0 += stepx;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        x1 -= stepx;
                        plot(x1, y1);
                    }
                } else if d < c {
                    x0 += stepx;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        x1 -= stepx;
                        plot(x1, y1);
                    }
                } else {
                    x0 += stepx;
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        x1 -= stepx;
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                }
            }
        } else {
            let c = (dy - dx) << 1;
            let incr1 = c << 1;
            let mut d = incr1 + dx;
            for _ in 0..length {
                x0 += stepx;
                x1 -= stepx;
                if d > 0 {
                    //     o
                    //   o
                    // x
                    y0 += stepy;
                    plot(x0, y0);
                    x0 += stepx;
                    y0 += stepy;
                    plot(x0, y0);
                    y1 -= stepy;
                    plot(x1, y1);
                    x1 -= stepx;
                    y1 -= stepy;
                    plot(x1, y1);
                    d += incr1;
                } else {
                    if d < c {
                        plot(x0, y0);
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                        plot(x1, y1);
                        x1 -= stepx;
                        y1 -= stepy;
                        plot(x1, y1);
                    } else {
                        y0 += stepy;
                        plot(x0, y0);
                        x0 += stepx;
                        plot(x0, y0);
                        y1 -= stepy;
                        plot(x1, y1);
                        x1 -= stepx;
                        plot(x1, y1);
                    }
                    d += incr2;
                }
            }
            if extras > 0 {
                if d > 0 {
                    x0 += stepx;
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        x1 -= stepx;
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                } else if d < c {
                    x0 += stepx;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        x1 -= stepx;
                        plot(x1, y1);
                    }
                } else {
                    x0 += stepx;
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        if d > c {
                            x1 -= stepx;
                            y1 -= stepy;
                        } else {
                            x1 -= stepx;
                        }
                        plot(x1, y1);
                    }
                }
            }
        }
    } else {
        let length = (dy - 1) >> 2;
        let extras = (dy - 1) & 3;
        let incr2 = (dx << 2) - (dy << 1);
        if incr2 < 0 {
            let c = dx << 1;
            let incr1 = c << 1;
            let mut d = incr1 - dy;
            for _ in 0..length {
                y0 += stepy;
                y1 -= stepy;
                if d < 0 {
                    plot(x0, y0);
                    y0 += stepy;
                    plot(x0, y0);
                    plot(x1, y1);
                    y1 -= stepy;
                    plot(x1, y1);
                    d += incr1;
                } else {
                    if d < c {
                        plot(x0, y0);
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                        plot(x1, y1);
                        x1 -= stepx;
                        y1 -= stepy;
                        plot(x1, y1);
                    } else {
                        x0 += stepx;
                        plot(x0, y0);
                        y0 += stepy;
                        plot(x0, y0);
                        x1 -= stepx;
                        plot(x1, y1);
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                    d += incr2;
                }
            }
            if extras > 0 {
                if d < 0 {
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                } else if d < c {
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                } else {
                    x0 += stepx;
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        x1 -= stepx;
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                }
            }
        } else {
            let c = (dx - dy) << 1;
            let incr1 = c << 1;
            let mut d = incr1 + dy;
            for _ in 0..length {
                y0 += stepy;
                y1 -= stepy;
                if d > 0 {
                    x0 += stepx;
                    plot(x0, y0);
                    x0 += stepx;
                    y0 += stepy;
                    plot(x0, y0);
                    x1 -= stepx;
                    plot(x1, y1);
                    x1 -= stepx;
                    y1 -= stepy;
                    plot(x1, y1);
                    d += incr1;
                } else {
                    if d < c {
                        plot(x0, y0);
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                        plot(x1, y1);
                        x1 -= stepx;
                        y1 -= stepy;
                        plot(x1, y1);
                    } else {
                        x0 += stepx;
                        plot(x0, y0);
                        y0 += stepy;
                        plot(x0, y0);
                        x1 -= stepx;
                        plot(x1, y1);
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                    d += incr2;
                }
            }
            if extras > 0 {
                if d > 0 {
                    x0 += stepx;
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        x1 -= stepx;
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                } else if d < c {
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        x0 += stepx;
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        y1 -= stepy;
                        plot(x1, y1);
                    }
                } else {
                    x0 += stepx;
                    y0 += stepy;
                    plot(x0, y0);
                    if extras > 1 {
                        y0 += stepy;
                        plot(x0, y0);
                    }
                    if extras > 2 {
                        if d > c {
                            x1 -= stepx;
                            y1 -= stepy;
                        } else {
                            y1 -= stepy;
                        }
                        plot(x1, y1);
                    }
                }
            }
        }
    }
}

/// DDA walker. `orientation` picks how the thickening axis is chosen.
fn dda<C: Canvas + ?Sized>(
    canvas: &mut C,
    p1: Point2D,
    p2: Point2D,
    color: Rgb,
    thickness: u32,
    orientation: DdaOrientation,
) {
    let length = (p2.x - p1.x).abs().max((p2.y - p1.y).abs());
    if length == 0 {
        set_pixel(canvas, p1.x, p1.y, color, thickness, false);
        return;
    }
    let x_increment = (p2.x - p1.x) as f64 / length as f64;
    let y_increment = (p2.y - p1.y) as f64 / length as f64;
    let steep = (p2.y - p1.y).abs() > (p2.x - p1.x).abs();
    let vertical_at = |x: f64, y: f64| match orientation {
        DdaOrientation::PerStep => x >= y,
        DdaOrientation::WholeLine => steep,
    };

    let mut x = p1.x as f64 + 0.5;
    let mut y = p1.y as f64 + 0.5;
    for _ in 0..length {
        set_pixel(canvas, x as i32, y as i32, color, thickness, vertical_at(x, y));
        x += x_increment;
        y += y_increment;
    }
    // Accumulated error must not cost us the far endpoint.
    set_pixel(canvas, p2.x, p2.y, color, thickness, vertical_at(x, y));
}
