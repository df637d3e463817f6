//! Timing harness comparing the line walkers on the same random segments.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::line::{DdaOrientation, Line, LineAlgorithm};
use crate::point2d::Point2D;
use crate::screen::{PixelBuffer, Rgb};

const LINE_COLOR: Rgb = [1.0, 1.0, 1.0];

/// `count` segments with both endpoints drawn uniformly from a `size` x `size` square.
pub fn random_lines<R: Rng>(rng: &mut R, count: usize, size: i32) -> Vec<Line> {
    let size = size.max(1);
    let mut point = || Point2D::new(rng.gen_range(0..size), rng.gen_range(0..size));
    (0..count).map(|_| Line::new(point(), point())).collect()
}

#[derive(Debug, Clone)]
pub struct AlgorithmRun {
    pub algorithm: LineAlgorithm,
    /// Mean wall time per line over every run.
    pub per_line: Duration,
    /// Canvas holding every line drawn by this algorithm.
    pub image: PixelBuffer,
}

/// Draws every line with each of `algorithms` `runs` times onto a fresh canvas
/// per algorithm and reports the mean time per line.
pub fn time_algorithms(
    lines: &[Line],
    algorithms: &[LineAlgorithm],
    size: usize,
    thickness: u32,
    orientation: DdaOrientation,
    runs: u32,
) -> Vec<AlgorithmRun> {
    let runs = runs.max(1);
    algorithms
        .iter()
        .map(|&algorithm| {
            let mut image = PixelBuffer::new(size, size, [0.0; 3]);
            let mut total = Duration::ZERO;
            for _ in 0..runs {
                let start = Instant::now();
                for line in lines {
                    line.draw_oriented(&mut image, LINE_COLOR, thickness, algorithm, orientation);
                }
                total += start.elapsed();
            }
            let draws = (lines.len().max(1) as u32) * runs;
            AlgorithmRun { algorithm, per_line: total / draws, image }
        })
        .collect()
}
