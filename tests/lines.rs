use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use softras::linebench::random_lines;
use softras::{Canvas, Line, LineAlgorithm, Point2D, Rgb};

/// Records every pixel written, in order.
struct Recorder {
    size: usize,
    pixels: Vec<(usize, usize)>,
}

impl Recorder {
    fn new(size: usize) -> Self {
        Self { size, pixels: Vec::new() }
    }

    fn set(&self) -> HashSet<(usize, usize)> {
        self.pixels.iter().copied().collect()
    }
}

impl Canvas for Recorder {
    fn width(&self) -> usize {
        self.size
    }
    fn height(&self) -> usize {
        self.size
    }
    fn put(&mut self, x: usize, y: usize, _color: Rgb) {
        self.pixels.push((x, y));
    }
}

fn draw(line: &Line, thickness: u32, algorithm: LineAlgorithm) -> Recorder {
    let mut canvas = Recorder::new(200);
    line.draw(&mut canvas, [1.0; 3], thickness, algorithm);
    canvas
}

#[test]
fn same_seed_same_lines_same_pixels() {
    let a = random_lines(&mut StdRng::seed_from_u64(2024), 40, 200);
    let b = random_lines(&mut StdRng::seed_from_u64(2024), 40, 200);
    assert_eq!(a, b);

    for algorithm in LineAlgorithm::ALL {
        for line in &a {
            assert_eq!(draw(line, 3, algorithm).pixels, draw(line, 3, algorithm).pixels);
        }
    }
}

#[test]
fn random_lines_include_both_endpoints() {
    let mut rng = StdRng::seed_from_u64(11);
    for line in random_lines(&mut rng, 200, 200) {
        let thickness = rng.gen_range(1..5);
        for algorithm in LineAlgorithm::ALL {
            let set = draw(&line, thickness, algorithm).set();
            for p in [line.p1, line.p2] {
                assert!(set.contains(&(p.x as usize, p.y as usize)), "{algorithm:?} {line:?} missed {p}");
            }
        }
    }
}

#[test]
fn axis_aligned_lines_are_exact() {
    let horizontal = Line::new(Point2D::new(0, 0), Point2D::new(10, 0));
    let vertical = Line::new(Point2D::new(0, 0), Point2D::new(0, 10));
    for algorithm in LineAlgorithm::ALL {
        let h: HashSet<_> = (0..=10).map(|x| (x, 0)).collect();
        let v: HashSet<_> = (0..=10).map(|y| (0, y)).collect();
        assert_eq!(draw(&horizontal, 1, algorithm).set(), h);
        assert_eq!(draw(&vertical, 1, algorithm).set(), v);
    }
}

#[test]
fn thin_lines_stay_connected() {
    let mut rng = StdRng::seed_from_u64(5);
    for line in random_lines(&mut rng, 100, 200) {
        for algorithm in [LineAlgorithm::Bresenham, LineAlgorithm::Efla, LineAlgorithm::Dda] {
            let mut walk = draw(&line, 1, algorithm).pixels;
            walk.sort_by_key(|&(x, y)| if (line.p2.x - line.p1.x).abs() >= line.p2.y - line.p1.y { x } else { y });
            for pair in walk.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert!(a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1, "{algorithm:?} gap in {line:?}");
            }
        }
    }
}
