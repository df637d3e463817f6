#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

// helper methods
impl Rect {
    pub fn width(&self) -> usize {
        self.max_x - self.min_x
    }
    pub fn height(&self) -> usize {
        self.max_y - self.min_y
    }
    /// Half-open containment test on signed pixel coordinates.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as usize) >= self.min_x
            && (x as usize) < self.max_x
            && (y as usize) >= self.min_y
            && (y as usize) < self.max_y
    }
}

/// Rows per band when splitting `height` rows into at most `bands` full-width strips.
pub fn rows_per_band(height: usize, bands: usize) -> usize {
    let bands = bands.clamp(1, height.max(1));
    height.div_ceil(bands).max(1)
}

/// Split a `width` x `height` screen into horizontal strips for the worker threads.
/// Strips never overlap, so each can be rasterized without synchronisation.
pub fn split_rows(width: usize, height: usize, bands: usize) -> Vec<Rect> {
    let step = rows_per_band(height, bands);
    (0..height)
        .step_by(step)
        .map(|min_y| Rect { min_x: 0, min_y, max_x: width, max_y: (min_y + step).min(height) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_cover_every_row_exactly_once() {
        let rects = split_rows(64, 37, 4);
        assert_eq!(rects.len(), 4);
        assert_eq!(rects[0].min_y, 0);
        assert_eq!(rects.last().map(|r| r.max_y), Some(37));
        for pair in rects.windows(2) {
            assert_eq!(pair[0].max_y, pair[1].min_y);
        }
    }

    #[test]
    fn more_bands_than_rows_collapses_to_one_row_each() {
        let rects = split_rows(8, 3, 16);
        assert_eq!(rects.len(), 3);
        assert!(rects.iter().all(|r| r.height() == 1 && r.width() == 8));
    }

    #[test]
    fn contains_rejects_negative_and_far_edges() {
        let r = Rect { min_x: 0, min_y: 2, max_x: 4, max_y: 4 };
        assert!(r.contains(0, 2));
        assert!(r.contains(3, 3));
        assert!(!r.contains(4, 3));
        assert!(!r.contains(-1, 3));
        assert!(!r.contains(1, 1));
    }
}
