use bytemuck::{cast_slice, cast_slice_mut};
use image::RgbImage;

use crate::rectangle::{Rect, rows_per_band};

/// Linear RGB in [0, 1].
pub type Rgb = [f32; 3];

/// Value the depth buffer is cleared to. Larger is farther.
pub const FAR_DEPTH: f32 = 1.0;

/// Anything the line rasterizer can plot onto.
///
/// `put` receives coordinates already checked against `width`/`height`;
/// implementations may still drop pixels they do not own.
pub trait Canvas {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn put(&mut self, x: usize, y: usize, color: Rgb);
}

/// Row-major image of 3-float pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize, fill: Rgb) -> Self {
        Self { width, height, pixels: vec![fill; width * height] }
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn set(&mut self, x: i32, y: i32, value: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = value;
        }
    }

    pub fn fill(&mut self, value: Rgb) {
        if value == [0.0; 3] {
            cast_slice_mut::<Rgb, f32>(&mut self.pixels).fill(0.0);
        } else {
            self.pixels.fill(value);
        }
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Scales every channel to 8 bits for export.
    pub fn to_rgb8(&self) -> RgbImage {
        let bytes: Vec<u8> = cast_slice::<Rgb, f32>(&self.pixels)
            .iter()
            .map(|&v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect();
        RgbImage::from_raw(self.width as u32, self.height as u32, bytes)
            .unwrap_or_else(|| RgbImage::new(self.width as u32, self.height as u32))
    }

    /// Renders the depth channel as grey, near = dark, far sentinel = white.
    pub fn depth_to_rgb8(&self) -> RgbImage {
        let mut img = RgbImage::new(self.width as u32, self.height as u32);
        for (i, px) in img.pixels_mut().enumerate() {
            let g = (self.pixels[i][2] * 255.0).round().clamp(0.0, 255.0) as u8;
            *px = image::Rgb([g, g, g]);
        }
        img
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}

impl Canvas for PixelBuffer {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn put(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }
}

/// The colour/depth pair every model of a frame renders into.
pub struct FrameBuffers {
    pub color: PixelBuffer,
    pub depth: PixelBuffer,
}

impl FrameBuffers {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            color: PixelBuffer::new(width, height, [0.0; 3]),
            depth: PixelBuffer::new(width, height, [FAR_DEPTH; 3]),
        }
    }

    pub fn width(&self) -> usize {
        self.color.width
    }

    pub fn height(&self) -> usize {
        self.color.height
    }

    pub fn clear(&mut self) {
        self.color.fill([0.0; 3]);
        self.depth.fill([FAR_DEPTH; 3]);
    }

    /// A single view over every row.
    pub fn full(&mut self) -> ScreenSpace<'_> {
        let (width, height) = (self.width(), self.height());
        ScreenSpace {
            rect: Rect { min_x: 0, min_y: 0, max_x: width, max_y: height },
            height,
            color: &mut self.color.pixels,
            depth: &mut self.depth.pixels,
        }
    }

    /// Disjoint horizontal strips covering the whole frame, at most `bands` of them.
    pub fn bands(&mut self, bands: usize) -> Vec<ScreenSpace<'_>> {
        let (width, height) = (self.width(), self.height());
        let rows = rows_per_band(height, bands);
        let chunk = (rows * width).max(1);
        self.color
            .pixels
            .chunks_mut(chunk)
            .zip(self.depth.pixels.chunks_mut(chunk))
            .enumerate()
            .map(|(i, (color, depth))| {
                let min_y = i * rows;
                ScreenSpace {
                    rect: Rect { min_x: 0, min_y, max_x: width, max_y: (min_y + rows).min(height) },
                    height,
                    color,
                    depth,
                }
            })
            .collect()
    }
}

/// Exclusive view over a strip of rows of both frame buffers.
///
/// Coordinates are absolute screen pixels. Reads outside the strip return
/// `None` and writes outside it are dropped.
pub struct ScreenSpace<'a> {
    pub rect: Rect,
    height: usize,
    color: &'a mut [Rgb],
    depth: &'a mut [Rgb],
}

impl ScreenSpace<'_> {
    /// Height of the whole frame, not just this strip.
    pub fn frame_height(&self) -> usize {
        self.height
    }

    pub fn owns_row(&self, y: i32) -> bool {
        y >= 0 && (y as usize) >= self.rect.min_y && (y as usize) < self.rect.max_y
    }

    pub fn color(&self, x: i32, y: i32) -> Option<Rgb> {
        self.index(x, y).map(|i| self.color[i])
    }

    pub fn set_color(&mut self, x: i32, y: i32, value: Rgb) {
        if let Some(i) = self.index(x, y) {
            self.color[i] = value;
        }
    }

    /// Stored depth of a pixel (third channel of the depth buffer).
    pub fn depth(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i][2])
    }

    /// Depth-tested write of one fragment. Colour and depth are updated together
    /// or not at all. Returns whether the fragment landed.
    pub fn write_fragment(&mut self, x: i32, y: i32, color: Rgb, depth: f32, depth_test: bool) -> bool {
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if depth_test && !(depth < self.depth[i][2]) {
            return false;
        }
        self.color[i] = color;
        self.depth[i][2] = depth;
        true
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || !self.rect.contains(x, y) {
            return None;
        }
        Some((y as usize - self.rect.min_y) * self.rect.width() + x as usize)
    }
}

impl Canvas for ScreenSpace<'_> {
    fn width(&self) -> usize {
        self.rect.width()
    }
    fn height(&self) -> usize {
        self.frame_height()
    }
    fn put(&mut self, x: usize, y: usize, color: Rgb) {
        self.set_color(x as i32, y as i32, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_color_and_depth() {
        let mut fb = FrameBuffers::new(4, 3);
        fb.color.set(1, 1, [1.0, 0.5, 0.25]);
        fb.depth.set(1, 1, [0.0, 0.0, 0.3]);
        fb.clear();
        assert_eq!(fb.color.get(1, 1), Some([0.0; 3]));
        assert_eq!(fb.depth.get(1, 1), Some([FAR_DEPTH; 3]));
    }

    #[test]
    fn out_of_bounds_access_is_silent() {
        let mut buf = PixelBuffer::new(2, 2, [0.0; 3]);
        buf.set(-1, 0, [1.0; 3]);
        buf.set(0, 2, [1.0; 3]);
        assert_eq!(buf.get(2, 0), None);
        assert!(buf.pixels().iter().all(|p| *p == [0.0; 3]));
    }

    #[test]
    fn bands_partition_rows_and_write_through() {
        let mut fb = FrameBuffers::new(3, 5);
        {
            let mut bands = fb.bands(2);
            assert_eq!(bands.len(), 2);
            assert_eq!(bands[0].rect.max_y, bands[1].rect.min_y);
            // Row 4 belongs to the second band only.
            assert!(!bands[0].write_fragment(1, 4, [1.0; 3], 0.5, true));
            assert!(bands[1].write_fragment(1, 4, [1.0; 3], 0.5, true));
        }
        assert_eq!(fb.color.get(1, 4), Some([1.0; 3]));
        assert_eq!(fb.depth.get(1, 4).map(|d| d[2]), Some(0.5));
    }

    #[test]
    fn depth_test_rejects_equal_or_farther() {
        let mut fb = FrameBuffers::new(2, 2);
        let mut view = fb.full();
        assert!(view.write_fragment(0, 0, [1.0, 0.0, 0.0], 0.4, true));
        assert!(!view.write_fragment(0, 0, [0.0, 1.0, 0.0], 0.4, true));
        assert!(!view.write_fragment(0, 0, [0.0, 1.0, 0.0], 0.9, true));
        assert!(view.write_fragment(0, 0, [0.0, 0.0, 1.0], 0.9, false));
        assert_eq!(view.color(0, 0), Some([0.0, 0.0, 1.0]));
    }

    #[test]
    fn export_scales_to_eight_bits() {
        let mut buf = PixelBuffer::new(1, 1, [0.0; 3]);
        buf.set(0, 0, [1.0, 0.5, 2.0]);
        let img = buf.to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [255, 128, 255]);
    }
}
