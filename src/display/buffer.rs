use rayon::iter::ParallelIterator;
use rayon::slice::ParallelSliceMut;

use crate::core::Color;

/// Off-screen ARGB (0xAARRGGBB) pixel buffer, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
}

impl FrameBuffer {
    /// A new buffer starts out white.
    pub fn new(width: usize, height: usize) -> Self {
        FrameBuffer {
            width,
            height,
            data: vec![Color::WHITE.to_argb(); width * height],
        }
    }

    pub fn clear(&mut self, color: Color) {
        let argb = color.to_argb();
        self.data.par_chunks_mut(1024).for_each(|chunk| {
            for point in chunk {
                *point = argb;
            }
        });
    }

    pub fn pixels(&self) -> &[u32] {
        &self.data
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Composites `argb` over the existing pixel. Out-of-bounds writes are dropped.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, argb: u32) {
        if self.in_bounds(x, y) {
            let index = x as usize + y as usize * self.width;
            self.data[index] = Color::blend_over(self.data[index], argb);
        }
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        if self.in_bounds(x, y) {
            Some(self.data[x as usize + y as usize * self.width])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_white_and_clear_refills() {
        let mut buffer = FrameBuffer::new(40, 30);
        assert_eq!(buffer.pixels().len(), 1200);
        assert!(buffer.pixels().iter().all(|&p| p == 0xFFFF_FFFF));

        buffer.clear(Color::BLUE);
        assert!(buffer.pixels().iter().all(|&p| p == 0xFF00_00FF));
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut buffer = FrameBuffer::new(2, 2);
        buffer.set_pixel(-1, 0, 0xFF00_0000);
        buffer.set_pixel(2, 1, 0xFF00_0000);
        assert!(buffer.pixels().iter().all(|&p| p == 0xFFFF_FFFF));

        buffer.set_pixel(1, 1, 0xFF00_0000);
        assert_eq!(buffer.get_pixel(1, 1), Some(0xFF00_0000));
        assert_eq!(buffer.get_pixel(5, 5), None);
    }
}
