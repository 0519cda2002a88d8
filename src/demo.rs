//! Animated BGRA test pattern for exercising the presenters

use crate::core::FrameTarget;
use crate::frame::FrameInfo;

const BARS: [[u8; 3]; 8] = [
    [0xFF, 0xFF, 0xFF],
    [0xFF, 0xFF, 0x00],
    [0x00, 0xFF, 0xFF],
    [0x00, 0xFF, 0x00],
    [0xFF, 0x00, 0xFF],
    [0xFF, 0x00, 0x00],
    [0x00, 0x00, 0xFF],
    [0x00, 0x00, 0x00],
];

/// Colour bars over the top half, a scrolling gradient below and a bouncing
/// square on top
#[derive(Debug, Clone, Copy)]
pub struct TestPattern {
    /// Square edge in pixels
    pub square: u32,
    /// Pixels per second
    pub speed: f32,
}

impl Default for TestPattern {
    fn default() -> Self {
        Self {
            square: 16,
            speed: 60.0,
        }
    }
}

impl TestPattern {
    /// Colour at `(x, y)` as `[r, g, b]`, ignoring the square
    pub fn background(&self, x: u32, y: u32, width: u32, height: u32, time: f32) -> [u8; 3] {
        if y < height / 2 {
            let bar = (x as usize * BARS.len()) / width.max(1) as usize;
            return BARS[bar.min(BARS.len() - 1)];
        }
        let width = width.max(1);
        let shift = (time * self.speed) as u32 % width;
        let r = ((x + shift) % width * 255 / width) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        [r, g, 0x80]
    }

    /// Top-left corner of the square at `time`
    pub fn square_origin(&self, width: u32, height: u32, time: f32) -> (u32, u32) {
        let travel = |span: u32| {
            let range = span.saturating_sub(self.square).max(1);
            let step = (time * self.speed) as u32 % (range * 2);
            if step < range { step } else { range * 2 - step }
        };
        (travel(width), travel(height))
    }

    pub fn fill(&self, target: &mut FrameTarget<'_>, frame: &FrameInfo) {
        let (width, height) = (target.width, target.height);
        let (sx, sy) = self.square_origin(width, height, frame.time);
        for y in 0..height {
            let row = target.row_mut(y);
            for (x, px) in (0..width).zip(row.chunks_exact_mut(4)) {
                let inside = (sx..sx + self.square).contains(&x) && (sy..sy + self.square).contains(&y);
                let [r, g, b] = if inside {
                    [0xFF, 0xFF, 0xFF]
                } else {
                    self.background(x, y, width, height, frame.time)
                };
                px.copy_from_slice(&[b, g, r, 0xFF]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_bgra_rows() {
        let (width, height, pitch) = (32u32, 8u32, 32 * 4 + 16);
        let mut pixels = vec![0u8; pitch * height as usize];
        let mut target = FrameTarget {
            pixels: &mut pixels,
            pitch,
            width,
            height,
        };
        let pattern = TestPattern {
            square: 2,
            speed: 0.0,
        };
        pattern.fill(&mut target, &FrameInfo::new(0, 0.0, 0.0));

        // square covers the origin at t=0
        assert_eq!(&pixels[0..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
        // second bar is yellow: no blue
        let x = 5 * 4;
        assert_eq!(&pixels[x..x + 4], &[0x00, 0xFF, 0xFF, 0xFF]);
        // row padding is left alone
        assert!(pixels[32 * 4..pitch].iter().all(|&b| b == 0));
    }

    #[test]
    fn gradient_survives_long_runs() {
        let pattern = TestPattern::default();
        // several days of scrolling at the default speed
        let time = 400_000.0;
        let [r, _, b] = pattern.background(319, 200, 320, 240, time);
        assert_eq!(b, 0x80);
        let shift = (time * pattern.speed) as u32 % 320;
        assert_eq!(r, ((319 + shift) % 320 * 255 / 320) as u8);
    }

    #[test]
    fn square_bounces_inside_frame() {
        let pattern = TestPattern::default();
        for t in 0..200 {
            let (x, y) = pattern.square_origin(64, 48, t as f32 * 0.1);
            assert!(x + pattern.square <= 64);
            assert!(y + pattern.square <= 48);
        }
    }
}
