//! Software texture sampling and quad fill
//!
//! Used by the software console graphics unit. Output pixels are ABGR8888
//! words (`0xAABBGGRR`), the console's native 32-bit display format.

use glam::Vec2;

use super::convert::{expand_565, tiled_offset, PackOrder};
use super::sampler::Filter;
use super::viewport::Viewport;

/// Texel encodings the sampler understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelFormat {
    Packed565(PackOrder),
    Rgba8,
    Bgra8,
}

impl TexelFormat {
    pub fn bytes_per_texel(&self) -> usize {
        match self {
            TexelFormat::Packed565(_) => 2,
            TexelFormat::Rgba8 | TexelFormat::Bgra8 => 4,
        }
    }
}

/// Borrowed texture memory
#[derive(Debug, Clone, Copy)]
pub struct TexelView<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Row stride in texels (ignored when tiled)
    pub stride: u32,
    pub format: TexelFormat,
    pub tiled: bool,
}

impl<'a> TexelView<'a> {
    /// Fetch texel `(x, y)` as `[r, g, b, a]`, clamped to the edge
    pub fn fetch(&self, x: i64, y: i64) -> [u8; 4] {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let bpp = self.format.bytes_per_texel();
        let offset = if self.tiled {
            tiled_offset(x, y, self.width as usize, bpp)
        } else {
            (y * self.stride as usize + x) * bpp
        };

        let Some(t) = self.data.get(offset..offset + bpp) else {
            return [0, 0, 0, 0xFF];
        };
        match self.format {
            TexelFormat::Packed565(order) => {
                let [r, g, b] = expand_565(u16::from_le_bytes([t[0], t[1]]), order);
                [r, g, b, 0xFF]
            }
            TexelFormat::Rgba8 => [t[0], t[1], t[2], t[3]],
            TexelFormat::Bgra8 => [t[2], t[1], t[0], t[3]],
        }
    }

    /// Sample at texel-space coordinates
    pub fn sample(&self, uv: Vec2, filter: Filter) -> [u8; 4] {
        match filter {
            Filter::Nearest => self.fetch(uv.x.floor() as i64, uv.y.floor() as i64),
            Filter::Linear => {
                let p = uv - Vec2::splat(0.5);
                let base = p.floor();
                let f = p - base;
                let (x, y) = (base.x as i64, base.y as i64);
                let t00 = self.fetch(x, y);
                let t10 = self.fetch(x + 1, y);
                let t01 = self.fetch(x, y + 1);
                let t11 = self.fetch(x + 1, y + 1);

                let mut out = [0u8; 4];
                for c in 0..4 {
                    let top = t00[c] as f32 * (1.0 - f.x) + t10[c] as f32 * f.x;
                    let bottom = t01[c] as f32 * (1.0 - f.x) + t11[c] as f32 * f.x;
                    out[c] = (top * (1.0 - f.y) + bottom * f.y).round() as u8;
                }
                out
            }
        }
    }
}

/// Pack `[r, g, b, a]` into an ABGR8888 word
pub fn abgr(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes(rgba)
}

/// Fill `rect` of `target` with the texture region `uv_min..uv_max`
/// (texel units). Alpha is forced opaque.
#[allow(clippy::too_many_arguments)]
pub fn draw_textured_quad(
    target: &mut [u32],
    target_width: u32,
    target_height: u32,
    rect: Viewport,
    uv_min: Vec2,
    uv_max: Vec2,
    texture: &TexelView<'_>,
    filter: Filter,
) {
    if rect.is_empty() || texture.width == 0 || texture.height == 0 {
        return;
    }

    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = rect.right().min(target_width as i32);
    let y1 = rect.bottom().min(target_height as i32);
    let scale = (uv_max - uv_min) / Vec2::new(rect.width as f32, rect.height as f32);

    for y in y0..y1 {
        let row = y as usize * target_width as usize;
        let v = uv_min.y + (y - rect.y) as f32 * scale.y + 0.5 * scale.y;
        for x in x0..x1 {
            let u = uv_min.x + (x - rect.x) as f32 * scale.x + 0.5 * scale.x;
            let mut texel = texture.sample(Vec2::new(u, v), filter);
            texel[3] = 0xFF;
            target[row + x as usize] = abgr(texel);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Vec<u8> {
        // 2x2 RGBA: red, green / blue, white
        vec![
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ]
    }

    fn view(data: &[u8]) -> TexelView<'_> {
        TexelView {
            data,
            width: 2,
            height: 2,
            stride: 2,
            format: TexelFormat::Rgba8,
            tiled: false,
        }
    }

    #[test]
    fn fetch_clamps_to_edge() {
        let data = checker();
        let tex = view(&data);
        assert_eq!(tex.fetch(-5, -5), [255, 0, 0, 255]);
        assert_eq!(tex.fetch(9, 9), [255, 255, 255, 255]);
    }

    #[test]
    fn nearest_upscale_copies_texels() {
        let data = checker();
        let tex = view(&data);
        let mut target = vec![0u32; 16];
        let rect = Viewport {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        };
        draw_textured_quad(&mut target, 4, 4, rect, Vec2::ZERO, Vec2::new(2.0, 2.0), &tex, Filter::Nearest);

        assert_eq!(target[0], abgr([255, 0, 0, 255]));
        assert_eq!(target[3], abgr([0, 255, 0, 255]));
        assert_eq!(target[12], abgr([0, 0, 255, 255]));
        assert_eq!(target[15], abgr([255, 255, 255, 255]));
    }

    #[test]
    fn linear_blends_neighbours() {
        let data = checker();
        let tex = view(&data);
        let center = tex.sample(Vec2::new(1.0, 1.0), Filter::Linear);
        // average of red, green, blue and white
        assert_eq!(center, [128, 128, 128, 255]);
    }

    #[test]
    fn quad_is_clipped_to_target() {
        let data = checker();
        let tex = view(&data);
        let mut target = vec![0u32; 4];
        let rect = Viewport {
            x: -2,
            y: -2,
            width: 8,
            height: 8,
        };
        draw_textured_quad(&mut target, 2, 2, rect, Vec2::ZERO, Vec2::new(2.0, 2.0), &tex, Filter::Nearest);
        assert!(target.iter().all(|px| *px != 0));
    }
}
