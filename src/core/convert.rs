//! Pixel conversion kernels
//!
//! Source frames are tightly packed BGRA8888: byte 0 blue, 1 green, 2 red,
//! 3 alpha. Packed 16-bit output is stored little-endian. Every kernel walks
//! pixels linearly without per-pixel branches.

pub const SOURCE_BYTES_PER_PIXEL: usize = 4;
pub const PACKED_BYTES_PER_PIXEL: usize = 2;

/// Bit placement of a 5/6/5 packed texel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackOrder {
    /// Red in bits 15..11, blue in 4..0 (GL `RGB` / `UNSIGNED_SHORT_5_6_5`)
    RedHigh,
    /// Blue in bits 15..11, red in 4..0 (console `5650`)
    BlueHigh,
}

#[inline(always)]
pub const fn pack_565(b: u8, g: u8, r: u8, order: PackOrder) -> u16 {
    let r5 = (r >> 3) as u16;
    let g6 = (g >> 2) as u16;
    let b5 = (b >> 3) as u16;
    match order {
        PackOrder::RedHigh => (r5 << 11) | (g6 << 5) | b5,
        PackOrder::BlueHigh => (b5 << 11) | (g6 << 5) | r5,
    }
}

/// Reverse of `pack_565`, returning the truncated channels as `(r5, g6, b5)`
#[inline(always)]
pub const fn unpack_565(value: u16, order: PackOrder) -> (u8, u8, u8) {
    let high = ((value >> 11) & 0x1F) as u8;
    let g6 = ((value >> 5) & 0x3F) as u8;
    let low = (value & 0x1F) as u8;
    match order {
        PackOrder::RedHigh => (high, g6, low),
        PackOrder::BlueHigh => (low, g6, high),
    }
}

/// Expand 5/6/5 channels back to 8 bits by bit replication
#[inline(always)]
pub const fn expand_565(value: u16, order: PackOrder) -> [u8; 3] {
    let (r5, g6, b5) = unpack_565(value, order);
    [
        (r5 << 3) | (r5 >> 2),
        (g6 << 2) | (g6 >> 4),
        (b5 << 3) | (b5 >> 2),
    ]
}

/// Swap red and blue of every pixel, BGRA8888 -> RGBA8888
///
/// Converts `min(dst, src)` whole pixels.
pub fn swizzle_bgra_to_rgba(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst
        .chunks_exact_mut(SOURCE_BYTES_PER_PIXEL)
        .zip(src.chunks_exact(SOURCE_BYTES_PER_PIXEL))
    {
        let v = u32::from_le_bytes([s[0], s[1], s[2], s[3]]);
        let swapped = ((v >> 16) & 0x0000_00FF) | (v & 0xFF00_FF00) | ((v & 0x0000_00FF) << 16);
        d.copy_from_slice(&swapped.to_le_bytes());
    }
}

/// Pack BGRA8888 pixels into 16-bit texels, dropping alpha
pub fn pack_row(dst: &mut [u8], src: &[u8], order: PackOrder) {
    for (d, s) in dst
        .chunks_exact_mut(PACKED_BYTES_PER_PIXEL)
        .zip(src.chunks_exact(SOURCE_BYTES_PER_PIXEL))
    {
        d.copy_from_slice(&pack_565(s[0], s[1], s[2], order).to_le_bytes());
    }
}

/// Geometry of a padded conversion: a `width`x`height` source written into a
/// destination `stride` texels wide and `rows` tall
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddedLayout {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub rows: usize,
}

impl PaddedLayout {
    pub fn new(width: u32, height: u32, stride: u32, rows: u32) -> Self {
        debug_assert!(stride >= width && rows >= height);
        Self {
            width: width as usize,
            height: height as usize,
            stride: stride as usize,
            rows: rows as usize,
        }
    }

    pub fn dst_len(&self, bytes_per_texel: usize) -> usize {
        self.stride * self.rows * bytes_per_texel
    }
}

/// `pack_row` every scanline into a padded destination
///
/// Trailing columns and rows are zeroed so filtered sampling never reads
/// stale texels.
pub fn pack_padded(dst: &mut [u8], src: &[u8], layout: PaddedLayout, order: PackOrder) {
    convert_padded(dst, src, layout, PACKED_BYTES_PER_PIXEL, |d, s| {
        pack_row(d, s, order)
    });
}

/// `swizzle_bgra_to_rgba` every scanline into a padded destination
pub fn reorder_padded(dst: &mut [u8], src: &[u8], layout: PaddedLayout) {
    convert_padded(dst, src, layout, SOURCE_BYTES_PER_PIXEL, swizzle_bgra_to_rgba);
}

fn convert_padded<F>(dst: &mut [u8], src: &[u8], layout: PaddedLayout, texel: usize, row: F)
where
    F: Fn(&mut [u8], &[u8]),
{
    let src_pitch = layout.width * SOURCE_BYTES_PER_PIXEL;
    let dst_pitch = layout.stride * texel;
    let used = layout.width * texel;
    let dst = &mut dst[..layout.dst_len(texel)];

    if src_pitch == 0 {
        dst.fill(0);
        return;
    }

    let (body, tail) = dst.split_at_mut(layout.height * dst_pitch);
    for (d, s) in body
        .chunks_exact_mut(dst_pitch)
        .zip(src.chunks_exact(src_pitch))
    {
        let (pixels, pad) = d.split_at_mut(used);
        row(pixels, s);
        pad.fill(0);
    }
    tail.fill(0);
}

/// Bytes per swizzle block row
pub const TILE_BYTES: usize = 16;
/// Rows per swizzle block
pub const TILE_ROWS: usize = 8;

/// Texel width of one swizzle block
pub const fn tile_width(bytes_per_texel: usize) -> usize {
    TILE_BYTES / bytes_per_texel
}

/// Rearrange a linear texture into 16-byte x 8-row blocks, block rows in
/// order, each block's eight rows contiguous
///
/// `width` and `height` must be multiples of the block size.
pub fn swizzle_tiles(dst: &mut [u8], src: &[u8], width: usize, height: usize, bytes_per_texel: usize) {
    let pitch = width * bytes_per_texel;
    debug_assert!(pitch % TILE_BYTES == 0 && height % TILE_ROWS == 0);

    let mut out = dst.chunks_exact_mut(TILE_BYTES);
    for band in src[..pitch * height].chunks_exact(pitch * TILE_ROWS) {
        for block in 0..pitch / TILE_BYTES {
            let column = block * TILE_BYTES;
            for row in band.chunks_exact(pitch) {
                if let Some(d) = out.next() {
                    d.copy_from_slice(&row[column..column + TILE_BYTES]);
                }
            }
        }
    }
}

/// Byte offset of texel `(x, y)` inside a tile-swizzled texture
pub fn tiled_offset(x: usize, y: usize, width: usize, bytes_per_texel: usize) -> usize {
    let pitch = width * bytes_per_texel;
    let byte_x = x * bytes_per_texel;
    let band = y / TILE_ROWS;
    let block = byte_x / TILE_BYTES;
    band * pitch * TILE_ROWS
        + block * TILE_BYTES * TILE_ROWS
        + (y % TILE_ROWS) * TILE_BYTES
        + byte_x % TILE_BYTES
}
