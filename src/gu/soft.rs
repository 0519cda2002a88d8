//! Software graphics unit
//!
//! Executes `GuApi` commands immediately on the CPU. Textures are sampled out
//! of a 2 MB VRAM image (or a snapshot of main-memory texels) and drawn into
//! a pair of 480x272 ABGR8888 buffers, 512 pixels per row. Useful for
//! headless runs and tests.

use glam::Vec2;
use log::{debug, trace};

use super::{
    GuApi, GuVertex, TexelRef, TextureImage, VramBlock, DISPLAY_HEIGHT, DISPLAY_WIDTH,
    FRAME_BUFFER_STRIDE, VRAM_SIZE,
};
use crate::core::raster::{draw_textured_quad, TexelFormat, TexelView};
use crate::core::{Extent, Filter, PackOrder, Viewport};
use crate::error::InitError;

const PIXELS: usize = (FRAME_BUFFER_STRIDE * DISPLAY_HEIGHT) as usize;

/// Calls observed by the software unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuCounters {
    /// Lists started, per list index
    pub list_starts: [u64; 2],
    pub draws: u64,
    pub syncs: u64,
    pub vblanks: u64,
    pub swaps: u64,
    pub writebacks: u64,
    pub tex_flushes: u64,
    pub filter_changes: u64,
}

#[derive(Debug)]
enum BoundTexels {
    Vram(VramBlock),
    Host(Vec<u8>),
}

#[derive(Debug)]
struct BoundTexture {
    texels: BoundTexels,
    size: Extent,
    stride: u32,
    order: PackOrder,
    swizzled: bool,
}

pub struct SoftGu {
    vram: Vec<u8>,
    buffers: [Vec<u32>; 2],
    draw: usize,
    texture: Option<BoundTexture>,
    filter: Filter,
    scale: Vec2,
    list: Option<usize>,
    initialized: bool,
    fail_init: bool,
    counters: GuCounters,
}

impl SoftGu {
    pub fn new() -> Self {
        Self {
            vram: vec![0; VRAM_SIZE],
            buffers: [vec![0; PIXELS], vec![0; PIXELS]],
            draw: 0,
            texture: None,
            filter: Filter::Nearest,
            scale: Vec2::ONE,
            list: None,
            initialized: false,
            fail_init: false,
            counters: GuCounters::default(),
        }
    }

    /// A unit whose `init` always fails
    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Self::new()
        }
    }

    pub fn counters(&self) -> GuCounters {
        self.counters
    }

    /// Buffer currently on screen, `FRAME_BUFFER_STRIDE` words per row
    pub fn displayed(&self) -> &[u32] {
        &self.buffers[self.draw ^ 1]
    }

    /// On-screen pixel as ABGR8888
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.displayed()[(y * FRAME_BUFFER_STRIDE + x) as usize]
    }

    /// Visible part of the on-screen buffer as packed RGB triples
    pub fn displayed_rgb(&self) -> Vec<u8> {
        self.displayed()
            .chunks_exact(FRAME_BUFFER_STRIDE as usize)
            .flat_map(|row| &row[..DISPLAY_WIDTH as usize])
            .flat_map(|&p| [p as u8, (p >> 8) as u8, (p >> 16) as u8])
            .collect()
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn tex_scale_factors(&self) -> Vec2 {
        self.scale
    }

    /// Display list being recorded, if any
    pub fn open_list(&self) -> Option<usize> {
        self.list
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Default for SoftGu {
    fn default() -> Self {
        Self::new()
    }
}

impl GuApi for SoftGu {
    fn init(&mut self) -> Result<Extent, InitError> {
        if self.fail_init {
            return Err(InitError::Display("graphics unit did not start".into()));
        }
        for buffer in &mut self.buffers {
            buffer.fill(0);
        }
        self.draw = 0;
        self.initialized = true;
        debug!("soft gu up, {}x{}", DISPLAY_WIDTH, DISPLAY_HEIGHT);
        Ok(Extent::new(DISPLAY_WIDTH, DISPLAY_HEIGHT))
    }

    fn term(&mut self) {
        self.initialized = false;
        self.texture = None;
        self.list = None;
    }

    fn vram_mut(&mut self) -> &mut [u8] {
        &mut self.vram
    }

    fn dcache_writeback(&mut self, texels: TexelRef<'_>) {
        trace!("writeback {} bytes", texels.len());
        self.counters.writebacks += 1;
    }

    fn tex_flush(&mut self) {
        self.counters.tex_flushes += 1;
    }

    fn start_list(&mut self, list: usize) {
        self.list = Some(list);
        self.counters.list_starts[list & 1] += 1;
    }

    fn finish_list(&mut self) {
        self.list = None;
    }

    fn clear(&mut self, abgr: u32) {
        self.buffers[self.draw].fill(abgr);
    }

    fn tex_image(&mut self, image: TextureImage<'_>) {
        let texels = match image.texels {
            TexelRef::Vram(block) => BoundTexels::Vram(block),
            // main memory is read when the list executes; the copy stands in for that
            TexelRef::Host(bytes) => BoundTexels::Host(bytes.to_vec()),
        };
        self.texture = Some(BoundTexture {
            texels,
            size: image.size,
            stride: image.stride,
            order: image.order,
            swizzled: image.swizzled,
        });
    }

    fn tex_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.counters.filter_changes += 1;
    }

    fn tex_scale(&mut self, u: f32, v: f32) {
        self.scale = Vec2::new(u, v);
    }

    // 2D transform: positions are screen pixels and UVs are texels, so the
    // texture scale does not apply
    fn draw_strip(&mut self, vertices: &[GuVertex; 4]) {
        self.counters.draws += 1;
        let Some(texture) = &self.texture else {
            return;
        };
        let data = match &texture.texels {
            BoundTexels::Vram(block) => &self.vram[block.range()],
            BoundTexels::Host(bytes) => bytes.as_slice(),
        };
        let view = TexelView {
            data,
            width: texture.size.width,
            height: texture.size.height,
            stride: texture.stride,
            format: TexelFormat::Packed565(texture.order),
            tiled: texture.swizzled,
        };

        let [first, _, _, last] = vertices;
        let rect = Viewport {
            x: first.x as i32,
            y: first.y as i32,
            width: (last.x - first.x).max(0.0) as u32,
            height: (last.y - first.y).max(0.0) as u32,
        };
        draw_textured_quad(
            &mut self.buffers[self.draw],
            FRAME_BUFFER_STRIDE,
            DISPLAY_HEIGHT,
            rect,
            Vec2::new(first.u, first.v),
            Vec2::new(last.u, last.v),
            &view,
            self.filter,
        );
    }

    fn sync(&mut self) {
        self.counters.syncs += 1;
    }

    fn wait_vblank(&mut self) {
        self.counters.vblanks += 1;
    }

    fn swap_buffers(&mut self) {
        self.draw ^= 1;
        self.counters.swaps += 1;
    }
}
