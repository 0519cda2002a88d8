//! Handheld console presentation backend
//!
//! The console's graphics unit samples 16-bit BGR565 textures straight out of
//! VRAM or main memory. `GuApi` is its command surface; `SoftGu` is a software
//! stand-in that rasterizes into a 480x272 display.

pub mod renderer;
pub mod soft;
pub mod vram;

pub use renderer::GuRenderer;
pub use soft::SoftGu;
pub use vram::{VramArena, VramBlock};

use crate::core::{Extent, Filter, PackOrder};
use crate::error::InitError;

pub const DISPLAY_WIDTH: u32 = 480;
pub const DISPLAY_HEIGHT: u32 = 272;
/// Row stride of the draw and display buffers, in pixels
pub const FRAME_BUFFER_STRIDE: u32 = 512;

/// Total VRAM, mapped for the CPU
pub const VRAM_SIZE: usize = 0x20_0000;
/// First byte after the draw, display and depth buffers
pub const TEXTURE_VRAM_BASE: usize = 0x15_4000;
pub const VRAM_ALIGN: usize = 16;

/// Blue sits in the high bits of the console's 5650 texels
pub const TEXTURE_ORDER: PackOrder = PackOrder::BlueHigh;

/// 2D-transformed vertex: texel-space UV then screen position
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GuVertex {
    pub u: f32,
    pub v: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Where a texture's texels live
#[derive(Debug, Clone, Copy)]
pub enum TexelRef<'a> {
    Vram(VramBlock),
    Host(&'a [u8]),
}

impl TexelRef<'_> {
    pub fn len(&self) -> usize {
        match self {
            TexelRef::Vram(block) => block.len,
            TexelRef::Host(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Arguments of a texture-image command
#[derive(Debug, Clone, Copy)]
pub struct TextureImage<'a> {
    pub size: Extent,
    /// Row stride in texels
    pub stride: u32,
    pub order: PackOrder,
    pub swizzled: bool,
    pub texels: TexelRef<'a>,
}

/// Graphics unit commands used for presentation
pub trait GuApi {
    /// Set up draw/display/depth buffers and turn the display on; returns the
    /// display size
    fn init(&mut self) -> Result<Extent, InitError>;

    fn term(&mut self);

    /// CPU mapping of the whole VRAM, `VRAM_SIZE` bytes
    fn vram_mut(&mut self) -> &mut [u8];

    /// Write the CPU data cache back over `texels`
    fn dcache_writeback(&mut self, texels: TexelRef<'_>);

    /// Invalidate the GPU texture cache
    fn tex_flush(&mut self);

    /// Begin recording into display list `list` (0 or 1)
    fn start_list(&mut self, list: usize);

    /// Close and kick the current list
    fn finish_list(&mut self);

    fn clear(&mut self, abgr: u32);

    /// Bind a 5650 texture with replace/RGB texture function and clamped wrap
    fn tex_image(&mut self, image: TextureImage<'_>);

    fn tex_filter(&mut self, filter: Filter);

    fn tex_scale(&mut self, u: f32, v: f32);

    /// Textured triangle strip in screen space
    fn draw_strip(&mut self, vertices: &[GuVertex; 4]);

    /// Wait for the graphics unit to drain
    fn sync(&mut self);

    fn wait_vblank(&mut self);

    fn swap_buffers(&mut self);
}

impl<T: GuApi + ?Sized> GuApi for Box<T> {
    fn init(&mut self) -> Result<Extent, InitError> {
        (**self).init()
    }

    fn term(&mut self) {
        (**self).term()
    }

    fn vram_mut(&mut self) -> &mut [u8] {
        (**self).vram_mut()
    }

    fn dcache_writeback(&mut self, texels: TexelRef<'_>) {
        (**self).dcache_writeback(texels)
    }

    fn tex_flush(&mut self) {
        (**self).tex_flush()
    }

    fn start_list(&mut self, list: usize) {
        (**self).start_list(list)
    }

    fn finish_list(&mut self) {
        (**self).finish_list()
    }

    fn clear(&mut self, abgr: u32) {
        (**self).clear(abgr)
    }

    fn tex_image(&mut self, image: TextureImage<'_>) {
        (**self).tex_image(image)
    }

    fn tex_filter(&mut self, filter: Filter) {
        (**self).tex_filter(filter)
    }

    fn tex_scale(&mut self, u: f32, v: f32) {
        (**self).tex_scale(u, v)
    }

    fn draw_strip(&mut self, vertices: &[GuVertex; 4]) {
        (**self).draw_strip(vertices)
    }

    fn sync(&mut self) {
        (**self).sync()
    }

    fn wait_vblank(&mut self) {
        (**self).wait_vblank()
    }

    fn swap_buffers(&mut self) {
        (**self).swap_buffers()
    }
}
