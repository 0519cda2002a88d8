//! Fixed-function GL ES presentation backend
//!
//! `GlesApi` is the slice of GL ES 1.1 the renderer issues. `WgpuGles`
//! implements it on wgpu for desktop windows; tests drive it with recording
//! devices.

pub mod gpu_context;
pub mod renderer;
pub mod wgpu_device;

pub use renderer::{GlesRenderer, UploadPath};
pub use wgpu_device::WgpuGles;

use crate::core::{Extent, Filter, TexelFormat, Viewport};
use crate::error::InitError;

pub type TextureId = u32;

/// What the created context reports about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    /// An embedded (ES) context, where 16-bit textures are preferred
    pub is_es: bool,
    pub renderer: String,
}

/// GL ES entry points used for presentation
///
/// Calls mirror their GL namesakes; texture calls act on the bound texture.
pub trait GlesApi {
    fn create_context(&mut self) -> Result<ContextInfo, InitError>;

    fn destroy_context(&mut self) {}

    /// 1 waits for vertical blank on swap, 0 presents immediately
    fn set_swap_interval(&mut self, interval: u32);

    /// Space-separated `GL_EXTENSIONS`
    fn extensions(&self) -> String;

    fn drawable_size(&self) -> Extent;

    /// Replace texture env, client arrays on, blending/depth/fog/lighting/dither off
    fn setup_fixed_function(&mut self, unpack_alignment: u32);

    fn gen_texture(&mut self) -> TextureId;

    fn delete_texture(&mut self, texture: TextureId);

    fn bind_texture(&mut self, texture: TextureId);

    fn tex_filter(&mut self, filter: Filter);

    fn tex_wrap_clamp_to_edge(&mut self);

    /// Specify storage; `None` leaves the contents undefined
    fn tex_image_2d(&mut self, format: TexelFormat, size: Extent, pixels: Option<&[u8]>);

    /// Replace the `size` region at the origin with tightly packed `pixels`
    fn tex_sub_image_2d(&mut self, format: TexelFormat, size: Extent, pixels: &[u8]);

    fn viewport(&mut self, viewport: Viewport);

    /// Texture coordinates for the four strip vertices
    fn tex_coord_pointer(&mut self, coords: &[f32; 8]);

    fn clear(&mut self, rgba: [f32; 4]);

    /// `glDrawArrays(GL_TRIANGLE_STRIP, 0, 4)`
    fn draw_quad(&mut self);

    /// Block until queued GPU work completes
    fn finish(&mut self);

    fn swap_window(&mut self);
}

impl<T: GlesApi + ?Sized> GlesApi for Box<T> {
    fn create_context(&mut self) -> Result<ContextInfo, InitError> {
        (**self).create_context()
    }

    fn destroy_context(&mut self) {
        (**self).destroy_context()
    }

    fn set_swap_interval(&mut self, interval: u32) {
        (**self).set_swap_interval(interval)
    }

    fn extensions(&self) -> String {
        (**self).extensions()
    }

    fn drawable_size(&self) -> Extent {
        (**self).drawable_size()
    }

    fn setup_fixed_function(&mut self, unpack_alignment: u32) {
        (**self).setup_fixed_function(unpack_alignment)
    }

    fn gen_texture(&mut self) -> TextureId {
        (**self).gen_texture()
    }

    fn delete_texture(&mut self, texture: TextureId) {
        (**self).delete_texture(texture)
    }

    fn bind_texture(&mut self, texture: TextureId) {
        (**self).bind_texture(texture)
    }

    fn tex_filter(&mut self, filter: Filter) {
        (**self).tex_filter(filter)
    }

    fn tex_wrap_clamp_to_edge(&mut self) {
        (**self).tex_wrap_clamp_to_edge()
    }

    fn tex_image_2d(&mut self, format: TexelFormat, size: Extent, pixels: Option<&[u8]>) {
        (**self).tex_image_2d(format, size, pixels)
    }

    fn tex_sub_image_2d(&mut self, format: TexelFormat, size: Extent, pixels: &[u8]) {
        (**self).tex_sub_image_2d(format, size, pixels)
    }

    fn viewport(&mut self, viewport: Viewport) {
        (**self).viewport(viewport)
    }

    fn tex_coord_pointer(&mut self, coords: &[f32; 8]) {
        (**self).tex_coord_pointer(coords)
    }

    fn clear(&mut self, rgba: [f32; 4]) {
        (**self).clear(rgba)
    }

    fn draw_quad(&mut self) {
        (**self).draw_quad()
    }

    fn finish(&mut self) {
        (**self).finish()
    }

    fn swap_window(&mut self) {
        (**self).swap_window()
    }
}
