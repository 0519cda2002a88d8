use log::{debug, info, trace, warn};

use super::{ContextInfo, GlesApi, TextureId};
use crate::config::PresentConfig;
use crate::core::convert::{pack_row, swizzle_bgra_to_rgba, PackOrder};
use crate::core::{
    required_extent, Capabilities, Extent, FilterState, FrameTarget, FramebufferRenderer,
    GrowBuffer, PresentStats, SlotAllocator, SourceFramebuffer, SyncThrottle, TexCoordCache,
    TexelFormat, TextureStream, Viewport,
};
use crate::error::InitError;

/// How source pixels reach the texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPath {
    /// Pack to RGB565 in a staging buffer
    Packed565,
    /// Upload the BGRA source as-is
    DirectBgra,
    /// Swap red/blue into RGBA in a staging buffer
    Reorder,
}

impl UploadPath {
    pub fn select(caps: Capabilities, prefer_565: bool) -> Self {
        if prefer_565 {
            UploadPath::Packed565
        } else if caps.bgra_upload {
            UploadPath::DirectBgra
        } else {
            UploadPath::Reorder
        }
    }

    pub fn format(&self) -> TexelFormat {
        match self {
            UploadPath::Packed565 => TexelFormat::Packed565(PackOrder::RedHigh),
            UploadPath::DirectBgra => TexelFormat::Bgra8,
            UploadPath::Reorder => TexelFormat::Rgba8,
        }
    }

    pub fn unpack_alignment(&self) -> u32 {
        self.format().bytes_per_texel() as u32
    }
}

/// One GL texture of the pair
#[derive(Debug)]
pub struct GlSlot {
    pub texture: TextureId,
    filter: FilterState,
    /// Region holding frame data; everything outside it is zero
    valid: Extent,
}

struct GlSlotAllocator<'a, G> {
    device: &'a mut G,
    format: TexelFormat,
    zeroes: &'a mut GrowBuffer,
}

impl<G: GlesApi> SlotAllocator for GlSlotAllocator<'_, G> {
    type Slot = GlSlot;

    fn allocate(&mut self, extent: Extent) -> GlSlot {
        let texture = self.device.gen_texture();
        self.device.bind_texture(texture);
        self.device.tex_wrap_clamp_to_edge();
        let zeroes = self
            .zeroes
            .ensure_zeroed(extent.pixel_count() * self.format.bytes_per_texel());
        self.device.tex_image_2d(self.format, extent, Some(zeroes));
        GlSlot {
            texture,
            filter: FilterState::new(),
            valid: Extent::default(),
        }
    }

    fn release(&mut self, slot: GlSlot) {
        self.device.delete_texture(slot.texture);
    }

    // glTexSubImage2D copies out of client memory before returning
    fn flush(&mut self, _slot: &mut GlSlot) {}
}

/// Framebuffer presenter on a fixed-function GL ES context
pub struct GlesRenderer<G: GlesApi> {
    device: G,
    config: PresentConfig,
    context: Option<ContextInfo>,
    caps: Capabilities,
    path: UploadPath,
    source: SourceFramebuffer,
    staging: GrowBuffer,
    zeroes: GrowBuffer,
    stream: TextureStream<GlSlot>,
    tex_coords: TexCoordCache,
    throttle: SyncThrottle,
    stats: PresentStats,
}

impl<G: GlesApi> GlesRenderer<G> {
    pub fn new(device: G, config: PresentConfig) -> Self {
        Self {
            device,
            config,
            context: None,
            caps: Capabilities::default(),
            path: UploadPath::Reorder,
            source: SourceFramebuffer::new(),
            staging: GrowBuffer::new(),
            zeroes: GrowBuffer::new(),
            stream: TextureStream::new(),
            tex_coords: TexCoordCache::new(),
            throttle: SyncThrottle::new(config.sync_every),
            stats: PresentStats::default(),
        }
    }

    pub fn device(&self) -> &G {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut G {
        &mut self.device
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn upload_path(&self) -> UploadPath {
        self.path
    }

    pub fn texture_extent(&self) -> Extent {
        self.stream.allocated()
    }

    fn prefers_565(&self) -> bool {
        let is_es = self.context.as_ref().is_some_and(|c| c.is_es);
        self.config.prefer_rgb565.unwrap_or(is_es)
    }

    fn release_textures(&mut self) {
        let mut alloc = GlSlotAllocator {
            device: &mut self.device,
            format: self.path.format(),
            zeroes: &mut self.zeroes,
        };
        self.stream.release_all(&mut alloc);
        self.tex_coords.invalidate();
    }

    /// Convert the current frame for the active path and upload it into the
    /// bound texture
    fn upload(&mut self, source: Extent) {
        let format = self.path.format();
        let src = self.source.pixels();
        let pixels: &[u8] = match self.path {
            UploadPath::DirectBgra => src,
            UploadPath::Packed565 => {
                let dst = self.staging.ensure(source.pixel_count() * 2);
                pack_row(dst, src, PackOrder::RedHigh);
                self.staging.as_slice()
            }
            UploadPath::Reorder => {
                let dst = self.staging.ensure(source.pixel_count() * 4);
                swizzle_bgra_to_rgba(dst, src);
                self.staging.as_slice()
            }
        };
        self.device.tex_sub_image_2d(format, source, pixels);
    }
}

impl<G: GlesApi> FramebufferRenderer for GlesRenderer<G> {
    fn name(&self) -> &str {
        "gles"
    }

    fn init(&mut self) -> Result<(), InitError> {
        if self.context.is_some() {
            return Err(InitError::AlreadyInitialized);
        }

        let context = self.device.create_context()?;
        self.device
            .set_swap_interval(if self.config.vsync { 1 } else { 0 });
        self.caps = Capabilities::detect(&self.device.extensions());
        self.context = Some(context);
        self.path = UploadPath::select(self.caps, self.prefers_565());
        self.device
            .setup_fixed_function(self.path.unpack_alignment());
        self.tex_coords.invalidate();

        info!(
            "gles renderer on {:?}: bgra={} npot={} path={:?}",
            self.context.as_ref().map(|c| c.renderer.as_str()).unwrap_or_default(),
            self.caps.bgra_upload,
            self.caps.npot,
            self.path
        );
        Ok(())
    }

    fn destroy(&mut self) {
        self.release_textures();
        self.staging.release();
        self.zeroes.release();
        self.source.release();
        if self.context.take().is_some() {
            self.device.destroy_context();
            debug!("gles renderer destroyed");
        }
    }

    fn begin_draw(&mut self, width: u32, height: u32) -> FrameTarget<'_> {
        let (pixels, pitch) = self.source.begin(width, height);
        FrameTarget {
            pixels,
            pitch,
            width,
            height,
        }
    }

    fn end_draw(&mut self) {
        let Some(source) = self.source.finish() else {
            warn!("end_draw without a matching begin_draw");
            return;
        };
        if self.context.is_none() || source.is_empty() {
            trace!("skipping frame {}x{}", source.width, source.height);
            self.stats.skipped_frames += 1;
            return;
        }

        let display = self.device.drawable_size();
        let viewport = Viewport::fit(source, display, self.config.aspect_locked());
        self.device.viewport(viewport);

        let format = self.path.format();
        let required = required_extent(source.width, source.height, self.caps.npot);
        let mut alloc = GlSlotAllocator {
            device: &mut self.device,
            format,
            zeroes: &mut self.zeroes,
        };
        if self.stream.ensure(required, &mut alloc) {
            self.tex_coords.invalidate();
            self.stats.reallocations += 1;
        }

        let Some((index, slot)) = self.stream.acquire_write_slot() else {
            return;
        };
        let texture = slot.texture;
        let stale = slot.valid;
        let filter = slot.filter.change(self.config.filter());
        slot.valid = source;

        self.device.bind_texture(texture);
        if let Some(filter) = filter {
            self.device.tex_filter(filter);
        }
        if !source.contains(stale) {
            // a larger earlier frame left texels outside this one
            let zeroes = self
                .zeroes
                .ensure_zeroed(stale.pixel_count() * format.bytes_per_texel());
            self.device.tex_sub_image_2d(format, stale, zeroes);
        }
        self.upload(source);

        let mut alloc = GlSlotAllocator {
            device: &mut self.device,
            format,
            zeroes: &mut self.zeroes,
        };
        self.stream.publish(index, &mut alloc);

        if let Some(coords) = self.tex_coords.update(source, self.stream.allocated()) {
            self.device.tex_coord_pointer(&coords.strip());
        }

        self.device.clear([0.0, 0.0, 0.0, 1.0]);
        self.device.draw_quad();
        if self.throttle.tick() {
            self.device.finish();
        }
        self.device.swap_window();
        self.stats.frames += 1;
    }

    fn set_config(&mut self, config: PresentConfig) {
        let previous = std::mem::replace(&mut self.config, config);
        if previous.sync_every != config.sync_every {
            self.throttle = SyncThrottle::new(config.sync_every);
        }
        if self.context.is_none() {
            return;
        }
        if previous.vsync != config.vsync {
            self.device
                .set_swap_interval(if config.vsync { 1 } else { 0 });
        }

        let path = UploadPath::select(self.caps, self.prefers_565());
        if path != self.path {
            debug!("upload path {:?} -> {:?}", self.path, path);
            self.release_textures();
            self.path = path;
            self.device.setup_fixed_function(path.unpack_alignment());
        }
    }

    fn config(&self) -> PresentConfig {
        self.config
    }

    fn stats(&self) -> PresentStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_565_over_everything() {
        let caps = Capabilities::fixed(true, true);
        assert_eq!(UploadPath::select(caps, true), UploadPath::Packed565);
    }

    #[test]
    fn direct_upload_needs_bgra_extension() {
        assert_eq!(
            UploadPath::select(Capabilities::fixed(true, false), false),
            UploadPath::DirectBgra
        );
        assert_eq!(
            UploadPath::select(Capabilities::fixed(false, false), false),
            UploadPath::Reorder
        );
    }

    #[test]
    fn unpack_alignment_follows_texel_size() {
        assert_eq!(UploadPath::Packed565.unpack_alignment(), 2);
        assert_eq!(UploadPath::Reorder.unpack_alignment(), 4);
    }
}
