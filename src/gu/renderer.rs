use log::{debug, info, trace, warn};

use super::{
    GuApi, GuVertex, TexelRef, TextureImage, VramArena, VramBlock, TEXTURE_ORDER, VRAM_ALIGN,
};
use crate::config::PresentConfig;
use crate::core::buffer::align_up;
use crate::core::convert::{
    pack_padded, swizzle_tiles, tile_width, PACKED_BYTES_PER_PIXEL, TILE_ROWS,
};
use crate::core::{
    required_extent, Capabilities, Extent, FilterState, FrameTarget, FramebufferRenderer, GrowBuffer,
    PaddedLayout, PresentStats, SlotAllocator, SourceFramebuffer, SyncThrottle, TexCoordCache,
    TextureStream, Viewport,
};
use crate::error::InitError;

const CLEAR_COLOR: u32 = 0xFF00_0000;

/// Backing memory of one console texture
#[derive(Debug)]
pub enum GuSlot {
    Vram(VramBlock),
    /// Main memory, used once VRAM runs out
    Host(Vec<u8>),
}

impl GuSlot {
    pub fn texels(&self) -> TexelRef<'_> {
        match self {
            GuSlot::Vram(block) => TexelRef::Vram(*block),
            GuSlot::Host(bytes) => TexelRef::Host(bytes),
        }
    }

    fn bytes_mut<'a>(&'a mut self, vram: &'a mut [u8]) -> &'a mut [u8] {
        match self {
            GuSlot::Vram(block) => &mut vram[block.range()],
            GuSlot::Host(bytes) => bytes,
        }
    }
}

struct GuSlotAllocator<'a, G> {
    device: &'a mut G,
    arena: &'a mut VramArena,
    fallbacks: &'a mut u32,
    synced: bool,
}

impl<'a, G: GuApi> GuSlotAllocator<'a, G> {
    fn new(device: &'a mut G, arena: &'a mut VramArena, fallbacks: &'a mut u32) -> Self {
        Self {
            device,
            arena,
            fallbacks,
            synced: false,
        }
    }
}

impl<G: GuApi> SlotAllocator for GuSlotAllocator<'_, G> {
    type Slot = GuSlot;

    fn allocate(&mut self, extent: Extent) -> GuSlot {
        let len = extent.pixel_count() * PACKED_BYTES_PER_PIXEL;
        match self.arena.alloc(len) {
            Some(block) => GuSlot::Vram(block),
            None => {
                warn!(
                    "VRAM exhausted ({} bytes left), {}x{} texture goes to main memory",
                    self.arena.remaining(),
                    extent.width,
                    extent.height
                );
                *self.fallbacks += 1;
                GuSlot::Host(vec![0; align_up(len, VRAM_ALIGN)])
            }
        }
    }

    fn release(&mut self, slot: GuSlot) {
        // the display list may still sample either slot
        if !self.synced {
            self.device.sync();
            self.synced = true;
        }
        if let GuSlot::Vram(block) = slot {
            if !self.arena.free(block) {
                debug!("VRAM block at {:#x} freed out of order", block.offset);
            }
        }
    }

    fn flush(&mut self, slot: &mut GuSlot) {
        self.device.dcache_writeback(slot.texels());
    }
}

/// Framebuffer presenter on the console graphics unit
///
/// Frames are packed to BGR565 into one of two power-of-two textures while
/// the other is on screen. Display lists alternate the same way.
pub struct GuRenderer<G: GuApi> {
    device: G,
    config: PresentConfig,
    display: Option<Extent>,
    source: SourceFramebuffer,
    staging: GrowBuffer,
    arena: VramArena,
    stream: TextureStream<GuSlot>,
    tex_coords: TexCoordCache,
    filter: FilterState,
    throttle: SyncThrottle,
    list: usize,
    stats: PresentStats,
}

impl<G: GuApi> GuRenderer<G> {
    pub fn new(device: G, config: PresentConfig) -> Self {
        Self {
            device,
            config,
            display: None,
            source: SourceFramebuffer::new(),
            staging: GrowBuffer::new(),
            arena: VramArena::for_textures(),
            stream: TextureStream::new(),
            tex_coords: TexCoordCache::new(),
            filter: FilterState::new(),
            throttle: SyncThrottle::new(config.sync_every),
            list: 0,
            stats: PresentStats::default(),
        }
    }

    pub fn device(&self) -> &G {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut G {
        &mut self.device
    }

    /// The unit takes neither BGRA texels nor non-power-of-two sizes
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::fixed(false, false)
    }

    pub fn texture_extent(&self) -> Extent {
        self.stream.allocated()
    }

    pub fn vram_remaining(&self) -> usize {
        self.arena.remaining()
    }

    fn texture_size(&self, source: Extent) -> Extent {
        let size = required_extent(source.width, source.height, self.capabilities().npot);
        if self.config.swizzle {
            size.align_to(tile_width(PACKED_BYTES_PER_PIXEL) as u32, TILE_ROWS as u32)
        } else {
            size
        }
    }

    fn release_textures(&mut self) {
        let mut alloc = GuSlotAllocator::new(
            &mut self.device,
            &mut self.arena,
            &mut self.stats.fallback_slots,
        );
        self.stream.release_all(&mut alloc);
        self.tex_coords.invalidate();
    }

    /// Quad covering `viewport`, UVs in texels
    fn quad(&self, viewport: Viewport, texture: Extent) -> [GuVertex; 4] {
        let coords = self.tex_coords.current();
        let u = coords.u_max * texture.width as f32;
        let v = coords.v_max * texture.height as f32;
        let (x0, y0) = (viewport.x as f32, viewport.y as f32);
        let (x1, y1) = (viewport.right() as f32, viewport.bottom() as f32);
        [
            GuVertex { u: 0.0, v: 0.0, x: x0, y: y0, z: 0.0 },
            GuVertex { u, v: 0.0, x: x1, y: y0, z: 0.0 },
            GuVertex { u: 0.0, v, x: x0, y: y1, z: 0.0 },
            GuVertex { u, v, x: x1, y: y1, z: 0.0 },
        ]
    }
}

impl<G: GuApi> FramebufferRenderer for GuRenderer<G> {
    fn name(&self) -> &str {
        "gu"
    }

    fn init(&mut self) -> Result<(), InitError> {
        if self.display.is_some() {
            return Err(InitError::AlreadyInitialized);
        }
        let display = self.device.init()?;
        self.display = Some(display);
        self.filter.reset();
        self.list = 0;
        info!(
            "gu renderer on {}x{} display, {} bytes of texture VRAM",
            display.width,
            display.height,
            self.arena.remaining()
        );
        Ok(())
    }

    fn destroy(&mut self) {
        self.release_textures();
        self.arena.reset();
        self.staging.release();
        self.source.release();
        self.filter.reset();
        if self.display.take().is_some() {
            self.device.term();
            debug!("gu renderer destroyed");
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
        let Some(display) = self.display.filter(|_| !source.is_empty()) else {
            trace!("skipping frame {}x{}", source.width, source.height);
            self.stats.skipped_frames += 1;
            return;
        };

        let viewport = Viewport::fit(source, display, self.config.aspect_locked());

        let required = self.texture_size(source);
        let mut alloc = GuSlotAllocator::new(
            &mut self.device,
            &mut self.arena,
            &mut self.stats.fallback_slots,
        );
        if self.stream.ensure(required, &mut alloc) {
            self.tex_coords.invalidate();
            self.stats.reallocations += 1;
        }
        let texture = self.stream.allocated();
        let layout = PaddedLayout::new(source.width, source.height, texture.width, texture.height);
        let len = layout.dst_len(PACKED_BYTES_PER_PIXEL);

        let Some((index, slot)) = self.stream.acquire_write_slot() else {
            return;
        };
        let dst = &mut slot.bytes_mut(self.device.vram_mut())[..len];
        if self.config.swizzle {
            let linear = self.staging.ensure(len);
            pack_padded(linear, self.source.pixels(), layout, TEXTURE_ORDER);
            swizzle_tiles(
                dst,
                linear,
                texture.width as usize,
                texture.height as usize,
                PACKED_BYTES_PER_PIXEL,
            );
        } else {
            pack_padded(dst, self.source.pixels(), layout, TEXTURE_ORDER);
        }

        let mut alloc = GuSlotAllocator::new(
            &mut self.device,
            &mut self.arena,
            &mut self.stats.fallback_slots,
        );
        self.stream.publish(index, &mut alloc);
        self.device.tex_flush();
        self.tex_coords.update(source, texture);
        let quad = self.quad(viewport, texture);

        self.device.start_list(self.list);
        self.device.clear(CLEAR_COLOR);
        if let Some(slot) = self.stream.display_slot() {
            self.device.tex_image(TextureImage {
                size: texture,
                stride: texture.width,
                order: TEXTURE_ORDER,
                swizzled: self.config.swizzle,
                texels: slot.texels(),
            });
        }
        if let Some(filter) = self.filter.change(self.config.filter()) {
            self.device.tex_filter(filter);
        }
        self.device
            .tex_scale(1.0 / texture.width as f32, 1.0 / texture.height as f32);
        self.device.draw_strip(&quad);
        self.device.finish_list();

        if self.throttle.tick() {
            self.device.sync();
        }
        if self.config.vsync {
            self.device.wait_vblank();
        }
        self.device.swap_buffers();
        self.list ^= 1;
        self.stats.frames += 1;
    }

    fn set_config(&mut self, config: PresentConfig) {
        let previous = std::mem::replace(&mut self.config, config);
        if previous.sync_every != config.sync_every {
            self.throttle = SyncThrottle::new(config.sync_every);
        }
        if previous.swizzle != config.swizzle && self.display.is_some() {
            debug!("texture swizzle {} -> {}", previous.swizzle, config.swizzle);
            self.release_textures();
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
    use crate::gu::SoftGu;

    #[test]
    fn texture_size_is_pot_and_tile_aligned_when_swizzling() {
        let mut renderer = GuRenderer::new(SoftGu::new(), PresentConfig::default());
        assert_eq!(renderer.texture_size(Extent::new(320, 240)), Extent::new(512, 256));
        assert_eq!(renderer.texture_size(Extent::new(3, 2)), Extent::new(4, 2));

        renderer.set_config(PresentConfig {
            swizzle: true,
            ..PresentConfig::default()
        });
        assert_eq!(renderer.texture_size(Extent::new(3, 2)), Extent::new(8, 8));
    }

    #[test]
    fn quad_spans_viewport_with_texel_uvs() {
        let mut renderer = GuRenderer::new(SoftGu::new(), PresentConfig::default());
        renderer
            .tex_coords
            .update(Extent::new(320, 240), Extent::new(512, 256));
        let viewport = Viewport {
            x: 59,
            y: 0,
            width: 362,
            height: 272,
        };
        let quad = renderer.quad(viewport, Extent::new(512, 256));
        assert_eq!((quad[0].x, quad[0].y), (59.0, 0.0));
        assert_eq!((quad[3].x, quad[3].y), (421.0, 272.0));
        assert_eq!((quad[3].u, quad[3].v), (320.0, 240.0));
        assert_eq!((quad[1].u, quad[2].v), (320.0, 240.0));
    }
}
