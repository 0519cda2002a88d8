use crate::config::PresentConfig;
use crate::error::InitError;

/// Writable view of the source framebuffer for one frame
///
/// Pixels are BGRA8888, `pitch` bytes per row. Contents are unspecified until
/// written.
#[derive(Debug)]
pub struct FrameTarget<'a> {
    pub pixels: &'a mut [u8],
    pub pitch: usize,
    pub width: u32,
    pub height: u32,
}

impl FrameTarget<'_> {
    /// Mutable bytes of row `y`
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.pitch;
        &mut self.pixels[start..start + self.width as usize * 4]
    }
}

/// Counters a renderer keeps about its own work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentStats {
    pub frames: u64,
    pub reallocations: u32,
    /// Texture slots placed in the fallback memory pool
    pub fallback_slots: u32,
    pub skipped_frames: u64,
}

/// Software framebuffer presentation, one implementation per graphics backend
///
/// Renderers are driven from a single thread: `begin_draw`, fill the pixels,
/// `end_draw`. All state is owned by the instance, none of it is shared.
pub trait FramebufferRenderer {
    fn name(&self) -> &str;

    /// Establish the rendering context and detect capabilities
    fn init(&mut self) -> Result<(), InitError>;

    /// Release every CPU and GPU buffer; safe to call repeatedly
    fn destroy(&mut self);

    /// Hand out a buffer large enough for a `width`x`height` frame
    fn begin_draw(&mut self, width: u32, height: u32) -> FrameTarget<'_>;

    /// Convert, upload, draw and present the frame filled since `begin_draw`
    fn end_draw(&mut self);

    fn set_config(&mut self, config: PresentConfig);

    fn config(&self) -> PresentConfig;

    fn stats(&self) -> PresentStats;
}
