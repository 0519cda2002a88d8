use crate::core::{Extent, FramebufferRenderer};
use crate::demo::TestPattern;
use crate::frame::FrameInfo;

/// Display combines a frame source with a presenting renderer
pub struct Display<R: FramebufferRenderer + ?Sized> {
    pattern: TestPattern,
    source: Extent,
    renderer: Box<R>,
}

impl<R: FramebufferRenderer + ?Sized> Display<R> {
    pub fn new(renderer: Box<R>, source: Extent) -> Self {
        Self {
            pattern: TestPattern::default(),
            source,
            renderer,
        }
    }

    /// Full frame cycle: begin → fill → present
    pub fn draw(&mut self, frame: &FrameInfo) {
        let mut target = self.renderer.begin_draw(self.source.width, self.source.height);
        self.pattern.fill(&mut target, frame);
        self.renderer.end_draw();
    }

    /// Change the source framebuffer size from the next frame on
    pub fn set_source(&mut self, source: Extent) {
        self.source = source;
    }

    pub fn source(&self) -> Extent {
        self.source
    }

    /// Access renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Access mutable renderer
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

impl<R: FramebufferRenderer + ?Sized> Drop for Display<R> {
    fn drop(&mut self) {
        self.renderer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PresentConfig;
    use crate::gu::{GuRenderer, SoftGu};

    #[test]
    fn resized_source_reaches_the_renderer() {
        let mut renderer = GuRenderer::new(SoftGu::new(), PresentConfig::default());
        renderer.init().unwrap();
        let mut display = Display::new(Box::new(renderer), Extent::new(100, 60));
        let frame = FrameInfo::new(0, 0.0, 0.0);

        display.draw(&frame);
        assert_eq!(display.renderer().texture_extent(), Extent::new(128, 64));

        display.set_source(Extent::new(200, 120));
        assert_eq!(display.source(), Extent::new(200, 120));
        display.draw(&frame);
        assert_eq!(display.renderer().texture_extent(), Extent::new(256, 128));
        assert_eq!(display.renderer().stats().frames, 2);
    }
}
