//! Renderer selection

use log::info;

use crate::config::PresentConfig;
use crate::core::FramebufferRenderer;
use crate::gles::{GlesApi, GlesRenderer};
use crate::gu::{GuApi, GuRenderer};

/// Graphics device a renderer is built on
pub enum Surface {
    /// A GL ES capable window
    Gles(Box<dyn GlesApi>),
    /// The handheld console's graphics unit
    Console(Box<dyn GuApi>),
}

impl Surface {
    pub fn kind(&self) -> &'static str {
        match self {
            Surface::Gles(_) => "gles",
            Surface::Console(_) => "gu",
        }
    }
}

/// Build the renderer for `surface`; call `init` on the result before drawing
pub fn create_renderer(surface: Surface, config: PresentConfig) -> Box<dyn FramebufferRenderer> {
    info!("creating {} renderer with {:?}", surface.kind(), config);
    match surface {
        Surface::Gles(device) => Box::new(GlesRenderer::new(device, config)),
        Surface::Console(device) => Box::new(GuRenderer::new(device, config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gu::SoftGu;

    #[test]
    fn console_surface_builds_gu_renderer() {
        let mut renderer = create_renderer(
            Surface::Console(Box::new(SoftGu::new())),
            PresentConfig::default(),
        );
        assert_eq!(renderer.name(), "gu");
        renderer.init().unwrap();
        assert!(renderer.init().is_err());
        renderer.destroy();
        renderer.destroy();
    }
}
