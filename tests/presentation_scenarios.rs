use fb_present::core::{has_extension, Capabilities, Extent, TexCoordCache, Viewport};

#[cfg(test)]
mod capability_tests {
    use super::*;

    #[test]
    fn test_extension_list_matches_both_needles() {
        let list = "GL_EXT_texture_format_BGRA8888 GL_OES_texture_npot";
        assert!(has_extension(list, "GL_EXT_texture_format_BGRA8888"));
        assert!(has_extension(list, "GL_OES_texture_npot"));
        assert_eq!(Capabilities::detect(list), Capabilities::fixed(true, true));
    }

    #[test]
    fn test_longer_token_does_not_match() {
        let list = "GL_EXT_texture_format_BGRA88880";
        assert!(!has_extension(list, "GL_EXT_texture_format_BGRA8888"));
        assert_eq!(Capabilities::detect(list), Capabilities::default());
    }

    #[test]
    fn test_prefix_of_token_does_not_match() {
        assert!(!has_extension("XGL_OES_texture_npot", "GL_OES_texture_npot"));
        assert!(!has_extension("GL_OES_texture_npot2", "GL_OES_texture_npot"));
    }
}

#[cfg(test)]
mod viewport_tests {
    use super::*;

    const DISPLAY: Extent = Extent::new(480, 272);

    #[test]
    fn test_aspect_locked_letterboxes() {
        let vp = Viewport::fit(Extent::new(320, 240), DISPLAY, true);
        assert_eq!(vp, Viewport { x: 59, y: 0, width: 362, height: 272 });
    }

    #[test]
    fn test_aspect_unlocked_fills_display() {
        let vp = Viewport::fit(Extent::new(320, 240), DISPLAY, false);
        assert_eq!(vp, Viewport { x: 0, y: 0, width: 480, height: 272 });
    }

    #[test]
    fn test_wide_source_pillars_vertically() {
        let vp = Viewport::fit(Extent::new(640, 200), DISPLAY, true);
        assert_eq!((vp.width, vp.height), (480, 150));
        assert_eq!((vp.x, vp.y), (0, 61));
    }

    #[test]
    fn test_repeated_present_is_idempotent() {
        let mut cache = TexCoordCache::new();
        let source = Extent::new(320, 240);
        let texture = Extent::new(512, 256);

        let first = cache.update(source, texture);
        assert!(first.is_some());
        assert!(cache.update(source, texture).is_none());
        assert_eq!(first, Some(cache.current()));
        assert_eq!(
            Viewport::fit(source, DISPLAY, true),
            Viewport::fit(source, DISPLAY, true)
        );
    }
}
