use super::texture_stream::Extent;

/// Destination rectangle on the display, in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn full(display: Extent) -> Self {
        Self {
            x: 0,
            y: 0,
            width: display.width,
            height: display.height,
        }
    }

    /// Largest centered rectangle with the source's aspect ratio, or the whole
    /// display when the aspect is not locked
    pub fn fit(source: Extent, display: Extent, aspect_locked: bool) -> Self {
        if !aspect_locked || source.is_empty() {
            return Self::full(display);
        }

        let (sw, sh) = (source.width as u64, source.height as u64);
        let (dw, dh) = (display.width as u64, display.height as u64);

        let (width, height) = if dw * sh < dh * sw {
            (dw, dw * sh / sw)
        } else {
            (dh * sw / sh, dh)
        };

        Self {
            x: ((dw - width) >> 1) as i32,
            y: ((dh - height) >> 1) as i32,
            width: width as u32,
            height: height as u32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }
}

/// Fraction of the texture covered by valid frame data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexCoords {
    pub u_max: f32,
    pub v_max: f32,
}

impl TexCoords {
    pub fn covering(source: Extent, texture: Extent) -> Self {
        if texture.is_empty() {
            return Self::default();
        }
        Self {
            u_max: source.width as f32 / texture.width as f32,
            v_max: source.height as f32 / texture.height as f32,
        }
    }

    /// Triangle-strip order matching `(-1,1) (-1,-1) (1,1) (1,-1)` positions
    pub fn strip(&self) -> [f32; 8] {
        [
            0.0, 0.0,
            0.0, self.v_max,
            self.u_max, 0.0,
            self.u_max, self.v_max,
        ]
    }
}

impl Default for TexCoords {
    fn default() -> Self {
        Self {
            u_max: 1.0,
            v_max: 1.0,
        }
    }
}

/// Recomputes texture coordinates only when the frame or texture size moves
#[derive(Debug, Default)]
pub struct TexCoordCache {
    key: Option<(Extent, Extent)>,
    coords: TexCoords,
}

impl TexCoordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the new coordinates if they had to be recomputed
    pub fn update(&mut self, source: Extent, texture: Extent) -> Option<TexCoords> {
        if self.key == Some((source, texture)) {
            return None;
        }
        self.key = Some((source, texture));
        self.coords = TexCoords::covering(source, texture);
        Some(self.coords)
    }

    pub fn current(&self) -> TexCoords {
        self.coords
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterboxes_horizontally() {
        let vp = Viewport::fit(Extent::new(320, 240), Extent::new(480, 272), true);
        assert_eq!(
            vp,
            Viewport {
                x: 59,
                y: 0,
                width: 362,
                height: 272
            }
        );
    }

    #[test]
    fn letterboxes_vertically() {
        let vp = Viewport::fit(Extent::new(256, 128), Extent::new(480, 272), true);
        assert_eq!((vp.width, vp.height), (480, 240));
        assert_eq!((vp.x, vp.y), (0, 16));
    }

    #[test]
    fn unlocked_fills_display() {
        let vp = Viewport::fit(Extent::new(320, 240), Extent::new(480, 272), false);
        assert_eq!(vp, Viewport::full(Extent::new(480, 272)));
    }

    #[test]
    fn cache_skips_unchanged_geometry() {
        let mut cache = TexCoordCache::new();
        let coords = cache
            .update(Extent::new(256, 224), Extent::new(256, 256))
            .unwrap();
        assert_eq!(coords.u_max, 1.0);
        assert_eq!(coords.v_max, 224.0 / 256.0);
        assert!(cache.update(Extent::new(256, 224), Extent::new(256, 256)).is_none());

        cache.invalidate();
        assert!(cache.update(Extent::new(256, 224), Extent::new(256, 256)).is_some());
    }

    #[test]
    fn strip_order() {
        let coords = TexCoords {
            u_max: 0.5,
            v_max: 0.25,
        };
        assert_eq!(coords.strip(), [0.0, 0.0, 0.0, 0.25, 0.5, 0.0, 0.5, 0.25]);
    }
}
