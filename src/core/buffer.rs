use super::convert::SOURCE_BYTES_PER_PIXEL;
use super::texture_stream::Extent;

/// Host buffers grow in whole pages
pub const HOST_BUFFER_ALIGN: usize = 4096;

pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

/// Grow-only owned byte buffer
///
/// Capacity only ever increases (rounded up to `HOST_BUFFER_ALIGN`); the
/// logical length follows the last request.
#[derive(Debug, Default)]
pub struct GrowBuffer {
    data: Vec<u8>,
    len: usize,
}

impl GrowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make room for `len` bytes and return them. Contents carry over from
    /// earlier frames and are otherwise unspecified.
    pub fn ensure(&mut self, len: usize) -> &mut [u8] {
        if len > self.data.len() {
            let capacity = align_up(len, HOST_BUFFER_ALIGN);
            log::debug!("growing host buffer {} -> {} bytes", self.data.len(), capacity);
            self.data.resize(capacity, 0);
        }
        self.len = len;
        &mut self.data[..len]
    }

    /// Like `ensure`, with the logical range zeroed
    pub fn ensure_zeroed(&mut self, len: usize) -> &mut [u8] {
        let bytes = self.ensure(len);
        bytes.fill(0);
        bytes
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Drop the storage entirely
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.len = 0;
    }
}

/// The CPU-side frame the application draws into
///
/// Contents are meaningful only between `begin` and `finish`.
#[derive(Debug, Default)]
pub struct SourceFramebuffer {
    buffer: GrowBuffer,
    extent: Extent,
    open: bool,
}

impl SourceFramebuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame and hand out its pixels together with the row pitch
    pub fn begin(&mut self, width: u32, height: u32) -> (&mut [u8], usize) {
        if self.open {
            log::warn!("begin_draw called twice without end_draw");
        }
        self.extent = Extent::new(width, height);
        self.open = true;
        let pitch = width as usize * SOURCE_BYTES_PER_PIXEL;
        let bytes = self.buffer.ensure(pitch * height as usize);
        (bytes, pitch)
    }

    /// Close the current frame, returning its extent if one was open
    pub fn finish(&mut self) -> Option<Extent> {
        if !self.open {
            return None;
        }
        self.open = false;
        Some(self.extent)
    }

    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn release(&mut self) {
        self.buffer.release();
        self.extent = Extent::default();
        self.open = false;
    }
}
