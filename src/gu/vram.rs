use std::ops::Range;

use super::{TEXTURE_VRAM_BASE, VRAM_ALIGN, VRAM_SIZE};
use crate::core::buffer::align_up;

/// A byte range of VRAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VramBlock {
    pub offset: usize,
    pub len: usize,
}

impl VramBlock {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Bump allocator over the free tail of VRAM
///
/// Frees only rewind when they happen in reverse allocation order; anything
/// else stays reserved until `reset`.
#[derive(Debug, Clone)]
pub struct VramArena {
    base: usize,
    end: usize,
    top: usize,
}

impl VramArena {
    pub fn new(base: usize, end: usize) -> Self {
        let base = align_up(base, VRAM_ALIGN);
        Self {
            base,
            end,
            top: base,
        }
    }

    /// Texture region left after the frame buffers
    pub fn for_textures() -> Self {
        Self::new(TEXTURE_VRAM_BASE, VRAM_SIZE)
    }

    pub fn alloc(&mut self, len: usize) -> Option<VramBlock> {
        let len = align_up(len, VRAM_ALIGN);
        if self.top + len > self.end {
            return None;
        }
        let block = VramBlock {
            offset: self.top,
            len,
        };
        self.top += len;
        Some(block)
    }

    /// Returns true if the block was on top and its space is reusable
    pub fn free(&mut self, block: VramBlock) -> bool {
        if block.offset + block.len == self.top {
            self.top = block.offset;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.top = self.base;
    }

    pub fn remaining(&self) -> usize {
        self.end - self.top
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_aligned_and_bounded() {
        let mut arena = VramArena::new(0, 64);
        let a = arena.alloc(10).unwrap();
        let b = arena.alloc(10).unwrap();
        assert_eq!(a, VramBlock { offset: 0, len: 16 });
        assert_eq!(b.offset, 16);
        assert!(arena.alloc(40).is_none());
        assert_eq!(arena.remaining(), 32);
    }

    #[test]
    fn stack_order_free_rewinds() {
        let mut arena = VramArena::new(0, 64);
        let a = arena.alloc(16).unwrap();
        let b = arena.alloc(16).unwrap();
        assert!(!arena.free(a));
        assert!(arena.free(b));
        assert!(arena.free(a));
        assert_eq!(arena.remaining(), 64);
    }

    #[test]
    fn texture_region_fits_two_512x256_slots() {
        let mut arena = VramArena::for_textures();
        let slot = 512 * 256 * 2;
        assert!(arena.alloc(slot).is_some());
        assert!(arena.alloc(slot).is_some());
        assert!(arena.alloc(slot).is_none());
    }
}
