//! Double-buffered texture storage
//!
//! Two slots alternate every frame: the CPU fills one while the GPU may still
//! be sampling the other from the previous frame's draw.

/// Width and height in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, other: Extent) -> bool {
        self.width >= other.width && self.height >= other.height
    }

    /// Component-wise maximum
    pub fn union(&self, other: Extent) -> Extent {
        Extent::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Round each side up to a multiple of the given (power-of-two) alignment
    pub fn align_to(&self, width_align: u32, height_align: u32) -> Extent {
        Extent::new(
            (self.width + width_align - 1) & !(width_align - 1),
            (self.height + height_align - 1) & !(height_align - 1),
        )
    }
}

/// Smallest power of two >= `value` (1 for 0)
pub fn next_pot(value: u32) -> u32 {
    value.max(1).next_power_of_two()
}

/// Texture size needed for a `width`x`height` frame
pub fn required_extent(width: u32, height: u32, npot: bool) -> Extent {
    if npot {
        Extent::new(width, height)
    } else {
        Extent::new(next_pot(width), next_pot(height))
    }
}

/// One of the two texture slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub const FIRST: SlotIndex = SlotIndex(0);
    pub const SECOND: SlotIndex = SlotIndex(1);

    pub fn other(self) -> SlotIndex {
        SlotIndex(self.0 ^ 1)
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// Tracks which slot the display reads; the write target is always the other
#[derive(Debug, Clone, Copy)]
pub struct SlotRing {
    display: SlotIndex,
}

impl SlotRing {
    /// The first frame writes `FIRST`
    pub fn new() -> Self {
        Self {
            display: SlotIndex::SECOND,
        }
    }

    pub fn write_slot(&self) -> SlotIndex {
        self.display.other()
    }

    pub fn display_slot(&self) -> SlotIndex {
        self.display
    }

    pub fn publish(&mut self, slot: SlotIndex) {
        debug_assert_ne!(slot, self.display, "publishing the slot already on display");
        self.display = slot;
    }
}

impl Default for SlotRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend hook that owns the memory behind a slot
pub trait SlotAllocator {
    type Slot;

    /// Allocate storage for `extent`. Must not fail: exhausting the preferred
    /// pool falls back to a slower one.
    fn allocate(&mut self, extent: Extent) -> Self::Slot;

    fn release(&mut self, slot: Self::Slot);

    /// Make CPU writes to `slot` visible to the GPU
    fn flush(&mut self, slot: &mut Self::Slot);
}

/// Two texture slots sized to the largest frame seen so far
#[derive(Debug)]
pub struct TextureStream<T> {
    slots: Option<[T; 2]>,
    allocated: Extent,
    ring: SlotRing,
    reallocations: u32,
}

impl<T> TextureStream<T> {
    pub fn new() -> Self {
        Self {
            slots: None,
            allocated: Extent::default(),
            ring: SlotRing::new(),
            reallocations: 0,
        }
    }

    pub fn allocated(&self) -> Extent {
        self.allocated
    }

    pub fn reallocations(&self) -> u32 {
        self.reallocations
    }

    /// Grow both slots to cover `required`; returns true if storage changed
    pub fn ensure<A>(&mut self, required: Extent, alloc: &mut A) -> bool
    where
        A: SlotAllocator<Slot = T>,
    {
        let target = self.allocated.union(required);
        if self.slots.is_some() && target == self.allocated {
            return false;
        }

        log::debug!(
            "texture slots {}x{} -> {}x{}",
            self.allocated.width,
            self.allocated.height,
            target.width,
            target.height
        );

        self.release_all(alloc);
        let first = alloc.allocate(target);
        let second = alloc.allocate(target);
        self.slots = Some([first, second]);
        self.allocated = target;
        self.reallocations += 1;
        true
    }

    /// The slot the display is not reading
    pub fn acquire_write_slot(&mut self) -> Option<(SlotIndex, &mut T)> {
        let index = self.ring.write_slot();
        let slots = self.slots.as_mut()?;
        Some((index, &mut slots[index.get()]))
    }

    /// Flush `slot` and make it the display slot
    pub fn publish<A>(&mut self, slot: SlotIndex, alloc: &mut A)
    where
        A: SlotAllocator<Slot = T>,
    {
        if let Some(slots) = self.slots.as_mut() {
            alloc.flush(&mut slots[slot.get()]);
            self.ring.publish(slot);
        }
    }

    pub fn display_slot(&self) -> Option<&T> {
        let index = self.ring.display_slot();
        self.slots.as_ref().map(|slots| &slots[index.get()])
    }

    /// Release both slots in reverse allocation order
    pub fn release_all<A>(&mut self, alloc: &mut A)
    where
        A: SlotAllocator<Slot = T>,
    {
        if let Some([first, second]) = self.slots.take() {
            alloc.release(second);
            alloc.release(first);
        }
        self.allocated = Extent::default();
        self.ring = SlotRing::new();
    }
}

impl<T> Default for TextureStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingAllocator {
        next: u32,
        live: Vec<u32>,
        flushed: Vec<u32>,
    }

    impl SlotAllocator for CountingAllocator {
        type Slot = u32;

        fn allocate(&mut self, _extent: Extent) -> u32 {
            self.next += 1;
            self.live.push(self.next);
            self.next
        }

        fn release(&mut self, slot: u32) {
            self.live.retain(|s| *s != slot);
        }

        fn flush(&mut self, slot: &mut u32) {
            self.flushed.push(*slot);
        }
    }

    #[test]
    fn pot_rounding() {
        assert_eq!(next_pot(0), 1);
        assert_eq!(next_pot(1), 1);
        assert_eq!(next_pot(224), 256);
        assert_eq!(next_pot(256), 256);
        assert_eq!(next_pot(257), 512);
    }

    #[test]
    fn required_extent_respects_npot() {
        assert_eq!(required_extent(320, 240, false), Extent::new(512, 256));
        assert_eq!(required_extent(320, 240, true), Extent::new(320, 240));
    }

    #[test]
    fn ensure_only_grows() {
        let mut alloc = CountingAllocator::default();
        let mut stream = TextureStream::new();

        assert!(stream.ensure(Extent::new(256, 256), &mut alloc));
        assert!(!stream.ensure(Extent::new(256, 256), &mut alloc));
        assert!(!stream.ensure(Extent::new(128, 64), &mut alloc));
        assert!(stream.ensure(Extent::new(64, 512), &mut alloc));

        assert_eq!(stream.allocated(), Extent::new(256, 512));
        assert_eq!(stream.reallocations(), 2);
        assert_eq!(alloc.live.len(), 2);
    }

    #[test]
    fn slots_alternate_and_flush_on_publish() {
        let mut alloc = CountingAllocator::default();
        let mut stream = TextureStream::new();
        stream.ensure(Extent::new(8, 8), &mut alloc);

        let mut published = Vec::new();
        for _ in 0..4 {
            let (index, _) = stream.acquire_write_slot().unwrap();
            stream.publish(index, &mut alloc);
            published.push(index);
        }

        assert_eq!(
            published,
            vec![SlotIndex::FIRST, SlotIndex::SECOND, SlotIndex::FIRST, SlotIndex::SECOND]
        );
        assert_eq!(alloc.flushed, vec![1, 2, 1, 2]);
    }

    #[test]
    fn acquire_without_storage_is_none() {
        let mut stream: TextureStream<u32> = TextureStream::new();
        assert!(stream.acquire_write_slot().is_none());
    }

    #[test]
    fn extent_alignment() {
        assert_eq!(Extent::new(4, 3).align_to(8, 8), Extent::new(8, 8));
        assert_eq!(Extent::new(16, 8).align_to(8, 8), Extent::new(16, 8));
    }
}
