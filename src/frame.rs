use std::time::Instant;

/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    pub number: u64,
    pub time: f32,
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Iterator that yields frame information, optionally stopping after a
/// fixed number of frames
pub struct FrameIterator {
    frame_number: u64,
    limit: Option<u64>,
    start_time: Instant,
    last_frame_time: Instant,
}

impl FrameIterator {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            frame_number: 0,
            limit: None,
            start_time: now,
            last_frame_time: now,
        }
    }

    /// Yield at most `frames` frames
    pub fn limited(frames: u64) -> Self {
        Self {
            limit: Some(frames),
            ..Self::new()
        }
    }

    pub fn is_done(&self) -> bool {
        self.limit.is_some_and(|limit| self.frame_number >= limit)
    }
}

impl Default for FrameIterator {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for FrameIterator {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        if self.is_done() {
            return None;
        }
        let now = Instant::now();
        let delta = now.duration_since(self.last_frame_time).as_secs_f32();
        let time = now.duration_since(self.start_time).as_secs_f32();

        let info = FrameInfo::new(self.frame_number, time, delta);

        self.frame_number += 1;
        self.last_frame_time = now;

        Some(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limited_iterator_stops() {
        let numbers: Vec<u64> = FrameIterator::limited(3).map(|f| f.number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
    }

    #[test]
    fn unlimited_iterator_keeps_going() {
        let mut frames = FrameIterator::new();
        assert_eq!(frames.nth(99).map(|f| f.number), Some(99));
        assert!(!frames.is_done());
    }
}
