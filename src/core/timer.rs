/// Frame counter - fires every N ticks
#[derive(Debug, Clone, Copy)]
pub struct EveryNTicks {
    interval: u64,
    count: u64,
}

impl EveryNTicks {
    /// Create timer that fires every N ticks
    pub fn new(interval: u64) -> Self {
        Self { interval, count: 0 }
    }

    /// Tick once, returns true if should fire
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.interval {
            self.count = 0;
            true
        } else {
            false
        }
    }
}

/// Explicit GPU wait cadence: every N presented frames, or never for 0
#[derive(Debug, Clone, Copy)]
pub struct SyncThrottle {
    every: Option<EveryNTicks>,
}

impl SyncThrottle {
    pub fn new(every: u32) -> Self {
        Self {
            every: (every > 0).then(|| EveryNTicks::new(every as u64)),
        }
    }

    /// Count one frame, returns true if this frame should wait for the GPU
    pub fn tick(&mut self) -> bool {
        self.every.as_mut().is_some_and(EveryNTicks::tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_n_ticks_counts() {
        let mut timer = EveryNTicks::new(3);

        assert!(!timer.tick()); // count=1
        assert!(!timer.tick()); // count=2
        assert!(timer.tick());  // count=3, fire and reset
        assert!(!timer.tick()); // count=1 again
    }

    #[test]
    fn zero_interval_never_syncs() {
        let mut throttle = SyncThrottle::new(0);
        assert!((0..10).all(|_| !throttle.tick()));
    }

    #[test]
    fn syncs_on_every_nth_frame() {
        let mut throttle = SyncThrottle::new(2);
        let fired: Vec<bool> = (0..4).map(|_| throttle.tick()).collect();
        assert_eq!(fired, vec![false, true, false, true]);
    }
}
