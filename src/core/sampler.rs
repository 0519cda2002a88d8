/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    Nearest,
    Linear,
}

impl Filter {
    pub fn from_linear(linear: bool) -> Self {
        if linear {
            Filter::Linear
        } else {
            Filter::Nearest
        }
    }
}

/// Last filter handed to the GPU, so unchanged settings are not re-sent
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterState {
    applied: Option<Filter>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(filter)` when it differs from what was last applied
    pub fn change(&mut self, wanted: Filter) -> Option<Filter> {
        if self.applied == Some(wanted) {
            return None;
        }
        self.applied = Some(wanted);
        Some(wanted)
    }

    pub fn applied(&self) -> Option<Filter> {
        self.applied
    }

    pub fn reset(&mut self) {
        self.applied = None;
    }
}
