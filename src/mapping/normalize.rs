//! Axis normalization

use super::Mapper;

/// Maps an axis range onto [0, 1] linearly, without clamping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    min: f64,
    max: f64,
}

impl Normalizer {
    /// Create a normalizer for `min..max`; callers guarantee `min < max`
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl Mapper for Normalizer {
    fn map(&self, input: f64) -> f64 {
        (input - self.min) / self.span()
    }
}
