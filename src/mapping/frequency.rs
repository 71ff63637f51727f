//! Exponential pitch mapping
//!
//! Maps y onto an equal-tempered pitch range: equal steps in y give equal
//! musical intervals, which is how the ear compares frequencies.

use super::{Mapper, Normalizer};

/// Frequency ratio of one equal-tempered semitone
pub const SEMITONE: f64 = 1.059_463_094_359_295_3;

/// Maps a y-value in `[min_y, max_y]` to an oscillator frequency
///
/// `frequency = start_frequency * 2^(normalized * semitone_range / 12)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyMapper {
    y: Normalizer,
    start_frequency: f64,
    semitone_range: f64,
}

impl FrequencyMapper {
    pub fn new(min_y: f64, max_y: f64, start_frequency: f64, semitone_range: f64) -> Self {
        Self {
            y: Normalizer::new(min_y, max_y),
            start_frequency,
            semitone_range,
        }
    }

    /// Frequency at `min_y`
    pub fn start_frequency(&self) -> f64 {
        self.start_frequency
    }

    /// Frequency at `max_y`
    pub fn top_frequency(&self) -> f64 {
        self.start_frequency * 2f64.powf(self.semitone_range / 12.0)
    }
}

impl Mapper for FrequencyMapper {
    /// No range check: the fade controller keeps out-of-range y away
    fn map(&self, y: f64) -> f64 {
        let semitones = self.y.map(y) * self.semitone_range;
        self.start_frequency * 2f64.powf(semitones / 12.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> FrequencyMapper {
        FrequencyMapper::new(0.0, 10.0, 130.8, 32.0)
    }

    #[test]
    fn test_semitone_constant() {
        assert!((SEMITONE.powi(12) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_endpoints() {
        let m = mapper();
        assert!((m.map(0.0) - 130.8).abs() < 1e-9);
        let top = 130.8 * 2f64.powf(32.0 / 12.0);
        assert!((m.map(10.0) - top).abs() < 1e-9);
        assert!((m.top_frequency() - top).abs() < 1e-9);
    }

    #[test]
    fn test_limits_approached_from_inside() {
        let m = mapper();
        let eps = 1e-9;
        assert!((m.map(0.0 + eps) - m.start_frequency()).abs() < 1e-6);
        assert!((m.map(10.0 - eps) - m.top_frequency()).abs() < 1e-5);
    }

    #[test]
    fn test_strictly_monotonic() {
        let m = mapper();
        let mut last = m.map(0.001);
        for i in 1..1000 {
            let y = 0.001 + i as f64 * 0.00998;
            let f = m.map(y);
            assert!(f > last, "not increasing at y={}", y);
            last = f;
        }
    }

    #[test]
    fn test_equal_steps_give_equal_intervals() {
        // Two octaves over the range: each half is one octave.
        let m = FrequencyMapper::new(-1.0, 1.0, 220.0, 24.0);
        let low = m.map(-1.0);
        let mid = m.map(0.0);
        let high = m.map(1.0);
        assert!((mid / low - high / mid).abs() < 1e-12);
        assert!((mid - 440.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_semitone_step() {
        let m = FrequencyMapper::new(0.0, 12.0, 100.0, 12.0);
        assert!((m.map(1.0) / m.map(0.0) - SEMITONE).abs() < 1e-12);
    }
}
