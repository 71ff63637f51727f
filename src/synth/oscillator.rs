//! Band-limited oscillators for the graph voices

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Waveform types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
    Square,
    /// White noise (uniform random)
    Noise,
}

/// PolyBLEP residual for a discontinuity at phase 0.
///
/// `t` is the phase in [0, 1), `dt` the per-sample phase increment.
fn poly_blep(t: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        0.0
    } else if t < dt {
        let t = t / dt;
        t + t - t * t - 1.0
    } else if t > 1.0 - dt {
        let t = (t - 1.0) / dt;
        t * t + t + t + 1.0
    } else {
        0.0
    }
}

/// A single oscillator with a resettable phase
#[derive(Debug, Clone)]
pub struct Oscillator {
    waveform: Waveform,
    phase: f64,
    frequency: f64,
    sample_rate: f64,
    /// Xorshift state for noise
    rng_state: u64,
}

impl Oscillator {
    /// Create a new oscillator
    pub fn new(waveform: Waveform, frequency: f64, sample_rate: f64) -> Self {
        Self {
            waveform,
            phase: 0.0,
            frequency,
            sample_rate,
            rng_state: 0x9E37_79B9_7F4A_7C15,
        }
    }

    /// Set the frequency in Hz
    pub fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }

    /// Get the current frequency
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Current phase in [0, 1)
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Restart the cycle from phase 0
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Generate the next sample
    pub fn generate(&mut self) -> f64 {
        // Nyquist-bounded increment keeps PolyBLEP well defined for wild input.
        let dt = (self.frequency / self.sample_rate).clamp(0.0, 0.5);

        let sample = match self.waveform {
            Waveform::Sine => (self.phase * 2.0 * PI).sin(),
            Waveform::Triangle => self.triangle(),
            Waveform::Saw => self.saw(dt),
            Waveform::Square => self.square(dt),
            Waveform::Noise => self.white_noise(),
        };

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        sample
    }

    fn triangle(&self) -> f64 {
        let p = self.phase;
        if p < 0.25 {
            4.0 * p
        } else if p < 0.75 {
            2.0 - 4.0 * p
        } else {
            4.0 * p - 4.0
        }
    }

    fn saw(&self, dt: f64) -> f64 {
        2.0 * self.phase - 1.0 - poly_blep(self.phase, dt)
    }

    fn square(&self, dt: f64) -> f64 {
        let naive = if self.phase < 0.5 { 1.0 } else { -1.0 };
        let falling = (self.phase + 0.5) % 1.0;
        naive + poly_blep(self.phase, dt) - poly_blep(falling, dt)
    }

    fn white_noise(&mut self) -> f64 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        (x as f64 / u64::MAX as f64) * 2.0 - 1.0
    }
}
