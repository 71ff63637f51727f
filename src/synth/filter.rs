//! Biquad low-pass filter
//!
//! Used by the spatializer to model head shadow on the far ear and the
//! darker timbre of sources below the listener.

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

/// Butterworth-style low-pass biquad (Direct Form II transposed)
#[derive(Debug, Clone)]
pub struct LowPass {
    sample_rate: f64,
    cutoff: f64,
    q: f64,
    coeffs: Coefficients,
    z1: f64,
    z2: f64,
}

impl LowPass {
    /// Create a filter with the given cutoff in Hz
    pub fn new(sample_rate: f64, cutoff: f64) -> Self {
        let mut filter = Self {
            sample_rate,
            cutoff: 0.0,
            q: std::f64::consts::FRAC_1_SQRT_2,
            coeffs: Coefficients {
                b0: 1.0,
                b1: 0.0,
                b2: 0.0,
                a1: 0.0,
                a2: 0.0,
            },
            z1: 0.0,
            z2: 0.0,
        };
        filter.set_cutoff(cutoff);
        filter
    }

    /// Set cutoff frequency in Hz, clamped to 20 Hz .. 0.45 * sample rate
    pub fn set_cutoff(&mut self, hz: f64) {
        let hz = hz.clamp(20.0, self.sample_rate * 0.45);
        if (hz - self.cutoff).abs() < f64::EPSILON {
            return;
        }
        self.cutoff = hz;
        self.calculate_coefficients();
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Clear filter history
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    fn calculate_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * self.q);

        let a0 = 1.0 + alpha;
        self.coeffs = Coefficients {
            b0: (1.0 - cos_omega) / 2.0 / a0,
            b1: (1.0 - cos_omega) / a0,
            b2: (1.0 - cos_omega) / 2.0 / a0,
            a1: -2.0 * cos_omega / a0,
            a2: (1.0 - alpha) / a0,
        };
    }

    /// Process a single sample
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.z1;
        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }
}
