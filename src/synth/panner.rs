//! Stereo and binaural panning
//!
//! `AmplitudePanner` is a plain equal-power panner driven by azimuth and
//! elevation. `Spatializer` places a mono source in 3-D space around a
//! listener and renders interaural time and level differences plus head
//! shadow, which is enough for headphone listeners to follow a source that
//! sweeps left to right and up and down.

use super::filter::LowPass;
use std::f64::consts::FRAC_PI_4;

/// Largest interaural time difference for a source at 90 degrees
const MAX_ITD_SECONDS: f64 = 0.00066;

/// Unshadowed cutoff for either ear
const OPEN_EAR_CUTOFF: f64 = 18000.0;

/// Cutoff of the far ear when the source is fully lateral
const SHADOWED_EAR_CUTOFF: f64 = 1500.0;

/// Share of the lateral offset used for level differences in binaural mode.
/// The rest comes from timing and shadowing.
const BINAURAL_LEVEL_SPREAD: f64 = 0.8;

/// Fold a direction onto the left/right axis: -1 is hard left, +1 hard right.
pub fn lateral(azimuth_deg: f64, elevation_deg: f64) -> f64 {
    (azimuth_deg.to_radians().sin() * elevation_deg.to_radians().cos()).clamp(-1.0, 1.0)
}

/// Equal-power gains for a pan position in [-1, 1]
fn equal_power(pan: f64) -> (f64, f64) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (theta.cos(), theta.sin())
}

/// Equal-power stereo panner
#[derive(Debug, Clone)]
pub struct AmplitudePanner {
    azimuth: f64,
    elevation: f64,
    gains: (f64, f64),
}

impl AmplitudePanner {
    pub fn new() -> Self {
        Self {
            azimuth: 0.0,
            elevation: 0.0,
            gains: equal_power(0.0),
        }
    }

    /// Point the panner at a direction in degrees (azimuth positive to the right)
    pub fn set_direction(&mut self, azimuth: f64, elevation: f64) {
        if azimuth == self.azimuth && elevation == self.elevation {
            return;
        }
        self.azimuth = azimuth;
        self.elevation = elevation;
        self.gains = equal_power(lateral(azimuth, elevation));
    }

    pub fn gains(&self) -> (f64, f64) {
        self.gains
    }

    pub fn process(&self, input: f64) -> (f64, f64) {
        (input * self.gains.0, input * self.gains.1)
    }
}

impl Default for AmplitudePanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction of a source as heard by the listener
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub azimuth: f64,
    pub elevation: f64,
    pub distance: f64,
}

/// Listener-relative direction of `source`.
///
/// The listener sits at `listener`, faces -z with +y up, so +x is to the right.
pub fn direction_to(listener: [f64; 3], source: [f64; 3]) -> Direction {
    let dx = source[0] - listener[0];
    let dy = source[1] - listener[1];
    let dz = source[2] - listener[2];
    let horizontal = (dx * dx + dz * dz).sqrt();
    Direction {
        azimuth: dx.atan2(-dz).to_degrees(),
        elevation: dy.atan2(horizontal).to_degrees(),
        distance: (horizontal * horizontal + dy * dy).sqrt(),
    }
}

/// Binaural renderer for a single mono source
#[derive(Debug, Clone)]
pub struct Spatializer {
    listener: [f64; 3],
    position: [f64; 3],
    gains: (f64, f64),
    delays: (usize, usize),
    shadows: (LowPass, LowPass),
    history: Vec<f64>,
    write: usize,
}

impl Spatializer {
    pub fn new(sample_rate: f64, listener: [f64; 3]) -> Self {
        let max_delay = (MAX_ITD_SECONDS * sample_rate).ceil() as usize;
        let mut spatializer = Self {
            listener,
            position: [f64::NAN; 3],
            gains: equal_power(0.0),
            delays: (0, 0),
            shadows: (
                LowPass::new(sample_rate, OPEN_EAR_CUTOFF),
                LowPass::new(sample_rate, OPEN_EAR_CUTOFF),
            ),
            history: vec![0.0; max_delay + 1],
            write: 0,
        };
        spatializer.set_position([0.0, 0.0, 0.0]);
        spatializer
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    pub fn direction(&self) -> Direction {
        direction_to(self.listener, self.position)
    }

    /// Interaural delays in samples, (left, right)
    pub fn delays(&self) -> (usize, usize) {
        self.delays
    }

    pub fn gains(&self) -> (f64, f64) {
        self.gains
    }

    /// Move the source; recomputes gains, delays and shadowing
    pub fn set_position(&mut self, position: [f64; 3]) {
        if position == self.position {
            return;
        }
        self.position = position;

        let dir = self.direction();
        let side = lateral(dir.azimuth, dir.elevation);
        self.gains = equal_power(side * BINAURAL_LEVEL_SPREAD);

        let max_delay = (self.history.len() - 1) as f64;
        let lag = (side.abs() * max_delay).round() as usize;
        // The ear away from the source hears it later.
        self.delays = if side > 0.0 { (lag, 0) } else { (0, lag) };

        // Sources below the listener sound darker.
        let below = dir.elevation.to_radians().sin().min(0.0);
        let tilt = 1.0 + 0.6 * below;
        let far = OPEN_EAR_CUTOFF + (SHADOWED_EAR_CUTOFF - OPEN_EAR_CUTOFF) * side.abs();
        let (left, right) = if side > 0.0 {
            (far, OPEN_EAR_CUTOFF)
        } else {
            (OPEN_EAR_CUTOFF, far)
        };
        self.shadows.0.set_cutoff(left * tilt);
        self.shadows.1.set_cutoff(right * tilt);
    }

    pub fn process(&mut self, input: f64) -> (f64, f64) {
        let len = self.history.len();
        self.history[self.write] = input;
        let left = self.history[(self.write + len - self.delays.0) % len];
        let right = self.history[(self.write + len - self.delays.1) % len];
        self.write = (self.write + 1) % len;

        (
            self.shadows.0.process(left) * self.gains.0,
            self.shadows.1.process(right) * self.gains.1,
        )
    }
}
