//! Automatable parameters
//!
//! A `Param` holds a current value plus a queue of linear ramps. Ramps are
//! chained: each one starts where the previous one ends, so a percussive
//! envelope is scheduled as "up to peak, then down to zero" in two calls.

use std::collections::VecDeque;

/// Upper bound on queued ramps; keeps the audio thread allocation-free.
const MAX_PENDING_RAMPS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Ramp {
    target: f64,
    /// Total length in seconds
    duration: f64,
    /// Seconds already elapsed
    elapsed: f64,
    /// Value when the ramp became active
    start: f64,
}

/// A parameter that can be set immediately or ramped linearly
#[derive(Debug, Clone)]
pub struct Param {
    value: f64,
    ramps: VecDeque<Ramp>,
}

impl Param {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            ramps: VecDeque::with_capacity(MAX_PENDING_RAMPS),
        }
    }

    /// Current value
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the value immediately, cancelling any pending ramps
    pub fn set(&mut self, value: f64) {
        self.ramps.clear();
        self.value = value;
    }

    /// Queue a linear ramp to `target` over `seconds`.
    ///
    /// The ramp starts when every previously queued ramp has finished. If the
    /// queue is full the oldest pending ramp is dropped.
    pub fn ramp_to(&mut self, seconds: f64, target: f64) {
        if self.ramps.len() == MAX_PENDING_RAMPS {
            self.ramps.pop_front();
        }
        self.ramps.push_back(Ramp {
            target,
            duration: seconds.max(0.0),
            elapsed: 0.0,
            start: f64::NAN,
        });
    }

    /// Whether any ramp is still pending
    pub fn is_ramping(&self) -> bool {
        !self.ramps.is_empty()
    }

    /// Number of queued ramps, including the active one
    pub fn pending(&self) -> usize {
        self.ramps.len()
    }

    /// Advance automation by `dt` seconds and return the new value
    pub fn advance(&mut self, dt: f64) -> f64 {
        let mut remaining = dt;
        while let Some(ramp) = self.ramps.front_mut() {
            if ramp.start.is_nan() {
                ramp.start = self.value;
            }
            let left = ramp.duration - ramp.elapsed;
            if left <= remaining {
                self.value = ramp.target;
                remaining -= left.max(0.0);
                self.ramps.pop_front();
                continue;
            }
            ramp.elapsed += remaining;
            let progress = ramp.elapsed / ramp.duration;
            self.value = ramp.start + (ramp.target - ramp.start) * progress;
            break;
        }
        self.value
    }
}

impl Default for Param {
    fn default() -> Self {
        Self::new(0.0)
    }
}
