//! Fade hysteresis
//!
//! The tone is only audible while y lies inside the graph's y range. Leaving
//! the range fades out once and then ignores further out-of-range blocks;
//! re-entering fades back in once.

/// Audibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeState {
    Audible,
    Faded,
}

/// A gain ramp the caller must schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeTransition {
    FadeOut,
    FadeIn,
}

/// Two-state machine gating parameter updates on the y range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeController {
    min_y: f64,
    max_y: f64,
    state: FadeState,
}

impl FadeController {
    /// Starts audible
    pub fn new(min_y: f64, max_y: f64) -> Self {
        Self {
            min_y,
            max_y,
            state: FadeState::Audible,
        }
    }

    pub fn state(&self) -> FadeState {
        self.state
    }

    pub fn is_faded(&self) -> bool {
        self.state == FadeState::Faded
    }

    /// Inclusive range check; NaN and infinities are never in range
    pub fn contains(&self, y: f64) -> bool {
        y >= self.min_y && y <= self.max_y
    }

    /// Feed this block's y. Returns the ramp to schedule, if the state changed.
    pub fn update(&mut self, y: f64) -> Option<FadeTransition> {
        match (self.state, self.contains(y)) {
            (FadeState::Audible, false) => {
                self.state = FadeState::Faded;
                Some(FadeTransition::FadeOut)
            }
            (FadeState::Faded, true) => {
                self.state = FadeState::Audible;
                Some(FadeTransition::FadeIn)
            }
            _ => None,
        }
    }
}
