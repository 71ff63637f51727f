//! Validated per-run mapping configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest run the user can ask for, in seconds
pub const MIN_DURATION: f64 = 1.0;

/// How the tone is positioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialMode {
    /// Stereo panning, left to right
    #[default]
    Planar,
    /// Binaural 3-D placement (headphones)
    #[serde(rename = "spatial3d", alias = "hrtf")]
    Spatial3D,
}

/// Rejected mapping parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{axis} range is empty or inverted: {min} to {max}")]
    EmptyRange { axis: char, min: f64, max: f64 },

    #[error("{what} must be a finite number")]
    NonFinite { what: &'static str },

    #[error("duration must be positive, got {0}")]
    NonPositiveDuration(f64),

    #[error("duration must be at least {min} seconds, got {duration}")]
    DurationTooShort { duration: f64, min: f64 },

    #[error("{axis} tick interval must be positive, got {interval}")]
    TickInterval { axis: char, interval: f64 },
}

/// Everything that shapes one sonification run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingConfig {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    /// Seconds to sweep from `min_x` to `max_x`
    pub duration: f64,
    pub x_ticks: Option<f64>,
    pub y_ticks: Option<f64>,
    pub zero_ticks: bool,
    pub spatial_mode: SpatialMode,
}

impl MappingConfig {
    /// A plain run over the given ranges: no ticks, planar panning
    pub fn new(x: (f64, f64), y: (f64, f64), duration: f64) -> Self {
        Self {
            min_x: x.0,
            max_x: x.1,
            min_y: y.0,
            max_y: y.1,
            duration,
            x_ticks: None,
            y_ticks: None,
            zero_ticks: false,
            spatial_mode: SpatialMode::Planar,
        }
    }

    pub fn with_x_ticks(mut self, interval: Option<f64>) -> Self {
        self.x_ticks = interval;
        self
    }

    pub fn with_y_ticks(mut self, interval: Option<f64>) -> Self {
        self.y_ticks = interval;
        self
    }

    pub fn with_zero_ticks(mut self, enabled: bool) -> Self {
        self.zero_ticks = enabled;
        self
    }

    pub fn with_spatial_mode(mut self, mode: SpatialMode) -> Self {
        self.spatial_mode = mode;
        self
    }

    /// Check the invariants the per-block update relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range('x', self.min_x, self.max_x)?;
        check_range('y', self.min_y, self.max_y)?;

        if self.duration.is_nan() || self.duration.is_infinite() {
            return Err(ConfigError::NonFinite { what: "duration" });
        }
        if self.duration <= 0.0 {
            return Err(ConfigError::NonPositiveDuration(self.duration));
        }

        check_ticks('x', self.x_ticks)?;
        check_ticks('y', self.y_ticks)?;
        Ok(())
    }
}

fn check_range(axis: char, min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ConfigError::NonFinite {
            what: if axis == 'x' { "x range" } else { "y range" },
        });
    }
    if min >= max {
        return Err(ConfigError::EmptyRange { axis, min, max });
    }
    Ok(())
}

fn check_ticks(axis: char, interval: Option<f64>) -> Result<(), ConfigError> {
    match interval {
        Some(interval) if !(interval > 0.0 && interval.is_finite()) => {
            Err(ConfigError::TickInterval { axis, interval })
        }
        _ => Ok(()),
    }
}
