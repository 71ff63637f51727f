//! Spatial placement of the tone
//!
//! Time runs left to right; y runs bottom to top. Planar mode expresses
//! that as a panner direction, 3-D mode as a source position in front of
//! the listener.

use super::{Mapper, Normalizer};
use crate::config::{SpatialMode, VoicePreset};

/// Where the tone should be heard for one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Panner direction in degrees
    Planar { azimuth: f64, elevation: f64 },
    /// Source position in the listener's frame
    Spatial { position: [f64; 3] },
}

/// Maps normalized time and y to a `Placement`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialMapper {
    mode: SpatialMode,
    y: Normalizer,
    /// Azimuth sweep in degrees, centered on straight ahead
    width: f64,
    /// Elevation span in degrees across the y range
    vertical_range: f64,
    /// Extent of the 3-D sweep box
    box_width: f64,
    box_height: f64,
}

impl SpatialMapper {
    pub fn new(mode: SpatialMode, min_y: f64, max_y: f64, preset: &VoicePreset) -> Self {
        Self {
            mode,
            y: Normalizer::new(min_y, max_y),
            width: preset.planar_width,
            vertical_range: preset.vertical_range,
            box_width: preset.hrtf_width,
            box_height: preset.hrtf_height,
        }
    }

    pub fn place(&self, normalized_time: f64, y: f64) -> Placement {
        let normalized_y = self.y.map(y);
        match self.mode {
            SpatialMode::Planar => Placement::Planar {
                azimuth: -self.width / 2.0 + normalized_time * self.width,
                elevation: self.vertical_range * (normalized_y - 0.5),
            },
            SpatialMode::Spatial3D => Placement::Spatial {
                position: [
                    (normalized_time - 0.5) * self.box_width,
                    (normalized_y - 0.5) * self.box_height,
                    0.0,
                ],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planar(preset: &VoicePreset) -> SpatialMapper {
        SpatialMapper::new(SpatialMode::Planar, 0.0, 10.0, preset)
    }

    #[test]
    fn test_planar_sweeps_left_to_right() {
        let m = planar(&VoicePreset::default());
        assert_eq!(
            m.place(0.0, 5.0),
            Placement::Planar { azimuth: -90.0, elevation: 0.0 }
        );
        assert_eq!(
            m.place(0.5, 5.0),
            Placement::Planar { azimuth: 0.0, elevation: 0.0 }
        );
        assert_eq!(
            m.place(1.0, 5.0),
            Placement::Planar { azimuth: 90.0, elevation: 0.0 }
        );
    }

    #[test]
    fn test_default_vertical_range_is_flat() {
        let m = planar(&VoicePreset::default());
        for y in [0.0, 2.5, 10.0] {
            match m.place(0.3, y) {
                Placement::Planar { elevation, .. } => assert_eq!(elevation, 0.0),
                other => panic!("unexpected placement {:?}", other),
            }
        }
    }

    #[test]
    fn test_vertical_range_tracks_y() {
        let preset = VoicePreset {
            vertical_range: 60.0,
            ..VoicePreset::default()
        };
        let m = planar(&preset);
        match (m.place(0.0, 0.0), m.place(0.0, 10.0)) {
            (
                Placement::Planar { elevation: low, .. },
                Placement::Planar { elevation: high, .. },
            ) => {
                assert_eq!(low, -30.0);
                assert_eq!(high, 30.0);
            }
            other => panic!("unexpected placements {:?}", other),
        }
    }

    #[test]
    fn test_spatial_position_in_unit_box() {
        let m = SpatialMapper::new(SpatialMode::Spatial3D, -5.0, 5.0, &VoicePreset::default());
        assert_eq!(
            m.place(0.0, -5.0),
            Placement::Spatial { position: [-0.5, -0.5, 0.0] }
        );
        assert_eq!(
            m.place(1.0, 5.0),
            Placement::Spatial { position: [0.5, 0.5, 0.0] }
        );
        assert_eq!(
            m.place(0.5, 0.0),
            Placement::Spatial { position: [0.0, 0.0, 0.0] }
        );
    }
}
