//! Configuration file schema

use super::mapping::{ConfigError, MappingConfig, SpatialMode, MIN_DURATION};
use crate::synth::Waveform;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for audiograph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudiographConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioSettings,

    /// Graph ranges, duration and ticks
    #[serde(default)]
    pub graph: GraphSettings,

    /// Voicing of the tone and ticks
    #[serde(default)]
    pub voice: VoicePreset,
}

impl AudiographConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.block_size < 16 || self.audio.block_size > 8192 {
            bail!("Block size must be between 16 and 8192");
        }
        if self.audio.mixahead == 0 {
            bail!("Mixahead must be at least one block");
        }
        if !(self.audio.tail >= 0.0 && self.audio.tail.is_finite()) {
            bail!("Tail must be a non-negative number of seconds");
        }

        self.voice.validate()?;
        self.graph.mapping()?;
        Ok(())
    }
}

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Frames per block; the engine updates once per block (default: 128)
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Device buffering, in blocks (default: 10)
    #[serde(default = "default_mixahead")]
    pub mixahead: usize,

    /// Silence kept after the run in file output, in seconds (default: 0.5)
    #[serde(default = "default_tail")]
    pub tail: f64,
}

fn default_sample_rate() -> u32 { 44100 }
fn default_block_size() -> usize { 128 }
fn default_mixahead() -> usize { 10 }
fn default_tail() -> f64 { 0.5 }

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            mixahead: default_mixahead(),
            tail: default_tail(),
        }
    }
}

impl AudioSettings {
    /// Seconds per block
    pub fn block_duration(&self) -> f64 {
        self.block_size as f64 / self.sample_rate as f64
    }
}

/// What to graph and how, as the user sets it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_min")]
    pub min_x: f64,
    #[serde(default = "default_max")]
    pub max_x: f64,
    #[serde(default = "default_min")]
    pub min_y: f64,
    #[serde(default = "default_max")]
    pub max_y: f64,

    /// Seconds per sweep (default: 5, minimum 1)
    #[serde(default = "default_duration")]
    pub duration: f64,

    /// Tick every multiple of this x interval
    #[serde(default)]
    pub x_ticks: Option<f64>,

    /// Tick every multiple of this y interval
    #[serde(default)]
    pub y_ticks: Option<f64>,

    /// Tick when y crosses zero
    #[serde(default)]
    pub zero_ticks: bool,

    #[serde(default)]
    pub spatial_mode: SpatialMode,
}

fn default_min() -> f64 { 0.0 }
fn default_max() -> f64 { 10.0 }
fn default_duration() -> f64 { 5.0 }

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            min_x: default_min(),
            max_x: default_max(),
            min_y: default_min(),
            max_y: default_max(),
            duration: default_duration(),
            x_ticks: None,
            y_ticks: None,
            zero_ticks: false,
            spatial_mode: SpatialMode::default(),
        }
    }
}

impl GraphSettings {
    /// The validated mapping for a run with these settings
    pub fn mapping(&self) -> Result<MappingConfig, ConfigError> {
        let mapping = MappingConfig::new((self.min_x, self.max_x), (self.min_y, self.max_y), self.duration)
            .with_x_ticks(self.x_ticks)
            .with_y_ticks(self.y_ticks)
            .with_zero_ticks(self.zero_ticks)
            .with_spatial_mode(self.spatial_mode);
        mapping.validate()?;
        if self.duration < MIN_DURATION {
            return Err(ConfigError::DurationTooShort {
                duration: self.duration,
                min: MIN_DURATION,
            });
        }
        Ok(mapping)
    }
}

/// Voicing of one tick generator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickVoice {
    pub waveform: Waveform,
    /// Seconds to reach `peak`
    pub attack: f64,
    /// Peak gain
    pub peak: f64,
    /// Seconds from peak back to silence
    pub decay: f64,
    /// Fixed pitch; `None` follows the main tone
    #[serde(default)]
    pub frequency: Option<f64>,
    /// Seconds to glide up one semitone after firing; `None` disables
    #[serde(default)]
    pub glide: Option<f64>,
}

/// Tuning of the tone, ticks and spatial geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoicePreset {
    /// Pitch at the bottom of the y range (C3)
    pub start_frequency: f64,
    /// Pitch span across the y range
    pub semitone_range: f64,
    pub main_volume: f64,
    /// Noise bed level in 3-D mode
    pub noise_level: f64,
    /// Planar azimuth sweep in degrees
    pub planar_width: f64,
    /// Planar elevation span across the y range, in degrees
    pub vertical_range: f64,
    /// 3-D sweep box extent
    pub hrtf_width: f64,
    pub hrtf_height: f64,
    /// Listener distance behind the sweep plane
    pub listener_offset: f64,
    /// Final fade-out length in seconds
    pub terminal_fade: f64,
    pub x_tick: TickVoice,
    pub y_tick: TickVoice,
    pub zero_tick: TickVoice,
}

impl Default for VoicePreset {
    fn default() -> Self {
        Self {
            start_frequency: 130.8,
            semitone_range: 32.0,
            main_volume: 0.3,
            noise_level: 0.01,
            planar_width: 180.0,
            vertical_range: 0.0,
            hrtf_width: 1.0,
            hrtf_height: 1.0,
            listener_offset: 0.2,
            terminal_fade: 0.2,
            x_tick: TickVoice {
                waveform: Waveform::Square,
                attack: 0.005,
                peak: 0.5,
                decay: 0.05,
                frequency: Some(115.0),
                glide: None,
            },
            y_tick: TickVoice {
                waveform: Waveform::Saw,
                attack: 0.005,
                peak: 0.5,
                decay: 0.05,
                frequency: None,
                glide: None,
            },
            zero_tick: TickVoice {
                waveform: Waveform::Saw,
                attack: 0.05,
                peak: 0.7,
                decay: 0.1,
                frequency: None,
                glide: Some(0.07),
            },
        }
    }
}

impl VoicePreset {
    /// Validate the voicing
    pub fn validate(&self) -> Result<()> {
        if !(self.start_frequency > 0.0 && self.start_frequency.is_finite()) {
            bail!("Start frequency must be a positive number of Hz");
        }
        if !self.semitone_range.is_finite() {
            bail!("Semitone range must be finite");
        }
        if !(0.0..=1.0).contains(&self.main_volume) {
            bail!("Main volume must be between 0.0 and 1.0");
        }
        if !(0.0..=1.0).contains(&self.noise_level) {
            bail!("Noise level must be between 0.0 and 1.0");
        }
        if !(self.listener_offset > 0.0) {
            bail!("Listener offset must be positive");
        }
        if !(self.terminal_fade >= 0.0) {
            bail!("Terminal fade must not be negative");
        }
        for (name, tick) in [("x", &self.x_tick), ("y", &self.y_tick), ("zero", &self.zero_tick)] {
            if !(tick.attack >= 0.0 && tick.decay >= 0.0) {
                bail!("{} tick attack and decay must not be negative", name);
            }
            if !(0.0..=1.0).contains(&tick.peak) {
                bail!("{} tick peak must be between 0.0 and 1.0", name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_audio_settings() {
        let yaml = "sample_rate: 48000";
        let audio: AudioSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(audio.sample_rate, 48000);
        assert_eq!(audio.block_size, 128); // default
        assert_eq!(audio.mixahead, 10);
    }

    #[test]
    fn test_graph_settings() {
        let yaml = r#"
min_x: -6.28
max_x: 6.28
min_y: -1.5
max_y: 1.5
duration: 8
x_ticks: 3.14
zero_ticks: true
spatial_mode: spatial3d
"#;
        let graph: GraphSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(graph.min_x, -6.28);
        assert_eq!(graph.duration, 8.0);
        assert_eq!(graph.x_ticks, Some(3.14));
        assert_eq!(graph.y_ticks, None);
        assert!(graph.zero_ticks);
        assert_eq!(graph.spatial_mode, SpatialMode::Spatial3D);

        let mapping = graph.mapping().unwrap();
        assert_eq!(mapping.min_y, -1.5);
        assert_eq!(mapping.x_ticks, Some(3.14));
    }

    #[test]
    fn test_partial_voice_preset() {
        let yaml = r#"
start_frequency: 220
zero_tick:
  waveform: sine
  attack: 0.01
  peak: 0.4
  decay: 0.2
"#;
        let voice: VoicePreset = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(voice.start_frequency, 220.0);
        assert_eq!(voice.semitone_range, 32.0);
        assert_eq!(voice.zero_tick.waveform, Waveform::Sine);
        assert_eq!(voice.zero_tick.glide, None);
        assert_eq!(voice.x_tick.frequency, Some(115.0));
    }

    #[test]
    fn test_short_duration_rejected() {
        let graph = GraphSettings {
            duration: 0.5,
            ..GraphSettings::default()
        };
        assert!(matches!(
            graph.mapping(),
            Err(ConfigError::DurationTooShort { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = AudiographConfig::default();
        assert!(config.validate().is_ok());

        let mut config = AudiographConfig::default();
        config.audio.sample_rate = 1000;
        assert!(config.validate().is_err());

        let mut config = AudiographConfig::default();
        config.voice.main_volume = 1.5;
        assert!(config.validate().is_err());

        let mut config = AudiographConfig::default();
        config.graph.max_y = -20.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_block_duration() {
        let audio = AudioSettings::default();
        assert!((audio.block_duration() - 128.0 / 44100.0).abs() < 1e-15);
    }
}
