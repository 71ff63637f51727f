//! The audio node graph for one sonification
//!
//! ```text
//! tone ──┬──────────────┬─► planar bus (panner)  ─┐
//! ticks ─┘              │                         ├─► output (active bus only)
//! noise ────────────────┴─► spatial bus (binaural)┘
//! ```

use super::backend::{Bus, Control, Generator, ParamSink};
use super::oscillator::{Oscillator, Waveform};
use super::panner::{AmplitudePanner, Spatializer};
use super::param::Param;

/// Static description of a generator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceLayout {
    pub waveform: Waveform,
    pub frequency: f64,
    pub gain: f64,
}

/// Everything needed to build a `SynthGraph`
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayout {
    pub tone: VoiceLayout,
    pub noise_gain: f64,
    pub x_tick: VoiceLayout,
    pub y_tick: VoiceLayout,
    pub zero_tick: VoiceLayout,
    /// Listener position for the spatial bus
    pub listener: [f64; 3],
}

struct Voice {
    osc: Oscillator,
    frequency: Param,
    gain: Param,
}

impl Voice {
    fn new(layout: VoiceLayout, sample_rate: f64) -> Self {
        Self {
            osc: Oscillator::new(layout.waveform, layout.frequency, sample_rate),
            frequency: Param::new(layout.frequency),
            gain: Param::new(layout.gain),
        }
    }

    fn next(&mut self, dt: f64) -> f64 {
        let frequency = self.frequency.advance(dt);
        let gain = self.gain.advance(dt);
        self.osc.set_frequency(frequency);
        let sample = self.osc.generate();
        sample * gain
    }
}

/// Oscillators, panners and their automatable controls
pub struct SynthGraph {
    sample_rate: f64,
    output: Bus,
    tone: Voice,
    noise: Voice,
    x_tick: Voice,
    y_tick: Voice,
    zero_tick: Voice,
    planar_gain: Param,
    spatial_gain: Param,
    azimuth: Param,
    elevation: Param,
    position: [Param; 3],
    panner: AmplitudePanner,
    spatializer: Spatializer,
}

impl SynthGraph {
    /// Build the graph with `output` as the bus connected to the output
    pub fn new(sample_rate: f64, output: Bus, layout: &GraphLayout) -> Self {
        let noise = VoiceLayout {
            waveform: Waveform::Noise,
            frequency: 0.0,
            gain: layout.noise_gain,
        };
        Self {
            sample_rate,
            output,
            tone: Voice::new(layout.tone, sample_rate),
            noise: Voice::new(noise, sample_rate),
            x_tick: Voice::new(layout.x_tick, sample_rate),
            y_tick: Voice::new(layout.y_tick, sample_rate),
            zero_tick: Voice::new(layout.zero_tick, sample_rate),
            planar_gain: Param::new(1.0),
            spatial_gain: Param::new(1.0),
            azimuth: Param::new(0.0),
            elevation: Param::new(0.0),
            position: [Param::new(0.0), Param::new(0.0), Param::new(0.0)],
            panner: AmplitudePanner::new(),
            spatializer: Spatializer::new(sample_rate, layout.listener),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The bus that reaches the output
    pub fn output_bus(&self) -> Bus {
        self.output
    }

    /// Current value of a control
    pub fn value(&self, control: Control) -> f64 {
        self.param(control).value()
    }

    /// Ramps still queued on a control
    pub fn pending_ramps(&self, control: Control) -> usize {
        self.param(control).pending()
    }

    /// Immediately silence every bus and cancel pending automation
    pub fn silence(&mut self) {
        self.planar_gain.set(0.0);
        self.spatial_gain.set(0.0);
        for g in [
            Generator::Tone,
            Generator::Noise,
            Generator::XTick,
            Generator::YTick,
            Generator::ZeroTick,
        ] {
            self.voice_mut(g).gain.set(0.0);
        }
    }

    fn voice(&self, generator: Generator) -> &Voice {
        match generator {
            Generator::Tone => &self.tone,
            Generator::Noise => &self.noise,
            Generator::XTick => &self.x_tick,
            Generator::YTick => &self.y_tick,
            Generator::ZeroTick => &self.zero_tick,
        }
    }

    fn voice_mut(&mut self, generator: Generator) -> &mut Voice {
        match generator {
            Generator::Tone => &mut self.tone,
            Generator::Noise => &mut self.noise,
            Generator::XTick => &mut self.x_tick,
            Generator::YTick => &mut self.y_tick,
            Generator::ZeroTick => &mut self.zero_tick,
        }
    }

    fn param(&self, control: Control) -> &Param {
        match control {
            Control::Gain(g) => &self.voice(g).gain,
            Control::Frequency(g) => &self.voice(g).frequency,
            Control::BusGain(Bus::Planar) => &self.planar_gain,
            Control::BusGain(Bus::Spatial) => &self.spatial_gain,
            Control::Azimuth => &self.azimuth,
            Control::Elevation => &self.elevation,
            Control::Position(axis) => &self.position[axis.index()],
        }
    }

    fn param_mut(&mut self, control: Control) -> &mut Param {
        match control {
            Control::Gain(g) => &mut self.voice_mut(g).gain,
            Control::Frequency(g) => &mut self.voice_mut(g).frequency,
            Control::BusGain(Bus::Planar) => &mut self.planar_gain,
            Control::BusGain(Bus::Spatial) => &mut self.spatial_gain,
            Control::Azimuth => &mut self.azimuth,
            Control::Elevation => &mut self.elevation,
            Control::Position(axis) => &mut self.position[axis.index()],
        }
    }

    /// Render interleaved stereo frames into `out`
    pub fn render(&mut self, out: &mut [f32]) {
        let dt = 1.0 / self.sample_rate;

        for frame in out.chunks_exact_mut(2) {
            let dry = self.tone.next(dt)
                + self.x_tick.next(dt)
                + self.y_tick.next(dt)
                + self.zero_tick.next(dt);
            let noise = self.noise.next(dt);

            let (left, right) = match self.output {
                Bus::Planar => {
                    let gain = self.planar_gain.advance(dt);
                    let azimuth = self.azimuth.advance(dt);
                    let elevation = self.elevation.advance(dt);
                    self.panner.set_direction(azimuth, elevation);
                    let (l, r) = self.panner.process(dry);
                    (l * gain, r * gain)
                }
                Bus::Spatial => {
                    let gain = self.spatial_gain.advance(dt);
                    let position = [
                        self.position[0].advance(dt),
                        self.position[1].advance(dt),
                        self.position[2].advance(dt),
                    ];
                    self.spatializer.set_position(position);
                    let (l, r) = self.spatializer.process(dry + noise);
                    (l * gain, r * gain)
                }
            };

            frame[0] = left as f32;
            frame[1] = right as f32;
        }
    }
}

impl ParamSink for SynthGraph {
    fn set(&mut self, control: Control, value: f64) {
        self.param_mut(control).set(value);
    }

    fn ramp(&mut self, control: Control, seconds: f64, target: f64) {
        self.param_mut(control).ramp_to(seconds, target);
    }

    fn reset(&mut self, generator: Generator) {
        self.voice_mut(generator).osc.reset();
    }
}
