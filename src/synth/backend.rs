//! The control surface the sonification engine drives
//!
//! Everything the engine does to the audio graph goes through `ParamSink`:
//! immediate sets, chained linear ramps, and phase resets. `SynthGraph`
//! implements it for real audio; tests implement it to record calls.

/// A sound generator in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generator {
    /// The continuous tone that follows y
    Tone,
    /// Low-level noise bed that helps binaural localization
    Noise,
    XTick,
    YTick,
    ZeroTick,
}

/// One of the two output buses; only the active one reaches the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bus {
    /// Equal-power stereo panner
    Planar,
    /// Binaural spatializer
    Spatial,
}

/// Axis of the 3-D source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// An automatable control in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Gain(Generator),
    Frequency(Generator),
    BusGain(Bus),
    /// Planar panner azimuth in degrees
    Azimuth,
    /// Planar panner elevation in degrees
    Elevation,
    /// Spatial source position
    Position(Axis),
}

/// Receiver of parameter changes from the engine
pub trait ParamSink {
    /// Set a control immediately, cancelling pending ramps on it
    fn set(&mut self, control: Control, value: f64);

    /// Queue a linear ramp to `target` over `seconds`, after any ramps
    /// already queued on the same control
    fn ramp(&mut self, control: Control, seconds: f64, target: f64);

    /// Restart a generator's cycle from phase zero
    fn reset(&mut self, generator: Generator);
}
