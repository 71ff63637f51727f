//! Synthesis backend
//!
//! Oscillators, automatable parameters, panners, the node graph, and the
//! block scheduler that calls the sonification engine once per block.

mod backend;
mod filter;
mod graph;
mod oscillator;
mod panner;
mod param;
mod server;

pub use backend::{Axis, Bus, Control, Generator, ParamSink};
pub use filter::LowPass;
pub use graph::{GraphLayout, SynthGraph, VoiceLayout};
pub use oscillator::{Oscillator, Waveform};
pub use panner::{direction_to, lateral, AmplitudePanner, Direction, Spatializer};
pub use param::Param;
pub use server::{BlockCallback, BlockControl, Server, CHANNELS};
