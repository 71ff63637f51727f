//! audiograph - hear graphs of mathematical functions
//!
//! Sweeps a function y = f(x) across a time window and plays it: pitch
//! follows y, stereo or 3-D position follows x, and short ticks mark grid
//! lines and zero crossings. An accessibility tool for exploring curves
//! by ear.

pub mod config;
pub mod engine;
pub mod expr;
pub mod mapping;
pub mod shell;
pub mod synth;

pub use config::AudiographConfig;
pub use engine::{SonificationEngine, Sonifier};
pub use expr::Expression;
