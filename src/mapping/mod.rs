//! Graph-to-audio parameter mapping
//!
//! The pure and small stateful pieces the sonification engine combines each
//! block: pitch from y, placement from time and y, tick detection, and the
//! fade gate.

mod fade;
mod frequency;
mod mapper;
mod normalize;
mod spatial;
mod ticks;

pub use fade::{FadeController, FadeState, FadeTransition};
pub use frequency::{FrequencyMapper, SEMITONE};
pub use mapper::Mapper;
pub use normalize::Normalizer;
pub use spatial::{Placement, SpatialMapper};
pub use ticks::{GridQuantizer, SamplePoint, Sign, TickDetector, TickKind, TickTrigger, Ticks};
