//! Block scheduler
//!
//! The `Server` renders the graph in fixed-size blocks. Before each block it
//! hands the registered callback the elapsed playback time so the callback
//! can update controls; the callback can ask to be detached.

use super::graph::SynthGraph;
use tracing::debug;

/// Output channel count of every server
pub const CHANNELS: usize = 2;

/// What the callback wants after a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockControl {
    Continue,
    Detach,
}

/// Per-block hook, called on the audio thread
pub trait BlockCallback: Send {
    fn on_block(&mut self, graph: &mut SynthGraph, time: f64) -> BlockControl;
}

/// Renders a `SynthGraph` block by block
pub struct Server {
    sample_rate: u32,
    block_size: usize,
    graph: SynthGraph,
    callback: Option<Box<dyn BlockCallback>>,
    blocks_rendered: u64,
    detached_at: Option<f64>,
    /// Interleaved stereo scratch for the current block
    block: Vec<f32>,
    /// Read position in `block` for `fill`
    cursor: usize,
}

impl Server {
    pub fn new(sample_rate: u32, block_size: usize, graph: SynthGraph) -> Self {
        let block = vec![0.0; block_size * CHANNELS];
        Self {
            sample_rate,
            block_size,
            graph,
            callback: None,
            blocks_rendered: 0,
            detached_at: None,
            cursor: block.len(),
            block,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Duration of one block in seconds
    pub fn block_duration(&self) -> f64 {
        self.block_size as f64 / self.sample_rate as f64
    }

    /// Seconds of audio rendered so far
    pub fn time(&self) -> f64 {
        self.blocks_rendered as f64 * self.block_duration()
    }

    pub fn graph(&self) -> &SynthGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut SynthGraph {
        &mut self.graph
    }

    /// Register (or with `None`, remove) the block callback
    pub fn set_block_callback(&mut self, callback: Option<Box<dyn BlockCallback>>) {
        if callback.is_none() && self.callback.is_some() {
            self.detached_at = Some(self.time());
        }
        self.callback = callback;
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Playback time at which the callback was detached, if it has been
    pub fn detached_at(&self) -> Option<f64> {
        self.detached_at
    }

    /// Run the callback and render one block; returns the interleaved frames
    pub fn render_block(&mut self) -> &[f32] {
        let time = self.time();
        if let Some(callback) = self.callback.as_mut() {
            if callback.on_block(&mut self.graph, time) == BlockControl::Detach {
                debug!(time, "block callback detached");
                self.callback = None;
                self.detached_at = Some(time);
            }
        }
        self.graph.render(&mut self.block);
        self.blocks_rendered += 1;
        self.cursor = self.block.len();
        &self.block
    }

    /// Fill an interleaved stereo buffer of any length, rendering blocks as needed
    pub fn fill(&mut self, out: &mut [f32]) {
        let mut written = 0;
        while written < out.len() {
            if self.cursor >= self.block.len() {
                self.render_block();
                self.cursor = 0;
            }
            let n = (out.len() - written).min(self.block.len() - self.cursor);
            out[written..written + n].copy_from_slice(&self.block[self.cursor..self.cursor + n]);
            written += n;
            self.cursor += n;
        }
    }
}
