//! WAV file recorder
//!
//! Writes interleaved stereo float frames.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::synth::CHANNELS;

/// Stereo WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    frames_written: u64,
}

impl Recorder {
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: CHANNELS as u16,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            frames_written: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stereo frames written so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames_written as f64 / self.sample_rate as f64
    }

    /// Write interleaved stereo frames; a trailing odd sample is ignored
    pub fn write_frames(&mut self, interleaved: &[f32]) -> Result<()> {
        for frame in interleaved.chunks_exact(CHANNELS) {
            for &sample in frame {
                self.writer
                    .write_sample(sample)
                    .context("failed to write sample")?;
            }
            self.frames_written += 1;
        }
        Ok(())
    }

    /// Flush and write the header. Without this the file is truncated.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}
