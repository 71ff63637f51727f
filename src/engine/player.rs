//! Real-time audio playback using cpal

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::synth::{Server, CHANNELS};

/// Smallest scratch buffer the output callback renders through
const MIN_SCRATCH_FRAMES: u32 = 1024;

/// Real-time audio player
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start pulling audio from the server on the default output device.
    ///
    /// Asks for a fixed buffer of `buffer_frames` and falls back to the
    /// device's default buffering if that is refused.
    pub fn start(&mut self, server: Arc<Mutex<Server>>, buffer_frames: u32) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No output device available"))?;

        let default = device
            .default_output_config()
            .context("failed to query output config")?;
        let sample_format = default.sample_format();
        let sample_rate = server
            .lock()
            .map_err(|_| anyhow!("audio server lock poisoned"))?
            .sample_rate();

        let mut stream_config = StreamConfig {
            channels: default.channels(),
            sample_rate: SampleRate(sample_rate),
            buffer_size: BufferSize::Fixed(buffer_frames),
        };

        self.running.store(true, Ordering::SeqCst);
        let scratch_frames = buffer_frames.max(MIN_SCRATCH_FRAMES) as usize;
        let stream = match self.build(sample_format, &device, &stream_config, server.clone(), scratch_frames) {
            Ok(stream) => stream,
            Err(err) => {
                warn!("fixed buffer of {} frames refused ({}), using device default", buffer_frames, err);
                stream_config.buffer_size = BufferSize::Default;
                self.build(sample_format, &device, &stream_config, server, scratch_frames)?
            }
        };

        stream.play().context("failed to start output stream")?;
        let name = device.name().unwrap_or_default();
        info!(
            device = %name,
            sample_rate,
            channels = stream_config.channels,
            "playing"
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn build(
        &self,
        sample_format: SampleFormat,
        device: &Device,
        config: &StreamConfig,
        server: Arc<Mutex<Server>>,
        scratch_frames: usize,
    ) -> Result<Stream> {
        let running = self.running.clone();
        match sample_format {
            SampleFormat::F32 => build_stream::<f32>(device, config, server, running, scratch_frames),
            SampleFormat::I16 => build_stream::<i16>(device, config, server, running, scratch_frames),
            SampleFormat::U16 => build_stream::<u16>(device, config, server, running, scratch_frames),
            _ => Err(anyhow!("Unsupported sample format")),
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    server: Arc<Mutex<Server>>,
    running: Arc<AtomicBool>,
    scratch_frames: usize,
) -> Result<Stream> {
    let channels = config.channels as usize;
    let mut stereo = vec![0.0f32; scratch_frames * CHANNELS];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let guard = if running.load(Ordering::SeqCst) {
                // Contended: play silence rather than block
                server.try_lock().ok()
            } else {
                None
            };
            match guard {
                Some(mut server) => render(data, channels, &mut stereo, |buf| server.fill(buf)),
                None => render(data, channels, &mut stereo, |buf| buf.fill(0.0)),
            }
        },
        |err| {
            warn!("audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

/// Fill a device buffer through a fixed stereo scratch buffer, a chunk at a
/// time, so the callback never allocates however large `data` is
fn render<T, F>(data: &mut [T], channels: usize, scratch: &mut [f32], mut source: F)
where
    T: cpal::Sample + cpal::FromSample<f32>,
    F: FnMut(&mut [f32]),
{
    let chunk_frames = scratch.len() / CHANNELS;
    if channels == 0 || chunk_frames == 0 {
        return;
    }
    for chunk in data.chunks_mut(chunk_frames * channels) {
        let frames = chunk.len() / channels;
        let stereo = &mut scratch[..frames * CHANNELS];
        source(stereo);
        for (frame, pair) in chunk.chunks_mut(channels).zip(stereo.chunks_exact(CHANNELS)) {
            write_frame(frame, pair[0], pair[1]);
        }
    }
}

/// Map a stereo frame onto a device frame of any width
fn write_frame<T: cpal::Sample + cpal::FromSample<f32>>(frame: &mut [T], left: f32, right: f32) {
    match frame.len() {
        0 => {}
        1 => frame[0] = T::from_sample((left + right) * 0.5),
        _ => {
            frame[0] = T::from_sample(left);
            frame[1] = T::from_sample(right);
            for extra in frame[2..].iter_mut() {
                *extra = T::from_sample(0.0f32);
            }
        }
    }
}
