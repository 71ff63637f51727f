//! Audio engine for audiograph
//!
//! `Sonifier` owns one synth server with a `SonificationEngine` attached and
//! sends its output either to the sound card or to a WAV file.

mod player;
mod recorder;
mod sonification;

pub use player::Player;
pub use recorder::Recorder;
pub use sonification::{bus_for, GraphFn, RunState, SonificationEngine};

use crate::config::{AudioSettings, ConfigError, MappingConfig, TickVoice, VoicePreset};
use crate::synth::{GraphLayout, Server, SynthGraph, VoiceLayout, Waveform, CHANNELS};
use anyhow::{anyhow, bail, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Build the synth graph voicing from a preset
pub fn graph_layout(preset: &VoicePreset) -> GraphLayout {
    let tick = |voice: &TickVoice| VoiceLayout {
        waveform: voice.waveform,
        frequency: voice.frequency.unwrap_or(preset.start_frequency),
        gain: 0.0,
    };
    GraphLayout {
        tone: VoiceLayout {
            waveform: Waveform::Triangle,
            frequency: preset.start_frequency,
            gain: preset.main_volume,
        },
        noise_gain: preset.noise_level,
        x_tick: tick(&preset.x_tick),
        y_tick: tick(&preset.y_tick),
        zero_tick: tick(&preset.zero_tick),
        listener: [0.0, 0.0, preset.listener_offset],
    }
}

/// One sonification run and its audio output
pub struct Sonifier {
    server: Arc<Mutex<Server>>,
    audio: AudioSettings,
    duration: f64,
    terminal_fade: f64,
    player: Option<Player>,
    shut_down: bool,
}

impl Sonifier {
    /// Build the graph and attach a fresh engine for `function`
    pub fn new(
        function: GraphFn,
        mapping: MappingConfig,
        preset: &VoicePreset,
        audio: &AudioSettings,
    ) -> Result<Self, ConfigError> {
        let engine = SonificationEngine::new(function, mapping, preset, audio.block_duration())?;
        let graph = SynthGraph::new(
            audio.sample_rate as f64,
            engine.bus(),
            &graph_layout(preset),
        );
        let mut server = Server::new(audio.sample_rate, audio.block_size, graph);
        server.set_block_callback(Some(Box::new(engine)));

        debug!(
            duration = mapping.duration,
            mode = ?mapping.spatial_mode,
            "sonifier created"
        );

        Ok(Self {
            server: Arc::new(Mutex::new(server)),
            audio: audio.clone(),
            duration: mapping.duration,
            terminal_fade: preset.terminal_fade,
            player: None,
            shut_down: false,
        })
    }

    /// Shared handle to the server, for inspection
    pub fn server(&self) -> Arc<Mutex<Server>> {
        self.server.clone()
    }

    /// Start playing on the default output device
    pub fn to_device(&mut self) -> Result<()> {
        if self.shut_down {
            bail!("sonifier has been shut down");
        }
        let buffer_frames = (self.audio.block_size * self.audio.mixahead) as u32;
        let mut player = Player::new();
        if let Err(err) = player.start(self.server.clone(), buffer_frames) {
            self.shutdown();
            return Err(err.context("failed to start audio output"));
        }
        self.player = Some(player);
        Ok(())
    }

    /// Render the whole run plus the trailing margin to a stereo WAV file
    pub fn to_file(&mut self, path: &Path) -> Result<()> {
        if self.shut_down {
            bail!("sonifier has been shut down");
        }
        match self.render(path) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.shutdown();
                Err(err.context(format!("failed to render {:?}", path)))
            }
        }
    }

    fn render(&mut self, path: &Path) -> Result<()> {
        let seconds = self.duration + self.audio.tail;
        let total_frames = (seconds * self.audio.sample_rate as f64).round() as u64;
        let mut recorder = Recorder::new(path, self.audio.sample_rate)?;

        {
            let mut server = self.lock()?;
            while recorder.frames_written() < total_frames {
                let remaining = (total_frames - recorder.frames_written()) as usize;
                let block = server.render_block();
                let take = block.len().min(remaining * CHANNELS);
                recorder.write_frames(&block[..take])?;
            }
        }

        info!(path = %path.display(), seconds, "rendered");
        recorder.finalize()
    }

    /// Stop output and detach the engine. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        if let Some(mut player) = self.player.take() {
            player.stop();
        }
        let mut server = match self.server.lock() {
            Ok(server) => server,
            Err(poisoned) => poisoned.into_inner(),
        };
        server.set_block_callback(None);
        server.graph_mut().silence();
        debug!(time = server.time(), "sonifier shut down");
    }

    /// True once shut down, or once the run and its terminal fade have played
    pub fn is_finished(&self) -> bool {
        if self.shut_down {
            return true;
        }
        match self.server.lock() {
            Ok(server) => match server.detached_at() {
                Some(at) => server.time() >= at + self.terminal_fade,
                None => false,
            },
            Err(_) => true,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Server>> {
        self.server
            .lock()
            .map_err(|_| anyhow!("audio server lock poisoned"))
    }
}

impl Drop for Sonifier {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpatialMode;
    use crate::synth::{Bus, Control, Generator};
    use tempfile::tempdir;

    fn sonifier(mapping: MappingConfig) -> Sonifier {
        Sonifier::new(
            Box::new(|x| x),
            mapping,
            &VoicePreset::default(),
            &AudioSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_layout_from_preset() {
        let layout = graph_layout(&VoicePreset::default());
        assert_eq!(layout.tone.waveform, Waveform::Triangle);
        assert_eq!(layout.tone.frequency, 130.8);
        assert_eq!(layout.tone.gain, 0.3);
        assert_eq!(layout.x_tick.frequency, 115.0);
        assert_eq!(layout.y_tick.frequency, 130.8);
        assert_eq!(layout.zero_tick.gain, 0.0);
        assert_eq!(layout.listener, [0.0, 0.0, 0.2]);
    }

    #[test]
    fn test_invalid_mapping_rejected() {
        let result = Sonifier::new(
            Box::new(|x| x),
            MappingConfig::new((1.0, 0.0), (0.0, 1.0), 5.0),
            &VoicePreset::default(),
            &AudioSettings::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("identity.wav");
        let mut s = sonifier(MappingConfig::new((0.0, 10.0), (0.0, 10.0), 1.0));
        s.to_file(&path).unwrap();
        assert!(s.is_finished());

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 44100);
        // 1 s run plus 0.5 s tail
        assert_eq!(reader.duration(), 66150);

        let samples: Vec<f32> = reader.into_samples().map(|s| s.unwrap()).collect();
        let peak = |range: std::ops::Range<usize>| {
            samples[range].iter().fold(0.0f32, |m, s| m.max(s.abs()))
        };
        // Audible during the run, silent after the terminal fade
        assert!(peak(0..44100) > 0.05);
        assert!(peak(2 * 60000..samples.len()) < 1e-6);
    }

    #[test]
    fn test_render_sweeps_left_to_right() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sweep.wav");
        let mut s = sonifier(MappingConfig::new((0.0, 10.0), (0.0, 10.0), 2.0));
        s.to_file(&path).unwrap();

        let samples: Vec<f32> = hound::WavReader::open(&path)
            .unwrap()
            .into_samples()
            .map(|s| s.unwrap())
            .collect();
        let energy = |frames: std::ops::Range<usize>, channel: usize| -> f32 {
            frames.map(|f| samples[2 * f + channel].powi(2)).sum()
        };
        let early = 0..4410;
        let late = 80000..84410;
        assert!(energy(early.clone(), 0) > energy(early, 1));
        assert!(energy(late.clone(), 1) > energy(late, 0));
    }

    #[test]
    fn test_spatial_render_uses_spatial_bus() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hrtf.wav");
        let mapping = MappingConfig::new((0.0, 10.0), (0.0, 10.0), 1.0)
            .with_spatial_mode(SpatialMode::Spatial3D);
        let mut s = sonifier(mapping);
        assert_eq!(s.server().lock().unwrap().graph().output_bus(), Bus::Spatial);
        s.to_file(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<f32> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert!(samples[..44100].iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_shutdown_twice() {
        let mut s = sonifier(MappingConfig::new((0.0, 10.0), (0.0, 10.0), 5.0));
        let server = s.server();
        server.lock().unwrap().render_block();

        s.shutdown();
        let detached = server.lock().unwrap().detached_at();
        assert!(detached.is_some());
        s.shutdown();
        assert!(s.is_finished());

        let server = server.lock().unwrap();
        assert!(!server.has_callback());
        assert_eq!(server.detached_at(), detached);
        assert_eq!(server.graph().pending_ramps(Control::BusGain(Bus::Planar)), 0);
        assert_eq!(server.graph().value(Control::Gain(Generator::Tone)), 0.0);
    }

    #[test]
    fn test_not_finished_until_fade_played() {
        let s = sonifier(MappingConfig::new((0.0, 10.0), (0.0, 10.0), 1.0));
        let server = s.server();
        let blocks_in_run = (1.0 / AudioSettings::default().block_duration()).ceil() as usize;
        for _ in 0..=blocks_in_run {
            server.lock().unwrap().render_block();
        }
        assert!(server.lock().unwrap().detached_at().is_some());
        assert!(!s.is_finished());

        for _ in 0..100 {
            server.lock().unwrap().render_block();
        }
        assert!(s.is_finished());
    }

    #[test]
    fn test_cannot_reuse_after_shutdown() {
        let dir = tempdir().unwrap();
        let mut s = sonifier(MappingConfig::new((0.0, 10.0), (0.0, 10.0), 1.0));
        s.shutdown();
        assert!(s.to_file(&dir.path().join("late.wav")).is_err());
    }
}
