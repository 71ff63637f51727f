//! The per-block sonification update
//!
//! Once per audio block the engine turns elapsed time into a point on the
//! graph and drives the synth: pitch from y, placement from time and y,
//! percussive ticks on grid and zero crossings, and fades whenever y leaves
//! the visible range.

use crate::config::{ConfigError, MappingConfig, SpatialMode, TickVoice, VoicePreset};
use crate::mapping::{
    FadeController, FadeTransition, FrequencyMapper, Mapper, Placement, SamplePoint, Sign,
    SpatialMapper, TickDetector, TickKind, SEMITONE,
};
use crate::synth::{Axis, BlockCallback, BlockControl, Bus, Control, Generator, ParamSink, SynthGraph};

/// The graphed function, `y = f(x)`
pub type GraphFn = Box<dyn Fn(f64) -> f64 + Send>;

/// Mutable state of one run
#[derive(Debug, Clone)]
pub struct RunState {
    fade: FadeController,
    ticks: TickDetector,
    finished: bool,
}

impl RunState {
    /// Last audible sample point
    pub fn prev(&self) -> SamplePoint {
        self.ticks.last()
    }

    pub fn prev_sign(&self) -> Sign {
        self.ticks.last_sign()
    }

    pub fn is_faded(&self) -> bool {
        self.fade.is_faded()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Drives a `ParamSink` from a function and its mapping, one block at a time
pub struct SonificationEngine {
    function: GraphFn,
    mapping: MappingConfig,
    frequency: FrequencyMapper,
    spatial: SpatialMapper,
    bus: Bus,
    x_tick: TickVoice,
    y_tick: TickVoice,
    zero_tick: TickVoice,
    terminal_fade: f64,
    /// Length of the in-run fade ramps: half a block
    fade_time: f64,
    state: RunState,
}

impl SonificationEngine {
    /// Rejects an invalid mapping; samples `f(min_x)` to seed the tick history
    pub fn new(
        function: GraphFn,
        mapping: MappingConfig,
        preset: &VoicePreset,
        block_duration: f64,
    ) -> Result<Self, ConfigError> {
        mapping.validate()?;
        if !(block_duration > 0.0 && block_duration.is_finite()) {
            return Err(ConfigError::NonFinite {
                what: "block duration",
            });
        }

        let origin = SamplePoint {
            x: mapping.min_x,
            y: function(mapping.min_x),
        };
        let state = RunState {
            fade: FadeController::new(mapping.min_y, mapping.max_y),
            ticks: TickDetector::new(mapping.x_ticks, mapping.y_ticks, mapping.zero_ticks, origin),
            finished: false,
        };

        Ok(Self {
            frequency: FrequencyMapper::new(
                mapping.min_y,
                mapping.max_y,
                preset.start_frequency,
                preset.semitone_range,
            ),
            spatial: SpatialMapper::new(mapping.spatial_mode, mapping.min_y, mapping.max_y, preset),
            bus: bus_for(mapping.spatial_mode),
            x_tick: preset.x_tick,
            y_tick: preset.y_tick,
            zero_tick: preset.zero_tick,
            terminal_fade: preset.terminal_fade,
            fade_time: block_duration / 2.0,
            function,
            mapping,
            state,
        })
    }

    pub fn mapping(&self) -> &MappingConfig {
        &self.mapping
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// The bus whose gain the fades act on
    pub fn bus(&self) -> Bus {
        self.bus
    }

    /// Update the sink for the block starting at `time` seconds.
    ///
    /// Returns `Detach` on the block that reaches the end of the run and on
    /// every call after it; those later calls touch nothing.
    pub fn on_block<P: ParamSink + ?Sized>(&mut self, sink: &mut P, time: f64) -> BlockControl {
        if self.state.finished {
            return BlockControl::Detach;
        }

        let mut normalized_time = time / self.mapping.duration;
        let terminating = normalized_time >= 1.0;
        if terminating {
            self.state.finished = true;
            normalized_time = 1.0;
        }

        self.update(sink, normalized_time);

        if terminating {
            // Queued last so no fade-in from this block can follow it.
            sink.ramp(Control::BusGain(self.bus), self.terminal_fade, 0.0);
            BlockControl::Detach
        } else {
            BlockControl::Continue
        }
    }

    fn update<P: ParamSink + ?Sized>(&mut self, sink: &mut P, normalized_time: f64) {
        let x = self.mapping.min_x + normalized_time * (self.mapping.max_x - self.mapping.min_x);
        let y = (self.function)(x);

        match self.state.fade.update(y) {
            Some(FadeTransition::FadeOut) => {
                sink.ramp(Control::BusGain(self.bus), self.fade_time, 0.0);
                return;
            }
            Some(FadeTransition::FadeIn) => {
                sink.ramp(Control::BusGain(self.bus), self.fade_time, 1.0);
            }
            None if self.state.fade.is_faded() => return,
            None => {}
        }

        let main_frequency = self.frequency.map(y);
        sink.set(Control::Frequency(Generator::Tone), main_frequency);

        match self.spatial.place(normalized_time, y) {
            Placement::Planar { azimuth, elevation } => {
                sink.set(Control::Azimuth, azimuth);
                sink.set(Control::Elevation, elevation);
            }
            Placement::Spatial { position } => {
                for axis in Axis::ALL {
                    sink.set(Control::Position(axis), position[axis.index()]);
                }
            }
        }

        let ticks = self.state.ticks.observe(SamplePoint { x, y }, main_frequency);
        for tick in ticks.iter() {
            let (generator, voice) = match tick.kind {
                TickKind::XGrid => (Generator::XTick, &self.x_tick),
                TickKind::YGrid => (Generator::YTick, &self.y_tick),
                TickKind::ZeroCross => (Generator::ZeroTick, &self.zero_tick),
            };
            strike(sink, generator, voice, tick.frequency_hint);
        }
    }
}

/// Restart a tick generator's percussive envelope
fn strike<P: ParamSink + ?Sized>(sink: &mut P, generator: Generator, voice: &TickVoice, main_frequency: f64) {
    let pitch = voice.frequency.unwrap_or(main_frequency);
    sink.set(Control::Gain(generator), 0.0);
    sink.reset(generator);
    sink.set(Control::Frequency(generator), pitch);
    sink.ramp(Control::Gain(generator), voice.attack, voice.peak);
    sink.ramp(Control::Gain(generator), voice.decay, 0.0);
    if let Some(glide) = voice.glide {
        sink.ramp(Control::Frequency(generator), glide, pitch * SEMITONE);
    }
}

/// The output bus used by a spatial mode
pub fn bus_for(mode: SpatialMode) -> Bus {
    match mode {
        SpatialMode::Planar => Bus::Planar,
        SpatialMode::Spatial3D => Bus::Spatial,
    }
}

impl BlockCallback for SonificationEngine {
    fn on_block(&mut self, graph: &mut SynthGraph, time: f64) -> BlockControl {
        SonificationEngine::on_block(self, graph, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: f64 = 128.0 / 44100.0;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        Set(Control, f64),
        Ramp(Control, f64, f64),
        Reset(Generator),
    }

    /// Records every call instead of producing audio
    #[derive(Debug, Default)]
    struct RecordingSink {
        calls: Vec<Call>,
    }

    impl RecordingSink {
        fn resets(&self, generator: Generator) -> usize {
            self.calls
                .iter()
                .filter(|c| **c == Call::Reset(generator))
                .count()
        }

        fn ramps_on(&self, control: Control) -> Vec<(f64, f64)> {
            self.calls
                .iter()
                .filter_map(|c| match *c {
                    Call::Ramp(ctl, seconds, target) if ctl == control => Some((seconds, target)),
                    _ => None,
                })
                .collect()
        }

        fn sets_on(&self, control: Control) -> Vec<f64> {
            self.calls
                .iter()
                .filter_map(|c| match *c {
                    Call::Set(ctl, value) if ctl == control => Some(value),
                    _ => None,
                })
                .collect()
        }
    }

    impl ParamSink for RecordingSink {
        fn set(&mut self, control: Control, value: f64) {
            self.calls.push(Call::Set(control, value));
        }

        fn ramp(&mut self, control: Control, seconds: f64, target: f64) {
            self.calls.push(Call::Ramp(control, seconds, target));
        }

        fn reset(&mut self, generator: Generator) {
            self.calls.push(Call::Reset(generator));
        }
    }

    fn engine(function: impl Fn(f64) -> f64 + Send + 'static, mapping: MappingConfig) -> SonificationEngine {
        SonificationEngine::new(Box::new(function), mapping, &VoicePreset::default(), BLOCK).unwrap()
    }

    /// x runs over [0, 10] in 10 seconds, so x equals t
    fn unit_time(y: (f64, f64)) -> MappingConfig {
        MappingConfig::new((0.0, 10.0), y, 10.0)
    }

    const BUS: Control = Control::BusGain(Bus::Planar);

    #[test]
    fn test_initial_state() {
        let e = engine(|x| x - 2.0, MappingConfig::new((-1.0, 4.0), (-5.0, 5.0), 5.0));
        assert_eq!(e.state().prev(), SamplePoint { x: -1.0, y: -3.0 });
        assert_eq!(e.state().prev_sign(), Sign::Negative);
        assert!(!e.state().is_faded());
        assert!(!e.state().is_finished());
    }

    #[test]
    fn test_invalid_mapping_rejected() {
        let result = SonificationEngine::new(
            Box::new(|x| x),
            MappingConfig::new((0.0, 10.0), (0.0, 10.0), 0.0),
            &VoicePreset::default(),
            BLOCK,
        );
        assert!(matches!(result, Err(ConfigError::NonPositiveDuration(_))));
    }

    #[test]
    fn test_fade_hysteresis_holds_history() {
        let mut e = engine(|x| x, unit_time((0.0, 5.0)));
        let mut sink = RecordingSink::default();

        e.on_block(&mut sink, 4.0);
        for t in [6.0, 7.0, 8.0, 9.0] {
            e.on_block(&mut sink, t);
        }
        assert!(e.state().is_faded());
        assert_eq!(e.state().prev(), SamplePoint { x: 4.0, y: 4.0 });
        assert_eq!(sink.ramps_on(BUS), vec![(BLOCK / 2.0, 0.0)]);

        assert_eq!(sink.sets_on(Control::Frequency(Generator::Tone)).len(), 1);
    }

    #[test]
    fn test_fade_in_resumes_same_block() {
        let mut e = engine(|x| if (5.0..8.0).contains(&x) { 100.0 } else { x }, unit_time((0.0, 10.0)));
        let mut sink = RecordingSink::default();
        e.on_block(&mut sink, 6.0);
        e.on_block(&mut sink, 7.0);
        assert_eq!(sink.ramps_on(BUS), vec![(BLOCK / 2.0, 0.0)]);
        sink.calls.clear();

        e.on_block(&mut sink, 9.0);
        assert_eq!(sink.ramps_on(BUS), vec![(BLOCK / 2.0, 1.0)]);
        assert_eq!(sink.sets_on(Control::Frequency(Generator::Tone)).len(), 1);
        assert_eq!(e.state().prev(), SamplePoint { x: 9.0, y: 9.0 });
        assert!(!e.state().is_faded());
    }

    #[test]
    fn test_x_tick_after_fade_uses_held_history() {
        let mapping = unit_time((0.0, 10.0)).with_x_ticks(Some(1.0));
        let mut e = engine(|x| if (5.0..8.0).contains(&x) { 100.0 } else { x }, mapping);
        let mut sink = RecordingSink::default();
        e.on_block(&mut sink, 4.0);
        sink.calls.clear();

        e.on_block(&mut sink, 6.0);
        e.on_block(&mut sink, 7.0);
        assert!(e.state().is_faded());
        assert_eq!(sink.resets(Generator::XTick), 0);
        sink.calls.clear();

        // Cells 4 and 9 differ, so the fade-in block ticks once
        e.on_block(&mut sink, 9.0);
        assert!(!e.state().is_faded());
        assert_eq!(sink.resets(Generator::XTick), 1);
    }

    #[test]
    fn test_non_finite_y_fades_out() {
        let mut e = engine(|x| if x > 1.0 { f64::NAN } else { x }, unit_time((0.0, 10.0)));
        let mut sink = RecordingSink::default();
        e.on_block(&mut sink, 0.5);
        e.on_block(&mut sink, 2.0);
        assert!(e.state().is_faded());
        assert_eq!(e.state().prev(), SamplePoint { x: 0.5, y: 0.5 });
        assert_eq!(sink.ramps_on(BUS).len(), 1);
    }

    #[test]
    fn test_x_grid_ticks() {
        let mut e = engine(|_| 1.0, unit_time((0.0, 10.0)).with_x_ticks(Some(1.0)));
        let mut sink = RecordingSink::default();
        for t in [0.4, 0.9, 1.1, 1.6, 2.2] {
            e.on_block(&mut sink, t);
        }
        assert_eq!(sink.resets(Generator::XTick), 2);
        assert_eq!(sink.resets(Generator::YTick), 0);
    }

    #[test]
    fn test_x_tick_envelope() {
        let mut e = engine(|_| 1.0, unit_time((0.0, 10.0)).with_x_ticks(Some(1.0)));
        let mut sink = RecordingSink::default();
        e.on_block(&mut sink, 1.5);
        let gen = Generator::XTick;
        let tick: Vec<Call> = sink
            .calls
            .iter()
            .copied()
            .filter(|c| match c {
                Call::Set(ctl, _) | Call::Ramp(ctl, _, _) => {
                    *ctl == Control::Gain(gen) || *ctl == Control::Frequency(gen)
                }
                Call::Reset(g) => *g == gen,
            })
            .collect();
        assert_eq!(
            tick,
            vec![
                Call::Set(Control::Gain(gen), 0.0),
                Call::Reset(gen),
                Call::Set(Control::Frequency(gen), 115.0),
                Call::Ramp(Control::Gain(gen), 0.005, 0.5),
                Call::Ramp(Control::Gain(gen), 0.05, 0.0),
            ]
        );
    }

    #[test]
    fn test_y_tick_follows_main_pitch() {
        let mut e = engine(|x| x, unit_time((0.0, 10.0)).with_y_ticks(Some(2.0)));
        let mut sink = RecordingSink::default();
        e.on_block(&mut sink, 2.5);
        let main = sink.sets_on(Control::Frequency(Generator::Tone))[0];
        assert_eq!(sink.resets(Generator::YTick), 1);
        assert_eq!(sink.sets_on(Control::Frequency(Generator::YTick)), vec![main]);
    }

    #[test]
    fn test_zero_ticks() {
        // Signs +1 (origin), +1, 0, -1, +1
        let values = [1.0, 1.0, 0.0, -1.0, 1.0];
        let f = move |x: f64| values[(x.round() as usize).min(4)];
        let mut e = engine(f, unit_time((-5.0, 5.0)).with_zero_ticks(true));
        let mut sink = RecordingSink::default();
        for t in [1.0, 2.0, 3.0, 4.0] {
            e.on_block(&mut sink, t);
        }
        assert_eq!(sink.resets(Generator::ZeroTick), 2);
    }

    #[test]
    fn test_zero_tick_glides_one_semitone() {
        let mut e = engine(|x| x - 5.0, unit_time((-5.0, 5.0)).with_zero_ticks(true));
        let mut sink = RecordingSink::default();
        e.on_block(&mut sink, 5.0);
        let main = sink.sets_on(Control::Frequency(Generator::Tone))[0];
        let glide = sink.ramps_on(Control::Frequency(Generator::ZeroTick));
        assert_eq!(glide.len(), 1);
        assert_eq!(glide[0].0, 0.07);
        assert!((glide[0].1 - main * SEMITONE).abs() < 1e-9);
        assert_eq!(
            sink.ramps_on(Control::Gain(Generator::ZeroTick)),
            vec![(0.05, 0.7), (0.1, 0.0)]
        );
    }

    #[test]
    fn test_terminal_fade_scheduled_once() {
        let mut e = engine(|x| x, MappingConfig::new((0.0, 10.0), (0.0, 10.0), 5.0));
        let mut sink = RecordingSink::default();

        assert_eq!(e.on_block(&mut sink, 4.99), BlockControl::Continue);
        assert!(!e.state().is_finished());
        assert_eq!(e.on_block(&mut sink, 5.0), BlockControl::Detach);
        assert!(e.state().is_finished());

        let calls = sink.calls.len();
        for t in [5.003, 5.006, 6.0] {
            assert_eq!(e.on_block(&mut sink, t), BlockControl::Detach);
        }
        assert_eq!(sink.calls.len(), calls);

        let terminal: Vec<_> = sink
            .ramps_on(BUS)
            .into_iter()
            .filter(|r| *r == (0.2, 0.0))
            .collect();
        assert_eq!(terminal.len(), 1);
        assert_eq!(sink.calls.last(), Some(&Call::Ramp(BUS, 0.2, 0.0)));
    }

    #[test]
    fn test_terminal_fade_while_faded() {
        let mut e = engine(|x| if x <= 5.0 { x } else { 100.0 }, unit_time((0.0, 10.0)));
        let mut sink = RecordingSink::default();
        for t in [4.0, 6.0, 7.0] {
            e.on_block(&mut sink, t);
        }
        assert!(e.state().is_faded());
        sink.calls.clear();

        assert_eq!(e.on_block(&mut sink, 10.0), BlockControl::Detach);
        assert!(sink.sets_on(Control::Frequency(Generator::Tone)).is_empty());
        assert_eq!(sink.calls, vec![Call::Ramp(BUS, 0.2, 0.0)]);

        assert_eq!(e.on_block(&mut sink, 10.1), BlockControl::Detach);
        assert_eq!(sink.calls.len(), 1);
    }

    #[test]
    fn test_terminal_block_clamps_to_max_x() {
        let mut e = engine(|x| x, MappingConfig::new((0.0, 10.0), (0.0, 10.0), 5.0));
        let mut sink = RecordingSink::default();

        // Unclamped this would be x = 10.4, outside the y range.
        e.on_block(&mut sink, 5.2);
        assert!(!e.state().is_faded());
        assert!(sink.ramps_on(BUS).iter().all(|r| *r == (0.2, 0.0)));
        assert_eq!(e.state().prev(), SamplePoint { x: 10.0, y: 10.0 });

        let top = FrequencyMapper::new(0.0, 10.0, 130.8, 32.0).top_frequency();
        let set = sink.sets_on(Control::Frequency(Generator::Tone));
        assert!((set[0] - top).abs() < 1e-9);
        assert_eq!(sink.sets_on(Control::Azimuth), vec![90.0]);
    }

    #[test]
    fn test_spatial_mode_drives_position() {
        let mapping = unit_time((0.0, 10.0)).with_spatial_mode(SpatialMode::Spatial3D);
        let mut e = engine(|x| x, mapping);
        assert_eq!(e.bus(), Bus::Spatial);
        let mut sink = RecordingSink::default();
        e.on_block(&mut sink, 7.5);
        assert_eq!(sink.sets_on(Control::Position(Axis::X)), vec![0.25]);
        assert_eq!(sink.sets_on(Control::Position(Axis::Y)), vec![0.25]);
        assert_eq!(sink.sets_on(Control::Position(Axis::Z)), vec![0.0]);
        assert!(sink.sets_on(Control::Azimuth).is_empty());

        e.on_block(&mut sink, 10.0);
        assert_eq!(
            sink.ramps_on(Control::BusGain(Bus::Spatial)),
            vec![(0.2, 0.0)]
        );
    }

    #[test]
    fn test_end_to_end_identity() {
        let mut e = engine(|x| x, MappingConfig::new((0.0, 10.0), (0.0, 10.0), 5.0));
        let mut sink = RecordingSink::default();
        let mut block = 0u64;
        while e.on_block(&mut sink, block as f64 * BLOCK) == BlockControl::Continue {
            block += 1;
        }

        let frequencies = sink.sets_on(Control::Frequency(Generator::Tone));
        assert!(frequencies.windows(2).all(|w| w[1] > w[0]));
        let mapper = FrequencyMapper::new(0.0, 10.0, 130.8, 32.0);
        assert!((frequencies[0] - mapper.start_frequency()).abs() < 1e-9);
        assert!((frequencies[frequencies.len() - 1] - mapper.top_frequency()).abs() < 1e-9);

        let azimuths = sink.sets_on(Control::Azimuth);
        assert_eq!(azimuths[0], -90.0);
        assert_eq!(azimuths[azimuths.len() - 1], 90.0);
        assert!(azimuths.windows(2).all(|w| w[1] > w[0]));

        assert!(sink.ramps_on(BUS).iter().all(|r| *r == (0.2, 0.0)));
        assert!(!e.state().is_faded());
    }
}
