use std::sync::Arc;

use crossbeam_channel::Receiver;

use super::parameters::{ParamSnapshot, ReverbParameters};
use crate::dsp::LinearRamp;
use crate::reverb::ReverbCore;
use crate::transition::{MIN_BPM, TransitionEffect};
use crate::types::{ControlEvent, MeterSnapshot};

/// Block-level reverb processor
/// Runs in real-time audio thread - must be lock-free and allocation-free
/// once prepared
pub struct ReverbEngine {
    core: ReverbCore,
    transition: TransitionEffect,
    parameters: Arc<ReverbParameters>,
    event_rx: Receiver<ControlEvent>,

    max_block: usize,
    wet: [Vec<f32>; 2],
    dry: [Vec<f32>; 2],

    input_gain: LinearRamp,
    output_gain: LinearRamp,
    mix: LinearRamp,

    midi_gate: bool,
    midi_tempo: Option<f32>,
    gate_was_open: bool,

    decay: f32,
    meters: MeterSnapshot,
}

impl ReverbEngine {
    /// Create an engine reading `parameters` and draining `event_rx`
    pub fn new(parameters: Arc<ReverbParameters>, event_rx: Receiver<ControlEvent>) -> Self {
        Self::with_core(ReverbCore::new(), parameters, event_rx)
    }

    pub fn with_core(
        core: ReverbCore,
        parameters: Arc<ReverbParameters>,
        event_rx: Receiver<ControlEvent>,
    ) -> Self {
        Self {
            core,
            transition: TransitionEffect::new(),
            parameters,
            event_rx,
            max_block: 0,
            wet: [Vec::new(), Vec::new()],
            dry: [Vec::new(), Vec::new()],
            input_gain: LinearRamp::new(1.0),
            output_gain: LinearRamp::new(1.0),
            mix: LinearRamp::new(0.0),
            midi_gate: false,
            midi_tempo: None,
            gate_was_open: false,
            decay: 5.0,
            meters: MeterSnapshot::default(),
        }
    }

    /// Allocate all buffers for `sample_rate` and blocks of up to `max_block`
    /// frames
    pub fn prepare(&mut self, sample_rate: f32, max_block: usize) {
        self.max_block = max_block.max(1);
        for buffer in self.wet.iter_mut().chain(&mut self.dry) {
            *buffer = vec![0.0; self.max_block];
        }

        self.core.prepare(sample_rate);
        self.transition.prepare(sample_rate);

        // Start ramps on the current values so the first block doesn't fade in
        let snapshot = self.parameters.snapshot();
        self.input_gain.reset(snapshot.input_gain);
        self.output_gain.reset(snapshot.output_gain);
        self.mix.reset(snapshot.mix);
        self.apply_to_core(&snapshot);
        self.gate_was_open = snapshot.fairing_enabled || self.midi_gate;
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.transition.reset();
        self.meters = MeterSnapshot::default();
    }

    /// Reverb tail length in seconds
    pub fn tail_seconds(&self) -> f32 {
        self.decay
    }

    pub fn transition(&self) -> &TransitionEffect {
        &self.transition
    }

    /// Latest meter state; peaks are the loudest since the previous call
    pub fn take_meters(&mut self) -> MeterSnapshot {
        let meters = self.meters;
        self.meters.input_peak = [0.0; 2];
        self.meters.output_peak = [0.0; 2];
        meters
    }

    /// Process an interleaved buffer in place. Only the first two channels
    /// are touched; mono input is run as stereo and the left result kept.
    pub fn process(&mut self, buffer: &mut [f32], channels: usize) {
        if channels == 0 || self.max_block == 0 {
            return;
        }

        for chunk in buffer.chunks_mut(self.max_block * channels) {
            self.process_block(chunk, channels);
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                ControlEvent::Gate { on } => self.midi_gate = on,
                ControlEvent::Tempo { bpm } => self.midi_tempo = bpm,
            }
        }
    }

    fn apply_to_core(&mut self, snapshot: &ParamSnapshot) {
        self.decay = snapshot.decay;
        self.core.set_decay(snapshot.decay);
        self.core.set_pre_delay(snapshot.pre_delay_ms);
        self.core.set_high_cut(snapshot.high_cut_hz);
        self.core.set_low_cut(snapshot.low_cut_hz);
        self.core.set_width(snapshot.width);
        self.core.set_thrust(snapshot.thrust);
        self.core.set_chaos(snapshot.chaos);
    }

    fn process_block(&mut self, block: &mut [f32], channels: usize) {
        let frames = block.len() / channels;
        if frames == 0 {
            return;
        }

        self.drain_events();
        let snapshot = self.parameters.snapshot();

        // De-interleave with input gain, duplicating mono
        self.input_gain.set_target(snapshot.input_gain, frames);
        let mut input_peak = [0.0f32; 2];
        for (n, frame) in block.chunks_exact(channels).enumerate() {
            let gain = self.input_gain.next();
            let left = frame[0] * gain;
            let right = if channels > 1 { frame[1] * gain } else { left };

            self.wet[0][n] = left;
            self.wet[1][n] = right;
            input_peak[0] = input_peak[0].max(left.abs());
            input_peak[1] = input_peak[1].max(right.abs());
        }
        for (dry, wet) in self.dry.iter_mut().zip(&self.wet) {
            dry[..frames].copy_from_slice(&wet[..frames]);
        }

        self.apply_to_core(&snapshot);
        let [wet_left, wet_right] = &mut self.wet;
        self.core
            .process(&mut wet_left[..frames], &mut wet_right[..frames]);

        // Transition fires on the rising edge of either gate
        let gate_open = snapshot.fairing_enabled || self.midi_gate;
        if gate_open && !self.gate_was_open {
            let bpm = self.midi_tempo.unwrap_or(snapshot.tempo);
            self.transition.set_bpm(bpm.max(MIN_BPM));
            self.transition.set_sync_beats(snapshot.sync_beats);
            self.transition.trigger();
        }
        self.gate_was_open = gate_open;

        self.transition
            .process(&mut wet_left[..frames], &mut wet_right[..frames]);

        // Dry/wet and output gain, then back to interleaved
        self.mix.set_target(snapshot.mix, frames);
        self.output_gain.set_target(snapshot.output_gain, frames);
        let mut output_peak = [0.0f32; 2];
        for (n, frame) in block.chunks_exact_mut(channels).enumerate() {
            let mix = self.mix.next();
            let gain = self.output_gain.next();

            let left = (self.dry[0][n] * (1.0 - mix) + wet_left[n] * mix) * gain;
            let right = (self.dry[1][n] * (1.0 - mix) + wet_right[n] * mix) * gain;

            frame[0] = left;
            output_peak[0] = output_peak[0].max(left.abs());
            if channels > 1 {
                frame[1] = right;
                output_peak[1] = output_peak[1].max(right.abs());
            } else {
                output_peak[1] = output_peak[0];
            }
        }

        self.meters = self.meters.merge(MeterSnapshot {
            decay_envelope: self.core.decay_envelope(),
            transition_active: self.transition.is_active(),
            transition_intensity: self.transition.intensity(),
            input_peak,
            output_peak,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::parameters::Param;
    use crate::types::FairingSync;
    use crossbeam_channel::{Sender, unbounded};

    const SR: f32 = 48000.0;
    const BLOCK: usize = 256;

    fn engine() -> (ReverbEngine, Arc<ReverbParameters>, Sender<ControlEvent>) {
        let parameters = Arc::new(ReverbParameters::new());
        let (tx, rx) = unbounded();
        let mut engine = ReverbEngine::new(Arc::clone(&parameters), rx);
        engine.prepare(SR, BLOCK);
        (engine, parameters, tx)
    }

    fn tone(frames: usize, channels: usize) -> Vec<f32> {
        (0..frames * channels)
            .map(|i| ((i / channels) as f32 * 0.03).sin() * 0.5)
            .collect()
    }

    #[test]
    fn test_dry_only_passes_input() {
        let (mut engine, parameters, _tx) = engine();
        parameters.set(Param::Mix, 0.0);
        engine.prepare(SR, BLOCK);

        let input = tone(1000, 2);
        let mut buffer = input.clone();
        engine.process(&mut buffer, 2);
        assert_eq!(buffer, input);
    }

    #[test]
    fn test_full_wet_replaces_input() {
        let (mut engine, parameters, _tx) = engine();
        parameters.set(Param::Mix, 100.0);
        parameters.set(Param::PreDelay, 100.0);
        engine.prepare(SR, BLOCK);

        // Impulse: the wet path stays silent until the pre-delay passes
        let mut buffer = vec![0.0f32; 2 * 2048];
        buffer[0] = 1.0;
        buffer[1] = 1.0;
        engine.process(&mut buffer, 2);
        assert!(buffer.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_mono_buffer() {
        let (mut engine, parameters, _tx) = engine();
        parameters.set(Param::Mix, 100.0);
        engine.prepare(SR, BLOCK);

        let mut buffer = tone(SR as usize / 2, 1);
        engine.process(&mut buffer, 1);
        assert!(buffer.iter().all(|x| x.is_finite()));
        assert!(buffer.iter().any(|&x| x != 0.0));

        let meters = engine.take_meters();
        assert_eq!(meters.input_peak[0], meters.input_peak[1]);
    }

    #[test]
    fn test_extra_channels_untouched() {
        let (mut engine, _parameters, _tx) = engine();
        let mut buffer = vec![0.25f32; 4 * 512];
        engine.process(&mut buffer, 4);
        for frame in buffer.chunks_exact(4) {
            assert_eq!(frame[2], 0.25);
            assert_eq!(frame[3], 0.25);
        }
    }

    #[test]
    fn test_long_buffer_is_chunked() {
        let (mut engine, _parameters, _tx) = engine();
        let mut buffer = tone(BLOCK * 10 + 17, 2);
        engine.process(&mut buffer, 2);
        assert!(buffer.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_fairing_rising_edge_triggers_once() {
        let (mut engine, parameters, _tx) = engine();
        parameters.set(Param::Tempo, 240.0);
        parameters.set_fairing_sync(FairingSync::Quarter);

        parameters.set_fairing_enabled(true);
        let mut buffer = tone(BLOCK, 2);
        engine.process(&mut buffer, 2);
        assert!(engine.take_meters().transition_active);
        assert_eq!(engine.transition().bpm(), 240.0);
        assert_eq!(engine.transition().sync_beats(), 1.0);

        // One beat at 240 BPM is 0.25 s; holding the gate must not retrigger
        let mut buffer = tone(SR as usize / 2, 2);
        engine.process(&mut buffer, 2);
        assert!(!engine.transition().is_active());
    }

    #[test]
    fn test_midi_gate_and_clock_tempo() {
        let (mut engine, parameters, tx) = engine();
        parameters.set(Param::Tempo, 90.0);

        tx.send(ControlEvent::tempo(150.0)).unwrap();
        tx.send(ControlEvent::gate_on()).unwrap();
        let mut buffer = tone(BLOCK, 2);
        engine.process(&mut buffer, 2);

        assert!(engine.transition().is_active());
        assert_eq!(engine.transition().bpm(), 150.0);
    }

    #[test]
    fn test_clock_stop_falls_back_to_parameter_tempo() {
        let (mut engine, parameters, tx) = engine();
        parameters.set(Param::Tempo, 90.0);

        tx.send(ControlEvent::tempo(150.0)).unwrap();
        tx.send(ControlEvent::clock_stopped()).unwrap();
        parameters.set_fairing_enabled(true);
        let mut buffer = tone(BLOCK, 2);
        engine.process(&mut buffer, 2);

        assert_eq!(engine.transition().bpm(), 90.0);
    }

    #[test]
    fn test_input_gain_reaches_meters() {
        let (mut engine, parameters, _tx) = engine();
        parameters.set(Param::InputGain, 6.0);
        engine.prepare(SR, BLOCK);

        let mut buffer = vec![0.5f32; 2 * BLOCK];
        engine.process(&mut buffer, 2);
        let meters = engine.take_meters();
        assert!((meters.input_peak[0] - 0.5 * 1.9953).abs() < 1e-3);

        // Peaks reset after being taken
        assert_eq!(engine.take_meters().input_peak, [0.0, 0.0]);
    }

    #[test]
    fn test_tail_follows_decay() {
        let (mut engine, parameters, _tx) = engine();
        parameters.set(Param::Decay, 12.0);
        let mut buffer = tone(BLOCK, 2);
        engine.process(&mut buffer, 2);
        assert_eq!(engine.tail_seconds(), 12.0);
    }
}
