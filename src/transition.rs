//! Tempo-synced transition effect ("fairing separation"): a bandpass sweep,
//! a short stereo-widening delay and a gain swell, triggered on demand and
//! lasting a fixed number of beats.

use crate::dsp::{Biquad, BiquadCoeffs, DelayLine, OnePole};

const SWEEP_MIN_HZ: f32 = 200.0;
const SWEEP_MAX_HZ: f32 = 8000.0;
const BANDPASS_Q: f32 = 2.0;

/// Filter coefficients are recomputed once per this many samples
const SWEEP_UPDATE_INTERVAL: usize = 32;

/// Widening delay line length
const WIDENING_BUFFER_MS: f32 = 50.0;
/// Right-channel widening delay at full intensity
const MAX_WIDENING_MS: f32 = 15.0;
/// Left delay as a fraction of the right
const LEFT_WIDENING_RATIO: f32 = 0.3;
const WIDE_MIX: f32 = 0.5;
const CROSS_FEED: f32 = 0.3;

const FILTER_MIX: f32 = 0.7;
const GAIN_BOOST: f32 = 0.3;

const ENVELOPE_SMOOTHING: f32 = 0.999;
/// Below this intensity an idle effect stops processing altogether
const SILENCE_THRESHOLD: f32 = 0.001;

pub const MIN_BPM: f32 = 20.0;
pub const DEFAULT_BPM: f32 = 120.0;

/// Target gain over the normalized cycle: 10% attack, 60% sustain, 30% release
pub fn envelope_shape(phase: f32) -> f32 {
    let phase = phase.clamp(0.0, 1.0);
    if phase < 0.1 {
        phase / 0.1
    } else if phase < 0.7 {
        1.0
    } else {
        (1.0 - phase) / 0.3
    }
}

/// Which way the bandpass travels during a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    /// 200 Hz up to 8 kHz
    Up,
    /// 8 kHz down to 200 Hz
    Down,
}

impl SweepDirection {
    fn flipped(self) -> Self {
        match self {
            SweepDirection::Up => SweepDirection::Down,
            SweepDirection::Down => SweepDirection::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TransitionState {
    Idle,
    Active { phase: f32 },
}

pub struct TransitionEffect {
    state: TransitionState,
    direction: SweepDirection,
    envelope: OnePole,
    sample_rate: f32,
    bpm: f32,
    sync_beats: f32,
    bandpass: [Biquad; 2],
    widening: [DelayLine; 2],
}

impl TransitionEffect {
    pub fn new() -> Self {
        Self {
            state: TransitionState::Idle,
            // The first trigger flips this, so the first sweep rises
            direction: SweepDirection::Down,
            envelope: OnePole::new(ENVELOPE_SMOOTHING),
            sample_rate: 44100.0,
            bpm: DEFAULT_BPM,
            sync_beats: 4.0,
            bandpass: [Biquad::new(), Biquad::new()],
            widening: [DelayLine::new(), DelayLine::new()],
        }
    }

    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;

        let capacity = (WIDENING_BUFFER_MS * sample_rate / 1000.0) as usize;
        for line in &mut self.widening {
            line.prepare(capacity);
        }

        let coeffs = BiquadCoeffs::bandpass(sample_rate, 1000.0, BANDPASS_Q);
        for filter in &mut self.bandpass {
            filter.reset();
            filter.set_coeffs(coeffs);
        }
    }

    pub fn reset(&mut self) {
        for filter in &mut self.bandpass {
            filter.reset();
        }
        for line in &mut self.widening {
            line.reset();
        }
        self.state = TransitionState::Idle;
        self.envelope.reset(0.0);
    }

    /// Cycle length in beats (1-8)
    pub fn set_sync_beats(&mut self, beats: f32) {
        self.sync_beats = beats.clamp(1.0, 8.0);
    }

    pub fn sync_beats(&self) -> f32 {
        self.sync_beats
    }

    /// Tempo used to turn beats into samples, floored at 20 BPM
    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = if bpm.is_finite() { bpm.max(MIN_BPM) } else { DEFAULT_BPM };
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Start a cycle. Ignored while one is already running.
    pub fn trigger(&mut self) {
        if self.is_active() {
            return;
        }
        self.state = TransitionState::Active { phase: 0.0 };
        self.direction = self.direction.flipped();
    }

    /// Present for symmetry with `trigger`; a running cycle always plays out
    /// and the envelope fades on its own.
    pub fn release(&mut self) {}

    pub fn is_active(&self) -> bool {
        matches!(self.state, TransitionState::Active { .. })
    }

    pub fn direction(&self) -> SweepDirection {
        self.direction
    }

    /// Smoothed effect intensity (0-1), for display
    pub fn intensity(&self) -> f32 {
        self.envelope.value()
    }

    /// Samples in one full cycle at the current tempo and sync
    pub fn duration_samples(&self) -> f32 {
        self.sync_beats / (self.bpm / 60.0) * self.sample_rate
    }

    fn sweep_frequency(&self, phase: f32) -> f32 {
        let position = match self.direction {
            SweepDirection::Up => phase,
            SweepDirection::Down => 1.0 - phase,
        };
        SWEEP_MIN_HZ * (SWEEP_MAX_HZ / SWEEP_MIN_HZ).powf(position)
    }

    /// Process a stereo block in place
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        if !self.is_active() && self.envelope.value() < SILENCE_THRESHOLD {
            return;
        }

        let frames = left.len().min(right.len());
        let increment = 1.0 / self.duration_samples().max(1.0);
        let ms_to_samples = self.sample_rate / 1000.0;

        for n in 0..frames {
            // Advance the cycle; a finished cycle parks at phase 1
            let (phase, target) = match self.state {
                TransitionState::Active { phase } => {
                    let phase = phase + increment;
                    if phase >= 1.0 {
                        self.state = TransitionState::Idle;
                        (1.0, 0.0)
                    } else {
                        self.state = TransitionState::Active { phase };
                        (phase, envelope_shape(phase))
                    }
                }
                TransitionState::Idle => (1.0, 0.0),
            };

            let envelope = self.envelope.next(target);

            if n % SWEEP_UPDATE_INTERVAL == 0 {
                let center = self.sweep_frequency(phase).clamp(100.0, 15000.0);
                let coeffs = BiquadCoeffs::bandpass(self.sample_rate, center, BANDPASS_Q);
                for filter in &mut self.bandpass {
                    filter.set_coeffs(coeffs);
                }
            }

            // Widening taps grow with the envelope, right longer than left
            let right_delay = (MAX_WIDENING_MS * envelope * ms_to_samples) as usize;
            let left_delay =
                (MAX_WIDENING_MS * envelope * LEFT_WIDENING_RATIO * ms_to_samples) as usize;

            let input = [left[n], right[n]];
            for (line, sample) in self.widening.iter_mut().zip(input) {
                line.write(sample);
            }
            let delayed = [
                self.widening[0].read(left_delay as f32 + 1.0),
                self.widening[1].read(right_delay as f32 + 1.0),
            ];

            let wide = envelope * WIDE_MIX;
            let cross = wide * CROSS_FEED;
            let widened = [
                input[0] * (1.0 - wide) + delayed[0] * wide + delayed[1] * cross,
                input[1] * (1.0 - wide) + delayed[1] * wide + delayed[0] * cross,
            ];

            let filter_mix = envelope * FILTER_MIX;
            let gain = 1.0 + envelope * GAIN_BOOST;
            for (channel, sample) in widened.into_iter().enumerate() {
                let filtered = self.bandpass[channel].process(sample);
                let out = (sample * (1.0 - filter_mix) + filtered * filter_mix) * gain;
                if channel == 0 {
                    left[n] = out;
                } else {
                    right[n] = out;
                }
            }
        }
    }
}

impl Default for TransitionEffect {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn prepared(bpm: f32, beats: f32) -> TransitionEffect {
        let mut effect = TransitionEffect::new();
        effect.prepare(SR);
        effect.set_bpm(bpm);
        effect.set_sync_beats(beats);
        effect
    }

    /// Push `frames` of a test tone through in 512-sample blocks
    fn run(effect: &mut TransitionEffect, frames: usize) -> (Vec<f32>, Vec<f32>) {
        let mut out_l = Vec::with_capacity(frames);
        let mut out_r = Vec::with_capacity(frames);
        let mut start = 0;
        while start < frames {
            let len = 512.min(frames - start);
            let mut left: Vec<f32> = (start..start + len)
                .map(|n| (n as f32 * 0.05).sin() * 0.5)
                .collect();
            let mut right = left.clone();
            effect.process(&mut left, &mut right);
            out_l.extend(left);
            out_r.extend(right);
            start += len;
        }
        (out_l, out_r)
    }

    #[test]
    fn test_envelope_shape_endpoints() {
        assert_eq!(envelope_shape(0.0), 0.0);
        assert_eq!(envelope_shape(1.0), 0.0);
        for step in 100..700 {
            assert_eq!(envelope_shape(step as f32 / 1000.0), 1.0);
        }
    }

    #[test]
    fn test_envelope_shape_is_monotonic_on_ramps() {
        let mut last = -1.0;
        for step in 0..100 {
            let value = envelope_shape(step as f32 / 1000.0);
            assert!(value > last, "attack not rising at {}", step);
            last = value;
        }

        let mut last = 2.0;
        for step in 700..=1000 {
            let value = envelope_shape(step as f32 / 1000.0);
            assert!(value < last, "release not falling at {}", step);
            last = value;
        }
    }

    #[test]
    fn test_consecutive_triggers_alternate_direction() {
        let mut effect = prepared(600.0, 1.0);

        effect.trigger();
        assert_eq!(effect.direction(), SweepDirection::Up);
        run(&mut effect, 10_000);
        assert!(!effect.is_active());

        effect.trigger();
        assert_eq!(effect.direction(), SweepDirection::Down);
        run(&mut effect, 10_000);

        effect.trigger();
        assert_eq!(effect.direction(), SweepDirection::Up);
    }

    #[test]
    fn test_trigger_ignored_while_active() {
        let mut effect = prepared(120.0, 4.0);
        effect.trigger();
        run(&mut effect, 1000);

        effect.trigger();
        assert_eq!(effect.direction(), SweepDirection::Up);
        assert!(effect.is_active());
    }

    #[test]
    fn test_cycle_length_follows_tempo() {
        // One beat at 120 BPM is half a second
        let mut effect = prepared(120.0, 1.0);
        assert!((effect.duration_samples() - SR * 0.5).abs() < 1.0);

        effect.trigger();
        run(&mut effect, (SR * 0.5) as usize - 100);
        assert!(effect.is_active());
        run(&mut effect, 200);
        assert!(!effect.is_active());
    }

    #[test]
    fn test_tempo_and_sync_are_clamped() {
        let mut effect = TransitionEffect::new();
        effect.set_bpm(0.0);
        assert_eq!(effect.bpm(), MIN_BPM);
        effect.set_bpm(f32::NAN);
        assert_eq!(effect.bpm(), DEFAULT_BPM);
        effect.set_sync_beats(0.0);
        assert_eq!(effect.sync_beats(), 1.0);
        effect.set_sync_beats(16.0);
        assert_eq!(effect.sync_beats(), 8.0);
    }

    #[test]
    fn test_idle_is_transparent() {
        let mut effect = prepared(120.0, 4.0);
        let (left, right) = run(&mut effect, 2048);
        for (n, (l, r)) in left.iter().zip(&right).enumerate() {
            let x = (n as f32 * 0.05).sin() * 0.5;
            assert_eq!(*l, x);
            assert_eq!(*r, x);
        }
    }

    #[test]
    fn test_sustain_widens_and_swells() {
        let mut effect = prepared(120.0, 4.0);
        effect.trigger();

        // Well into the sustain segment of a two-second cycle
        let (left, right) = run(&mut effect, (SR * 0.8) as usize);
        assert!(effect.intensity() > 0.9, "intensity {}", effect.intensity());

        let tail = left.len() - 2000;
        let spread: f32 = left[tail..]
            .iter()
            .zip(&right[tail..])
            .map(|(l, r)| (l - r).abs())
            .sum();
        assert!(spread > 1.0, "mono input should be widened: {}", spread);
    }

    #[test]
    fn test_envelope_fades_after_cycle() {
        let mut effect = prepared(600.0, 1.0);
        effect.trigger();

        // 0.1 s cycle, then let the smoothed envelope settle
        run(&mut effect, (SR * 0.1) as usize + 64);
        assert!(!effect.is_active());
        assert!(effect.intensity() > SILENCE_THRESHOLD);

        run(&mut effect, SR as usize);
        assert!(effect.intensity() < SILENCE_THRESHOLD);
    }

    #[test]
    fn test_output_stays_finite() {
        let mut effect = prepared(300.0, 1.0);
        for _ in 0..5 {
            effect.trigger();
            let (left, right) = run(&mut effect, 20_000);
            assert!(left.iter().chain(&right).all(|x| x.is_finite()));
        }
    }
}
