use std::f32::consts::{PI, TAU};

use crate::dsp::{OnePole, Rng};

pub const NUM_OSCILLATORS: usize = 6;

/// One modulation output per comb line
pub const NUM_OUTPUTS: usize = 8;

const GOLDEN_RATIO: f32 = 1.618_034;

/// Spacing exponent applied to the golden ratio between oscillators
const FREQUENCY_SPREAD: f32 = 0.7;

/// Seconds of audio between drift retargets
const DRIFT_INTERVAL_SECS: f32 = 2.0;

const DRIFT_SMOOTHING: f32 = 0.9999;
const OUTPUT_SMOOTHING: f32 = 0.995;

/// Drift contribution relative to the oscillator mix, before chaos scaling
const DRIFT_AMOUNT: f32 = 0.3;

/// Primes used to derive the fixed mixing weights
const MIX_PRIMES: [u32; NUM_OUTPUTS] = [7, 11, 13, 17, 19, 23, 29, 31];

/// Oscillator rate in Hz for a given chaos amount (0-1)
pub fn base_frequency(chaos: f32) -> f32 {
    0.15 + chaos.clamp(0.0, 1.0) * 0.5
}

/// Peak modulation depth in samples for a given chaos amount (0-1)
pub fn max_depth(chaos: f32) -> f32 {
    20.0 + chaos.clamp(0.0, 1.0) * 60.0
}

/// Oscillator waveshape, fixed per oscillator index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveshape {
    Sine,
    SmoothTriangle,
    Harmonic,
    Asymmetric,
}

impl Waveshape {
    /// Shape assigned to oscillator `index`
    pub fn for_index(index: usize) -> Self {
        match index % 4 {
            0 => Waveshape::Sine,
            1 => Waveshape::SmoothTriangle,
            2 => Waveshape::Harmonic,
            _ => Waveshape::Asymmetric,
        }
    }

    /// Generate a value for a phase in radians [0, 2π)
    pub fn generate(&self, phase: f32) -> f32 {
        match self {
            Waveshape::Sine => phase.sin(),
            Waveshape::SmoothTriangle => {
                let tri = if phase < PI {
                    2.0 * phase / PI - 1.0
                } else {
                    3.0 - 2.0 * phase / PI
                };
                // Cubic rounding of the corners
                tri * tri * tri * 0.5 + tri * 0.5
            }
            Waveshape::Harmonic => {
                phase.sin() * 0.7 + (phase * 2.0).sin() * 0.2 + (phase * 3.0).sin() * 0.1
            }
            Waveshape::Asymmetric => {
                let s = phase.sin();
                s * (1.0 + 0.3 * s * s)
            }
        }
    }
}

/// Slow LFO in the golden-ratio bank
#[derive(Debug, Clone, Copy)]
pub struct ChaosOscillator {
    phase: f32,
    frequency_hz: f32,
    shape: Waveshape,
}

impl ChaosOscillator {
    fn new(index: usize) -> Self {
        Self {
            phase: Self::home_phase(index),
            frequency_hz: 0.0,
            shape: Waveshape::for_index(index),
        }
    }

    /// Evenly spread starting phase before any randomization
    fn home_phase(index: usize) -> f32 {
        index as f32 * 0.37
    }

    #[inline]
    fn advance(&mut self, sample_rate: f32) {
        self.phase += self.frequency_hz / sample_rate * TAU;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
    }

    #[inline]
    fn value(&self) -> f32 {
        self.shape.generate(self.phase)
    }

    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    pub fn shape(&self) -> Waveshape {
        self.shape
    }
}

/// Bounded random walk that glides toward a target redrawn every few seconds
#[derive(Debug, Clone, Copy)]
pub struct DriftVoice {
    value: OnePole,
    target: f32,
}

impl DriftVoice {
    fn new() -> Self {
        Self {
            value: OnePole::new(DRIFT_SMOOTHING),
            target: 0.0,
        }
    }

    fn reset(&mut self) {
        self.value.reset(0.0);
        self.target = 0.0;
    }

    #[inline]
    fn next(&mut self) -> f32 {
        self.value.next(self.target)
    }

    pub fn value(&self) -> f32 {
        self.value.value()
    }
}

/// Fixed output × oscillator weights
///
/// Every row is a different combination of the oscillators so no two comb
/// lines move together; later oscillators are progressively attenuated.
#[derive(Debug, Clone, PartialEq)]
pub struct MixMatrix {
    weights: [[f32; NUM_OSCILLATORS]; NUM_OUTPUTS],
}

impl MixMatrix {
    pub fn new() -> Self {
        let mut weights = [[0.0; NUM_OSCILLATORS]; NUM_OUTPUTS];
        for (output, row) in weights.iter_mut().enumerate() {
            for (oscillator, weight) in row.iter_mut().enumerate() {
                let seed = MIX_PRIMES[output % NUM_OUTPUTS] * (oscillator as u32 + 1) + output as u32;
                let spread = (seed % 100) as f32 / 100.0 - 0.5;
                *weight = spread * (1.0 - oscillator as f32 * 0.12);
            }
        }
        Self { weights }
    }

    pub fn weight(&self, output: usize, oscillator: usize) -> f32 {
        self.weights[output][oscillator]
    }

    fn row(&self, output: usize) -> &[f32; NUM_OSCILLATORS] {
        &self.weights[output]
    }
}

impl Default for MixMatrix {
    fn default() -> Self {
        Self::new()
    }
}

/// Multi-LFO engine producing per-comb delay offsets ("chaos")
///
/// Advance once per sample with [`ModulationEngine::advance`], then read each
/// comb line's offset in samples with [`ModulationEngine::modulation`].
pub struct ModulationEngine {
    sample_rate: f32,
    chaos: f32,
    max_depth: f32,
    oscillators: [ChaosOscillator; NUM_OSCILLATORS],
    drift: [DriftVoice; NUM_OUTPUTS],
    matrix: MixMatrix,
    outputs: [OnePole; NUM_OUTPUTS],
    drift_counter: usize,
    drift_interval: usize,
    seed: u32,
    rng: Rng,
}

impl ModulationEngine {
    pub fn new() -> Self {
        Self::with_seed(Rng::DEFAULT_SEED)
    }

    /// Create an engine whose random phases and drift follow `seed`
    pub fn with_seed(seed: u32) -> Self {
        let mut engine = Self {
            sample_rate: 44100.0,
            chaos: 0.3,
            max_depth: max_depth(0.3),
            oscillators: std::array::from_fn(ChaosOscillator::new),
            drift: [DriftVoice::new(); NUM_OUTPUTS],
            matrix: MixMatrix::new(),
            outputs: [OnePole::new(OUTPUT_SMOOTHING); NUM_OUTPUTS],
            drift_counter: 0,
            drift_interval: (44100.0 * DRIFT_INTERVAL_SECS) as usize,
            seed,
            rng: Rng::new(seed),
        };
        engine.set_chaos(0.3);
        engine
    }

    /// Seed the generator, scatter the oscillator phases and draw the first
    /// drift targets
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.drift_interval = (sample_rate * DRIFT_INTERVAL_SECS) as usize;
        self.rng.reseed(self.seed);

        for (index, oscillator) in self.oscillators.iter_mut().enumerate() {
            oscillator.phase =
                ChaosOscillator::home_phase(index) + self.rng.next_unipolar() * TAU * 0.3;
        }

        for voice in &mut self.drift {
            voice.reset();
        }
        for output in &mut self.outputs {
            output.reset(0.0);
        }
        self.drift_counter = 0;
        self.retarget_drift();

        self.set_chaos(self.chaos);
    }

    pub fn reset(&mut self) {
        for (index, oscillator) in self.oscillators.iter_mut().enumerate() {
            oscillator.phase = ChaosOscillator::home_phase(index);
        }
        for voice in &mut self.drift {
            voice.reset();
        }
        for output in &mut self.outputs {
            output.reset(0.0);
        }
        self.drift_counter = 0;
    }

    /// Set chaos (0-1): oscillator rate and modulation depth
    pub fn set_chaos(&mut self, chaos: f32) {
        self.chaos = chaos.clamp(0.0, 1.0);

        let base = base_frequency(self.chaos);
        for (index, oscillator) in self.oscillators.iter_mut().enumerate() {
            oscillator.frequency_hz = base * GOLDEN_RATIO.powf(index as f32 * FREQUENCY_SPREAD);
        }

        self.max_depth = max_depth(self.chaos);
    }

    pub fn chaos(&self) -> f32 {
        self.chaos
    }

    pub fn depth(&self) -> f32 {
        self.max_depth
    }

    pub fn oscillators(&self) -> &[ChaosOscillator; NUM_OSCILLATORS] {
        &self.oscillators
    }

    pub fn drift(&self) -> &[DriftVoice; NUM_OUTPUTS] {
        &self.drift
    }

    pub fn matrix(&self) -> &MixMatrix {
        &self.matrix
    }

    /// Smoothed offset in samples for comb line `index` (0 if out of range)
    #[inline]
    pub fn modulation(&self, index: usize) -> f32 {
        self.outputs.get(index).map_or(0.0, OnePole::value)
    }

    /// Advance every oscillator, drift voice and output by one sample
    pub fn advance(&mut self) {
        for oscillator in &mut self.oscillators {
            oscillator.advance(self.sample_rate);
        }

        self.drift_counter += 1;
        if self.drift_counter > self.drift_interval {
            self.retarget_drift();
            self.drift_counter = 0;
        }

        let mut lfo = [0.0f32; NUM_OSCILLATORS];
        for (value, oscillator) in lfo.iter_mut().zip(&self.oscillators) {
            *value = oscillator.value();
        }

        for (index, (output, voice)) in self.outputs.iter_mut().zip(&mut self.drift).enumerate() {
            let mixed: f32 = self
                .matrix
                .row(index)
                .iter()
                .zip(&lfo)
                .map(|(weight, value)| weight * value)
                .sum();

            let drift = voice.next() * self.chaos * DRIFT_AMOUNT;
            output.next((mixed + drift) * self.max_depth);
        }
    }

    fn retarget_drift(&mut self) {
        for voice in &mut self.drift {
            voice.target = self.rng.next_bipolar();
        }
    }
}

impl Default for ModulationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    fn prepared(chaos: f32, seed: u32) -> ModulationEngine {
        let mut engine = ModulationEngine::with_seed(seed);
        engine.set_chaos(chaos);
        engine.prepare(SR);
        engine
    }

    #[test]
    fn test_frequencies_follow_golden_ratio() {
        let engine = prepared(0.0, 1);
        let oscillators = engine.oscillators();

        assert!((oscillators[0].frequency() - 0.15).abs() < 1e-6);
        let ratio = GOLDEN_RATIO.powf(FREQUENCY_SPREAD);
        for pair in oscillators.windows(2) {
            let measured = pair[1].frequency() / pair[0].frequency();
            assert!((measured - ratio).abs() < 1e-4, "ratio {}", measured);
        }
    }

    #[test]
    fn test_chaos_changes_rate_and_depth_not_shape() {
        let calm = prepared(0.0, 1);
        let wild = prepared(1.0, 1);

        for (index, (a, b)) in calm.oscillators().iter().zip(wild.oscillators()).enumerate() {
            assert_eq!(a.shape(), Waveshape::for_index(index));
            assert_eq!(a.shape(), b.shape());
            assert!(b.frequency() > a.frequency());
        }
        assert_eq!(calm.depth(), 20.0);
        assert_eq!(wild.depth(), 80.0);
        assert_eq!(calm.matrix(), wild.matrix());
    }

    #[test]
    fn test_waveshapes_are_bounded() {
        for shape in [
            Waveshape::Sine,
            Waveshape::SmoothTriangle,
            Waveshape::Harmonic,
            Waveshape::Asymmetric,
        ] {
            for step in 0..1000 {
                let phase = step as f32 / 1000.0 * TAU;
                let value = shape.generate(phase);
                assert!(value.abs() <= 1.3 + 1e-5, "{:?} at {}: {}", shape, phase, value);
            }
        }
    }

    #[test]
    fn test_smooth_triangle_corners() {
        let shape = Waveshape::SmoothTriangle;
        assert!((shape.generate(0.0) + 1.0).abs() < 1e-6);
        assert!((shape.generate(PI) - 1.0).abs() < 1e-5);
        assert!(shape.generate(PI * 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_mix_matrix_rows_are_distinct() {
        let matrix = MixMatrix::new();

        for output in 0..NUM_OUTPUTS {
            for oscillator in 0..NUM_OSCILLATORS {
                let weight = matrix.weight(output, oscillator);
                let limit = 0.5 * (1.0 - oscillator as f32 * 0.12);
                assert!(weight.abs() <= limit + 1e-6);
            }
        }

        for a in 0..NUM_OUTPUTS {
            for b in (a + 1)..NUM_OUTPUTS {
                assert_ne!(matrix.row(a), matrix.row(b), "rows {} and {}", a, b);
            }
        }
    }

    #[test]
    fn test_mix_weight_formula() {
        let matrix = MixMatrix::new();
        // Output 0, oscillator 0: seed 7 -> 0.07 - 0.5
        assert!((matrix.weight(0, 0) + 0.43).abs() < 1e-6);
        // Output 1, oscillator 2: seed 11 * 3 + 1 = 34 -> (0.34 - 0.5) * 0.76
        assert!((matrix.weight(1, 2) + 0.16 * 0.76).abs() < 1e-6);
    }

    #[test]
    fn test_outputs_bounded_by_depth() {
        let mut engine = prepared(1.0, 99);
        // Oscillator sum plus drift can never exceed this
        let bound = engine.depth() * (NUM_OSCILLATORS as f32 * 0.5 * 1.3 + DRIFT_AMOUNT);

        for _ in 0..(SR as usize * 5) {
            engine.advance();
            for index in 0..NUM_OUTPUTS {
                assert!(engine.modulation(index).abs() <= bound);
            }
        }
    }

    #[test]
    fn test_outputs_are_decorrelated() {
        let mut engine = prepared(0.5, 3);
        let mut sums = [0.0f32; NUM_OUTPUTS];
        for _ in 0..(SR as usize) {
            engine.advance();
            for (index, sum) in sums.iter_mut().enumerate() {
                *sum += engine.modulation(index).abs();
            }
        }

        for a in 0..NUM_OUTPUTS {
            for b in (a + 1)..NUM_OUTPUTS {
                assert_ne!(sums[a], sums[b]);
            }
        }
    }

    #[test]
    fn test_drift_stays_in_unit_range() {
        let mut engine = prepared(1.0, 11);
        for _ in 0..(SR as usize * 7) {
            engine.advance();
        }
        for voice in engine.drift() {
            assert!(voice.value().abs() <= 1.0);
        }
        // Several retargets have happened and the walk has moved
        assert!(engine.drift().iter().any(|voice| voice.value() != 0.0));
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let mut a = prepared(0.4, 42);
        let mut b = prepared(0.4, 42);
        for _ in 0..10_000 {
            a.advance();
            b.advance();
        }
        for index in 0..NUM_OUTPUTS {
            assert_eq!(a.modulation(index), b.modulation(index));
        }
    }

    #[test]
    fn test_out_of_range_index_is_zero() {
        let mut engine = prepared(1.0, 5);
        for _ in 0..1000 {
            engine.advance();
        }
        assert_eq!(engine.modulation(NUM_OUTPUTS), 0.0);
    }
}
