use super::diffusion::DiffusionNetwork;
use super::modulation::{ModulationEngine, NUM_OUTPUTS};
use crate::dsp::{Biquad, BiquadCoeffs, DampedComb, DelayLine, OnePole};

/// Comb lines per channel
pub const NUM_COMBS: usize = NUM_OUTPUTS;

/// Comb delays in milliseconds, chosen for density without flutter
const COMB_DELAYS_MS: [f32; NUM_COMBS] = [29.7, 37.1, 41.1, 43.7, 47.3, 53.0, 59.3, 67.1];

/// Added to every right-channel comb
const RIGHT_OFFSET_MS: f32 = 1.7;

/// Room past each comb's nominal delay for modulation
const COMB_HEADROOM: usize = 200;

pub const MAX_PRE_DELAY_MS: f32 = 500.0;

const FILTER_Q: f32 = 0.707;
const MAX_FEEDBACK: f32 = 0.998;
const MAX_DAMPING: f32 = 0.7;
const ENVELOPE_SMOOTHING: f32 = 0.99;

/// Comb feedback that reaches -60 dB after `decay_secs` for a line of
/// `delay_secs`
pub fn comb_feedback(delay_secs: f32, decay_secs: f32) -> f32 {
    10.0f32
        .powf(-3.0 * delay_secs / decay_secs.max(f32::EPSILON))
        .clamp(0.0, MAX_FEEDBACK)
}

/// Comb damping for a high-cut frequency: none at 20 kHz, heaviest at 1 kHz
pub fn damping_for_high_cut(high_cut_hz: f32) -> f32 {
    (MAX_DAMPING * (1.0 - (high_cut_hz - 1000.0) / 19000.0)).clamp(0.0, MAX_DAMPING)
}

/// Stereo reverb: pre-delay, diffusion, modulated comb bank, tone and width
///
/// Everything is allocated in `prepare`; setters only derive coefficients.
pub struct ReverbCore {
    sample_rate: f32,

    pre_delay: [DelayLine; 2],
    max_pre_delay: usize,
    pre_delay_samples: usize,

    diffusion: DiffusionNetwork,
    combs: [[DampedComb; NUM_COMBS]; 2],
    modulation: ModulationEngine,

    high_cut: [Biquad; 2],
    low_cut: [Biquad; 2],

    decay: f32,
    high_cut_hz: f32,
    low_cut_hz: f32,
    width: f32,

    envelope: OnePole,
}

impl ReverbCore {
    pub fn new() -> Self {
        Self::with_modulation(ModulationEngine::new())
    }

    /// Build around a specific modulation engine (e.g. one with a fixed seed)
    pub fn with_modulation(modulation: ModulationEngine) -> Self {
        Self {
            sample_rate: 44100.0,
            pre_delay: [DelayLine::new(), DelayLine::new()],
            max_pre_delay: 0,
            pre_delay_samples: 0,
            diffusion: DiffusionNetwork::new(),
            combs: std::array::from_fn(|_| std::array::from_fn(|_| DampedComb::new())),
            modulation,
            high_cut: [Biquad::new(), Biquad::new()],
            low_cut: [Biquad::new(), Biquad::new()],
            decay: 5.0,
            high_cut_hz: 12000.0,
            low_cut_hz: 80.0,
            width: 1.0,
            envelope: OnePole::new(ENVELOPE_SMOOTHING),
        }
    }

    /// Allocate every line for `sample_rate` and derive all coefficients
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;

        self.max_pre_delay = (MAX_PRE_DELAY_MS * sample_rate / 1000.0) as usize;
        for line in &mut self.pre_delay {
            // One extra slot since the tap is read after the write
            line.prepare(self.max_pre_delay + 1);
        }
        self.pre_delay_samples = self.pre_delay_samples.min(self.max_pre_delay);

        self.diffusion.prepare(sample_rate);

        for (channel, combs) in self.combs.iter_mut().enumerate() {
            for (comb, delay_ms) in combs.iter_mut().zip(COMB_DELAYS_MS) {
                let delay = (Self::comb_delay_ms(channel, delay_ms) * sample_rate / 1000.0) as usize;
                comb.prepare(delay + COMB_HEADROOM);
                comb.set_delay(delay as f32);
            }
        }

        self.modulation.prepare(sample_rate);

        for filter in self.high_cut.iter_mut().chain(&mut self.low_cut) {
            filter.reset();
        }
        self.envelope.reset(0.0);

        self.update_filters();
        self.update_combs();
    }

    /// Clear all audio state, keeping buffers and settings
    pub fn reset(&mut self) {
        for line in &mut self.pre_delay {
            line.reset();
        }
        self.diffusion.reset();
        for comb in self.combs.iter_mut().flatten() {
            comb.reset();
        }
        self.modulation.reset();
        for filter in self.high_cut.iter_mut().chain(&mut self.low_cut) {
            filter.reset();
        }
        self.envelope.reset(0.0);
    }

    fn comb_delay_ms(channel: usize, base_ms: f32) -> f32 {
        if channel == 1 {
            base_ms + RIGHT_OFFSET_MS
        } else {
            base_ms
        }
    }

    /// Set the RT60 target in seconds (0.5-30)
    pub fn set_decay(&mut self, seconds: f32) {
        self.decay = seconds.clamp(0.5, 30.0);
        self.update_combs();
    }

    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Set pre-delay in milliseconds (0-500)
    pub fn set_pre_delay(&mut self, ms: f32) {
        let samples = (ms.clamp(0.0, MAX_PRE_DELAY_MS) * self.sample_rate / 1000.0) as usize;
        self.pre_delay_samples = samples.min(self.max_pre_delay);
    }

    pub fn pre_delay_samples(&self) -> usize {
        self.pre_delay_samples
    }

    /// Set the low-pass cutoff, which also sets comb damping (1-20 kHz)
    pub fn set_high_cut(&mut self, hz: f32) {
        self.high_cut_hz = hz.clamp(1000.0, 20000.0);
        self.update_filters();
        self.update_combs();
    }

    /// Set the high-pass cutoff (20-500 Hz)
    pub fn set_low_cut(&mut self, hz: f32) {
        self.low_cut_hz = hz.clamp(20.0, 500.0);
        self.update_filters();
    }

    /// Set stereo width (0 = mono, 1 = unchanged, 2 = extra wide)
    pub fn set_width(&mut self, width: f32) {
        self.width = width.clamp(0.0, 2.0);
    }

    /// Diffusion thrust (0-1)
    pub fn set_thrust(&mut self, thrust: f32) {
        self.diffusion.set_thrust(thrust);
    }

    /// Modulation chaos (0-1)
    pub fn set_chaos(&mut self, chaos: f32) {
        self.modulation.set_chaos(chaos);
    }

    /// Smoothed wet peak, for display only
    pub fn decay_envelope(&self) -> f32 {
        self.envelope.value()
    }

    pub fn comb(&self, channel: usize, index: usize) -> &DampedComb {
        &self.combs[channel][index]
    }

    fn update_combs(&mut self) {
        let damping = damping_for_high_cut(self.high_cut_hz);

        for (channel, combs) in self.combs.iter_mut().enumerate() {
            for (comb, delay_ms) in combs.iter_mut().zip(COMB_DELAYS_MS) {
                let delay_secs = Self::comb_delay_ms(channel, delay_ms) / 1000.0;
                comb.set_feedback(comb_feedback(delay_secs, self.decay));
                comb.set_damping(damping);
            }
        }
    }

    fn update_filters(&mut self) {
        let low_pass = BiquadCoeffs::lowpass(self.sample_rate, self.high_cut_hz, FILTER_Q);
        let high_pass = BiquadCoeffs::highpass(self.sample_rate, self.low_cut_hz, FILTER_Q);

        for filter in &mut self.high_cut {
            filter.set_coeffs(low_pass);
        }
        for filter in &mut self.low_cut {
            filter.set_coeffs(high_pass);
        }
    }

    /// Replace a stereo block with its fully wet reverb
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let apply_width = (self.width - 1.0).abs() > 0.01;
        let mut peak = 0.0f32;

        for n in 0..frames {
            self.modulation.advance();

            let mut wet = [left[n], right[n]];
            for (channel, sample) in wet.iter_mut().enumerate() {
                // Pre-delay (0 samples reads back the sample just written)
                let line = &mut self.pre_delay[channel];
                line.write(*sample);
                let delayed = line.read(self.pre_delay_samples as f32 + 1.0);

                let diffused = self.diffusion.process(channel, delayed);

                // Alternating-sign sum across the comb bank
                let comb_input = diffused / NUM_COMBS as f32;
                let mut sum = 0.0;
                for (index, comb) in self.combs[channel].iter_mut().enumerate() {
                    let out = comb.process(comb_input, self.modulation.modulation(index));
                    if (index + channel) % 2 == 0 {
                        sum += out;
                    } else {
                        sum -= out;
                    }
                }

                let filtered = self.high_cut[channel].process(sum);
                *sample = self.low_cut[channel].process(filtered);
            }

            if apply_width {
                let mid = (wet[0] + wet[1]) * 0.5;
                let side = (wet[0] - wet[1]) * 0.5 * self.width;
                wet = [mid + side, mid - side];
            }

            peak = peak.max(wet[0].abs()).max(wet[1].abs());
            left[n] = wet[0];
            right[n] = wet[1];
        }

        if frames > 0 {
            self.envelope.next(peak);
        }
    }
}

impl Default for ReverbCore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 22050.0;
    const BLOCK: usize = 256;

    fn prepared() -> ReverbCore {
        let mut core = ReverbCore::with_modulation(ModulationEngine::with_seed(7));
        core.prepare(SR);
        core.set_decay(5.0);
        core.set_pre_delay(20.0);
        core.set_thrust(0.5);
        core.set_chaos(0.3);
        core.set_width(1.0);
        core
    }

    /// Run `frames` of input produced by `signal` through the core in blocks
    fn run(
        core: &mut ReverbCore,
        frames: usize,
        signal: impl Fn(usize) -> (f32, f32),
    ) -> (Vec<f32>, Vec<f32>) {
        let mut out_l = Vec::with_capacity(frames);
        let mut out_r = Vec::with_capacity(frames);
        let mut left = [0.0f32; BLOCK];
        let mut right = [0.0f32; BLOCK];

        let mut start = 0;
        while start < frames {
            let len = BLOCK.min(frames - start);
            for i in 0..len {
                (left[i], right[i]) = signal(start + i);
            }
            core.process(&mut left[..len], &mut right[..len]);
            out_l.extend_from_slice(&left[..len]);
            out_r.extend_from_slice(&right[..len]);
            start += len;
        }

        (out_l, out_r)
    }

    fn burst(n: usize) -> (f32, f32) {
        if n < 2000 {
            let x = ((n as f32) * 0.37).sin() * 0.5;
            (x, -x * 0.8)
        } else {
            (0.0, 0.0)
        }
    }

    #[test]
    fn test_feedback_within_range_and_monotonic() {
        for delay_ms in COMB_DELAYS_MS {
            let delay_secs = (delay_ms + RIGHT_OFFSET_MS) / 1000.0;
            let mut last = 0.0;
            for step in 0..=295 {
                let decay = 0.5 + step as f32 * 0.1;
                let fb = comb_feedback(delay_secs, decay);
                assert!((0.0..=MAX_FEEDBACK).contains(&fb), "fb {} at decay {}", fb, decay);
                assert!(fb >= last, "feedback dropped at decay {}", decay);
                last = fb;
            }
        }
    }

    #[test]
    fn test_feedback_reaches_rt60() {
        // 60 dB down after decay / delay round trips
        let delay_secs = 0.05;
        let decay = 2.0;
        let fb = comb_feedback(delay_secs, decay);
        let trips = decay / delay_secs;
        assert!((fb.powf(trips) - 0.001).abs() < 1e-5);
    }

    #[test]
    fn test_damping_mapping() {
        assert!((damping_for_high_cut(1000.0) - 0.7).abs() < 1e-6);
        assert_eq!(damping_for_high_cut(20000.0), 0.0);
        assert!((damping_for_high_cut(10500.0) - 0.35).abs() < 1e-5);
        assert_eq!(damping_for_high_cut(500.0), 0.7);
    }

    #[test]
    fn test_setters_update_combs() {
        let mut core = prepared();
        core.set_high_cut(20000.0);
        assert_eq!(core.comb(0, 0).damping(), 0.0);

        core.set_decay(30.0);
        let long = core.comb(1, 7).feedback();
        core.set_decay(0.5);
        assert!(core.comb(1, 7).feedback() < long);

        // Out-of-range values are clamped
        core.set_decay(100.0);
        assert_eq!(core.decay(), 30.0);
    }

    #[test]
    fn test_pre_delay_is_clamped() {
        let mut core = prepared();
        core.set_pre_delay(10_000.0);
        assert_eq!(core.pre_delay_samples(), (0.5 * SR) as usize);
        core.set_pre_delay(-5.0);
        assert_eq!(core.pre_delay_samples(), 0);
    }

    #[test]
    fn test_pre_delay_holds_back_onset() {
        let mut core = prepared();
        core.set_pre_delay(100.0);
        let pre_delay = core.pre_delay_samples();

        let (left, right) = run(&mut core, pre_delay + 4000, |n| {
            if n == 0 { (1.0, 1.0) } else { (0.0, 0.0) }
        });

        // Nothing reaches the output before the pre-delay has elapsed
        assert!(left[..pre_delay].iter().all(|&x| x == 0.0));
        assert!(right[..pre_delay].iter().all(|&x| x == 0.0));
        assert!(left[pre_delay..].iter().any(|&x| x != 0.0));
    }

    #[test]
    fn test_silence_stays_silent() {
        let mut core = prepared();
        let (left, right) = run(&mut core, 10_000, |_| (0.0, 0.0));
        assert!(left.iter().chain(&right).all(|&x| x == 0.0));
        assert_eq!(core.decay_envelope(), 0.0);
    }

    #[test]
    fn test_tail_dies_out() {
        let mut core = prepared();
        let frames = (5.0 * core.decay() * SR) as usize;
        let (left, right) = run(&mut core, frames, burst);

        // There was a tail to begin with
        let early: f32 = left[2000..6000].iter().map(|x| x.abs()).sum();
        assert!(early > 0.0);

        let window = SR as usize;
        let energy: f32 = left[frames - window..]
            .iter()
            .chain(&right[frames - window..])
            .map(|x| x * x)
            .sum();
        let rms = (energy / (2 * window) as f32).sqrt();
        // -80 dBFS
        assert!(rms < 1e-4, "tail rms: {}", rms);
        assert!(left.iter().chain(&right).all(|x| x.is_finite()));
    }

    #[test]
    fn test_zero_width_collapses_to_mono() {
        let mut core = prepared();
        core.set_width(0.0);
        let (left, right) = run(&mut core, 8000, burst);

        assert!(left.iter().any(|&x| x != 0.0));
        assert_eq!(left, right);
    }

    #[test]
    fn test_double_width_widens() {
        let mut normal = prepared();
        let mut wide = prepared();
        wide.set_width(2.0);

        let (nl, nr) = run(&mut normal, 8000, burst);
        let (wl, wr) = run(&mut wide, 8000, burst);

        let spread = |l: &[f32], r: &[f32]| -> f32 {
            l.iter().zip(r).map(|(a, b)| (a - b).abs()).sum()
        };
        let normal_spread = spread(&nl, &nr);
        let wide_spread = spread(&wl, &wr);

        assert!(normal_spread > 0.0);
        assert!(
            (wide_spread - 2.0 * normal_spread).abs() < normal_spread * 0.01,
            "normal {}, wide {}",
            normal_spread,
            wide_spread
        );
    }

    #[test]
    fn test_envelope_tracks_activity() {
        let mut core = prepared();
        run(&mut core, 4000, burst);
        let active = core.decay_envelope();
        assert!(active > 0.0);

        core.reset();
        assert_eq!(core.decay_envelope(), 0.0);
        let (left, _) = run(&mut core, 2000, |_| (0.0, 0.0));
        assert!(left.iter().all(|&x| x == 0.0));
    }
}
