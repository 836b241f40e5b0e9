use crate::dsp::{AllpassDiffuser, Biquad, BiquadCoeffs};

/// Allpass stages per channel
pub const STAGES: usize = 8;

/// Base stage delays in milliseconds (Fibonacci-spaced, mutually inharmonic)
const STAGE_DELAYS_MS: [f32; STAGES] = [1.3, 2.1, 3.4, 5.5, 8.9, 14.4, 23.3, 37.7];

/// Added to every right-channel stage for stereo decorrelation
const RIGHT_OFFSET_MS: f32 = 0.07;

/// Spare samples allocated past each stage's nominal delay
const STAGE_HEADROOM: usize = 100;

const SHELF_HZ: f32 = 400.0;
const SHELF_Q: f32 = 0.7;
const SHELF_MAX_DB: f32 = 6.0;

/// Number of stages a sample runs through at a given thrust (0-1)
pub fn active_stage_count(thrust: f32) -> usize {
    (2.0 + thrust.clamp(0.0, 1.0) * 6.0).round() as usize
}

/// Feedback for stage `index` at a given thrust (0-1)
pub fn stage_feedback(index: usize, thrust: f32) -> f32 {
    let thrust = thrust.clamp(0.0, 1.0);
    (0.3 + thrust * 0.45 + (index as f32 / STAGES as f32) * 0.1).clamp(0.0, 0.75)
}

/// Per-channel allpass cascade that thickens the input before the combs
///
/// Thrust sets how many stages run, how hard each one recirculates, and how
/// much low shelf is added after the cascade.
pub struct DiffusionNetwork {
    stages: [[AllpassDiffuser; STAGES]; 2],
    shelves: [Biquad; 2],
    sample_rate: f32,
    thrust: f32,
    active_stages: usize,
    shelf_enabled: bool,
}

impl DiffusionNetwork {
    pub fn new() -> Self {
        Self {
            stages: std::array::from_fn(|_| std::array::from_fn(|_| AllpassDiffuser::new())),
            shelves: [Biquad::new(), Biquad::new()],
            sample_rate: 44100.0,
            thrust: 0.5,
            active_stages: active_stage_count(0.5),
            shelf_enabled: true,
        }
    }

    /// Allocate every stage for `sample_rate` and reapply the current thrust
    pub fn prepare(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;

        for (channel, stages) in self.stages.iter_mut().enumerate() {
            let offset_ms = if channel == 1 { RIGHT_OFFSET_MS } else { 0.0 };
            for (stage, base_ms) in stages.iter_mut().zip(STAGE_DELAYS_MS) {
                let delay = (base_ms + offset_ms) * sample_rate / 1000.0;
                stage.prepare(delay as usize + STAGE_HEADROOM);
                stage.set_delay(delay);
            }
        }

        for shelf in &mut self.shelves {
            shelf.reset();
        }

        self.set_thrust(self.thrust);
    }

    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut().flatten() {
            stage.reset();
        }
        for shelf in &mut self.shelves {
            shelf.reset();
        }
    }

    /// Set thrust (0-1)
    pub fn set_thrust(&mut self, thrust: f32) {
        self.thrust = thrust.clamp(0.0, 1.0);
        self.active_stages = active_stage_count(self.thrust);

        for stages in &mut self.stages {
            for (index, stage) in stages.iter_mut().enumerate() {
                stage.set_feedback(stage_feedback(index, self.thrust));
            }
        }

        self.shelf_enabled = self.thrust > 0.01;
        let coeffs = BiquadCoeffs::low_shelf(
            self.sample_rate,
            SHELF_HZ,
            SHELF_Q,
            self.thrust * SHELF_MAX_DB,
        );
        for shelf in &mut self.shelves {
            shelf.set_coeffs(coeffs);
        }
    }

    pub fn thrust(&self) -> f32 {
        self.thrust
    }

    pub fn active_stages(&self) -> usize {
        self.active_stages
    }

    /// Run one sample of `channel` (0 = left, 1 = right) through the cascade
    #[inline]
    pub fn process(&mut self, channel: usize, input: f32) -> f32 {
        let channel = channel.min(1);

        let mut sample = input;
        for stage in &mut self.stages[channel][..self.active_stages] {
            sample = stage.process(sample, 0.0);
        }

        if self.shelf_enabled {
            sample = self.shelves[channel].process(sample);
        }

        sample
    }
}

impl Default for DiffusionNetwork {
    fn default() -> Self {
        Self::new()
    }
}
