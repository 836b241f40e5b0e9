use super::delay_line::DelayLine;

/// Feedback comb filter with a one-pole lowpass in the feedback path
///
/// The returned tap is the undamped delayed sample; damping only shapes
/// what recirculates, so high frequencies die faster than lows.
pub struct DampedComb {
    line: DelayLine,
    max_delay: f32,
    delay: f32,
    feedback: f32,
    damping: f32,
    filter_state: f32,
}

impl DampedComb {
    pub fn new() -> Self {
        Self {
            line: DelayLine::new(),
            max_delay: 1.0,
            delay: 1.0,
            feedback: 0.7,
            damping: 0.3,
            filter_state: 0.0,
        }
    }

    /// Allocate the delay line for delays up to `max_delay_samples`
    pub fn prepare(&mut self, max_delay_samples: usize) {
        self.line.prepare(max_delay_samples);
        self.max_delay = (max_delay_samples as f32).clamp(1.0, self.line.max_delay());
        self.delay = self.delay.clamp(1.0, self.max_delay);
        self.filter_state = 0.0;
    }

    pub fn reset(&mut self) {
        self.line.reset();
        self.filter_state = 0.0;
    }

    /// Set the nominal delay in samples
    pub fn set_delay(&mut self, delay_samples: f32) {
        self.delay = delay_samples.clamp(1.0, self.max_delay);
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 0.999);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Set damping (0 = none, approaching 1 = heavy HF loss)
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(0.0, 0.999);
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    /// Process one sample. `offset` (in samples) shifts only the read tap;
    /// the nominal delay is left untouched.
    #[inline]
    pub fn process(&mut self, input: f32, offset: f32) -> f32 {
        let delay = (self.delay + offset).clamp(1.0, self.max_delay);
        let delayed = self.line.read(delay);

        self.filter_state = delayed * (1.0 - self.damping) + self.filter_state * self.damping;
        self.line.write(input + self.filter_state * self.feedback);

        delayed
    }
}

impl Default for DampedComb {
    fn default() -> Self {
        Self::new()
    }
}
