use super::delay_line::DelayLine;

/// Modulatable Schroeder allpass stage for diffusion
///
/// `y = -g*x + d`, and `x + g*d` is fed back into the line, where `d` is the
/// delayed sample. The delay accepts a per-sample offset so the stage can
/// wobble smoothly; interpolation in the line keeps fractional jumps clean.
pub struct AllpassDiffuser {
    line: DelayLine,
    max_delay: f32,
    delay: f32,
    feedback: f32,
}

impl AllpassDiffuser {
    pub fn new() -> Self {
        Self {
            line: DelayLine::new(),
            max_delay: 1.0,
            delay: 1.0,
            feedback: 0.5,
        }
    }

    /// Allocate the delay line for delays up to `max_delay_samples`
    pub fn prepare(&mut self, max_delay_samples: usize) {
        self.line.prepare(max_delay_samples);
        self.max_delay = (max_delay_samples as f32).clamp(1.0, self.line.max_delay());
        self.delay = self.delay.clamp(1.0, self.max_delay);
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }

    /// Set the nominal delay in samples
    pub fn set_delay(&mut self, delay_samples: f32) {
        self.delay = delay_samples.clamp(1.0, self.max_delay);
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(-0.99, 0.99);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Process one sample. `offset` is added to the nominal delay (in samples);
    /// pass `0.0` for a static stage.
    #[inline]
    pub fn process(&mut self, input: f32, offset: f32) -> f32 {
        let delay = (self.delay + offset).clamp(1.0, self.max_delay);
        let delayed = self.line.read(delay);

        let output = -self.feedback * input + delayed;
        self.line.write(input + self.feedback * delayed);

        output
    }
}

impl Default for AllpassDiffuser {
    fn default() -> Self {
        Self::new()
    }
}
