//! Parameter and signal smoothing for the real-time path.

/// One-pole smoother with a fixed per-sample coefficient
///
/// `value = value * coeff + target * (1 - coeff)`. A coefficient close to 1
/// moves slowly; the time constant is roughly `1 / (1 - coeff)` samples.
#[derive(Debug, Clone, Copy)]
pub struct OnePole {
    coeff: f32,
    value: f32,
}

impl OnePole {
    pub const fn new(coeff: f32) -> Self {
        Self { coeff, value: 0.0 }
    }

    /// Move one step toward `target` and return the new value
    #[inline]
    pub fn next(&mut self, target: f32) -> f32 {
        self.value = self.value * self.coeff + target * (1.0 - self.coeff);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Snap to a value
    pub fn reset(&mut self, value: f32) {
        self.value = value;
    }
}

/// Linear ramp spread across one audio block
///
/// `set_target` is called once per block with the block length; each
/// `next()` then steps evenly so the block ends exactly on the target.
#[derive(Debug, Clone, Copy)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: usize,
}

impl LinearRamp {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Start ramping toward `target` over `frames` samples
    pub fn set_target(&mut self, target: f32, frames: usize) {
        // Finish any ramp still in flight before starting the next
        self.current = self.target;
        self.target = target;

        if frames == 0 || (target - self.current).abs() < f32::EPSILON {
            self.current = target;
            self.step = 0.0;
            self.remaining = 0;
        } else {
            self.step = (target - self.current) / frames as f32;
            self.remaining = frames;
        }
    }

    /// Next value along the ramp
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Snap to a value
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.remaining = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_pole_converges() {
        let mut smoother = OnePole::new(0.995);
        for _ in 0..10_000 {
            smoother.next(1.0);
        }
        assert!((smoother.value() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_one_pole_time_constant() {
        let mut smoother = OnePole::new(0.99);
        // ~63% after 1 / (1 - coeff) = 100 samples
        for _ in 0..100 {
            smoother.next(1.0);
        }
        assert!((smoother.value() - 0.634).abs() < 0.01, "{}", smoother.value());
    }

    #[test]
    fn test_ramp_lands_on_target_at_block_end() {
        let mut ramp = LinearRamp::new(0.0);
        ramp.set_target(1.0, 4);

        let values: Vec<f32> = (0..4).map(|_| ramp.next()).collect();
        assert!((values[0] - 0.25).abs() < 1e-6);
        assert!((values[1] - 0.5).abs() < 1e-6);
        assert_eq!(values[3], 1.0);

        // Holds afterwards
        assert_eq!(ramp.next(), 1.0);
    }

    #[test]
    fn test_ramp_is_monotonic() {
        let mut ramp = LinearRamp::new(1.0);
        ramp.set_target(0.2, 256);

        let mut last = 1.0;
        for _ in 0..256 {
            let v = ramp.next();
            assert!(v <= last);
            last = v;
        }
        assert_eq!(last, 0.2);
    }

    #[test]
    fn test_unchanged_target_is_flat() {
        let mut ramp = LinearRamp::new(0.5);
        ramp.set_target(0.5, 64);
        for _ in 0..64 {
            assert_eq!(ramp.next(), 0.5);
        }
    }

    #[test]
    fn test_new_target_starts_from_previous_target() {
        let mut ramp = LinearRamp::new(0.0);
        ramp.set_target(1.0, 10);
        ramp.next(); // abandon the ramp early
        ramp.set_target(1.0, 10);
        assert_eq!(ramp.next(), 1.0);
    }
}
