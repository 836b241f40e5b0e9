use std::f32::consts::PI;

/// Normalized biquad coefficients (a0 folded in)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoeffs {
    /// Pass-through coefficients
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Second-order low-pass
    pub fn lowpass(sample_rate: f32, cutoff_hz: f32, q: f32) -> Self {
        let (cos_w, alpha) = Self::prewarp(sample_rate, cutoff_hz, q);

        Self::normalize(
            (1.0 - cos_w) / 2.0,
            1.0 - cos_w,
            (1.0 - cos_w) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w,
            1.0 - alpha,
        )
    }

    /// Second-order high-pass
    pub fn highpass(sample_rate: f32, cutoff_hz: f32, q: f32) -> Self {
        let (cos_w, alpha) = Self::prewarp(sample_rate, cutoff_hz, q);

        Self::normalize(
            (1.0 + cos_w) / 2.0,
            -(1.0 + cos_w),
            (1.0 + cos_w) / 2.0,
            1.0 + alpha,
            -2.0 * cos_w,
            1.0 - alpha,
        )
    }

    /// Band-pass with 0 dB gain at the center frequency
    pub fn bandpass(sample_rate: f32, center_hz: f32, q: f32) -> Self {
        let (cos_w, alpha) = Self::prewarp(sample_rate, center_hz, q);

        Self::normalize(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
    }

    /// Low shelf boosting (or cutting) everything below `freq_hz` by `gain_db`
    pub fn low_shelf(sample_rate: f32, freq_hz: f32, q: f32, gain_db: f32) -> Self {
        let a = 10.0f32.powf(gain_db / 40.0);
        let (cos_w, alpha) = Self::prewarp(sample_rate, freq_hz, q);
        let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;

        Self::normalize(
            a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
            2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
            a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
            (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
            -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
            (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
        )
    }

    /// Returns (cos w0, alpha) with the frequency kept below Nyquist
    fn prewarp(sample_rate: f32, freq_hz: f32, q: f32) -> (f32, f32) {
        let freq = freq_hz.clamp(10.0, sample_rate * 0.49);
        let omega = 2.0 * PI * freq / sample_rate;
        (omega.cos(), omega.sin() / (2.0 * q.max(0.01)))
    }

    fn normalize(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Direct form I biquad section
/// Coefficients can be swapped at any time without touching the state
pub struct Biquad {
    coeffs: BiquadCoeffs,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Create a pass-through filter
    pub fn new() -> Self {
        Self::with_coeffs(BiquadCoeffs::IDENTITY)
    }

    pub fn with_coeffs(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn coeffs(&self) -> BiquadCoeffs {
        self.coeffs
    }

    /// Process one sample
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let c = &self.coeffs;
        let output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Filter a block in place
    pub fn process_block(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Reset filter state
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    /// Steady-state peak of a sine at `freq` after the filter settles
    fn sine_gain(coeffs: BiquadCoeffs, freq: f32) -> f32 {
        let mut filter = Biquad::with_coeffs(coeffs);
        let mut peak = 0.0f32;
        for n in 0..(SR as usize) {
            let x = (2.0 * PI * freq * n as f32 / SR).sin();
            let y = filter.process(x);
            if n > SR as usize / 2 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_identity_passes_through() {
        let mut filter = Biquad::new();
        for x in [0.3, -1.0, 0.7] {
            assert_eq!(filter.process(x), x);
        }
    }

    #[test]
    fn test_lowpass_dc() {
        let mut filter = Biquad::with_coeffs(BiquadCoeffs::lowpass(SR, 1000.0, 0.707));

        // Feed DC signal (1.0)
        let mut output = 0.0;
        for _ in 0..2000 {
            output = filter.process(1.0);
        }

        assert!((output - 1.0).abs() < 0.01, "DC response should be ~1.0");
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let gain = sine_gain(BiquadCoeffs::lowpass(SR, 1000.0, 0.707), 10000.0);
        assert!(gain < 0.05, "10 kHz should be well attenuated: {}", gain);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = Biquad::with_coeffs(BiquadCoeffs::highpass(SR, 100.0, 0.707));

        let mut output = 1.0;
        for _ in 0..20000 {
            output = filter.process(1.0);
        }

        assert!(output.abs() < 0.01, "DC should be blocked: {}", output);
    }

    #[test]
    fn test_bandpass_unity_at_center() {
        let gain = sine_gain(BiquadCoeffs::bandpass(SR, 1000.0, 2.0), 1000.0);
        assert!((gain - 1.0).abs() < 0.05, "center gain: {}", gain);

        let off = sine_gain(BiquadCoeffs::bandpass(SR, 1000.0, 2.0), 8000.0);
        assert!(off < 0.3, "off-center gain: {}", off);
    }

    #[test]
    fn test_low_shelf_boost() {
        let coeffs = BiquadCoeffs::low_shelf(SR, 400.0, 0.7, 6.0);

        let low = sine_gain(coeffs, 40.0);
        let high = sine_gain(coeffs, 10000.0);

        // +6 dB is a gain of ~2 well below the shelf, unity well above
        assert!((low - 2.0).abs() < 0.1, "low gain: {}", low);
        assert!((high - 1.0).abs() < 0.05, "high gain: {}", high);
    }

    #[test]
    fn test_flat_shelf_is_transparent() {
        let coeffs = BiquadCoeffs::low_shelf(SR, 400.0, 0.7, 0.0);
        assert!((coeffs.b0 - 1.0).abs() < 1e-5);
        assert!((coeffs.b1 - coeffs.a1).abs() < 1e-5);
        assert!((coeffs.b2 - coeffs.a2).abs() < 1e-5);
    }

    #[test]
    fn test_cutoff_above_nyquist_is_stable() {
        let mut filter = Biquad::with_coeffs(BiquadCoeffs::lowpass(22050.0, 20000.0, 0.707));
        for n in 0..10000 {
            let y = filter.process(if n % 2 == 0 { 1.0 } else { -1.0 });
            assert!(y.is_finite());
        }
    }

    #[test]
    fn test_filter_reset() {
        let mut filter = Biquad::with_coeffs(BiquadCoeffs::lowpass(SR, 1000.0, 0.707));
        for _ in 0..10 {
            filter.process(1.0);
        }

        filter.reset();

        assert_eq!(filter.y1, 0.0);
        assert_eq!(filter.x1, 0.0);
    }
}
