/// Extra slots past the longest requested delay so the interpolating read
/// never touches the sample being written.
const INTERPOLATION_HEADROOM: usize = 4;

/// Circular sample buffer with a linearly interpolated fractional read
///
/// Reads are relative to the next write position: calling `read(n)` before
/// `write` returns the sample written `n` calls ago. Callers clamp the delay
/// to `1..=capacity()-1`; the line itself does not.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create an empty line. Nothing is allocated until `prepare`.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            write_pos: 0,
        }
    }

    /// Allocate room for delays up to `max_delay_samples`
    pub fn prepare(&mut self, max_delay_samples: usize) {
        self.buffer = vec![0.0; max_delay_samples + INTERPOLATION_HEADROOM];
        self.write_pos = 0;
    }

    /// Zero the buffer without reallocating
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    /// Number of slots in the buffer
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest delay that can be read back, in samples
    pub fn max_delay(&self) -> f32 {
        self.buffer.len().saturating_sub(1) as f32
    }

    /// Store a sample at the cursor and advance
    #[inline]
    pub fn write(&mut self, sample: f32) {
        if self.buffer.is_empty() {
            return;
        }
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos >= self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Read `delay_samples` behind the cursor with linear interpolation
    #[inline]
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }

        let mut read_pos = self.write_pos as f32 - delay_samples;
        if read_pos < 0.0 {
            read_pos += len as f32;
        }

        let idx0 = (read_pos as usize) % len;
        let idx1 = (idx0 + 1) % len;
        let frac = read_pos - read_pos.floor();

        self.buffer[idx0] * (1.0 - frac) + self.buffer[idx1] * frac
    }
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}
