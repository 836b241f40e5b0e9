/// MIDI clock resolution
pub const PULSES_PER_BEAT: usize = 24;

/// Gaps longer than this mean the clock stalled (below ~2.5 BPM)
const MAX_PULSE_INTERVAL_US: u64 = 1_000_000;

/// Estimates tempo from MIDI clock pulses, averaging one beat of intervals
#[derive(Debug, Clone)]
pub struct ClockTracker {
    last_pulse_us: Option<u64>,
    intervals: [u64; PULSES_PER_BEAT],
    position: usize,
    filled: usize,
}

impl ClockTracker {
    pub fn new() -> Self {
        Self {
            last_pulse_us: None,
            intervals: [0; PULSES_PER_BEAT],
            position: 0,
            filled: 0,
        }
    }

    /// Forget all timing, e.g. on start/stop
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Record a pulse at `timestamp_us`. Returns a tempo once per beat, as
    /// soon as a full beat of intervals has been seen.
    pub fn pulse(&mut self, timestamp_us: u64) -> Option<f32> {
        let previous = self.last_pulse_us.replace(timestamp_us)?;

        let interval = timestamp_us.saturating_sub(previous);
        if interval == 0 || interval > MAX_PULSE_INTERVAL_US {
            self.position = 0;
            self.filled = 0;
            return None;
        }

        self.intervals[self.position] = interval;
        self.position = (self.position + 1) % PULSES_PER_BEAT;
        self.filled = (self.filled + 1).min(PULSES_PER_BEAT);

        if self.filled < PULSES_PER_BEAT || self.position != 0 {
            return None;
        }

        let beat_us: u64 = self.intervals.iter().sum();
        Some(60_000_000.0 / beat_us as f32)
    }
}

impl Default for ClockTracker {
    fn default() -> Self {
        Self::new()
    }
}
