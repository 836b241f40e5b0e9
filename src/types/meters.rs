/// Levels published by the audio thread for display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterSnapshot {
    /// Smoothed wet peak from the reverb core
    pub decay_envelope: f32,
    pub transition_active: bool,
    /// Transition envelope (0-1)
    pub transition_intensity: f32,
    /// Per-channel peaks after input gain
    pub input_peak: [f32; 2],
    /// Per-channel peaks after output gain
    pub output_peak: [f32; 2],
}

impl MeterSnapshot {
    /// Combine two snapshots: latest state, loudest peaks
    pub fn merge(self, newer: MeterSnapshot) -> MeterSnapshot {
        MeterSnapshot {
            decay_envelope: newer.decay_envelope,
            transition_active: newer.transition_active,
            transition_intensity: newer.transition_intensity,
            input_peak: [
                self.input_peak[0].max(newer.input_peak[0]),
                self.input_peak[1].max(newer.input_peak[1]),
            ],
            output_peak: [
                self.output_peak[0].max(newer.output_peak[0]),
                self.output_peak[1].max(newer.output_peak[1]),
            ],
        }
    }
}
