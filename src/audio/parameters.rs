use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::types::FairingSync;

/// Continuous parameters, in the units the user sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Decay,
    PreDelay,
    HighCut,
    LowCut,
    Width,
    Thrust,
    Chaos,
    Mix,
    InputGain,
    OutputGain,
    Tempo,
}

impl Param {
    pub const ALL: [Param; 11] = [
        Param::Decay,
        Param::PreDelay,
        Param::HighCut,
        Param::LowCut,
        Param::Width,
        Param::Thrust,
        Param::Chaos,
        Param::Mix,
        Param::InputGain,
        Param::OutputGain,
        Param::Tempo,
    ];

    /// Valid (min, max) range
    pub fn range(self) -> (f32, f32) {
        match self {
            Param::Decay => (0.5, 30.0),
            Param::PreDelay => (0.0, 500.0),
            Param::HighCut => (1000.0, 20000.0),
            Param::LowCut => (20.0, 500.0),
            Param::Width => (0.0, 200.0),
            Param::Thrust | Param::Chaos | Param::Mix => (0.0, 100.0),
            Param::InputGain | Param::OutputGain => (-24.0, 12.0),
            Param::Tempo => (20.0, 300.0),
        }
    }

    pub fn default_value(self) -> f32 {
        match self {
            Param::Decay => 5.0,
            Param::PreDelay => 20.0,
            Param::HighCut => 12000.0,
            Param::LowCut => 80.0,
            Param::Width => 100.0,
            Param::Thrust => 50.0,
            Param::Chaos => 30.0,
            Param::Mix => 35.0,
            Param::InputGain | Param::OutputGain => 0.0,
            Param::Tempo => 120.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Param::Decay => "Decay",
            Param::PreDelay => "Pre-Delay",
            Param::HighCut => "High Cut",
            Param::LowCut => "Low Cut",
            Param::Width => "Width",
            Param::Thrust => "Thrust",
            Param::Chaos => "Chaos",
            Param::Mix => "Mix",
            Param::InputGain => "Input",
            Param::OutputGain => "Output",
            Param::Tempo => "Tempo",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Param::Decay => "s",
            Param::PreDelay => "ms",
            Param::HighCut | Param::LowCut => "Hz",
            Param::Width | Param::Thrust | Param::Chaos | Param::Mix => "%",
            Param::InputGain | Param::OutputGain => "dB",
            Param::Tempo => "BPM",
        }
    }

    /// Increment for one key press
    pub fn step(self) -> f32 {
        match self {
            Param::Decay => 0.5,
            Param::PreDelay => 5.0,
            Param::HighCut => 500.0,
            Param::LowCut => 10.0,
            Param::Width | Param::Thrust | Param::Chaos | Param::Mix => 5.0,
            Param::InputGain | Param::OutputGain => 0.5,
            Param::Tempo => 1.0,
        }
    }

    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.range();
        if value.is_nan() {
            return self.default_value();
        }
        value.clamp(min, max)
    }
}

/// Thread-safe parameter storage using atomic operations
/// Allows real-time audio thread to read parameters without blocking
pub struct ReverbParameters {
    /// RT60 target in seconds
    pub decay: AtomicF32,
    /// Pre-delay in milliseconds
    pub pre_delay: AtomicF32,
    /// Low-pass cutoff and comb damping in Hz
    pub high_cut: AtomicF32,
    /// High-pass cutoff in Hz
    pub low_cut: AtomicF32,
    /// Stereo width in percent
    pub width: AtomicF32,
    /// Diffusion amount in percent
    pub thrust: AtomicF32,
    /// Modulation amount in percent
    pub chaos: AtomicF32,
    /// Wet share of the output in percent
    pub mix: AtomicF32,
    pub input_gain: AtomicF32,
    pub output_gain: AtomicF32,
    /// Fallback tempo when no MIDI clock is running
    pub tempo: AtomicF32,
    /// Gate for the transition effect; rising edges trigger it
    pub fairing_enabled: AtomicBool,
    /// Transition length, `FairingSync` as u8
    pub fairing_sync: AtomicU8,
}

impl ReverbParameters {
    pub fn new() -> Self {
        Self {
            decay: AtomicF32::new(Param::Decay.default_value()),
            pre_delay: AtomicF32::new(Param::PreDelay.default_value()),
            high_cut: AtomicF32::new(Param::HighCut.default_value()),
            low_cut: AtomicF32::new(Param::LowCut.default_value()),
            width: AtomicF32::new(Param::Width.default_value()),
            thrust: AtomicF32::new(Param::Thrust.default_value()),
            chaos: AtomicF32::new(Param::Chaos.default_value()),
            mix: AtomicF32::new(Param::Mix.default_value()),
            input_gain: AtomicF32::new(Param::InputGain.default_value()),
            output_gain: AtomicF32::new(Param::OutputGain.default_value()),
            tempo: AtomicF32::new(Param::Tempo.default_value()),
            fairing_enabled: AtomicBool::new(false),
            fairing_sync: AtomicU8::new(FairingSync::default().to_u8()),
        }
    }

    fn slot(&self, param: Param) -> &AtomicF32 {
        match param {
            Param::Decay => &self.decay,
            Param::PreDelay => &self.pre_delay,
            Param::HighCut => &self.high_cut,
            Param::LowCut => &self.low_cut,
            Param::Width => &self.width,
            Param::Thrust => &self.thrust,
            Param::Chaos => &self.chaos,
            Param::Mix => &self.mix,
            Param::InputGain => &self.input_gain,
            Param::OutputGain => &self.output_gain,
            Param::Tempo => &self.tempo,
        }
    }

    pub fn get(&self, param: Param) -> f32 {
        self.slot(param).load(Ordering::Relaxed)
    }

    /// Store a value, clamped to the parameter's range
    pub fn set(&self, param: Param, value: f32) {
        self.slot(param).store(param.clamp(value), Ordering::Relaxed);
    }

    pub fn fairing_enabled(&self) -> bool {
        self.fairing_enabled.load(Ordering::Relaxed)
    }

    pub fn set_fairing_enabled(&self, enabled: bool) {
        self.fairing_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn fairing_sync(&self) -> FairingSync {
        FairingSync::from_u8(self.fairing_sync.load(Ordering::Relaxed))
    }

    pub fn set_fairing_sync(&self, sync: FairingSync) {
        self.fairing_sync.store(sync.to_u8(), Ordering::Relaxed);
    }

    /// Read every parameter once, converted to processing units
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            decay: Param::Decay.clamp(self.get(Param::Decay)),
            pre_delay_ms: Param::PreDelay.clamp(self.get(Param::PreDelay)),
            high_cut_hz: Param::HighCut.clamp(self.get(Param::HighCut)),
            low_cut_hz: Param::LowCut.clamp(self.get(Param::LowCut)),
            width: Param::Width.clamp(self.get(Param::Width)) / 100.0,
            thrust: Param::Thrust.clamp(self.get(Param::Thrust)) / 100.0,
            chaos: Param::Chaos.clamp(self.get(Param::Chaos)) / 100.0,
            mix: Param::Mix.clamp(self.get(Param::Mix)) / 100.0,
            input_gain: db_to_gain(Param::InputGain.clamp(self.get(Param::InputGain))),
            output_gain: db_to_gain(Param::OutputGain.clamp(self.get(Param::OutputGain))),
            tempo: Param::Tempo.clamp(self.get(Param::Tempo)),
            fairing_enabled: self.fairing_enabled(),
            sync_beats: self.fairing_sync().beats(),
        }
    }
}

impl Default for ReverbParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Parameter values for one audio block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub decay: f32,
    pub pre_delay_ms: f32,
    pub high_cut_hz: f32,
    pub low_cut_hz: f32,
    /// 0-2
    pub width: f32,
    /// 0-1
    pub thrust: f32,
    /// 0-1
    pub chaos: f32,
    /// 0-1
    pub mix: f32,
    /// Linear gain
    pub input_gain: f32,
    /// Linear gain
    pub output_gain: f32,
    pub tempo: f32,
    pub fairing_enabled: bool,
    pub sync_beats: f32,
}

pub fn db_to_gain(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Atomic f32 wrapper for lock-free parameter updates
pub struct AtomicF32 {
    storage: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            storage: AtomicU32::new(value.to_bits()),
        }
    }

    pub fn load(&self, ordering: Ordering) -> f32 {
        f32::from_bits(self.storage.load(ordering))
    }

    pub fn store(&self, value: f32, ordering: Ordering) {
        self.storage.store(value.to_bits(), ordering);
    }
}
