/// Control events sent from the MIDI thread to the audio thread
/// Must be simple and fast to construct/parse
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    /// Transition gate opened or closed (note or CC)
    Gate { on: bool },
    /// Tempo measured from MIDI clock, `None` once the clock stops
    Tempo { bpm: Option<f32> },
}

impl ControlEvent {
    pub fn gate_on() -> Self {
        ControlEvent::Gate { on: true }
    }

    pub fn gate_off() -> Self {
        ControlEvent::Gate { on: false }
    }

    pub fn tempo(bpm: f32) -> Self {
        ControlEvent::Tempo { bpm: Some(bpm) }
    }

    pub fn clock_stopped() -> Self {
        ControlEvent::Tempo { bpm: None }
    }
}
