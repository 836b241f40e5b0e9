use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;
use midir::{MidiInput, MidiInputConnection};

use super::clock::ClockTracker;
use super::message::MidiMessage;
use crate::types::ControlEvent;

/// Which MIDI messages open and close the transition gate
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateMapping {
    /// Trigger note; with neither a note nor a CC set, any note gates
    pub note: Option<u8>,
    /// Controller that gates at values >= 64
    pub cc: Option<u8>,
    /// 0-15, `None` for omni
    pub channel: Option<u8>,
}

impl GateMapping {
    fn accepts_channel(&self, channel: u8) -> bool {
        self.channel.is_none_or(|wanted| wanted == channel)
    }

    fn matches_note(&self, note: u8) -> bool {
        match (self.note, self.cc) {
            (Some(trigger), _) => trigger == note,
            (None, None) => true,
            (None, Some(_)) => false,
        }
    }
}

/// Turns incoming MIDI into engine control events
#[derive(Debug, Clone, Default)]
pub struct MidiRouter {
    mapping: GateMapping,
    clock: ClockTracker,
}

impl MidiRouter {
    pub fn new(mapping: GateMapping) -> Self {
        Self {
            mapping,
            clock: ClockTracker::new(),
        }
    }

    pub fn route(&mut self, timestamp_us: u64, message: MidiMessage) -> Option<ControlEvent> {
        if let Some(channel) = message.channel() {
            if !self.mapping.accepts_channel(channel) {
                return None;
            }
        }

        match message {
            MidiMessage::NoteOn { note, .. } if self.mapping.matches_note(note) => {
                Some(ControlEvent::gate_on())
            }
            MidiMessage::NoteOff { note, .. } if self.mapping.matches_note(note) => {
                Some(ControlEvent::gate_off())
            }
            MidiMessage::ControlChange {
                controller, value, ..
            } if self.mapping.cc == Some(controller) => Some(ControlEvent::Gate { on: value >= 64 }),
            MidiMessage::Clock => self.clock.pulse(timestamp_us).map(ControlEvent::tempo),
            MidiMessage::Start | MidiMessage::Continue => {
                self.clock.reset();
                None
            }
            MidiMessage::Stop => {
                self.clock.reset();
                Some(ControlEvent::clock_stopped())
            }
            _ => None,
        }
    }
}

/// MIDI input handler
/// Manages MIDI device connection and sends events to audio thread
pub struct MidiHandler {
    _connection: MidiInputConnection<MidiRouter>,
}

impl MidiHandler {
    /// Connect to the input port at `port_index` and start routing messages
    pub fn connect(
        port_index: usize,
        mapping: GateMapping,
        event_tx: Sender<ControlEvent>,
    ) -> Result<Self> {
        let mut midi_in = MidiInput::new("cosmos-verb-input")?;
        // Clock and transport are needed for tempo sync
        midi_in.ignore(midir::Ignore::SysexAndActiveSense);

        let ports = midi_in.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| anyhow!("MIDI device index {} not available", port_index))?;
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        let connection = midi_in
            .connect(
                port,
                "cosmos-verb-input",
                move |timestamp, bytes, router| {
                    let message = MidiMessage::parse(bytes);
                    if let Some(event) = router.route(timestamp, message) {
                        if let ControlEvent::Tempo { bpm } = event {
                            log::debug!("MIDI clock tempo: {:?}", bpm);
                        }
                        // Use try_send to avoid blocking MIDI thread
                        let _ = event_tx.try_send(event);
                    }
                },
                MidiRouter::new(mapping),
            )
            .map_err(|e| anyhow!("Failed to connect to MIDI port: {}", e))?;

        log::info!("Connected to MIDI input: {} ({:?})", port_name, mapping);

        Ok(Self {
            _connection: connection,
        })
    }

    /// List all available MIDI input devices
    pub fn list_devices() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("cosmos-verb-list")?;
        let ports = midi_in.ports();

        let mut devices = Vec::new();
        for port in ports.iter() {
            if let Ok(name) = midi_in.port_name(port) {
                devices.push(name);
            }
        }

        Ok(devices)
    }
}

/// Find MIDI device index by name or index string
pub fn find_device(devices: &[String], search: &str) -> Result<usize> {
    // Try to parse as index first
    if let Ok(index) = search.parse::<usize>() {
        if index < devices.len() {
            return Ok(index);
        }
        return Err(anyhow!(
            "MIDI device index {} out of range ({} devices)",
            index,
            devices.len()
        ));
    }

    // Search by name (case-insensitive substring match)
    let search_lower = search.to_lowercase();
    devices
        .iter()
        .position(|device| device.to_lowercase().contains(&search_lower))
        .ok_or_else(|| anyhow!("MIDI device '{}' not found", search))
}
