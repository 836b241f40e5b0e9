/// MIDI message types we care about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// Timing clock, 24 per quarter note
    Clock,
    Start,
    Continue,
    Stop,
    Unknown,
}

impl MidiMessage {
    /// Parse raw MIDI bytes into a message
    /// Handles standard MIDI protocol: [status, data1, data2]
    pub fn parse(bytes: &[u8]) -> Self {
        let Some(&status) = bytes.first() else {
            return MidiMessage::Unknown;
        };

        // System real-time messages are a single status byte
        match status {
            0xF8 => return MidiMessage::Clock,
            0xFA => return MidiMessage::Start,
            0xFB => return MidiMessage::Continue,
            0xFC => return MidiMessage::Stop,
            0xF0..=0xFF => return MidiMessage::Unknown,
            _ => {}
        }

        if bytes.len() < 3 {
            return MidiMessage::Unknown;
        }

        let channel = status & 0x0F;
        let (data1, data2) = (bytes[1], bytes[2]);

        match status & 0xF0 {
            // MIDI spec: Note On with velocity 0 is actually Note Off
            0x90 if data2 == 0 => MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: 0,
            },
            0x90 => MidiMessage::NoteOn {
                channel,
                note: data1,
                velocity: data2,
            },
            0x80 => MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: data2,
            },
            0xB0 => MidiMessage::ControlChange {
                channel,
                controller: data1,
                value: data2,
            },
            _ => MidiMessage::Unknown,
        }
    }

    /// Channel of a channel-voice message
    pub fn channel(&self) -> Option<u8> {
        match self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => Some(*channel),
            _ => None,
        }
    }
}
