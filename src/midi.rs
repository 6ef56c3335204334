use serde::{Deserialize, Serialize};

pub const NOTE_OFF: u8 = 0x80;
pub const NOTE_ON: u8 = 0x90;
pub const CONTROL_CHANGE: u8 = 0xB0;

/// Percussion pads live on channel 10 (index 9)
pub const DRUM_CHANNEL: u8 = 9;
/// Melodic synth notes and synth CCs live on channel 1 (index 0)
pub const SYNTH_CHANNEL: u8 = 0;

/// First and last pad note; pads map to drum tracks 0-7
pub const FIRST_PAD_NOTE: u8 = 36;
pub const LAST_PAD_NOTE: u8 = 43;

/// Convert MIDI note number to frequency in Hz
/// A4 (69) = 440 Hz
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

/// Note name from MIDI note number (e.g., 60 -> "C4", 61 -> "C#4")
pub fn note_name(note: u8) -> String {
    let names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i32 - 1;
    format!("{}{}", names[note as usize % 12], octave)
}

/// Pad index (0-7) for a percussion note, if it is in the pad range
pub fn pad_index(note: u8) -> Option<usize> {
    (FIRST_PAD_NOTE..=LAST_PAD_NOTE)
        .contains(&note)
        .then(|| (note - FIRST_PAD_NOTE) as usize)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn,
    NoteOff,
    ControlChange,
    Other,
}

/// One timestamped channel message. The tick is the pattern position
/// (0 to pattern length - 1) the event was recorded or replayed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiEvent {
    pub tick: u32,
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiEvent {
    pub fn new(tick: u32, status: u8, data1: u8, data2: u8) -> Self {
        Self {
            tick,
            status,
            data1,
            data2,
        }
    }

    pub fn note_on(tick: u32, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(tick, NOTE_ON | (channel & 0x0F), note, velocity)
    }

    pub fn note_off(tick: u32, channel: u8, note: u8) -> Self {
        Self::new(tick, NOTE_OFF | (channel & 0x0F), note, 0)
    }

    pub fn control_change(tick: u32, channel: u8, control: u8, value: u8) -> Self {
        Self::new(tick, CONTROL_CHANGE | (channel & 0x0F), control, value)
    }

    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// Velocity-0 note-ons count as note-offs
    pub fn kind(&self) -> EventKind {
        match self.status & 0xF0 {
            NOTE_ON if self.data2 > 0 => EventKind::NoteOn,
            NOTE_ON | NOTE_OFF => EventKind::NoteOff,
            CONTROL_CHANGE => EventKind::ControlChange,
            _ => EventKind::Other,
        }
    }

    pub fn describe(&self) -> String {
        match self.kind() {
            EventKind::NoteOn => format!(
                "ch{} note on {} vel {}",
                self.channel() + 1,
                note_name(self.data1),
                self.data2
            ),
            EventKind::NoteOff => {
                format!("ch{} note off {}", self.channel() + 1, note_name(self.data1))
            }
            EventKind::ControlChange => {
                format!("ch{} cc {} = {}", self.channel() + 1, self.data1, self.data2)
            }
            EventKind::Other => format!(
                "status {:02X} {} {}",
                self.status, self.data1, self.data2
            ),
        }
    }
}
