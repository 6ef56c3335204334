use serde::{Deserialize, Serialize};

use crate::midi::note_name;

/// Where a command came from. Only live input is recorded into the pattern;
/// control-sourced notes just audition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandSource {
    Control,
    LiveInput,
}

/// Control-domain requests, applied by the audio thread at the start of the
/// next block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // Transport
    Play,
    Stop,
    /// Stop and rewind to tick 0
    Reset,
    /// Rewind and erase every track and all automation
    ResetAndClear,
    Record,
    ToggleRecord,
    SetBpm(u16),
    AdjustBpm(i16),
    SetPatternBars(u8),

    // Performance input
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    AllNotesOff,

    // Sound
    /// Factory preset by index; out-of-range indices are ignored
    LoadPreset(usize),

    // Mapping
    SetBank(usize),

    // Recording
    SetOverdub(bool),
    SetBlend(bool),
    ClearTrack(usize),
    ClearAllTracks,
    ClearAutomation,
    ClearAutomationCc(u8),
}

impl Command {
    /// Note and CC traffic is logged as MIDI events instead
    pub fn is_loggable(&self) -> bool {
        !matches!(
            self,
            Command::NoteOn { .. } | Command::NoteOff { .. } | Command::ControlChange { .. }
        )
    }

    /// Human-readable description of the command
    pub fn description(&self) -> String {
        match self {
            Command::Play => "Play".to_string(),
            Command::Stop => "Stop".to_string(),
            Command::Reset => "Reset".to_string(),
            Command::ResetAndClear => "Reset and clear".to_string(),
            Command::Record => "Record".to_string(),
            Command::ToggleRecord => "Toggle record".to_string(),
            Command::SetBpm(bpm) => format!("Set BPM to {}", bpm),
            Command::AdjustBpm(delta) => format!("Adjust BPM by {:+}", delta),
            Command::SetPatternBars(bars) => format!("Set pattern length to {} bars", bars),
            Command::NoteOn {
                channel,
                note,
                velocity,
            } => format!(
                "Note on {} vel {} ch {}",
                note_name(*note),
                velocity,
                channel + 1
            ),
            Command::NoteOff { channel, note } => {
                format!("Note off {} ch {}", note_name(*note), channel + 1)
            }
            Command::ControlChange {
                channel,
                control,
                value,
            } => format!("CC {} = {} ch {}", control, value, channel + 1),
            Command::AllNotesOff => "All notes off".to_string(),
            Command::LoadPreset(index) => format!("Load preset {}", index),
            Command::SetBank(bank) => format!("Select bank {}", bank),
            Command::SetOverdub(on) => {
                format!("Record mode {}", if *on { "overdub" } else { "replace" })
            }
            Command::SetBlend(on) => {
                format!("Automation blend {}", if *on { "on" } else { "off" })
            }
            Command::ClearTrack(track) => format!("Clear track {}", track),
            Command::ClearAllTracks => "Clear all tracks".to_string(),
            Command::ClearAutomation => "Clear automation".to_string(),
            Command::ClearAutomationCc(cc) => format!("Clear automation for CC {}", cc),
        }
    }
}
