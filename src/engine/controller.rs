//! Control-side handle.
//!
//! Cheap operations write through shared atomics; everything the audio
//! callback owns goes over the command bus and lands at the next block
//! boundary.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::automation::NUM_AUTO_PARAMS;
use crate::command::{Command, CommandSender, CommandSource};
use crate::event::{Event, EventLog, EventSource};
use crate::mapping::{Bank, NUM_FADERS};
use crate::midi::MidiEvent;
use crate::sequencer::{Position, TransportState, NUM_TRACKS};
use crate::sync::{EdgeFlag, EventConsumer, SharedParams, SharedState};
use crate::synth::{preset_name, ParamId, SynthParams};

/// Edge flags raised by the audio domain
#[derive(Clone)]
pub struct EngineFlags {
    pub state_changed: Arc<EdgeFlag>,
    pub pattern_looped: Arc<EdgeFlag>,
    pub voice_count_changed: Arc<EdgeFlag>,
    pub nan_detected: Arc<EdgeFlag>,
    pub stuck_voice: Arc<EdgeFlag>,
    pub bank_changed: Arc<EdgeFlag>,
}

/// What one [`Controller::poll`] found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub events: usize,
    pub state_changed: bool,
    pub pattern_looped: bool,
    pub voice_count_changed: bool,
    pub nan_detected: bool,
    pub stuck_voice: bool,
    pub bank_changed: bool,
    /// Playback events lost to a full queue since the previous poll
    pub newly_dropped: u64,
    /// Commands refused by a full bus since the previous poll
    pub newly_dropped_commands: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FaderFlags {
    pub picked_up: bool,
    pub needs_pickup: bool,
}

/// Everything a status display needs, gathered without touching the audio
/// thread
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub transport: TransportState,
    pub playing: bool,
    pub recording: bool,
    pub bpm: u16,
    pub tick: u32,
    pub position: Position,
    pub pattern_bars: u8,
    pub synth_voices: u8,
    pub drum_voices: u8,
    pub preset: usize,
    pub preset_name: &'static str,
    pub synth: SynthParams,
    pub bank: usize,
    pub bank_name: &'static str,
    pub faders: [FaderFlags; NUM_FADERS],
    pub overdub: bool,
    pub blend: bool,
    pub track_events: [u16; NUM_TRACKS],
    pub automation_points: [u16; NUM_AUTO_PARAMS],
    pub master_output: f32,
    pub dropped_events: u64,
    /// Commands refused by a full bus
    pub dropped_commands: u64,
}

pub struct Controller {
    commands: CommandSender,
    events: EventConsumer,
    state: Arc<SharedState>,
    params: Arc<SharedParams>,
    flags: EngineFlags,
    log: Arc<RwLock<EventLog>>,
    last_dropped: u64,
    last_dropped_commands: u64,
}

impl Controller {
    pub(crate) fn new(
        commands: CommandSender,
        events: EventConsumer,
        state: Arc<SharedState>,
        params: Arc<SharedParams>,
        flags: EngineFlags,
        log: Arc<RwLock<EventLog>>,
    ) -> Self {
        Self {
            commands,
            events,
            state,
            params,
            flags,
            log,
            last_dropped: 0,
            last_dropped_commands: 0,
        }
    }

    /// Queue a control command. Returns false if the bus was full.
    pub fn send(&self, cmd: Command) -> bool {
        self.log.write().log_command(cmd.clone());
        self.commands.send(cmd, CommandSource::Control).is_sent()
    }

    pub fn play(&self) -> bool {
        self.send(Command::Play)
    }

    pub fn stop(&self) -> bool {
        self.send(Command::Stop)
    }

    /// Stop and rewind to the top of the pattern
    pub fn reset(&self) -> bool {
        self.send(Command::Reset)
    }

    /// Stop, rewind and erase every recorded event and automation point
    pub fn reset_and_clear(&self) -> bool {
        self.send(Command::ResetAndClear)
    }

    pub fn record(&self) -> bool {
        self.send(Command::Record)
    }

    pub fn toggle_record(&self) -> bool {
        self.send(Command::ToggleRecord)
    }

    pub fn set_bpm(&self, bpm: u16) -> bool {
        self.send(Command::SetBpm(bpm))
    }

    pub fn adjust_bpm(&self, delta: i16) -> bool {
        self.send(Command::AdjustBpm(delta))
    }

    pub fn set_pattern_bars(&self, bars: u8) -> bool {
        self.send(Command::SetPatternBars(bars))
    }

    pub fn all_notes_off(&self) -> bool {
        self.send(Command::AllNotesOff)
    }

    pub fn set_bank(&self, bank: Bank) -> bool {
        self.send(Command::SetBank(bank.index()))
    }

    pub fn set_overdub(&self, enabled: bool) -> bool {
        self.send(Command::SetOverdub(enabled))
    }

    pub fn set_blend(&self, enabled: bool) -> bool {
        self.send(Command::SetBlend(enabled))
    }

    pub fn clear_track(&self, track: usize) -> bool {
        self.send(Command::ClearTrack(track))
    }

    pub fn clear_all_tracks(&self) -> bool {
        self.send(Command::ClearAllTracks)
    }

    pub fn clear_automation(&self) -> bool {
        self.send(Command::ClearAutomation)
    }

    pub fn clear_automation_cc(&self, cc: u8) -> bool {
        self.send(Command::ClearAutomationCc(cc))
    }

    // Live input. These are what a recording pass captures.

    pub fn note_on(&self, channel: u8, note: u8, velocity: u8) -> bool {
        self.log
            .write()
            .log_midi(MidiEvent::note_on(0, channel, note, velocity), EventSource::LiveInput);
        self.commands.send(
            Command::NoteOn {
                channel,
                note,
                velocity,
            },
            CommandSource::LiveInput,
        )
        .is_sent()
    }

    pub fn note_off(&self, channel: u8, note: u8) -> bool {
        self.log
            .write()
            .log_midi(MidiEvent::note_off(0, channel, note), EventSource::LiveInput);
        self.commands
            .send(Command::NoteOff { channel, note }, CommandSource::LiveInput)
            .is_sent()
    }

    pub fn control_change(&self, channel: u8, control: u8, value: u8) -> bool {
        self.log.write().log_midi(
            MidiEvent::control_change(0, channel, control, value),
            EventSource::LiveInput,
        );
        self.commands.send(
            Command::ControlChange {
                channel,
                control,
                value,
            },
            CommandSource::LiveInput,
        )
        .is_sent()
    }

    /// Audition a note without it being eligible for recording
    pub fn audition(&self, channel: u8, note: u8, velocity: u8) -> bool {
        self.commands.send(
            Command::NoteOn {
                channel,
                note,
                velocity,
            },
            CommandSource::Control,
        )
        .is_sent()
    }

    // Synth parameters are shared atomics; the engine picks changes up
    // within one refresh interval.

    pub fn set_param(&self, id: ParamId, value: f32) {
        self.params.set(id, value);
    }

    /// Index form of [`Controller::set_param`]. Unknown indices are ignored.
    pub fn set_param_index(&self, index: usize, value: f32) -> bool {
        match ParamId::from_index(index) {
            Some(id) => {
                self.set_param(id, value);
                true
            }
            None => false,
        }
    }

    pub fn param(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    pub fn params(&self) -> SynthParams {
        self.params.snapshot()
    }

    /// Applied by the audio thread in order with controller input, so a knob
    /// turned just before or after the load keeps its place
    pub fn load_preset(&self, index: usize) -> bool {
        log::info!("Loading preset {} ({})", index, preset_name(index));
        self.send(Command::LoadPreset(index))
    }

    pub fn preset(&self) -> usize {
        self.params.preset_index()
    }

    /// Drain playback events into the log and collect raised flags
    pub fn poll(&mut self) -> PollReport {
        let mut report = PollReport::default();
        {
            let mut log = self.log.write();
            for event in self.events.drain() {
                log.log_midi(event, EventSource::Playback);
                report.events += 1;
            }
        }

        report.state_changed = self.flags.state_changed.take();
        report.pattern_looped = self.flags.pattern_looped.take();
        report.voice_count_changed = self.flags.voice_count_changed.take();
        report.nan_detected = self.flags.nan_detected.take();
        report.stuck_voice = self.flags.stuck_voice.take();
        report.bank_changed = self.flags.bank_changed.take();

        let dropped = self.events.dropped();
        report.newly_dropped = dropped - self.last_dropped;
        self.last_dropped = dropped;

        let dropped = self.commands.dropped();
        report.newly_dropped_commands = dropped - self.last_dropped_commands;
        self.last_dropped_commands = dropped;

        report
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let status = self.state.load();
        let preset = self.params.preset_index();
        let bank = Bank::from_index(status.bank).unwrap_or_default();
        let faders = std::array::from_fn(|i| FaderFlags {
            picked_up: status.faders_picked_up & (1 << i) != 0,
            needs_pickup: status.faders_need_pickup & (1 << i) != 0,
        });

        StatusSnapshot {
            transport: status.transport,
            playing: status.transport.is_running(),
            recording: status.transport == TransportState::Recording,
            bpm: status.bpm,
            tick: status.tick,
            position: Position::from_tick(status.tick),
            pattern_bars: status.pattern_bars,
            synth_voices: status.synth_voices,
            drum_voices: status.drum_voices,
            preset,
            preset_name: preset_name(preset),
            synth: self.params.snapshot(),
            bank: bank.index(),
            bank_name: bank.name(),
            faders,
            overdub: status.overdub,
            blend: status.blend,
            track_events: status.track_events,
            automation_points: status.automation_points,
            master_output: status.master_output,
            dropped_events: self.events.dropped(),
            dropped_commands: self.commands.dropped(),
        }
    }

    /// Log entries newer than `since_id`, oldest first
    pub fn events_since(&self, since_id: u64) -> Vec<Event> {
        self.log.read().get_events_since(since_id)
    }

    pub fn event_log(&self) -> Arc<RwLock<EventLog>> {
        Arc::clone(&self.log)
    }

    pub fn flags(&self) -> &EngineFlags {
        &self.flags
    }
}
