//! Composition root.
//!
//! [`build`] creates every component once and splits them into the
//! audio-side [`Engine`] and the control-side [`Controller`]. The two halves
//! only meet through the command bus, the playback event queue, edge flags
//! and shared atomics.

pub mod controller;
pub(crate) mod router;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::automation::{is_automated, Automation};
use crate::command::{command_bus, Command, CommandReceiver, CommandSource};
use crate::config::EngineConfig;
use crate::event::EventLog;
use crate::midi::{EventKind, MidiEvent, SYNTH_CHANNEL};
use crate::mapping::CcMapper;
use crate::sequencer::{Sequencer, Transport};
use crate::sync::{event_queue, EdgeFlag, EngineStatus, EventProducer, SharedParams, SharedState};
use crate::synth::SynthEngine;

pub use controller::{Controller, EngineFlags, FaderFlags, PollReport, StatusSnapshot};
use router::{apply_automation, apply_target, route_note, PlaybackRouter};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

/// The percussion mixer the engine drives. Only `trigger` is required.
pub trait DrumSink: Send {
    /// Fire pad 0-7
    fn trigger(&mut self, pad: usize, velocity: u8);

    fn set_level(&mut self, _pad: usize, _level: f32) {}

    fn set_pan(&mut self, _pad: usize, _pan: f32) {}

    fn set_master_level(&mut self, _level: f32) {}

    fn active_count(&self) -> usize {
        0
    }

    fn process_stereo(&mut self) -> (f32, f32) {
        (0.0, 0.0)
    }
}

/// Drum sink for running without a mixer
pub struct SilentDrums;

impl DrumSink for SilentDrums {
    fn trigger(&mut self, _pad: usize, _velocity: u8) {}
}

/// Build the engine pair from `config`
pub fn build(config: &EngineConfig, drums: Box<dyn DrumSink>) -> (Engine, Controller) {
    let sample_rate = config.sample_rate.max(1) as f32;

    let params = Arc::new(SharedParams::default());
    if !params.load_preset(config.preset) {
        log::warn!("Preset {} does not exist, keeping the init patch", config.preset);
    }

    let mut transport = Transport::new(sample_rate);
    transport.set_bpm(config.bpm);
    transport.set_pattern_bars(config.pattern_bars);
    // Configuration is not a state change
    transport.check_state_changed();

    let mut sequencer = Sequencer::new();
    sequencer.set_overdub(config.overdub);

    let mut automation = Automation::new();
    automation.set_blend(config.blend);

    let synth = SynthEngine::new(sample_rate, Arc::clone(&params));
    let mapper = CcMapper::with_bank(config.bank);

    let (commands, receiver) = command_bus(config.command_capacity);
    let (producer, consumer) = event_queue(config.event_queue_capacity);
    let state = Arc::new(SharedState::new());
    let voice_count_changed = EdgeFlag::shared();

    let flags = EngineFlags {
        state_changed: transport.state_changed_flag(),
        pattern_looped: transport.pattern_looped_flag(),
        voice_count_changed: Arc::clone(&voice_count_changed),
        nan_detected: synth.nan_flag(),
        stuck_voice: synth.stuck_voice_flag(),
        bank_changed: mapper.bank_changed_flag(),
    };

    let engine = Engine {
        transport,
        sequencer,
        synth,
        automation,
        mapper,
        drums,
        commands: receiver,
        events: producer,
        state: Arc::clone(&state),
        voice_count_changed,
        last_voice_counts: (0, 0),
    };
    engine.publish();

    let log = Arc::new(RwLock::new(EventLog::with_capacity(config.event_log_capacity)));
    let controller = Controller::new(commands, consumer, state, params, flags, log);

    (engine, controller)
}

/// Audio-side half. Everything here runs inside the audio callback and
/// never blocks or allocates.
pub struct Engine {
    transport: Transport,
    sequencer: Sequencer,
    synth: SynthEngine,
    automation: Automation,
    mapper: CcMapper,
    drums: Box<dyn DrumSink>,
    commands: CommandReceiver,
    events: EventProducer,
    state: Arc<SharedState>,
    voice_count_changed: Arc<EdgeFlag>,
    last_voice_counts: (usize, usize),
}

impl Engine {
    /// Render one block. Pending commands apply before the first frame and
    /// status is published after the last.
    pub fn process_block(&mut self, out: &mut [StereoFrame]) {
        self.drain_commands();
        for frame in out.iter_mut() {
            *frame = self.process_frame();
        }
        self.after_block();
    }

    /// Interleaved stereo variant for device callbacks
    pub fn process_interleaved(&mut self, out: &mut [f32], channels: usize) {
        self.drain_commands();
        for frame in out.chunks_mut(channels.max(1)) {
            let StereoFrame { left, right } = self.process_frame();
            for (ch, sample) in frame.iter_mut().enumerate() {
                *sample = match ch {
                    0 => left,
                    1 => right,
                    _ => (left + right) * 0.5,
                };
            }
        }
        self.after_block();
    }

    pub fn process_frame(&mut self) -> StereoFrame {
        if self.transport.process() {
            self.on_tick(self.transport.tick());
        }

        let (synth_l, synth_r) = self.synth.process_stereo();
        let (drum_l, drum_r) = self.drums.process_stereo();
        let master = self.mapper.master_output();

        StereoFrame {
            left: (synth_l + drum_l) * master,
            right: (synth_r + drum_r) * master,
        }
    }

    fn on_tick(&mut self, tick: u32) {
        let mut router = PlaybackRouter {
            synth: &mut self.synth,
            drums: &mut *self.drums,
            events: &mut self.events,
        };
        self.sequencer.process(tick, &mut router);

        let synth = &mut self.synth;
        let mapper = &mut self.mapper;
        self.automation.process(tick, |slot, _cc, value| {
            apply_automation(slot, value, synth, mapper)
        });
    }

    pub fn drain_commands(&mut self) {
        while let Some((cmd, source)) = self.commands.try_recv() {
            self.handle_command(cmd, source);
        }
    }

    pub fn handle_command(&mut self, cmd: Command, source: CommandSource) {
        match cmd {
            Command::Play => {
                let was_stopped = self.transport.is_stopped();
                self.automation.capture_base_values();
                self.automation.reset_playback();
                self.transport.play();
                self.prime_if_fresh(was_stopped);
            }
            Command::Stop => {
                self.transport.stop();
                self.silence_and_rewind_cursors();
            }
            Command::Reset => {
                self.transport.stop_and_reset();
                self.silence_and_rewind_cursors();
            }
            Command::ResetAndClear => {
                self.transport.stop_and_reset();
                self.silence_and_rewind_cursors();
                self.sequencer.clear();
                self.automation.clear();
            }
            Command::Record => {
                if !self.transport.is_recording() {
                    let was_stopped = self.transport.is_stopped();
                    self.transport.record();
                    self.sequencer.start_record_pass();
                    self.prime_if_fresh(was_stopped);
                }
            }
            Command::ToggleRecord => {
                let was_stopped = self.transport.is_stopped();
                self.transport.toggle_record();
                if self.transport.is_recording() {
                    self.sequencer.start_record_pass();
                }
                self.prime_if_fresh(was_stopped);
            }
            Command::SetBpm(bpm) => self.transport.set_bpm(bpm),
            Command::AdjustBpm(delta) => self.transport.adjust_bpm(delta),
            Command::SetPatternBars(bars) => self.transport.set_pattern_bars(bars),
            Command::NoteOn {
                channel,
                note,
                velocity,
            } => {
                let tick = self.transport.tick();
                let event = if velocity == 0 {
                    MidiEvent::note_off(tick, channel, note)
                } else {
                    MidiEvent::note_on(tick, channel, note, velocity)
                };
                self.live_note(event, source);
            }
            Command::NoteOff { channel, note } => {
                let event = MidiEvent::note_off(self.transport.tick(), channel, note);
                self.live_note(event, source);
            }
            Command::ControlChange {
                channel,
                control,
                value,
            } => self.live_cc(channel, control, value, source),
            Command::AllNotesOff => self.synth.all_notes_off(),
            Command::LoadPreset(index) => {
                self.synth.load_preset(index);
            }
            Command::SetBank(index) => self.mapper.set_bank_index(index),
            Command::SetOverdub(on) => self.sequencer.set_overdub(on),
            Command::SetBlend(on) => self.automation.set_blend(on),
            Command::ClearTrack(track) => self.sequencer.clear_track(track),
            Command::ClearAllTracks => self.sequencer.clear(),
            Command::ClearAutomation => self.automation.clear(),
            Command::ClearAutomationCc(cc) => self.automation.clear_cc(cc),
        }
    }

    /// A transport started from the very top has not played tick 0 yet;
    /// play it now so the first pass matches every later one
    fn prime_if_fresh(&mut self, was_stopped: bool) {
        if was_stopped && self.transport.state().is_running() && self.transport.at_fresh_start()
        {
            self.on_tick(0);
        }
    }

    fn silence_and_rewind_cursors(&mut self) {
        self.synth.all_notes_off();
        self.sequencer.reset_playback();
        self.automation.reset_playback();
    }

    fn live_note(&mut self, event: MidiEvent, source: CommandSource) {
        route_note(&event, &mut self.synth, &mut *self.drums);

        if source != CommandSource::LiveInput || !self.transport.is_recording() {
            return;
        }
        match event.kind() {
            EventKind::NoteOn => self.sequencer.record(event),
            // Drum hits are one-shots, only synth releases are kept
            EventKind::NoteOff if event.channel() == SYNTH_CHANNEL => self.sequencer.record(event),
            _ => {}
        }
    }

    fn live_cc(&mut self, channel: u8, control: u8, value: u8, source: CommandSource) {
        if let Some((target, out)) = self.mapper.process_cc(control, value) {
            apply_target(target, out, &mut self.synth, &mut *self.drums, &mut self.mapper);
        }

        if channel == SYNTH_CHANNEL && is_automated(control) {
            self.automation.update_current_value(control, value);
            if source == CommandSource::LiveInput && self.transport.is_recording() {
                self.automation
                    .record_cc(self.transport.tick(), control, value);
            }
        }
    }

    fn after_block(&mut self) {
        let counts = (self.synth.active_count(), self.drums.active_count());
        if counts != self.last_voice_counts {
            self.last_voice_counts = counts;
            self.voice_count_changed.raise();
        }
        self.publish();
    }

    fn publish(&self) {
        let track_events = std::array::from_fn(|i| self.sequencer.track_event_count(i) as u16);
        self.state.publish(&EngineStatus {
            transport: self.transport.state(),
            bpm: self.transport.bpm(),
            tick: self.transport.tick(),
            pattern_bars: self.transport.pattern_bars(),
            synth_voices: self.synth.active_count() as u8,
            drum_voices: self.drums.active_count().min(u8::MAX as usize) as u8,
            bank: self.mapper.bank().index(),
            faders_picked_up: self.mapper.picked_up_mask(),
            faders_need_pickup: self.mapper.needs_pickup_mask(),
            overdub: self.sequencer.is_overdub(),
            blend: self.automation.is_blend(),
            track_events,
            automation_points: self.automation.point_counts(),
            master_output: self.mapper.master_output(),
        });
    }

    pub fn sample_rate(&self) -> f32 {
        self.synth.sample_rate()
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// For loading a pattern before the engine is handed to the audio thread
    pub fn sequencer_mut(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    pub fn synth(&self) -> &SynthEngine {
        &self.synth
    }

    pub fn automation(&self) -> &Automation {
        &self.automation
    }

    pub fn automation_mut(&mut self) -> &mut Automation {
        &mut self.automation
    }

    pub fn mapper(&self) -> &CcMapper {
        &self.mapper
    }
}
