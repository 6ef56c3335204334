//! One routing path for everything that makes sound: sequencer playback,
//! live notes and mapped controller values.

use crate::automation::AUTO_PARAMS;
use crate::mapping::convert::{cc_to_norm, cc_to_pan, synth_value};
use crate::mapping::{CcMapper, ParamTarget};
use crate::midi::{pad_index, EventKind, MidiEvent, DRUM_CHANNEL, SYNTH_CHANNEL};
use crate::sequencer::PlaybackSink;
use crate::sync::EventProducer;
use crate::synth::SynthEngine;

use super::DrumSink;

/// Sends one note event to the instrument that owns its channel
pub(crate) fn route_note(event: &MidiEvent, synth: &mut SynthEngine, drums: &mut dyn DrumSink) {
    match (event.channel(), event.kind()) {
        (DRUM_CHANNEL, EventKind::NoteOn) => {
            if let Some(pad) = pad_index(event.data1) {
                drums.trigger(pad, event.data2);
            }
        }
        (SYNTH_CHANNEL, EventKind::NoteOn) => synth.note_on(event.data1, event.data2),
        (SYNTH_CHANNEL, EventKind::NoteOff) => synth.note_off(event.data1),
        _ => {}
    }
}

/// Apply a mapped controller value to its target
pub(crate) fn apply_target(
    target: ParamTarget,
    value: u8,
    synth: &mut SynthEngine,
    drums: &mut dyn DrumSink,
    mapper: &mut CcMapper,
) {
    match target {
        ParamTarget::Synth(id) => synth.set_param(id, synth_value(id, value)),
        ParamTarget::DrumLevel(pad) => drums.set_level(pad as usize, cc_to_norm(value)),
        ParamTarget::DrumPan(pad) => drums.set_pan(pad as usize, cc_to_pan(value)),
        ParamTarget::DrumMaster => drums.set_master_level(cc_to_norm(value)),
        ParamTarget::MasterOutput => mapper.set_master_output(cc_to_norm(value)),
    }
}

/// Apply one automation slot's value and keep any fader showing that
/// parameter in step with it
pub(crate) fn apply_automation(
    slot: usize,
    value: u8,
    synth: &mut SynthEngine,
    mapper: &mut CcMapper,
) {
    let Some(&id) = AUTO_PARAMS.get(slot) else {
        return;
    };
    synth.set_param(id, synth_value(id, value));
    mapper.sync_target(ParamTarget::Synth(id), value);
}

/// Sequencer sink: report each replayed event to the control domain, then
/// sound it
pub(crate) struct PlaybackRouter<'a> {
    pub synth: &'a mut SynthEngine,
    pub drums: &'a mut dyn DrumSink,
    pub events: &'a mut EventProducer,
}

impl PlaybackSink for PlaybackRouter<'_> {
    fn play(&mut self, event: &MidiEvent) {
        // A full queue only costs the monitor an entry
        self.events.push(*event);
        route_note(event, self.synth, self.drums);
    }
}
