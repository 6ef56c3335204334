use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, AtomicUsize, Ordering};

use serde::Serialize;

use crate::automation::NUM_AUTO_PARAMS;
use crate::sequencer::{TransportState, NUM_TRACKS};
use crate::synth::presets::{factory_patch, preset_writes, PRESET_COUNT};
use crate::synth::{ParamId, SynthParams, PARAM_COUNT};

/// f32 stored as its bit pattern in an `AtomicU32`.
///
/// All accesses are relaxed: the value is a freestanding scalar, nothing
/// else is published through it.
#[derive(Debug, Default)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Synth parameter set written by the control domain, read by the audio
/// domain without locking.
///
/// Each field is individually atomic; a reader may see a mix of old and new
/// fields while a preset is being stored. Index-like fields are masked where
/// they are used.
pub struct SharedParams {
    values: [AtomicF32; PARAM_COUNT],
    preset: AtomicUsize,
}

impl SharedParams {
    pub fn new(params: &SynthParams) -> Self {
        let shared = Self {
            values: std::array::from_fn(|_| AtomicF32::new(0.0)),
            preset: AtomicUsize::new(0),
        };
        shared.store(params);
        shared
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()].load()
    }

    /// Clamped by the parameter's own range
    pub fn set(&self, id: ParamId, value: f32) {
        self.values[id.index()].store(id.clamp(value));
    }

    pub fn store(&self, params: &SynthParams) {
        for id in ParamId::ALL {
            self.values[id.index()].store(params.get(id));
        }
    }

    pub fn snapshot(&self) -> SynthParams {
        let mut params = SynthParams::init_patch();
        for id in ParamId::ALL {
            params.set(id, self.get(id));
        }
        params
    }

    /// Store a factory preset's values straight from the catalog. Only the
    /// fields the preset defines are written, so a value set elsewhere in the
    /// meantime is never overwritten with a stale copy. An index outside the
    /// catalog changes nothing and returns false.
    pub fn load_preset(&self, index: usize) -> bool {
        let Some(patch) = factory_patch(index) else {
            return false;
        };
        for id in ParamId::ALL {
            if preset_writes(index, id) {
                self.values[id.index()].store(patch.get(id));
            }
        }
        self.preset.store(index, Ordering::Relaxed);
        true
    }

    pub fn preset_index(&self) -> usize {
        self.preset.load(Ordering::Relaxed) % PRESET_COUNT
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(&SynthParams::default())
    }
}

/// Plain-data status published by the audio domain once per block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStatus {
    pub transport: TransportState,
    pub bpm: u16,
    pub tick: u32,
    pub pattern_bars: u8,
    pub synth_voices: u8,
    pub drum_voices: u8,
    pub bank: usize,
    /// Bit i set: fader slot i is picked up
    pub faders_picked_up: u16,
    /// Bit i set: fader slot i still needs pickup
    pub faders_need_pickup: u16,
    pub overdub: bool,
    pub blend: bool,
    pub track_events: [u16; NUM_TRACKS],
    pub automation_points: [u16; NUM_AUTO_PARAMS],
    pub master_output: f32,
}

/// Atomic mirror of [`EngineStatus`].
///
/// One writer (audio callback), any number of readers. Fields are
/// independent; a reader can observe a status that straddles two blocks.
#[derive(Debug, Default)]
pub struct SharedState {
    transport: AtomicU8,
    bpm: AtomicU16,
    tick: AtomicU32,
    pattern_bars: AtomicU8,
    synth_voices: AtomicU8,
    drum_voices: AtomicU8,
    bank: AtomicU8,
    faders_picked_up: AtomicU16,
    faders_need_pickup: AtomicU16,
    overdub: AtomicBool,
    blend: AtomicBool,
    track_events: [AtomicU16; NUM_TRACKS],
    automation_points: [AtomicU16; NUM_AUTO_PARAMS],
    master_output: AtomicF32,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, status: &EngineStatus) {
        let r = Ordering::Relaxed;
        self.transport.store(status.transport.as_u8(), r);
        self.bpm.store(status.bpm, r);
        self.tick.store(status.tick, r);
        self.pattern_bars.store(status.pattern_bars, r);
        self.synth_voices.store(status.synth_voices, r);
        self.drum_voices.store(status.drum_voices, r);
        self.bank.store(status.bank as u8, r);
        self.faders_picked_up.store(status.faders_picked_up, r);
        self.faders_need_pickup.store(status.faders_need_pickup, r);
        self.overdub.store(status.overdub, r);
        self.blend.store(status.blend, r);
        for (slot, &count) in self.track_events.iter().zip(status.track_events.iter()) {
            slot.store(count, r);
        }
        for (slot, &count) in self.automation_points.iter().zip(status.automation_points.iter()) {
            slot.store(count, r);
        }
        self.master_output.store(status.master_output);
    }

    pub fn load(&self) -> EngineStatus {
        let r = Ordering::Relaxed;
        EngineStatus {
            transport: TransportState::from_u8(self.transport.load(r)),
            bpm: self.bpm.load(r),
            tick: self.tick.load(r),
            pattern_bars: self.pattern_bars.load(r),
            synth_voices: self.synth_voices.load(r),
            drum_voices: self.drum_voices.load(r),
            bank: self.bank.load(r) as usize,
            faders_picked_up: self.faders_picked_up.load(r),
            faders_need_pickup: self.faders_need_pickup.load(r),
            overdub: self.overdub.load(r),
            blend: self.blend.load(r),
            track_events: std::array::from_fn(|i| self.track_events[i].load(r)),
            automation_points: std::array::from_fn(|i| self.automation_points[i].load(r)),
            master_output: self.master_output.load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_f32_round_trips_bits() {
        let a = AtomicF32::new(-0.25);
        assert_eq!(a.load(), -0.25);
        a.store(f32::INFINITY);
        assert_eq!(a.load(), f32::INFINITY);
    }

    #[test]
    fn shared_params_clamp_on_set() {
        let shared = SharedParams::default();
        shared.set(ParamId::FilterCutoff, 1.0);
        assert_eq!(shared.get(ParamId::FilterCutoff), 20.0);
        shared.set(ParamId::Osc2Wave, 7.0);
        assert_eq!(shared.snapshot().osc2_wave, 3);
    }

    #[test]
    fn preset_load_updates_values_and_index() {
        let shared = SharedParams::default();
        shared.load_preset(1);
        assert_eq!(shared.preset_index(), 1);
        assert_eq!(shared.get(ParamId::FilterCutoff), 800.0);
        assert_eq!(shared.snapshot().osc2_detune, 7);
    }

    #[test]
    fn out_of_range_preset_changes_nothing() {
        let shared = SharedParams::default();
        assert!(shared.load_preset(2));
        let before = shared.snapshot();
        assert!(!shared.load_preset(99));
        assert!(!shared.load_preset(PRESET_COUNT));
        assert_eq!(shared.preset_index(), 2);
        assert_eq!(shared.snapshot(), before);
    }

    #[test]
    fn preset_load_keeps_values_it_does_not_define() {
        let shared = SharedParams::default();
        shared.set(ParamId::Pan, -0.6);
        shared.set(ParamId::MasterLevel, 0.3);
        assert!(shared.load_preset(1));
        assert_eq!(shared.get(ParamId::Pan), -0.6);
        assert_eq!(shared.get(ParamId::MasterLevel), 0.3);
        assert_eq!(shared.get(ParamId::FilterCutoff), 800.0);
    }

    #[test]
    fn status_publish_load() {
        let state = SharedState::new();
        let mut status = EngineStatus {
            transport: TransportState::Recording,
            bpm: 133,
            tick: 777,
            pattern_bars: 2,
            bank: 3,
            faders_need_pickup: 0b1_1111_1111,
            ..EngineStatus::default()
        };
        status.track_events[9] = 12;
        status.automation_points[0] = 5;
        state.publish(&status);
        assert_eq!(state.load(), status);
    }
}
