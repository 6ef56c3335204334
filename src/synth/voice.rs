use serde::Serialize;

use super::envelope::Adsr;
use super::filter::SvfLowpass;
use super::oscillator::Oscillator;
use super::params::SynthParams;
use crate::midi::midi_to_freq;

/// One slot of the synth voice pool. Slots are recycled, never dropped.
pub struct Voice {
    pub(crate) osc1: Oscillator,
    pub(crate) osc2: Oscillator,
    pub(crate) filter: SvfLowpass,
    pub(crate) amp_env: Adsr,
    pub(crate) filt_env: Adsr,

    pub(crate) note: u8,
    pub(crate) velocity: u8,
    /// Sounding, including the release tail
    pub(crate) active: bool,
    /// Key held
    pub(crate) gate: bool,
    /// Allocation order; smallest is the oldest and the first to be stolen
    pub(crate) age: u64,
    /// Samples spent with the gate closed
    pub(crate) release_samples: u32,
    pub(crate) last_env: f32,
    pub(crate) cached_filt_env: f32,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            osc1: Oscillator::new(sample_rate),
            osc2: Oscillator::new(sample_rate),
            filter: SvfLowpass::new(sample_rate),
            amp_env: Adsr::new(sample_rate),
            filt_env: Adsr::new(sample_rate),
            note: 0,
            velocity: 0,
            active: false,
            gate: false,
            age: 0,
            release_samples: 0,
            last_env: 0.0,
            cached_filt_env: 0.0,
        }
    }

    /// Tune, shape and retrigger for a new note
    pub(crate) fn start(&mut self, note: u8, velocity: u8, age: u64, params: &SynthParams) {
        self.note = note;
        self.velocity = velocity;
        self.active = true;
        self.gate = true;
        self.age = age;
        self.release_samples = 0;

        self.osc1.reset();
        self.osc2.reset();

        let freq = midi_to_freq(note);
        self.osc1.set_freq(freq);
        let detune_ratio = 2.0f32.powf(params.osc2_detune as f32 / 12.0);
        self.osc2.set_freq(freq * detune_ratio);

        self.osc1.set_waveform(params.osc1_waveform());
        self.osc2.set_waveform(params.osc2_waveform());

        // Normalise so the oscillator sum never exceeds unity before the filter
        let osc_sum = params.osc1_level + params.osc2_level;
        let osc_scale = if osc_sum > 1.0 { 1.0 / osc_sum } else { 1.0 };
        self.osc1.set_amp(params.osc1_level * osc_scale);
        self.osc2.set_amp(params.osc2_level * osc_scale);

        self.apply_envelopes(params);
        self.amp_env.retrigger(true);
        self.filt_env.retrigger(true);
    }

    pub(crate) fn apply_envelopes(&mut self, params: &SynthParams) {
        self.amp_env.set_times(
            params.amp_attack,
            params.amp_decay,
            params.amp_sustain,
            params.amp_release,
        );
        self.filt_env.set_times(
            params.filt_attack,
            params.filt_decay,
            params.filt_sustain,
            params.filt_release,
        );
    }

    /// Silence immediately and clear the filter integrators
    pub(crate) fn kill(&mut self) {
        self.active = false;
        self.gate = false;
        self.release_samples = 0;
        self.filter.reset();
    }

    pub fn info(&self) -> VoiceInfo {
        VoiceInfo {
            active: self.active,
            gate: self.gate,
            note: self.note,
            velocity: self.velocity,
            age: self.age,
            envelope: self.last_env,
        }
    }
}

/// Diagnostic view of one voice
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceInfo {
    pub active: bool,
    pub gate: bool,
    pub note: u8,
    pub velocity: u8,
    pub age: u64,
    pub envelope: f32,
}

impl std::fmt::Display for VoiceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}{} n{} e{}]",
            if self.active { 'A' } else { '-' },
            if self.gate { 'G' } else { '-' },
            self.note,
            (self.envelope * 99.0) as i32
        )
    }
}
