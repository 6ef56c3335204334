use std::sync::Arc;

use super::params::{ParamId, SynthParams};
use super::voice::{Voice, VoiceInfo};
use crate::midi::{EventKind, MidiEvent, SYNTH_CHANNEL};
use crate::sync::{EdgeFlag, SharedParams};

pub const NUM_VOICES: usize = 6;

/// Filter coefficients and the parameter snapshot refresh at this rate
pub const FILTER_UPDATE_INTERVAL: u32 = 64;

/// A released voice is force-killed after this long
pub const STUCK_VOICE_SECONDS: f32 = 3.0;

/// Released voices below this amplitude are finished
pub const ENVELOPE_FLOOR: f32 = 0.01;

/// Per-voice headroom in the mix bus
const VOICE_GAIN: f32 = 0.15;

/// Six-voice subtractive synth.
///
/// Runs entirely on the audio thread. Parameters come from [`SharedParams`]
/// and are re-read every [`FILTER_UPDATE_INTERVAL`] samples and on every
/// note-on, so control-side writes land within about a millisecond.
pub struct SynthEngine {
    sample_rate: f32,
    voices: [Voice; NUM_VOICES],
    shared: Arc<SharedParams>,
    params: SynthParams,
    age_counter: u64,
    filter_update_counter: u32,
    stuck_limit: u32,
    active_count: usize,
    nan_detected: Arc<EdgeFlag>,
    stuck_voice: Arc<EdgeFlag>,
}

impl SynthEngine {
    pub fn new(sample_rate: f32, shared: Arc<SharedParams>) -> Self {
        let params = shared.snapshot();
        let mut engine = Self {
            sample_rate,
            voices: std::array::from_fn(|_| Voice::new(sample_rate)),
            shared,
            params,
            age_counter: 0,
            filter_update_counter: 0,
            stuck_limit: (sample_rate * STUCK_VOICE_SECONDS) as u32,
            active_count: 0,
            nan_detected: EdgeFlag::shared(),
            stuck_voice: EdgeFlag::shared(),
        };
        engine.refresh_params();
        engine
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn refresh_params(&mut self) {
        self.params = self.shared.snapshot();
        for v in self.voices.iter_mut() {
            v.apply_envelopes(&self.params);
        }
    }

    /// Start a note. Takes the first free voice, otherwise steals the oldest.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        self.refresh_params();

        let idx = self.find_free_voice();
        let age = self.age_counter;
        self.age_counter += 1;

        let v = &mut self.voices[idx];
        if v.active && v.gate {
            // Stolen mid-note
            v.gate = false;
            v.filter.reset();
        }
        v.start(note, velocity, age, &self.params);
    }

    fn find_free_voice(&self) -> usize {
        if let Some(idx) = self.voices.iter().position(|v| !v.active) {
            return idx;
        }
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.age)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Release every voice holding `note`
    pub fn note_off(&mut self, note: u8) {
        for v in self.voices.iter_mut() {
            if v.active && v.gate && v.note == note {
                v.gate = false;
            }
        }
    }

    /// Close every gate; tails still ring out
    pub fn all_notes_off(&mut self) {
        for v in self.voices.iter_mut() {
            v.gate = false;
        }
    }

    /// Note on/off on the synth channel. Returns true if the event was consumed.
    pub fn handle_midi(&mut self, event: &MidiEvent) -> bool {
        if event.channel() != SYNTH_CHANNEL {
            return false;
        }
        match event.kind() {
            EventKind::NoteOn => {
                self.note_on(event.data1, event.data2);
                true
            }
            EventKind::NoteOff => {
                self.note_off(event.data1);
                true
            }
            _ => false,
        }
    }

    /// Mono voice sum after level and soft clip
    pub fn process(&mut self) -> f32 {
        let update_filters = self.filter_update_counter == 0;
        self.filter_update_counter += 1;
        if self.filter_update_counter >= FILTER_UPDATE_INTERVAL {
            self.filter_update_counter = 0;
        }
        if update_filters {
            self.refresh_params();
        }

        let p = &self.params;
        let mut out = 0.0;
        let mut active = 0;

        for v in self.voices.iter_mut() {
            if !v.active {
                continue;
            }

            let osc_out = v.osc1.next_sample() + v.osc2.next_sample();
            let filt_env = v.filt_env.process(v.gate);
            let vel_norm = v.velocity as f32 / 127.0;

            if update_filters {
                v.cached_filt_env = filt_env;
                let vel_mod = (vel_norm - 0.5) * p.vel_to_filter * 1500.0;
                let env_mod = v.cached_filt_env * p.filter_env_amt * 2000.0;
                let cutoff = (p.filter_cutoff + vel_mod + env_mod).clamp(20.0, 12000.0);
                v.filter.set_cutoff(cutoff);
                v.filter.set_resonance(p.filter_res.min(0.7));
            }

            let filt_out = v.filter.process(osc_out);

            let amp_env = v.amp_env.process(v.gate);
            v.last_env = amp_env;

            let vel_amp = 1.0 - p.vel_to_amp + vel_norm * p.vel_to_amp;

            if v.gate {
                v.release_samples = 0;
            } else {
                v.release_samples += 1;
                if v.release_samples > self.stuck_limit {
                    v.kill();
                    self.stuck_voice.raise();
                    continue;
                }
                if amp_env < ENVELOPE_FLOOR {
                    v.kill();
                    continue;
                }
            }

            if !filt_out.is_finite() {
                v.kill();
                self.nan_detected.raise();
                continue;
            }

            out += filt_out * amp_env * vel_amp * VOICE_GAIN;
            active += 1;
        }

        self.active_count = active;
        soft_clip(out * p.level)
    }

    /// Panned stereo pair with master level applied
    pub fn process_stereo(&mut self) -> (f32, f32) {
        let mono = self.process();
        let left_gain = (1.0 - self.params.pan) * 0.5;
        let right_gain = (1.0 + self.params.pan) * 0.5;
        let master = self.params.master_level;
        (mono * left_gain * master, mono * right_gain * master)
    }

    /// Voices that contributed to the last processed sample
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    /// Voices currently allocated, including ones that have not rendered yet
    pub fn allocated_count(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    pub fn params(&self) -> SynthParams {
        self.shared.snapshot()
    }

    pub fn param(&self, id: ParamId) -> f32 {
        self.shared.get(id)
    }

    pub fn set_param(&mut self, id: ParamId, value: f32) {
        self.shared.set(id, value);
    }

    pub fn set_params(&mut self, params: &SynthParams) {
        self.shared.store(params);
        self.refresh_params();
    }

    /// Out-of-range indices are ignored and return false
    pub fn load_preset(&mut self, index: usize) -> bool {
        let loaded = self.shared.load_preset(index);
        if loaded {
            self.refresh_params();
        }
        loaded
    }

    pub fn current_preset(&self) -> usize {
        self.shared.preset_index()
    }

    pub fn shared_params(&self) -> Arc<SharedParams> {
        Arc::clone(&self.shared)
    }

    pub fn nan_flag(&self) -> Arc<EdgeFlag> {
        Arc::clone(&self.nan_detected)
    }

    pub fn stuck_voice_flag(&self) -> Arc<EdgeFlag> {
        Arc::clone(&self.stuck_voice)
    }

    /// Check-and-clear
    pub fn had_nan(&self) -> bool {
        self.nan_detected.take()
    }

    /// Check-and-clear
    pub fn had_stuck_voice(&self) -> bool {
        self.stuck_voice.take()
    }

    pub fn voice_info(&self) -> [VoiceInfo; NUM_VOICES] {
        std::array::from_fn(|i| self.voices[i].info())
    }

    /// One-line voice summary, e.g. `V: 0[AG n60 e70] 1[-- n0 e0] ...`
    pub fn describe_voices(&self) -> String {
        let mut s = String::from("V:");
        for (i, info) in self.voice_info().iter().enumerate() {
            s.push_str(&format!(" {}{}", i, info));
        }
        s
    }

    #[cfg(test)]
    pub(crate) fn voice_mut(&mut self, index: usize) -> &mut Voice {
        &mut self.voices[index]
    }
}

/// Unity gain up to ±0.5, then an exponential knee that approaches ±1
pub fn soft_clip(x: f32) -> f32 {
    if x > 0.5 {
        1.0 - 0.5 * (-(x - 0.5) * 2.0).exp()
    } else if x < -0.5 {
        -1.0 + 0.5 * ((x + 0.5) * 2.0).exp()
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SynthEngine {
        SynthEngine::new(48000.0, Arc::new(SharedParams::default()))
    }

    fn run(engine: &mut SynthEngine, samples: usize) -> Vec<(f32, f32)> {
        (0..samples).map(|_| engine.process_stereo()).collect()
    }

    #[test]
    fn active_count_never_exceeds_pool() {
        let mut e = engine();
        for n in 0..40u8 {
            e.note_on(36 + n, 100);
            if n % 3 == 0 {
                e.note_off(36 + n / 2);
            }
            run(&mut e, 16);
            assert!(e.active_count() <= NUM_VOICES);
            assert!(e.allocated_count() <= NUM_VOICES);
        }
    }

    #[test]
    fn steals_smallest_age_when_full() {
        let mut e = engine();
        for n in 0..NUM_VOICES as u8 {
            e.note_on(60 + n, 100);
        }
        // Make slot 3 the oldest
        e.voice_mut(3).age = 0;
        for (i, v) in e.voices.iter_mut().enumerate() {
            if i != 3 {
                v.age += 10;
            }
        }
        e.note_on(90, 100);
        let info = e.voice_info();
        assert_eq!(info[3].note, 90);
        assert!(info[3].gate);
        assert_eq!(info.iter().filter(|v| v.note == 63).count(), 0);
    }

    #[test]
    fn note_off_releases_duplicates() {
        let mut e = engine();
        e.note_on(60, 100);
        e.note_on(60, 90);
        e.note_on(64, 90);
        e.note_off(60);
        let info = e.voice_info();
        assert_eq!(info.iter().filter(|v| v.note == 60 && v.gate).count(), 0);
        assert_eq!(info.iter().filter(|v| v.note == 64 && v.gate).count(), 1);
    }

    #[test]
    fn released_voice_falls_silent() {
        let mut e = engine();
        e.note_on(48, 127);
        run(&mut e, 4800);
        assert_eq!(e.active_count(), 1);
        e.note_off(48);
        // Init patch release is 0.3 s
        run(&mut e, 48000);
        assert_eq!(e.active_count(), 0);
        assert_eq!(e.allocated_count(), 0);
        assert!(!e.had_stuck_voice());
    }

    #[test]
    fn stuck_voice_is_killed_and_flagged() {
        let mut e = engine();
        e.set_param(ParamId::AmpRelease, 5.0);
        e.set_param(ParamId::AmpSustain, 1.0);
        e.note_on(60, 127);
        run(&mut e, 1000);
        e.note_off(60);
        run(&mut e, (48000.0 * STUCK_VOICE_SECONDS) as usize + 10);
        assert_eq!(e.allocated_count(), 0);
        assert!(e.had_stuck_voice());
        assert!(!e.had_stuck_voice());
    }

    #[test]
    fn non_finite_voice_output_is_dropped_and_flagged() {
        let mut e = engine();
        e.note_on(60, 100);
        e.note_on(67, 100);
        e.process();
        e.voice_mut(0).osc1.set_amp(f32::NAN);
        let out = e.process();
        assert!(out.is_finite());
        assert!(e.had_nan());
        assert!(!e.voice_info()[0].active);
        assert!(e.voice_info()[1].active);
    }

    #[test]
    fn output_is_bounded_with_full_pool() {
        let mut e = engine();
        e.set_param(ParamId::Level, 1.0);
        for n in 0..NUM_VOICES as u8 {
            e.note_on(40 + n * 5, 127);
        }
        for (l, r) in run(&mut e, 9600) {
            assert!(l.abs() <= 1.0 && r.abs() <= 1.0);
        }
    }

    #[test]
    fn pan_splits_between_channels() {
        let mut e = engine();
        e.set_param(ParamId::Pan, -1.0);
        e.note_on(60, 127);
        let frames = run(&mut e, 2000);
        assert!(frames.iter().all(|(_, r)| *r == 0.0));
        assert!(frames.iter().any(|(l, _)| l.abs() > 0.0));
    }

    #[test]
    fn handle_midi_ignores_other_channels() {
        let mut e = engine();
        assert!(!e.handle_midi(&MidiEvent::note_on(0, 9, 36, 100)));
        assert!(e.handle_midi(&MidiEvent::note_on(0, 0, 60, 100)));
        assert_eq!(e.allocated_count(), 1);
        assert!(e.handle_midi(&MidiEvent::note_on(0, 0, 60, 0)));
        assert!(!e.voice_info()[0].gate);
    }

    #[test]
    fn preset_load_reaches_audio_side() {
        let mut e = engine();
        assert!(e.load_preset(3));
        assert_eq!(e.current_preset(), 3);
        assert!(!e.load_preset(7));
        assert_eq!(e.current_preset(), 3);
        assert_eq!(e.params().osc2_detune, -12);
        assert_eq!(e.param(ParamId::FilterCutoff), 500.0);
    }

    #[test]
    fn soft_clip_is_continuous_and_bounded() {
        assert_eq!(soft_clip(0.3), 0.3);
        assert!((soft_clip(0.5001) - 0.5001).abs() < 1e-3);
        assert!(soft_clip(10.0) < 1.0);
        assert!(soft_clip(-10.0) > -1.0);
        assert!(soft_clip(2.0) > soft_clip(1.0));
    }
}
