//! 7-bit controller values to parameter units.

use crate::synth::{ParamId, Waveform};

pub fn cc_to_norm(value: u8) -> f32 {
    value as f32 / 127.0
}

pub fn norm_to_cc(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 127.0) as u8
}

/// Logarithmic, 20 Hz to 20 kHz
pub fn cc_to_freq(value: u8) -> f32 {
    20.0 * 1000.0f32.powf(cc_to_norm(value))
}

/// Logarithmic, 1 ms to 5 s
pub fn cc_to_time(value: u8) -> f32 {
    0.001 * 5000.0f32.powf(cc_to_norm(value))
}

/// Four equal zones across the controller range
pub fn cc_to_wave(value: u8) -> u8 {
    ((value as usize * Waveform::COUNT) / 128) as u8
}

/// -24..=+23 semitones, centre 64 is zero
pub fn cc_to_semitones(value: u8) -> i8 {
    ((value as i32 - 64) * 24 / 64) as i8
}

/// -1.0 (left) to just under +1.0, centre 64 is zero
pub fn cc_to_pan(value: u8) -> f32 {
    (value as f32 - 64.0) / 64.0
}

pub fn pan_to_cc(pan: f32) -> u8 {
    ((pan.clamp(-1.0, 1.0) + 1.0) * 64.0).min(127.0) as u8
}

/// Controller value in the units `id` expects
pub fn synth_value(id: ParamId, value: u8) -> f32 {
    match id {
        ParamId::Osc1Wave | ParamId::Osc2Wave => cc_to_wave(value) as f32,
        ParamId::Osc2Detune => cc_to_semitones(value) as f32,
        ParamId::FilterCutoff => cc_to_freq(value),
        ParamId::AmpAttack
        | ParamId::AmpDecay
        | ParamId::AmpRelease
        | ParamId::FiltAttack
        | ParamId::FiltDecay
        | ParamId::FiltRelease => cc_to_time(value),
        ParamId::Pan => cc_to_pan(value),
        _ => cc_to_norm(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < b.abs() * 1e-4 + 1e-6
    }

    #[test]
    fn curve_endpoints() {
        assert!(close(cc_to_freq(0), 20.0));
        assert!(close(cc_to_freq(127), 20000.0));
        assert!(close(cc_to_time(0), 0.001));
        assert!(close(cc_to_time(127), 5.0));
        assert_eq!(cc_to_norm(127), 1.0);
    }

    #[test]
    fn stepped_conversions() {
        assert_eq!(cc_to_wave(0), 0);
        assert_eq!(cc_to_wave(31), 0);
        assert_eq!(cc_to_wave(32), 1);
        assert_eq!(cc_to_wave(127), 3);
        assert_eq!(cc_to_semitones(64), 0);
        assert_eq!(cc_to_semitones(0), -24);
        assert_eq!(cc_to_semitones(127), 23);
        assert_eq!(cc_to_semitones(60), -1);
        assert_eq!(cc_to_pan(64), 0.0);
        assert_eq!(cc_to_pan(0), -1.0);
    }

    #[test]
    fn reverse_conversions() {
        assert_eq!(norm_to_cc(1.0), 127);
        assert_eq!(norm_to_cc(-3.0), 0);
        assert_eq!(pan_to_cc(0.0), 64);
        assert_eq!(pan_to_cc(1.0), 127);
    }

    #[test]
    fn synth_value_picks_curve() {
        assert!(close(synth_value(ParamId::FilterCutoff, 127), 20000.0));
        assert!(close(synth_value(ParamId::AmpRelease, 0), 0.001));
        assert_eq!(synth_value(ParamId::Osc2Wave, 127), 3.0);
        assert_eq!(synth_value(ParamId::Osc2Detune, 0), -24.0);
        assert_eq!(synth_value(ParamId::Level, 127), 1.0);
        assert_eq!(synth_value(ParamId::Pan, 64), 0.0);
    }
}
