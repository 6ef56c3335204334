//! Factory patch catalog.

use super::params::{ParamId, SynthParams, Waveform};

pub const PRESET_COUNT: usize = 4;

const PRESET_NAMES: [&str; PRESET_COUNT] = ["Init Patch", "Warm Pad", "Pluck Lead", "Bass"];

pub fn preset_name(index: usize) -> &'static str {
    PRESET_NAMES.get(index).copied().unwrap_or("Unknown")
}

pub fn preset_names() -> &'static [&'static str] {
    &PRESET_NAMES
}

/// Load a factory preset over `params`. Returns false, leaving `params`
/// alone, for an index outside the catalog.
///
/// Index 0 resets to the init patch. The other patches only touch the voice
/// fields, leaving pan and master level as they were so switching sounds
/// does not move the mix.
pub fn apply_preset(index: usize, params: &mut SynthParams) -> bool {
    match index {
        0 => *params = SynthParams::init_patch(),
        1 => {
            // Warm Pad
            params.osc1_wave = Waveform::Saw.index();
            params.osc2_wave = Waveform::Saw.index();
            params.osc1_level = 0.7;
            params.osc2_level = 0.7;
            params.osc2_detune = 7;
            params.filter_cutoff = 800.0;
            params.filter_res = 0.2;
            params.filter_env_amt = 0.3;
            params.amp_attack = 0.4;
            params.amp_decay = 0.5;
            params.amp_sustain = 0.8;
            params.amp_release = 0.8;
            params.filt_attack = 0.5;
            params.filt_decay = 1.0;
            params.filt_sustain = 0.4;
            params.filt_release = 0.8;
            params.vel_to_amp = 0.3;
            params.vel_to_filter = 0.2;
            params.level = 0.6;
        }
        2 => {
            // Pluck Lead
            params.osc1_wave = Waveform::Saw.index();
            params.osc2_wave = Waveform::Square.index();
            params.osc1_level = 1.0;
            params.osc2_level = 0.3;
            params.osc2_detune = 0;
            params.filter_cutoff = 3000.0;
            params.filter_res = 0.6;
            params.filter_env_amt = 0.7;
            params.amp_attack = 0.001;
            params.amp_decay = 0.15;
            params.amp_sustain = 0.3;
            params.amp_release = 0.2;
            params.filt_attack = 0.001;
            params.filt_decay = 0.2;
            params.filt_sustain = 0.2;
            params.filt_release = 0.15;
            params.vel_to_amp = 0.8;
            params.vel_to_filter = 0.6;
            params.level = 0.7;
        }
        3 => {
            // Bass
            params.osc1_wave = Waveform::Saw.index();
            params.osc2_wave = Waveform::Square.index();
            params.osc1_level = 1.0;
            params.osc2_level = 0.6;
            params.osc2_detune = -12;
            params.filter_cutoff = 500.0;
            params.filter_res = 0.4;
            params.filter_env_amt = 0.6;
            params.amp_attack = 0.005;
            params.amp_decay = 0.3;
            params.amp_sustain = 0.6;
            params.amp_release = 0.15;
            params.filt_attack = 0.001;
            params.filt_decay = 0.25;
            params.filt_sustain = 0.2;
            params.filt_release = 0.1;
            params.vel_to_amp = 0.7;
            params.vel_to_filter = 0.5;
            params.level = 0.8;
        }
        _ => return false,
    }
    true
}

/// Whether loading preset `index` writes parameter `id`
pub fn preset_writes(index: usize, id: ParamId) -> bool {
    index < PRESET_COUNT
        && (index == 0 || !matches!(id, ParamId::Pan | ParamId::MasterLevel))
}

/// The full patch preset `index` produces from the init patch
pub fn factory_patch(index: usize) -> Option<SynthParams> {
    let mut params = SynthParams::init_patch();
    apply_preset(index, &mut params).then_some(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_cover_catalog() {
        assert_eq!(preset_name(0), "Init Patch");
        assert_eq!(preset_name(3), "Bass");
        assert_eq!(preset_name(9), "Unknown");
        assert_eq!(preset_names().len(), PRESET_COUNT);
    }

    #[test]
    fn voice_presets_keep_mix_settings() {
        let mut p = SynthParams::default();
        p.pan = -0.5;
        p.master_level = 0.4;
        apply_preset(3, &mut p);
        assert_eq!(p.osc2_detune, -12);
        assert_eq!(p.filter_cutoff, 500.0);
        assert_eq!(p.pan, -0.5);
        assert_eq!(p.master_level, 0.4);
    }

    #[test]
    fn unknown_index_changes_nothing() {
        let mut p = SynthParams::default();
        assert!(apply_preset(2, &mut p));
        let before = p.clone();
        assert!(!apply_preset(4, &mut p));
        assert!(!apply_preset(42, &mut p));
        assert_eq!(p, before);
        assert!(factory_patch(4).is_none());
    }

    #[test]
    fn init_preset_writes_the_mix_too() {
        assert!(preset_writes(0, ParamId::Pan));
        assert!(!preset_writes(1, ParamId::Pan));
        assert!(!preset_writes(2, ParamId::MasterLevel));
        assert!(preset_writes(3, ParamId::FilterCutoff));
        assert!(!preset_writes(9, ParamId::FilterCutoff));
    }
}
