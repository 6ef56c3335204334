use serde::{Deserialize, Serialize};

use crate::synth::ParamId;

pub const NUM_BANKS: usize = 4;
pub const NUM_ENCODERS: usize = 9;
pub const NUM_FADERS: usize = 9;

/// Bank cycling buttons
pub const CC_BANK_NEXT: u8 = 1;
pub const CC_BANK_PREV: u8 = 2;

/// Encoder CCs, left to right
pub const ENCODER_CCS: [u8; NUM_ENCODERS] = [74, 71, 76, 77, 93, 18, 19, 16, 17];
/// Fader CCs, left to right
pub const FADER_CCS: [u8; NUM_FADERS] = [73, 75, 79, 72, 80, 81, 82, 83, 85];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Bank {
    General,
    Mix,
    /// Power-on bank
    #[default]
    Synth,
    Sampler,
}

impl Bank {
    pub const ALL: [Bank; NUM_BANKS] = [Bank::General, Bank::Mix, Bank::Synth, Bank::Sampler];

    pub fn index(self) -> usize {
        match self {
            Bank::General => 0,
            Bank::Mix => 1,
            Bank::Synth => 2,
            Bank::Sampler => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Bank> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        self.mappings().name
    }

    pub fn next(self) -> Bank {
        Self::ALL[(self.index() + 1) % NUM_BANKS]
    }

    pub fn prev(self) -> Bank {
        Self::ALL[(self.index() + NUM_BANKS - 1) % NUM_BANKS]
    }

    pub fn mappings(&self) -> &'static BankMappings {
        &BANKS[self.index()]
    }
}

/// What a control ends up driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamTarget {
    Synth(ParamId),
    /// Pad 0-7
    DrumLevel(u8),
    /// Pad 0-7
    DrumPan(u8),
    DrumMaster,
    MasterOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMapping {
    pub target: Option<ParamTarget>,
    pub name: &'static str,
}

#[derive(Debug)]
pub struct BankMappings {
    pub name: &'static str,
    pub encoders: [ControlMapping; NUM_ENCODERS],
    pub faders: [ControlMapping; NUM_FADERS],
}

const fn to(target: ParamTarget, name: &'static str) -> ControlMapping {
    ControlMapping {
        target: Some(target),
        name,
    }
}

const fn unmapped(name: &'static str) -> ControlMapping {
    ControlMapping { target: None, name }
}

const fn synth(id: ParamId, name: &'static str) -> ControlMapping {
    to(ParamTarget::Synth(id), name)
}

const NONE: ControlMapping = unmapped("---");

/// Controller layout per bank, indexed by [`Bank::index`].
///
/// The Sampler bank's encoders are reserved: they carry the labels the
/// hardware shows for per-pad sound design, but have no target because the
/// drum mixer only exposes trigger, level, pan and master. `process_cc`
/// returns `None` for them. Automation never goes through this table; it
/// drives fixed synth parameters (see `automation::AUTO_PARAMS`).
pub static BANKS: [BankMappings; NUM_BANKS] = [
    // Master controls
    BankMappings {
        name: "General",
        encoders: [NONE; NUM_ENCODERS],
        faders: [
            to(ParamTarget::DrumMaster, "DrumMst"),
            synth(ParamId::MasterLevel, "SynthMst"),
            NONE,
            NONE,
            NONE,
            NONE,
            synth(ParamId::VelToAmp, "Vel>Amp"),
            synth(ParamId::VelToFilter, "Vel>Flt"),
            to(ParamTarget::MasterOutput, "Master"),
        ],
    },
    // Pans on the encoders, levels on the faders
    BankMappings {
        name: "Mix",
        encoders: [
            to(ParamTarget::DrumPan(0), "D1 Pan"),
            to(ParamTarget::DrumPan(1), "D2 Pan"),
            to(ParamTarget::DrumPan(2), "D3 Pan"),
            to(ParamTarget::DrumPan(3), "D4 Pan"),
            to(ParamTarget::DrumPan(4), "D5 Pan"),
            to(ParamTarget::DrumPan(5), "D6 Pan"),
            to(ParamTarget::DrumPan(6), "D7 Pan"),
            to(ParamTarget::DrumPan(7), "D8 Pan"),
            synth(ParamId::Pan, "Syn Pan"),
        ],
        faders: [
            to(ParamTarget::DrumLevel(0), "D1 Lvl"),
            to(ParamTarget::DrumLevel(1), "D2 Lvl"),
            to(ParamTarget::DrumLevel(2), "D3 Lvl"),
            to(ParamTarget::DrumLevel(3), "D4 Lvl"),
            to(ParamTarget::DrumLevel(4), "D5 Lvl"),
            to(ParamTarget::DrumLevel(5), "D6 Lvl"),
            to(ParamTarget::DrumLevel(6), "D7 Lvl"),
            to(ParamTarget::DrumLevel(7), "D8 Lvl"),
            synth(ParamId::Level, "Syn Lvl"),
        ],
    },
    // Sound design
    BankMappings {
        name: "Synth",
        encoders: [
            synth(ParamId::FilterCutoff, "Cutoff"),
            synth(ParamId::FiltAttack, "FltAtk"),
            synth(ParamId::FiltDecay, "FltDcy"),
            synth(ParamId::Osc2Detune, "Detune"),
            synth(ParamId::AmpAttack, "AmpAtk"),
            synth(ParamId::AmpDecay, "AmpDcy"),
            synth(ParamId::AmpRelease, "AmpRel"),
            synth(ParamId::Osc1Wave, "Wave1"),
            synth(ParamId::Osc2Wave, "Wave2"),
        ],
        faders: [
            synth(ParamId::Osc1Level, "Osc1"),
            synth(ParamId::Osc2Level, "Osc2"),
            synth(ParamId::FilterResonance, "Reso"),
            synth(ParamId::FilterEnvAmount, "FltEnv"),
            synth(ParamId::AmpSustain, "AmpSus"),
            synth(ParamId::FiltSustain, "FltSus"),
            synth(ParamId::FiltRelease, "FltRel"),
            NONE,
            synth(ParamId::Level, "Syn Lvl"),
        ],
    },
    // Per-drum sound design. Encoders reserved, see above.
    BankMappings {
        name: "Sampler",
        encoders: [
            unmapped("Pitch"),
            unmapped("Decay"),
            unmapped("Filter"),
            unmapped("FltRes"),
            unmapped("Swing"),
            NONE,
            NONE,
            NONE,
            NONE,
        ],
        faders: [
            to(ParamTarget::DrumLevel(0), "D1 Lvl"),
            to(ParamTarget::DrumLevel(1), "D2 Lvl"),
            to(ParamTarget::DrumLevel(2), "D3 Lvl"),
            to(ParamTarget::DrumLevel(3), "D4 Lvl"),
            to(ParamTarget::DrumLevel(4), "D5 Lvl"),
            to(ParamTarget::DrumLevel(5), "D6 Lvl"),
            to(ParamTarget::DrumLevel(6), "D7 Lvl"),
            to(ParamTarget::DrumLevel(7), "D8 Lvl"),
            to(ParamTarget::DrumMaster, "DrumMst"),
        ],
    },
];

pub fn encoder_index(cc: u8) -> Option<usize> {
    ENCODER_CCS.iter().position(|&c| c == cc)
}

pub fn fader_index(cc: u8) -> Option<usize> {
    FADER_CCS.iter().position(|&c| c == cc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_cycle_wraps_both_ways() {
        assert_eq!(Bank::Sampler.next(), Bank::General);
        assert_eq!(Bank::General.prev(), Bank::Sampler);
        assert_eq!(Bank::Mix.next(), Bank::Synth);
        assert_eq!(Bank::from_index(4), None);
        assert_eq!(Bank::default(), Bank::Synth);
    }

    #[test]
    fn tables_are_named_and_indexed() {
        for bank in Bank::ALL {
            assert_eq!(BANKS[bank.index()].name, bank.name());
        }
        assert_eq!(
            Bank::Synth.mappings().encoders[0].target,
            Some(ParamTarget::Synth(ParamId::FilterCutoff))
        );
        assert_eq!(Bank::Synth.mappings().faders[7].target, None);
        assert_eq!(Bank::General.mappings().faders[8].target, Some(ParamTarget::MasterOutput));
        assert!(Bank::Sampler.mappings().encoders.iter().all(|m| m.target.is_none()));
    }

    #[test]
    fn sampler_encoders_are_labelled_but_reserved() {
        let encoders = &Bank::Sampler.mappings().encoders;
        let labels: Vec<_> = encoders[..5].iter().map(|m| m.name).collect();
        assert_eq!(labels, ["Pitch", "Decay", "Filter", "FltRes", "Swing"]);
        assert!(encoders[5..].iter().all(|m| m.name == "---"));
        assert!(encoders.iter().all(|m| m.target.is_none()));
    }

    #[test]
    fn cc_lookup() {
        assert_eq!(encoder_index(74), Some(0));
        assert_eq!(encoder_index(17), Some(8));
        assert_eq!(fader_index(85), Some(8));
        assert_eq!(fader_index(74), None);
        assert_eq!(encoder_index(CC_BANK_NEXT), None);
    }
}
