use serde::{Deserialize, Serialize};

pub const PARAM_COUNT: usize = 21;

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    Sine,
    Triangle,
    /// Band-limited (polyBLEP)
    Saw,
    /// Band-limited (polyBLEP)
    Square,
}

impl Waveform {
    pub const COUNT: usize = 4;

    /// Any index is accepted; out-of-range values wrap into the table.
    pub fn from_index(index: usize) -> Self {
        match index % Self::COUNT {
            0 => Waveform::Sine,
            1 => Waveform::Triangle,
            2 => Waveform::Saw,
            _ => Waveform::Square,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Waveform::Sine => 0,
            Waveform::Triangle => 1,
            Waveform::Saw => 2,
            Waveform::Square => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "SIN",
            Waveform::Triangle => "TRI",
            Waveform::Saw => "SAW",
            Waveform::Square => "SQR",
        }
    }
}

/// Parameter ID for addressing individual synth parameters.
///
/// The discriminant order is the external numbering used by the command
/// layer (`ParamId::from_index`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamId {
    Osc1Wave,
    Osc2Wave,
    Osc1Level,
    Osc2Level,
    Osc2Detune,
    FilterCutoff,
    FilterResonance,
    FilterEnvAmount,
    AmpAttack,
    AmpDecay,
    AmpSustain,
    AmpRelease,
    FiltAttack,
    FiltDecay,
    FiltSustain,
    FiltRelease,
    VelToAmp,
    VelToFilter,
    Level,
    Pan,
    MasterLevel,
}

impl ParamId {
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Osc1Wave,
        ParamId::Osc2Wave,
        ParamId::Osc1Level,
        ParamId::Osc2Level,
        ParamId::Osc2Detune,
        ParamId::FilterCutoff,
        ParamId::FilterResonance,
        ParamId::FilterEnvAmount,
        ParamId::AmpAttack,
        ParamId::AmpDecay,
        ParamId::AmpSustain,
        ParamId::AmpRelease,
        ParamId::FiltAttack,
        ParamId::FiltDecay,
        ParamId::FiltSustain,
        ParamId::FiltRelease,
        ParamId::VelToAmp,
        ParamId::VelToFilter,
        ParamId::Level,
        ParamId::Pan,
        ParamId::MasterLevel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<ParamId> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable parameter name
    pub fn name(&self) -> &'static str {
        match self {
            ParamId::Osc1Wave => "Osc1 Wave",
            ParamId::Osc2Wave => "Osc2 Wave",
            ParamId::Osc1Level => "Osc1 Level",
            ParamId::Osc2Level => "Osc2 Level",
            ParamId::Osc2Detune => "Osc2 Detune",
            ParamId::FilterCutoff => "Cutoff",
            ParamId::FilterResonance => "Resonance",
            ParamId::FilterEnvAmount => "Filter Env",
            ParamId::AmpAttack => "Amp Attack",
            ParamId::AmpDecay => "Amp Decay",
            ParamId::AmpSustain => "Amp Sustain",
            ParamId::AmpRelease => "Amp Release",
            ParamId::FiltAttack => "Filt Attack",
            ParamId::FiltDecay => "Filt Decay",
            ParamId::FiltSustain => "Filt Sustain",
            ParamId::FiltRelease => "Filt Release",
            ParamId::VelToAmp => "Vel>Amp",
            ParamId::VelToFilter => "Vel>Filter",
            ParamId::Level => "Level",
            ParamId::Pan => "Pan",
            ParamId::MasterLevel => "Master",
        }
    }

    /// Short key name for serialization
    pub fn key(&self) -> &'static str {
        match self {
            ParamId::Osc1Wave => "osc1_wave",
            ParamId::Osc2Wave => "osc2_wave",
            ParamId::Osc1Level => "osc1_level",
            ParamId::Osc2Level => "osc2_level",
            ParamId::Osc2Detune => "osc2_detune",
            ParamId::FilterCutoff => "filter_cutoff",
            ParamId::FilterResonance => "filter_res",
            ParamId::FilterEnvAmount => "filter_env_amt",
            ParamId::AmpAttack => "amp_attack",
            ParamId::AmpDecay => "amp_decay",
            ParamId::AmpSustain => "amp_sustain",
            ParamId::AmpRelease => "amp_release",
            ParamId::FiltAttack => "filt_attack",
            ParamId::FiltDecay => "filt_decay",
            ParamId::FiltSustain => "filt_sustain",
            ParamId::FiltRelease => "filt_release",
            ParamId::VelToAmp => "vel_to_amp",
            ParamId::VelToFilter => "vel_to_filter",
            ParamId::Level => "level",
            ParamId::Pan => "pan",
            ParamId::MasterLevel => "master_level",
        }
    }

    pub fn from_key(key: &str) -> Option<ParamId> {
        Self::ALL.iter().copied().find(|p| p.key() == key)
    }

    /// Parameter range (min, max, default)
    pub fn range(&self) -> (f32, f32, f32) {
        match self {
            ParamId::Osc1Wave => (0.0, 3.0, 2.0),
            ParamId::Osc2Wave => (0.0, 3.0, 3.0),
            ParamId::Osc1Level => (0.0, 1.0, 1.0),
            ParamId::Osc2Level => (0.0, 1.0, 0.5),
            ParamId::Osc2Detune => (-24.0, 24.0, 0.0),
            ParamId::FilterCutoff => (20.0, 20000.0, 2000.0),
            ParamId::FilterResonance => (0.0, 1.0, 0.3),
            ParamId::FilterEnvAmount => (0.0, 1.0, 0.5),
            ParamId::AmpAttack => (0.001, 5.0, 0.01),
            ParamId::AmpDecay => (0.001, 5.0, 0.2),
            ParamId::AmpSustain => (0.0, 1.0, 0.7),
            ParamId::AmpRelease => (0.001, 5.0, 0.3),
            ParamId::FiltAttack => (0.001, 5.0, 0.01),
            ParamId::FiltDecay => (0.001, 5.0, 0.3),
            ParamId::FiltSustain => (0.0, 1.0, 0.3),
            ParamId::FiltRelease => (0.001, 5.0, 0.3),
            ParamId::VelToAmp => (0.0, 1.0, 0.5),
            ParamId::VelToFilter => (0.0, 1.0, 0.3),
            ParamId::Level => (0.0, 1.0, 0.7),
            ParamId::Pan => (-1.0, 1.0, 0.0),
            ParamId::MasterLevel => (0.0, 1.0, 1.0),
        }
    }

    /// Bring any incoming value into this parameter's domain.
    ///
    /// Waveforms wrap (`value as u8 % 4`), detune truncates to whole
    /// semitones, everything else clamps. NaN lands on the minimum.
    pub fn clamp(&self, value: f32) -> f32 {
        let (min, max, _) = self.range();
        if value.is_nan() {
            return min;
        }
        match self {
            ParamId::Osc1Wave | ParamId::Osc2Wave => {
                ((value as u8) as usize % Waveform::COUNT) as f32
            }
            ParamId::Osc2Detune => value.clamp(min, max).trunc(),
            _ => value.clamp(min, max),
        }
    }

    pub fn default_value(&self) -> f32 {
        self.range().2
    }
}

/// All controllable synth parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthParams {
    // Oscillators
    pub osc1_wave: u8, // 0-3: sin, tri, saw, square
    pub osc2_wave: u8,
    pub osc1_level: f32, // 0.0-1.0
    pub osc2_level: f32,
    pub osc2_detune: i8, // -24 to +24 semitones

    // Filter
    pub filter_cutoff: f32,  // 20-20000 Hz
    pub filter_res: f32,     // 0.0-1.0
    pub filter_env_amt: f32, // 0.0-1.0

    // Amp envelope (seconds, sustain 0-1)
    pub amp_attack: f32,
    pub amp_decay: f32,
    pub amp_sustain: f32,
    pub amp_release: f32,

    // Filter envelope
    pub filt_attack: f32,
    pub filt_decay: f32,
    pub filt_sustain: f32,
    pub filt_release: f32,

    // Velocity sensitivity
    pub vel_to_amp: f32,
    pub vel_to_filter: f32,

    // Output
    pub level: f32,
    pub pan: f32, // -1.0 (left) to +1.0 (right)
    pub master_level: f32,
}

impl SynthParams {
    /// The "Init Patch": saw + square, moderately open filter
    pub fn init_patch() -> Self {
        let mut params = Self {
            osc1_wave: 0,
            osc2_wave: 0,
            osc1_level: 0.0,
            osc2_level: 0.0,
            osc2_detune: 0,
            filter_cutoff: 0.0,
            filter_res: 0.0,
            filter_env_amt: 0.0,
            amp_attack: 0.0,
            amp_decay: 0.0,
            amp_sustain: 0.0,
            amp_release: 0.0,
            filt_attack: 0.0,
            filt_decay: 0.0,
            filt_sustain: 0.0,
            filt_release: 0.0,
            vel_to_amp: 0.0,
            vel_to_filter: 0.0,
            level: 0.0,
            pan: 0.0,
            master_level: 0.0,
        };
        for id in ParamId::ALL {
            params.set(id, id.default_value());
        }
        params
    }

    pub fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::Osc1Wave => self.osc1_wave as f32,
            ParamId::Osc2Wave => self.osc2_wave as f32,
            ParamId::Osc1Level => self.osc1_level,
            ParamId::Osc2Level => self.osc2_level,
            ParamId::Osc2Detune => self.osc2_detune as f32,
            ParamId::FilterCutoff => self.filter_cutoff,
            ParamId::FilterResonance => self.filter_res,
            ParamId::FilterEnvAmount => self.filter_env_amt,
            ParamId::AmpAttack => self.amp_attack,
            ParamId::AmpDecay => self.amp_decay,
            ParamId::AmpSustain => self.amp_sustain,
            ParamId::AmpRelease => self.amp_release,
            ParamId::FiltAttack => self.filt_attack,
            ParamId::FiltDecay => self.filt_decay,
            ParamId::FiltSustain => self.filt_sustain,
            ParamId::FiltRelease => self.filt_release,
            ParamId::VelToAmp => self.vel_to_amp,
            ParamId::VelToFilter => self.vel_to_filter,
            ParamId::Level => self.level,
            ParamId::Pan => self.pan,
            ParamId::MasterLevel => self.master_level,
        }
    }

    /// Set one parameter; the value is clamped by [`ParamId::clamp`]
    pub fn set(&mut self, id: ParamId, value: f32) {
        let v = id.clamp(value);
        match id {
            ParamId::Osc1Wave => self.osc1_wave = v as u8,
            ParamId::Osc2Wave => self.osc2_wave = v as u8,
            ParamId::Osc1Level => self.osc1_level = v,
            ParamId::Osc2Level => self.osc2_level = v,
            ParamId::Osc2Detune => self.osc2_detune = v as i8,
            ParamId::FilterCutoff => self.filter_cutoff = v,
            ParamId::FilterResonance => self.filter_res = v,
            ParamId::FilterEnvAmount => self.filter_env_amt = v,
            ParamId::AmpAttack => self.amp_attack = v,
            ParamId::AmpDecay => self.amp_decay = v,
            ParamId::AmpSustain => self.amp_sustain = v,
            ParamId::AmpRelease => self.amp_release = v,
            ParamId::FiltAttack => self.filt_attack = v,
            ParamId::FiltDecay => self.filt_decay = v,
            ParamId::FiltSustain => self.filt_sustain = v,
            ParamId::FiltRelease => self.filt_release = v,
            ParamId::VelToAmp => self.vel_to_amp = v,
            ParamId::VelToFilter => self.vel_to_filter = v,
            ParamId::Level => self.level = v,
            ParamId::Pan => self.pan = v,
            ParamId::MasterLevel => self.master_level = v,
        }
    }

    /// Waveform for oscillator 1, masked into range at the read site
    pub fn osc1_waveform(&self) -> Waveform {
        Waveform::from_index(self.osc1_wave as usize)
    }

    pub fn osc2_waveform(&self) -> Waveform {
        Waveform::from_index(self.osc2_wave as usize)
    }
}

impl Default for SynthParams {
    fn default() -> Self {
        Self::init_patch()
    }
}
