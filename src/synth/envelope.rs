/// ADSR stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Gate-driven ADSR envelope.
///
/// Linear attack, exponential decay and release. Times are in seconds and
/// take effect on the next sample.
pub struct Adsr {
    sample_rate: f32,
    stage: Stage,
    value: f32,
    attack_inc: f32,
    decay_coef: f32,
    release_coef: f32,
    sustain: f32,
}

/// ln(1000): exponential segments fall by 60 dB over their nominal time
const EXP_SPAN: f32 = 6.907_755;

impl Adsr {
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            sample_rate,
            stage: Stage::Idle,
            value: 0.0,
            attack_inc: 0.0,
            decay_coef: 0.0,
            release_coef: 0.0,
            sustain: 0.0,
        };
        env.set_times(0.01, 0.2, 0.7, 0.3);
        env
    }

    pub fn set_times(&mut self, attack: f32, decay: f32, sustain: f32, release: f32) {
        let sr = self.sample_rate;
        self.attack_inc = 1.0 / (attack.max(0.0005) * sr);
        self.decay_coef = (-EXP_SPAN / (decay.max(0.0005) * sr)).exp();
        self.release_coef = (-EXP_SPAN / (release.max(0.0005) * sr)).exp();
        self.sustain = sustain.clamp(0.0, 1.0);
    }

    /// Restart the attack. A hard retrigger drops to zero first.
    pub fn retrigger(&mut self, hard: bool) {
        if hard {
            self.value = 0.0;
        }
        self.stage = Stage::Attack;
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn process(&mut self, gate: bool) -> f32 {
        if !gate && !matches!(self.stage, Stage::Idle | Stage::Release) {
            self.stage = Stage::Release;
        }

        match self.stage {
            Stage::Idle => {
                self.value = 0.0;
            }
            Stage::Attack => {
                self.value += self.attack_inc;
                if self.value >= 1.0 {
                    self.value = 1.0;
                    self.stage = Stage::Decay;
                }
            }
            Stage::Decay => {
                self.value = self.sustain + (self.value - self.sustain) * self.decay_coef;
                if (self.value - self.sustain).abs() < 1e-4 {
                    self.value = self.sustain;
                    self.stage = Stage::Sustain;
                }
            }
            Stage::Sustain => {
                self.value = self.sustain;
            }
            Stage::Release => {
                self.value *= self.release_coef;
                if self.value < 1e-5 {
                    self.value = 0.0;
                    self.stage = Stage::Idle;
                }
            }
        }

        self.value
    }
}
