use std::f32::consts::TAU;

use super::params::Waveform;

/// Single phase-accumulator oscillator
pub struct Oscillator {
    sample_rate: f32,
    waveform: Waveform,
    phase: f32,
    phase_inc: f32,
    amp: f32,
}

impl Oscillator {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            waveform: Waveform::Saw,
            phase: 0.0,
            phase_inc: 0.0,
            amp: 1.0,
        }
    }

    pub fn set_freq(&mut self, hz: f32) {
        // Keep below Nyquist so the polyBLEP correction stays valid
        let hz = hz.clamp(0.0, self.sample_rate * 0.45);
        self.phase_inc = hz / self.sample_rate;
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn set_amp(&mut self, amp: f32) {
        self.amp = amp;
    }

    /// Restart at phase zero (avoids clicks from a random start position)
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    pub fn next_sample(&mut self) -> f32 {
        let t = self.phase;
        let dt = self.phase_inc;

        let out = match self.waveform {
            Waveform::Sine => (t * TAU).sin(),
            Waveform::Triangle => 1.0 - 4.0 * (t - 0.5).abs(),
            Waveform::Saw => (2.0 * t - 1.0) - poly_blep(t, dt),
            Waveform::Square => {
                let naive = if t < 0.5 { 1.0 } else { -1.0 };
                naive + poly_blep(t, dt) - poly_blep((t + 0.5).fract(), dt)
            }
        };

        self.phase += dt;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        out * self.amp
    }
}

/// Two-sample polynomial band-limited step residual
fn poly_blep(t: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    if t < dt {
        let x = t / dt;
        x + x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + x + x + 1.0
    } else {
        0.0
    }
}
