use std::f32::consts::PI;

/// Trapezoidal state variable lowpass.
///
/// Coefficients are only recomputed when cutoff or resonance change, so
/// `process` stays cheap enough to run every sample.
pub struct SvfLowpass {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    // Integrator states
    low: f32,
    band: f32,
    // Precomputed coefficients
    g: f32,
    k: f32,
}

impl SvfLowpass {
    pub fn new(sample_rate: f32) -> Self {
        let mut f = Self {
            sample_rate,
            cutoff: 2000.0,
            resonance: 0.0,
            low: 0.0,
            band: 0.0,
            g: 0.0,
            k: 0.0,
        };
        f.update_coefficients();
        f
    }

    fn update_coefficients(&mut self) {
        let freq = self.cutoff.clamp(20.0, self.sample_rate * 0.49);
        self.g = (PI * freq / self.sample_rate).tan();
        // resonance 0..0.95 -> k 2..0.1
        self.k = 2.0 - 2.0 * self.resonance;
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff = hz.clamp(20.0, 20000.0);
        self.update_coefficients();
    }

    pub fn set_resonance(&mut self, res: f32) {
        self.resonance = res.clamp(0.0, 0.95);
        self.update_coefficients();
    }

    /// Zero the integrators; coefficients are kept
    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let a1 = 1.0 / (1.0 + self.g * (self.g + self.k));
        let a2 = self.g * a1;
        let a3 = self.g * a2;

        let v3 = input - self.low - self.k * self.band;
        let v1 = a1 * self.band + a2 * v3;
        let v2 = self.low + a2 * self.band + a3 * v3;

        self.band = 2.0 * v1 - self.band;
        self.low = 2.0 * v2 - self.low;

        v2
    }
}
