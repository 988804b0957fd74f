//! Trapezoidal state-variable filter.

use core::f32::consts::PI;

use libm::tanf;

/// Which of the simultaneous responses the filter returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SvfMode {
    /// Pass the input through untouched, keeping the state
    Off,
    #[default]
    LowPass,
    BandPass,
    HighPass,
}

impl SvfMode {
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => SvfMode::LowPass,
            2 => SvfMode::BandPass,
            3 => SvfMode::HighPass,
            _ => SvfMode::Off,
        }
    }
}

/// Low, band and high-pass outputs of one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SvfOutput {
    pub low: f32,
    pub band: f32,
    pub high: f32,
}

/// Two-integrator SVF with zero-delay feedback.
#[derive(Clone, Debug)]
pub struct Svf {
    g: f32,
    r: f32,
    s1: f32,
    s2: f32,
    mode: SvfMode,
}

impl Default for Svf {
    fn default() -> Self {
        Self::new()
    }
}

impl Svf {
    pub fn new() -> Self {
        Self { g: 0.0, r: 1.0, s1: 0.0, s2: 0.0, mode: SvfMode::LowPass }
    }

    /// `g = tan(pi * fc / fs)`, `R = 1 - resonance`.
    ///
    /// Cutoff is kept below Nyquist and resonance below 1 so the loop
    /// stays damped.
    pub fn set_params(&mut self, cutoff: f32, resonance: f32, sample_rate: f32) {
        let nyquist = sample_rate * 0.5;
        let fc = cutoff.clamp(1.0, nyquist * 0.999);
        self.g = tanf(PI * fc / sample_rate);
        self.r = 1.0 - resonance.clamp(0.0, 0.999);
    }

    pub fn set_mode(&mut self, mode: SvfMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> SvfMode {
        self.mode
    }

    /// Advance one sample and return all three responses.
    #[inline]
    pub fn tick(&mut self, x: f32) -> SvfOutput {
        let (g, r) = (self.g, self.r);
        let high = (x - (2.0 * r + g) * self.s1 - self.s2) / (1.0 + 2.0 * r * g + g * g);
        let band = g * high + self.s1;
        self.s1 = g * high + band;
        let low = g * band + self.s2;
        self.s2 = g * band + low;
        SvfOutput { low, band, high }
    }

    /// Filter one sample through the selected response.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        match self.mode {
            SvfMode::Off => x,
            SvfMode::LowPass => self.tick(x).low,
            SvfMode::BandPass => self.tick(x).band,
            SvfMode::HighPass => self.tick(x).high,
        }
    }

    pub fn clear(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }
}
