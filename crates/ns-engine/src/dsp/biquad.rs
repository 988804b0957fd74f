//! Second-order IIR filter with RBJ cookbook coefficients.

use core::f32::consts::PI;

use libm::{cosf, sinf, sqrtf};

/// Filter response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BiquadMode {
    LowPass,
    HighPass,
    BandPass,
    AllPass,
    #[default]
    Peak,
    Notch,
    LowShelf,
    HighShelf,
}

impl BiquadMode {
    pub const ALL: [BiquadMode; 8] = [
        BiquadMode::LowPass,
        BiquadMode::HighPass,
        BiquadMode::BandPass,
        BiquadMode::AllPass,
        BiquadMode::Peak,
        BiquadMode::Notch,
        BiquadMode::LowShelf,
        BiquadMode::HighShelf,
    ];

    pub fn from_index(index: i32) -> Self {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .unwrap_or_default()
    }
}

/// Normalized coefficients (`a0 == 1`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Coefficients {
    /// Unity passthrough.
    pub const IDENTITY: Coefficients = Coefficients { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 };

    /// Cookbook design for `mode` at `frequency` Hz.
    ///
    /// `gain` is linear and only used by the peak and shelf responses.
    pub fn design(mode: BiquadMode, frequency: f32, q: f32, gain: f32, sample_rate: f32) -> Self {
        let frequency = frequency.clamp(1.0, sample_rate * 0.4999);
        let omega = 2.0 * PI * frequency / sample_rate;
        let (sin_w, cos_w) = (sinf(omega), cosf(omega));
        let alpha = sin_w / (2.0 * q.max(1e-4));
        let a = sqrtf(gain.max(1e-6));
        let sqrt_a_alpha = 2.0 * sqrtf(a) * alpha;

        let (b0, b1, b2, a0, a1, a2) = match mode {
            BiquadMode::LowPass => {
                let b = (1.0 - cos_w) / 2.0;
                (b, 1.0 - cos_w, b, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
            BiquadMode::HighPass => {
                let b = (1.0 + cos_w) / 2.0;
                (b, -(1.0 + cos_w), b, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
            BiquadMode::BandPass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha),
            BiquadMode::AllPass => {
                (1.0 - alpha, -2.0 * cos_w, 1.0 + alpha, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
            BiquadMode::Peak => (
                1.0 + alpha * a,
                -2.0 * cos_w,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w,
                1.0 - alpha / a,
            ),
            BiquadMode::Notch => (1.0, -2.0 * cos_w, 1.0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha),
            BiquadMode::LowShelf => (
                a * ((a + 1.0) - (a - 1.0) * cos_w + sqrt_a_alpha),
                2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
                a * ((a + 1.0) - (a - 1.0) * cos_w - sqrt_a_alpha),
                (a + 1.0) + (a - 1.0) * cos_w + sqrt_a_alpha,
                -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
                (a + 1.0) + (a - 1.0) * cos_w - sqrt_a_alpha,
            ),
            BiquadMode::HighShelf => (
                a * ((a + 1.0) + (a - 1.0) * cos_w + sqrt_a_alpha),
                -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
                a * ((a + 1.0) + (a - 1.0) * cos_w - sqrt_a_alpha),
                (a + 1.0) - (a - 1.0) * cos_w + sqrt_a_alpha,
                2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
                (a + 1.0) - (a - 1.0) * cos_w - sqrt_a_alpha,
            ),
        };

        let inv = 1.0 / a0;
        Coefficients { b0: b0 * inv, b1: b1 * inv, b2: b2 * inv, a1: a1 * inv, a2: a2 * inv }
    }
}

/// Direct form I biquad.
#[derive(Clone, Debug)]
pub struct Biquad {
    coeffs: Coefficients,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

impl Biquad {
    pub fn new() -> Self {
        Self { coeffs: Coefficients::IDENTITY, x1: 0.0, x2: 0.0, y1: 0.0, y2: 0.0 }
    }

    pub fn set_coefficients(&mut self, coeffs: Coefficients) {
        self.coeffs = coeffs;
    }

    pub fn coefficients(&self) -> Coefficients {
        self.coeffs
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let c = &self.coeffs;
        let y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
