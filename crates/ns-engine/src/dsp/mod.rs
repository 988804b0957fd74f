//! DSP primitives shared by the built-in machines.

pub mod biquad;
pub mod comb;
pub mod envelope;
pub mod fft;
pub mod spectrum;
pub mod svf;

pub use biquad::{Biquad, BiquadMode, Coefficients};
pub use comb::{AllPassFilter, CombFilter};
pub use envelope::{envelope, release, Adhsr};
pub use fft::{fft_in_place, hann, FftError};
pub use spectrum::SpectrumAnalyzer;
pub use svf::{Svf, SvfMode, SvfOutput};
