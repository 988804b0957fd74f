//! Stereo sample value type and loaded sample assets.

use alloc::string::String;
use alloc::vec::Vec;
use arrayvec::ArrayString;
use core::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

slotmap::new_key_type! {
    /// Key for referencing assets in the graph's sample bank.
    pub struct SampleKey;
}

/// One stereo sample: a (left, right) pair of 32-bit floats.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub left: f32,
    pub right: f32,
}

impl Sample {
    /// Silence.
    pub const ZERO: Sample = Sample { left: 0.0, right: 0.0 };

    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Same value on both channels.
    pub const fn mono(value: f32) -> Self {
        Self { left: value, right: value }
    }

    /// Average of both channels.
    pub fn to_mono(self) -> f32 {
        (self.left + self.right) * 0.5
    }

    pub fn is_finite(self) -> bool {
        self.left.is_finite() && self.right.is_finite()
    }

    /// Linear blend: `t = 0` gives `self`, `t = 1` gives `other`.
    pub fn lerp(self, other: Sample, t: f32) -> Sample {
        self + (other - self) * t
    }
}

impl Add for Sample {
    type Output = Sample;
    fn add(self, rhs: Sample) -> Sample {
        Sample::new(self.left + rhs.left, self.right + rhs.right)
    }
}

impl Sub for Sample {
    type Output = Sample;
    fn sub(self, rhs: Sample) -> Sample {
        Sample::new(self.left - rhs.left, self.right - rhs.right)
    }
}

impl Mul for Sample {
    type Output = Sample;
    fn mul(self, rhs: Sample) -> Sample {
        Sample::new(self.left * rhs.left, self.right * rhs.right)
    }
}

impl Div for Sample {
    type Output = Sample;
    fn div(self, rhs: Sample) -> Sample {
        Sample::new(self.left / rhs.left, self.right / rhs.right)
    }
}

impl Mul<f32> for Sample {
    type Output = Sample;
    fn mul(self, rhs: f32) -> Sample {
        Sample::new(self.left * rhs, self.right * rhs)
    }
}

impl Mul<Sample> for f32 {
    type Output = Sample;
    fn mul(self, rhs: Sample) -> Sample {
        rhs * self
    }
}

impl Div<f32> for Sample {
    type Output = Sample;
    fn div(self, rhs: f32) -> Sample {
        Sample::new(self.left / rhs, self.right / rhs)
    }
}

impl Neg for Sample {
    type Output = Sample;
    fn neg(self) -> Sample {
        Sample::new(-self.left, -self.right)
    }
}

impl AddAssign for Sample {
    fn add_assign(&mut self, rhs: Sample) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}

impl SubAssign for Sample {
    fn sub_assign(&mut self, rhs: Sample) {
        self.left -= rhs.left;
        self.right -= rhs.right;
    }
}

impl MulAssign<f32> for Sample {
    fn mul_assign(&mut self, rhs: f32) {
        self.left *= rhs;
        self.right *= rhs;
    }
}

/// A decoded audio asset at the engine sample rate.
///
/// An empty asset is valid and plays as silence; loaders produce one when
/// the source could not be decoded.
#[derive(Clone, Debug, Default)]
pub struct SampleAsset {
    /// Asset name
    pub name: ArrayString<32>,
    /// Stereo frames
    pub frames: Vec<Sample>,
    /// Where the asset was loaded from, if it came from a file
    pub source: Option<String>,
}

impl SampleAsset {
    /// Create an asset from decoded frames.
    pub fn new(name: &str, frames: Vec<Sample>) -> Self {
        let mut asset = Self { name: ArrayString::new(), frames, source: None };
        for c in name.chars() {
            if asset.name.try_push(c).is_err() {
                break;
            }
        }
        asset
    }

    /// Record the file the asset was read from.
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Create an empty (silent) asset.
    pub fn empty(name: &str) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Linearly interpolated frame at a fractional position.
    /// Positions past the end read as silence.
    pub fn frame_at(&self, position: f64) -> Sample {
        if position < 0.0 {
            return Sample::ZERO;
        }
        let idx = position as usize;
        let frac = (position - idx as f64) as f32;
        let a = self.frames.get(idx).copied().unwrap_or(Sample::ZERO);
        let b = self.frames.get(idx + 1).copied().unwrap_or(Sample::ZERO);
        a.lerp(b, frac)
    }
}
