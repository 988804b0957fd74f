//! Fixed-size stereo block, the unit of processing and thread handoff.

use core::ops::{Index, IndexMut};

use crate::sample::Sample;

/// Engine sample rate. The engine never adapts to other rates.
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of samples processed per scheduler pass.
pub const BLOCK_SIZE: usize = 256;

/// One block of stereo samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AudioBlock {
    samples: [Sample; BLOCK_SIZE],
}

impl Default for AudioBlock {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBlock {
    /// Create a silent block.
    pub const fn new() -> Self {
        Self { samples: [Sample::ZERO; BLOCK_SIZE] }
    }

    /// Fill all samples with zero.
    pub fn silence(&mut self) {
        self.samples.fill(Sample::ZERO);
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn as_mut_slice(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Sample> {
        self.samples.iter_mut()
    }

    /// Sum `source` into this block.
    pub fn mix_from(&mut self, source: &AudioBlock) {
        for (dst, src) in self.samples.iter_mut().zip(source.samples.iter()) {
            *dst += *src;
        }
    }

    /// Sum `source` into this block with gain.
    pub fn mix_from_scaled(&mut self, source: &AudioBlock, gain: f32) {
        for (dst, src) in self.samples.iter_mut().zip(source.samples.iter()) {
            *dst += *src * gain;
        }
    }

    /// Scale all samples by `gain`.
    pub fn apply_gain(&mut self, gain: f32) {
        for s in &mut self.samples {
            *s *= gain;
        }
    }

    /// Largest absolute channel value in the block.
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .map(|s| s.left.abs().max(s.right.abs()))
            .fold(0.0f32, f32::max)
    }
}

impl Index<usize> for AudioBlock {
    type Output = Sample;
    fn index(&self, index: usize) -> &Sample {
        &self.samples[index]
    }
}

impl IndexMut<usize> for AudioBlock {
    fn index_mut(&mut self, index: usize) -> &mut Sample {
        &mut self.samples[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_silent() {
        let block = AudioBlock::new();
        assert!(block.iter().all(|&s| s == Sample::ZERO));
        assert_eq!(block.as_slice().len(), BLOCK_SIZE);
    }

    #[test]
    fn silence_clears_data() {
        let mut block = AudioBlock::new();
        block[3] = Sample::mono(1.0);
        block.silence();
        assert_eq!(block[3], Sample::ZERO);
    }

    #[test]
    fn mix_from_scaled_applies_gain() {
        let mut dst = AudioBlock::new();
        let mut src = AudioBlock::new();
        src[0] = Sample::new(1.0, -1.0);
        dst[0] = Sample::mono(0.25);

        dst.mix_from_scaled(&src, 0.5);
        assert!((dst[0].left - 0.75).abs() < 1e-6);
        assert!((dst[0].right - -0.25).abs() < 1e-6);
    }

    #[test]
    fn apply_gain_and_peak() {
        let mut block = AudioBlock::new();
        block[0] = Sample::new(1.0, -0.5);
        block[7] = Sample::new(0.1, -2.0);
        block.apply_gain(0.5);
        assert!((block.peak() - 1.0).abs() < 1e-6);
    }
}
