//! Windowed FFT magnitude analysis on a log-frequency grid.

use num_complex::Complex32;

use super::fft::{fft_in_place, hann};

/// Frames a mono stream into windowed FFT blocks and keeps smoothed
/// magnitudes in log-spaced bands.
///
/// All buffers are sized at construction; `push` never allocates.
#[derive(Clone, Debug)]
pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    frame: Vec<Complex32>,
    input: Vec<f32>,
    fill: usize,
    ranges: Vec<(usize, usize)>,
    bands: Vec<f32>,
    smoothing: f32,
}

/// Smallest frame that leaves at least one bin between DC and Nyquist.
const MIN_SIZE: usize = 4;

impl SpectrumAnalyzer {
    /// `size` is rounded up to a power of two of at least 4. Bands span
    /// 20 Hz to Nyquist.
    pub fn new(size: usize, bands: usize, smoothing: f32, sample_rate: f32) -> Self {
        let size = size.next_power_of_two().max(MIN_SIZE);
        Self {
            window: hann(size),
            frame: vec![Complex32::new(0.0, 0.0); size],
            input: vec![0.0; size],
            fill: 0,
            ranges: band_ranges(size, bands, sample_rate),
            bands: vec![0.0; bands],
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    pub fn size(&self) -> usize {
        self.input.len()
    }

    /// Smoothed band magnitudes, lowest band first.
    pub fn bands(&self) -> &[f32] {
        &self.bands
    }

    /// Feed one sample; runs an analysis each time a full frame is collected.
    pub fn push(&mut self, x: f32) {
        self.input[self.fill] = x;
        self.fill += 1;
        if self.fill == self.input.len() {
            self.fill = 0;
            self.analyze();
        }
    }

    fn analyze(&mut self) {
        for ((slot, &x), &w) in self.frame.iter_mut().zip(&self.input).zip(&self.window) {
            *slot = Complex32::new(x * w, 0.0);
        }
        if fft_in_place(&mut self.frame).is_err() {
            return;
        }
        let scale = 2.0 / self.frame.len() as f32;
        for (band, &(start, end)) in self.bands.iter_mut().zip(&self.ranges) {
            let bins = &self.frame[start..end];
            let magnitude = bins.iter().map(|c| c.norm()).sum::<f32>() / bins.len() as f32 * scale;
            *band += self.smoothing * (magnitude - *band);
        }
    }

    pub fn clear(&mut self) {
        self.fill = 0;
        self.input.fill(0.0);
        self.bands.fill(0.0);
    }
}

/// FFT bin range `[start, end)` of every band; each band gets at least one bin.
fn band_ranges(size: usize, bands: usize, sample_rate: f32) -> Vec<(usize, usize)> {
    let half = size / 2;
    let bin_hz = sample_rate / size as f32;
    let (low, high) = (20.0f32, sample_rate / 2.0);
    (0..bands)
        .map(|b| {
            let edge = |k: usize| low * (high / low).powf(k as f32 / bands as f32);
            let start = ((edge(b) / bin_hz) as usize).clamp(1, half - 1);
            let end = ((edge(b + 1) / bin_hz) as usize).clamp(start + 1, half);
            (start, end)
        })
        .collect()
}
