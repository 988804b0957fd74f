//! In-place radix-2 FFT.

use num_complex::{Complex32, Complex64};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FftError {
    #[error("FFT length {0} is not a power of two")]
    NotPowerOfTwo(usize),
}

/// Forward decimation-in-time FFT of `data`, in place.
///
/// Twiddles are advanced by complex rotation, and the rotation step for the
/// next stage comes from the half-angle identities instead of fresh sin/cos
/// calls. The recursion runs in f64 to keep the drift small.
pub fn fft_in_place(data: &mut [Complex32]) -> Result<(), FftError> {
    let n = data.len();
    if n <= 1 {
        return Ok(());
    }
    if !n.is_power_of_two() {
        return Err(FftError::NotPowerOfTwo(n));
    }

    bit_reverse(data);

    // Rotation step for the 2-point stage: e^{-i*pi}
    let mut step = Complex64::new(-1.0, 0.0);
    let mut half = 1;
    while half < n {
        let span = half * 2;
        let mut w = Complex64::new(1.0, 0.0);
        for j in 0..half {
            let tw = Complex32::new(w.re as f32, w.im as f32);
            let mut i = j;
            while i < n {
                let t = tw * data[i + half];
                data[i + half] = data[i] - t;
                data[i] += t;
                i += span;
            }
            w *= step;
        }
        let c = step.re;
        step = Complex64::new(((1.0 + c) / 2.0).sqrt(), -((1.0 - c) / 2.0).sqrt());
        half = span;
    }
    Ok(())
}

fn bit_reverse(data: &mut [Complex32]) {
    let shift = usize::BITS - data.len().trailing_zeros();
    for i in 0..data.len() {
        let j = i.reverse_bits() >> shift;
        if j > i {
            data.swap(i, j);
        }
    }
}

/// Hann window coefficients of length `n`.
pub fn hann(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }
    (0..n)
        .map(|i| {
            let x = core::f64::consts::TAU * i as f64 / (n - 1) as f64;
            (0.5 - 0.5 * x.cos()) as f32
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::TAU;

    fn naive_dft(input: &[Complex32]) -> Vec<Complex64> {
        let n = input.len();
        (0..n)
            .map(|k| {
                input.iter().enumerate().fold(Complex64::new(0.0, 0.0), |acc, (t, x)| {
                    let angle = -TAU * (k * t) as f64 / n as f64;
                    acc + Complex64::new(x.re as f64, x.im as f64) * Complex64::from_polar(1.0, angle)
                })
            })
            .collect()
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut data = vec![Complex32::new(0.0, 0.0); 12];
        assert_eq!(fft_in_place(&mut data), Err(FftError::NotPowerOfTwo(12)));
    }

    #[test]
    fn trivial_lengths() {
        let mut empty: Vec<Complex32> = Vec::new();
        assert!(fft_in_place(&mut empty).is_ok());
        let mut one = vec![Complex32::new(3.0, 1.0)];
        fft_in_place(&mut one).unwrap();
        assert_eq!(one[0], Complex32::new(3.0, 1.0));
    }

    #[test]
    fn impulse_is_flat() {
        let mut data = vec![Complex32::new(0.0, 0.0); 16];
        data[0] = Complex32::new(1.0, 0.0);
        fft_in_place(&mut data).unwrap();
        for x in &data {
            assert!((x.re - 1.0).abs() < 1e-6 && x.im.abs() < 1e-6);
        }
    }

    #[test]
    fn matches_naive_dft() {
        let input: Vec<Complex32> = (0..64)
            .map(|i| {
                let t = i as f32;
                Complex32::new((t * 0.37).sin() + 0.25 * (t * 1.9).cos(), 0.0)
            })
            .collect();
        let expected = naive_dft(&input);
        let mut data = input.clone();
        fft_in_place(&mut data).unwrap();
        for (got, want) in data.iter().zip(&expected) {
            assert!((got.re as f64 - want.re).abs() < 1e-3, "{got} vs {want}");
            assert!((got.im as f64 - want.im).abs() < 1e-3, "{got} vs {want}");
        }
    }

    #[test]
    fn sine_lands_in_its_bin() {
        let n = 1024;
        let k = 37;
        let mut data: Vec<Complex32> = (0..n)
            .map(|i| Complex32::new((TAU * (k * i) as f64 / n as f64).sin() as f32, 0.0))
            .collect();
        fft_in_place(&mut data).unwrap();
        let peak = (0..n / 2)
            .max_by(|&a, &b| data[a].norm().total_cmp(&data[b].norm()))
            .unwrap();
        assert_eq!(peak, k);
        assert!((data[k].norm() - n as f32 / 2.0).abs() < 0.5);
    }

    #[test]
    fn hann_window_shape() {
        let w = hann(5);
        assert_eq!(w[0], 0.0);
        assert!((w[2] - 1.0).abs() < 1e-6);
        assert!(w[4].abs() < 1e-6);
    }
}
