use std::sync::Arc;

use rustfft::{num_complex::Complex, num_traits::Zero};

use crate::float::{from_usize, Float};

/// A planned forward/inverse FFT pair of a fixed size.
pub struct Fft<T: Float> {
    size: usize,
    forward: Arc<dyn rustfft::Fft<T>>,
    inverse: Arc<dyn rustfft::Fft<T>>,
}

impl<T: Float> Fft<T> {
    pub fn new(size: usize) -> Self {
        let mut planner = rustfft::FftPlanner::new();
        Self {
            size,
            forward: planner.plan_fft_forward(size),
            inverse: planner.plan_fft_inverse(size),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn forward(&self, buffer: &mut [Complex<T>]) {
        self.forward.process(buffer);
    }

    /// Unnormalized; follow with [`fix_scale`] for a true inverse.
    pub fn inverse(&self, buffer: &mut [Complex<T>]) {
        self.inverse.process(buffer);
    }

    /// Spectrum of `buf` zero-padded (or truncated) to the transform size.
    pub fn spectrum(&self, buf: &[T]) -> Vec<Complex<T>> {
        let mut spectrum: Vec<_> = buf
            .iter()
            .take(self.size)
            .map(|&x| Complex::new(x, T::zero()))
            .collect();
        spectrum.resize(self.size, Complex::zero());
        self.forward(&mut spectrum);
        spectrum
    }

    /// Windows `buf` with `pre_window`, lets `process` edit its spectrum, and
    /// returns the resynthesized frame multiplied by `post_window`.
    pub fn retouch_spectrum(
        &self,
        pre_window: &[T],
        post_window: &[T],
        buf: &[T],
        process: impl FnOnce(&mut [Complex<T>]),
    ) -> Vec<T> {
        debug_assert_eq!(pre_window.len(), self.size);
        debug_assert_eq!(post_window.len(), self.size);

        let mut spectrum: Vec<_> = buf
            .iter()
            .zip(pre_window)
            .map(|(&x, &w)| Complex::new(x * w, T::zero()))
            .collect();
        spectrum.resize(self.size, Complex::zero());

        self.forward(&mut spectrum);
        process(&mut spectrum);
        self.inverse(&mut spectrum);
        fix_scale(&mut spectrum);

        spectrum
            .iter()
            .zip(post_window)
            .map(|(x, &w)| x.re * w)
            .collect()
    }
}

pub fn fix_scale<T: Float>(buf: &mut [Complex<T>]) {
    let scale = T::one() / from_usize(buf.len());
    for x in buf.iter_mut() {
        *x = *x * scale;
    }
}

/// Mirrors bins `1..len/2` onto the upper half so the spectrum stays Hermitian.
pub fn fill_right_part_of_spectrum<T: Float>(spectrum: &mut [Complex<T>]) {
    let len = spectrum.len();
    for i in 1..len / 2 {
        spectrum[len - i] = spectrum[i].conj();
    }
}
