use rustfft::num_complex::Complex;

use crate::{
    fft::Fft,
    float::Float,
    windows::{hann_window, overlap_add_scale},
};

/// Short-time spectral processor: Hann-windowed frames every `slide_size`
/// samples, edited in the frequency domain and overlap-added back.
pub struct Transformer<T: Float> {
    fft: Fft<T>,
    slide_size: usize,
    pre_window: Vec<T>,
    post_window: Vec<T>,
    output_scale: T,
}

impl<T: Float> Transformer<T> {
    pub fn new(window_size: usize, slide_size: usize) -> Self {
        assert!(0 < slide_size && slide_size <= window_size);

        let pre_window = hann_window(window_size);
        let post_window = hann_window(window_size);
        let output_scale = overlap_add_scale(&pre_window, &post_window, slide_size);
        Self {
            fft: Fft::new(window_size),
            slide_size,
            pre_window,
            post_window,
            output_scale,
        }
    }

    pub fn window_size(&self) -> usize {
        self.fft.size()
    }

    pub fn slide_size(&self) -> usize {
        self.slide_size
    }

    /// `process` gets the index of each frame's first sample in `buf`, negative
    /// for frames hanging over the start.
    pub fn process(
        &self,
        buf: &[T],
        mut process: impl FnMut(&Fft<T>, isize, &mut [Complex<T>]),
    ) -> Vec<T> {
        if buf.is_empty() {
            return Vec::new();
        }

        let window_size = self.window_size();
        let lead = window_size - self.slide_size;

        let mut padded = vec![T::zero(); lead];
        padded.extend_from_slice(buf);
        padded.resize(lead + buf.len() + window_size, T::zero());

        let mut output = vec![T::zero(); padded.len()];
        let mut start = 0;
        while start + window_size <= padded.len() && start < lead + buf.len() {
            let frame = &padded[start..start + window_size];
            let offset = start as isize - lead as isize;
            let b = self
                .fft
                .retouch_spectrum(&self.pre_window, &self.post_window, frame, |spectrum| {
                    process(&self.fft, offset, spectrum)
                });
            for (x, y) in output[start..].iter_mut().zip(b) {
                *x = *x + y * self.output_scale;
            }
            start += self.slide_size;
        }

        output.drain(..lead);
        output.truncate(buf.len());
        output
    }
}
