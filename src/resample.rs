//! Length-changing interpolation.
//!
//! Stretching a signal to `output_len` samples and playing it back at the
//! original rate scales every frequency by `input_len / output_len`.

use crate::float::{from_usize, lit, to_index, Float};

/// Resamples `buf` to exactly `output_len` samples with 4-point Hermite
/// interpolation. The first and last samples map onto each other.
pub fn resample<T: Float>(buf: &[T], output_len: usize) -> Vec<T> {
    if buf.is_empty() || output_len == 0 {
        return Vec::new();
    }
    if buf.len() == output_len {
        return buf.to_vec();
    }
    if buf.len() == 1 {
        return vec![buf[0]; output_len];
    }

    let last = buf.len() - 1;
    let rate = from_usize::<T>(last) / from_usize(output_len.saturating_sub(1).max(1));
    let half = lit::<T>(0.5);
    let two = lit::<T>(2.0);
    let one_half = lit::<T>(1.5);
    let two_half = lit::<T>(2.5);

    (0..output_len)
        .map(|i| {
            let p = from_usize::<T>(i) * rate;
            let j = to_index(p).min(last);
            let x = p - from_usize(j);

            let s0 = buf[j.saturating_sub(1)];
            let s1 = buf[j];
            let s2 = buf[(j + 1).min(last)];
            let s3 = buf[(j + 2).min(last)];

            let c1 = half * (s2 - s0);
            let c2 = s0 - two_half * s1 + two * s2 - half * s3;
            let c3 = half * (s3 - s0) + one_half * (s1 - s2);

            ((c3 * x + c2) * x + c1) * x + s1
        })
        .collect()
}
