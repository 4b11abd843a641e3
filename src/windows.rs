use crate::float::{from_usize, lit, Float};

/// Periodic Hann window.
pub fn hann_window<T: Float>(size: usize) -> Vec<T> {
    let half = lit::<T>(0.5);
    (0..size)
        .map(|i| half * (T::one() - (from_usize::<T>(i) * T::TAU() / from_usize(size)).cos()))
        .collect()
}

/// Gain that makes overlap-added `pre * post` frames sum to unity at the
/// given hop size.
pub fn overlap_add_scale<T: Float>(pre_window: &[T], post_window: &[T], slide_size: usize) -> T {
    let energy = pre_window
        .iter()
        .zip(post_window)
        .fold(T::zero(), |acc, (&a, &b)| acc + a * b);
    if energy > T::zero() {
        from_usize::<T>(slide_size) / energy
    } else {
        T::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window_shape() {
        let w: Vec<f64> = hann_window(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-12);
        assert!((w[4] - 1.0).abs() < 1e-12);
        assert!((w[2] - w[6]).abs() < 1e-12);
    }

    #[test]
    fn test_squared_hann_sums_to_unity_at_quarter_hop() {
        let size = 64;
        let slide = size / 4;
        let w: Vec<f64> = hann_window(size);
        let scale = overlap_add_scale(&w, &w, slide);
        for n in 0..slide {
            let sum: f64 = (0..size / slide)
                .map(|k| w[n + k * slide] * w[n + k * slide])
                .sum();
            assert!((sum * scale - 1.0).abs() < 1e-9, "n={} sum={}", n, sum * scale);
        }
    }
}
