use rustfft::{num_complex::Complex, num_traits::Zero};

use crate::{
    fft::{fill_right_part_of_spectrum, fix_scale, Fft},
    float::{from_usize, lit, to_index, Float},
};

/// Log magnitude of bins with no source material.
const LOG_FLOOR: f64 = -1000.0;

pub fn process_spectrum<T: Float>(
    slide_size: usize,
    fft: &Fft<T>,
    pitch_shift: &mut impl FnMut(&[Complex<T>], T, usize) -> Vec<Complex<T>>,
    envelope_order: usize,
    formant_ratio: T,
    pitch_ratio: T,
    spectrum: &mut [Complex<T>],
) {
    let len = spectrum.len();
    debug_assert!(0 < envelope_order && envelope_order < len / 2);

    let log_spectrum = log_magnitude(spectrum);

    // formant shift
    let envelope = lift_spectrum(fft, &log_spectrum, |b| {
        b[envelope_order..len - envelope_order + 1].fill(Complex::zero());
    });
    let shifted_envelope = warp_envelope(&envelope, formant_ratio);

    // fine structure moves with the harmonics
    let fine_structure: Vec<T> = log_spectrum
        .iter()
        .zip(&envelope)
        .map(|(&x, &e)| x - e)
        .collect();
    let shifted_fine_structure = shift_bins(&fine_structure, pitch_ratio);

    // pitch shift, for the phases
    let shifted_spectrum = pitch_shift(spectrum, pitch_ratio, slide_size);

    for i in 0..len / 2 + 1 {
        let amp = (shifted_envelope[i] + shifted_fine_structure[i]).exp();
        spectrum[i] = Complex::from_polar(amp, shifted_spectrum[i].arg());
    }

    fill_right_part_of_spectrum(spectrum);
}

/// Bin `i` of the result reads bin `i / ratio` of `envelope`, linearly
/// interpolated; positions past Nyquist read [`LOG_FLOOR`].
pub fn warp_envelope<T: Float>(envelope: &[T], ratio: T) -> Vec<T> {
    let len = envelope.len();
    let half = len / 2;
    let negative = lit::<T>(LOG_FLOOR);
    let at = |j: usize| if j <= half { envelope[j] } else { negative };

    let mut warped = vec![negative; len];
    for i in 0..half + 1 {
        let pos = from_usize::<T>(i) / ratio;
        // also catches NaN and overflow
        if !(pos <= from_usize(half)) {
            break;
        }
        let j = to_index(pos.floor());
        let x = pos - from_usize(j);
        warped[i] = if x.is_zero() {
            at(j)
        } else {
            (T::one() - x) * at(j) + x * at(j + 1)
        };
    }
    mirror(&mut warped);
    warped
}

/// Nearest-bin counterpart of [`warp_envelope`], matching the bin mapping of
/// the phase vocoder.
pub fn shift_bins<T: Float>(buf: &[T], ratio: T) -> Vec<T> {
    let len = buf.len();
    let half = len / 2;
    let mut shifted = vec![lit::<T>(LOG_FLOOR); len];
    for i in 0..half + 1 {
        let pos = (from_usize::<T>(i) / ratio).round();
        if !(pos <= from_usize(half)) {
            break;
        }
        shifted[i] = buf[to_index(pos)];
    }
    mirror(&mut shifted);
    shifted
}

fn mirror<T: Copy>(buf: &mut [T]) {
    let len = buf.len();
    for i in 1..len - len / 2 {
        buf[len - i] = buf[i];
    }
}

pub fn log_magnitude<T: Float>(spectrum: &[Complex<T>]) -> Vec<T> {
    spectrum
        .iter()
        .map(|x| (x.norm() + T::epsilon()).ln())
        .collect()
}

/// Applies `process` to the real cepstrum of `log_spectrum` and transforms back.
pub fn lift_spectrum<T: Float>(
    fft: &Fft<T>,
    log_spectrum: &[T],
    process: impl FnOnce(&mut [Complex<T>]),
) -> Vec<T> {
    let mut cepstrum: Vec<_> = log_spectrum
        .iter()
        .map(|&x| Complex::new(x, T::zero()))
        .collect();

    fft.inverse(&mut cepstrum);
    fix_scale(&mut cepstrum);

    process(&mut cepstrum);

    let mut envelope = cepstrum;
    fft.forward(&mut envelope);

    envelope.into_iter().map(|x| x.re).collect()
}

/// Cepstral order that keeps the envelope smoother than the harmonic spacing
/// of the highest expected pitch.
pub fn envelope_order(sample_rate: u32, pitch_ceiling: f64, window_size: usize) -> usize {
    let order = (sample_rate as f64 / (2.0 * pitch_ceiling)).round() as usize;
    order.clamp(1, (window_size / 2).saturating_sub(1).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch_shift::pitch_shifter;

    fn log_ramp(len: usize) -> Vec<f64> {
        let mut env = vec![0.0; len];
        for i in 0..len / 2 + 1 {
            env[i] = -(i as f64) * 0.1;
        }
        for i in 1..len / 2 {
            env[len - i] = env[i];
        }
        env
    }

    #[test]
    fn test_warp_by_one_is_identity() {
        let env = log_ramp(32);
        assert_eq!(warp_envelope(&env, 1.0), env);
    }

    #[test]
    fn test_warp_moves_peak_up() {
        let mut env = vec![-5.0f64; 64];
        env[8] = 0.0;
        let warped = warp_envelope(&env, 2.0);
        let peak = (0..=32)
            .max_by(|&a, &b| warped[a].total_cmp(&warped[b]))
            .unwrap();
        assert_eq!(peak, 16);
        // stays symmetric
        assert_eq!(warped[64 - 16], warped[16]);
    }

    #[test]
    fn test_warp_down_floors_bins_beyond_nyquist() {
        let env = log_ramp(32);
        let warped = warp_envelope(&env, 0.5);
        assert!((warped[4] - env[8]).abs() < 1e-12);
        assert!((warped[8] - env[16]).abs() < 1e-12);
        assert!(warped[9..=16].iter().all(|&x| x == LOG_FLOOR));
    }

    #[test]
    fn test_warp_up_stays_inside_source() {
        let env = log_ramp(32);
        let warped = warp_envelope(&env, 2.0);
        assert!((warped[16] - env[8]).abs() < 1e-12);
        assert!(warped.iter().all(|&x| x > LOG_FLOOR / 2.0));
    }

    #[test]
    fn test_lifters_are_complementary() {
        let size = 64;
        let order = 6;
        let fft = Fft::<f64>::new(size);
        let buf: Vec<f64> = (0..size)
            .map(|i| (i as f64 * 0.3).sin() + 0.5 * (i as f64 * 1.1).cos())
            .collect();
        let log_spectrum = log_magnitude(&fft.spectrum(&buf));

        let envelope = lift_spectrum(&fft, &log_spectrum, |b| {
            b[order..size - order + 1].fill(Complex::zero());
        });
        let fine = lift_spectrum(&fft, &log_spectrum, |b| {
            b[..order].fill(Complex::zero());
            b[size - order + 1..].fill(Complex::zero());
        });
        for i in 0..size {
            assert!((envelope[i] + fine[i] - log_spectrum[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_shift_bins_follows_nearest_source_bin() {
        let buf: Vec<f64> = log_ramp(32);
        let up = shift_bins(&buf, 2.0);
        assert_eq!(up[6], buf[3]);
        assert_eq!(up[7], buf[4]);
        let down = shift_bins(&buf, 0.5);
        assert_eq!(down[8], buf[16]);
        assert!(down[9..=16].iter().all(|&x| x == LOG_FLOOR));
        assert_eq!(down[32 - 9], down[9]);
    }

    #[test]
    fn test_tiny_ratios_floor_everything_but_dc() {
        let env = log_ramp(32);
        for warped in [warp_envelope(&env, 1e-20), shift_bins(&env, 1e-20)] {
            assert_eq!(warped[0], env[0]);
            assert!(warped[1..].iter().all(|&x| x == LOG_FLOOR));
        }
    }

    #[test]
    fn test_shift_down_of_quiet_frame_stays_bounded() {
        // mostly zero padding, as at the start of a signal
        let size = 256;
        let fft = Fft::<f64>::new(size);
        let mut shifter = pitch_shifter::<f64>(size);
        let buf: Vec<f64> = (0..size)
            .map(|i| if i < 192 { 0.0 } else { (0.9 * i as f64).sin() })
            .collect();
        let original = fft.spectrum(&buf);
        let mut spectrum = original.clone();
        process_spectrum(64, &fft, &mut shifter, 8, 1.0, 0.7, &mut spectrum);

        let peak_in = original.iter().fold(0.0f64, |a, x| a.max(x.norm()));
        let peak_out = spectrum.iter().fold(0.0f64, |a, x| a.max(x.norm()));
        assert!(peak_out < 2.0 * peak_in, "{} vs {}", peak_out, peak_in);
        // nothing above the lowered Nyquist
        assert!(spectrum[91..=128].iter().all(|x| x.norm() < 1e-12));
    }

    #[test]
    fn test_unit_ratios_keep_spectrum() {
        let size = 128;
        let fft = Fft::<f64>::new(size);
        let mut shifter = pitch_shifter::<f64>(size);
        let buf: Vec<f64> = (0..size).map(|i| (i as f64 * 0.25).sin()).collect();
        let original = fft.spectrum(&buf);
        let mut spectrum = original.clone();
        process_spectrum(32, &fft, &mut shifter, 8, 1.0, 1.0, &mut spectrum);
        for (a, b) in original.iter().zip(&spectrum) {
            assert!((a - b).norm() < 1e-6 * (1.0 + a.norm()), "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_envelope_order() {
        assert_eq!(envelope_order(16000, 500.0, 1024), 16);
        assert_eq!(envelope_order(44100, 500.0, 2048), 44);
        assert_eq!(envelope_order(8000, 10_000.0, 512), 1);
        assert_eq!(envelope_order(96000, 50.0, 64), 31);
    }
}
