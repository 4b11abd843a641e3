use rustfft::num_complex::Complex;

use crate::{
    fft::fill_right_part_of_spectrum,
    float::{from_usize, to_index, Float},
};

/// Phase vocoder over consecutive frames; the ratio may change between calls.
pub fn pitch_shifter<T: Float>(len: usize) -> impl FnMut(&[Complex<T>], T, usize) -> Vec<Complex<T>> {
    let mut prev_input_phases = vec![T::zero(); len];
    let mut prev_output_phases = vec![T::zero(); len];

    move |spectrum, pitch_change_amount, slide_size| {
        let len = spectrum.len();
        let slide = from_usize::<T>(slide_size);
        let bins_per_radian = from_usize::<T>(len) / (slide * T::TAU());

        // magnitude and true frequency (in bins) of every analysis bin
        let mut pre = vec![[T::zero(); 2]; len / 2 + 1];
        for i in 0..len / 2 + 1 {
            let (norm, phase) = spectrum[i].to_polar();
            let bin_center_freq = T::TAU() * from_usize(i) / from_usize(len);

            let phase_diff = wrap_phase(phase - prev_input_phases[i] - bin_center_freq * slide);
            prev_input_phases[i] = phase;

            pre[i] = [norm, from_usize::<T>(i) + phase_diff * bins_per_radian];
        }

        let mut post = vec![[T::zero(); 2]; len / 2 + 1];
        for i in 0..len / 2 + 1 {
            let shifted_bin = (from_usize::<T>(i) / pitch_change_amount).round();
            if !(shifted_bin <= from_usize(len / 2)) {
                break;
            }
            let shifted_bin = to_index(shifted_bin);
            post[i] = [
                pre[shifted_bin][0],
                pre[shifted_bin][1] * pitch_change_amount,
            ];
        }

        let mut shifted_spectrum = spectrum.to_vec();
        for i in 0..len / 2 + 1 {
            let bin_deviation = post[i][1] - from_usize(i);
            let bin_center_freq = T::TAU() * from_usize(i) / from_usize(len);
            let phase_diff = (bin_deviation / bins_per_radian) + bin_center_freq * slide;

            let phase = wrap_phase(prev_output_phases[i] + phase_diff);
            shifted_spectrum[i] = Complex::from_polar(post[i][0], phase);
            prev_output_phases[i] = phase;
        }

        fill_right_part_of_spectrum(&mut shifted_spectrum);

        shifted_spectrum
    }
}

pub fn wrap_phase<T: Float>(phase: T) -> T {
    if phase >= T::zero() {
        (phase + T::PI()) % T::TAU() - T::PI()
    } else {
        (phase - T::PI()) % T::TAU() + T::PI()
    }
}
