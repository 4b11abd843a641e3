use std::{f64::consts::TAU, path::Path};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rustfft::{num_complex::Complex, FftPlanner};

pub const SR: u32 = 16000;

pub fn gen_sine(freq_hz: f64, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (TAU * freq_hz * i as f64 / sr as f64).sin() as f32)
        .collect()
}

/// Resonance gain of a crude three-formant vowel at `freq` Hz.
fn vowel_gain(freq: f64) -> f64 {
    [(700.0, 1.0), (1200.0, 0.6), (2600.0, 0.3)]
        .iter()
        .map(|&(centre, gain)| {
            let d = (freq - centre) / 250.0;
            gain * (-d * d).exp()
        })
        .sum::<f64>()
        + 0.02
}

/// Harmonics of `f0` up to 4 kHz shaped by fixed formants, peak about 0.5.
pub fn gen_vowel(f0: f64, sr: u32, n: usize) -> Vec<f32> {
    let harmonics: Vec<(f64, f64)> = (1..)
        .map(|h| h as f64 * f0)
        .take_while(|&f| f < 4000.0 && f < sr as f64 / 2.0)
        .map(|f| (f, vowel_gain(f)))
        .collect();
    let raw: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64 / sr as f64;
            harmonics
                .iter()
                .map(|&(f, g)| g * (TAU * f * t).sin())
                .sum()
        })
        .collect();
    let peak = raw.iter().fold(0.0f64, |a, x| a.max(x.abs())).max(1e-12);
    raw.iter().map(|&x| (0.5 * x / peak) as f32).collect()
}

pub fn gen_noise(seed: u64, n: usize, amp: f32) -> Vec<f32> {
    let mut rng = Pcg32::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(-amp..amp)).collect()
}

/// Power-weighted mean frequency of the whole signal, in Hz.
pub fn spectral_centroid(signal: &[f32], sr: u32) -> f64 {
    let n = signal.len();
    let mut buf: Vec<Complex<f64>> = signal.iter().map(|&x| Complex::new(x as f64, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buf);

    let (weighted, total) = buf[..n / 2 + 1]
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(w, t), (i, x)| {
            let freq = i as f64 * sr as f64 / n as f64;
            (w + freq * x.norm_sqr(), t + x.norm_sqr())
        });
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// Signal-to-noise ratio of `actual` against `expected`, in dB.
pub fn snr_db(expected: &[f32], actual: &[f32]) -> f64 {
    let (signal, noise) = expected
        .iter()
        .zip(actual)
        .fold((0.0, 0.0), |(s, e), (&x, &y)| {
            let d = (x - y) as f64;
            (s + (x as f64).powi(2), e + d * d)
        });
    10.0 * (signal / noise.max(1e-30)).log10()
}

/// Writes 16-bit PCM with one inner vector per channel.
pub fn write_wav_i16(path: &Path, channels: &[Vec<f32>], sr: u32) {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate: sr,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..channels[0].len() {
        for channel in channels {
            let x = (channel[i] * i16::MAX as f32).round() as i16;
            writer.write_sample(x).unwrap();
        }
    }
    writer.finalize().unwrap();
}

pub fn read_wav(path: &Path) -> (hound::WavSpec, Vec<f32>) {
    let mut reader = hound::WavReader::open(path).unwrap();
    let spec = reader.spec();
    let samples = reader.samples::<f32>().map(|x| x.unwrap()).collect();
    (spec, samples)
}
