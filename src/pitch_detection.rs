use log::{debug, warn};
use rustfft::num_complex::Complex;

use crate::{
    error::{Error, Result},
    fft::Fft,
    float::{from_usize, lit, Float},
};

/// Pitch used when a recording has no voiced frame at all.
pub const FALLBACK_PITCH_HZ: f64 = 200.0;

pub const PERIODS_PER_WINDOW: f64 = 3.0;
pub const PERIODS_PER_STEP: f64 = 0.75;

/// Frames whose peak is below this fraction of the global peak are silent.
const SILENCE_THRESHOLD: f64 = 0.03;
/// Minimum NSDF key maximum for a voiced frame.
const VOICING_THRESHOLD: f64 = 0.45;
/// Fraction of the highest peak the chosen peak must reach.
const KEY_MAXIMUM_RATIO: f64 = 0.9;

/// Pitch search bounds in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchRange {
    floor: f64,
    ceiling: f64,
}

impl PitchRange {
    pub fn new(floor: f64, ceiling: f64) -> Result<Self> {
        let valid = floor.is_finite() && ceiling.is_finite() && floor > 0.0 && floor < ceiling;
        if !valid {
            return Err(Error::InvalidPitchRange { floor, ceiling });
        }
        Ok(Self { floor, ceiling })
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    pub fn time_step(&self) -> f64 {
        PERIODS_PER_STEP / self.floor
    }

    pub fn window_duration(&self) -> f64 {
        PERIODS_PER_WINDOW / self.floor
    }

    /// Shortest and longest searched period, in samples.
    pub fn lag_range(&self, sample_rate: u32) -> (f64, f64) {
        let sr = sample_rate as f64;
        (sr / self.ceiling, sr / self.floor)
    }
}

/// One analysis frame; `frequency` is 0 for unvoiced frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchFrame {
    pub time: f64,
    pub frequency: f64,
}

impl PitchFrame {
    pub fn is_voiced(&self) -> bool {
        self.frequency.is_finite() && self.frequency > 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PitchTrack {
    frames: Vec<PitchFrame>,
    time_step: f64,
}

impl PitchTrack {
    pub fn new(frames: Vec<PitchFrame>, time_step: f64) -> Self {
        Self { frames, time_step }
    }

    pub fn frames(&self) -> &[PitchFrame] {
        &self.frames
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn voiced(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames
            .iter()
            .filter(|f| f.is_voiced())
            .map(|f| f.frequency)
    }

    pub fn voiced_median(&self) -> Option<f64> {
        median(self.voiced().collect())
    }

    /// Frequency of the frame nearest to `time` (clamped to the track), 0 when
    /// that frame is unvoiced or the track is empty.
    pub fn frequency_at(&self, time: f64) -> f64 {
        let Some(first) = self.frames.first() else {
            return 0.0;
        };
        let index = if self.time_step > 0.0 {
            ((time - first.time) / self.time_step).round().max(0.0) as usize
        } else {
            0
        };
        let frame = &self.frames[index.min(self.frames.len() - 1)];
        if frame.is_voiced() {
            frame.frequency
        } else {
            0.0
        }
    }
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Tracks the pitch of a mono signal.
///
/// Frames are `range.time_step()` apart and centred over the signal; a signal
/// shorter than one analysis window gives an empty track.
pub fn analyze_pitch(samples: &[f32], sample_rate: u32, range: PitchRange) -> Result<PitchTrack> {
    if sample_rate == 0 {
        return Err(Error::InvalidParameter("sample rate must be positive".into()));
    }

    let sr = sample_rate as f64;
    let time_step = range.time_step();
    let window_duration = range.window_duration();
    let duration = samples.len() as f64 / sr;

    let mut window_size = (window_duration * sr).round() as usize;
    if window_size % 2 == 0 {
        window_size += 1;
    }
    let half_window = window_size / 2;
    let (min_lag, max_lag) = range.lag_range(sample_rate);

    if duration < window_duration || window_size < 4 {
        debug!(
            "signal of {:.3}s is shorter than the {:.3}s pitch window",
            duration, window_duration
        );
        return Ok(PitchTrack::new(Vec::new(), time_step));
    }

    let n_frames = ((duration - window_duration) / time_step + 1e-9).floor() as usize + 1;
    let t1 = (duration - (n_frames - 1) as f64 * time_step) / 2.0;

    let samples: Vec<f64> = samples.iter().map(|&x| x as f64).collect();
    let global_peak = samples.iter().fold(0.0f64, |a, x| a.max(x.abs()));
    let fft = Fft::<f64>::new((2 * window_size).next_power_of_two());

    let mut frames = Vec::with_capacity(n_frames);
    let mut buf = vec![0.0; window_size];
    for i in 0..n_frames {
        let time = t1 + i as f64 * time_step;
        let start = (time * sr).round() as isize - half_window as isize;
        for (k, x) in buf.iter_mut().enumerate() {
            let j = start + k as isize;
            *x = if 0 <= j && (j as usize) < samples.len() {
                samples[j as usize]
            } else {
                0.0
            };
        }

        let local_peak = buf.iter().fold(0.0f64, |a, x| a.max(x.abs()));
        let frequency = if local_peak <= SILENCE_THRESHOLD * global_peak {
            0.0
        } else {
            pitch_detect(&fft, &buf, min_lag, max_lag, VOICING_THRESHOLD)
                .map_or(0.0, |(lag, _)| sr / lag)
        };
        frames.push(PitchFrame { time, frequency });
    }

    let track = PitchTrack::new(frames, time_step);
    debug!(
        "pitch analysis: {} frames, {} voiced",
        track.len(),
        track.voiced().count()
    );
    Ok(track)
}

/// Median pitch of the voiced frames of `samples`, or [`FALLBACK_PITCH_HZ`]
/// when nothing is voiced.
pub fn estimate_median_pitch(samples: &[f32], sample_rate: u32, range: PitchRange) -> Result<f64> {
    let track = analyze_pitch(samples, sample_rate, range)?;
    match track.voiced_median() {
        Some(median) => {
            debug!("median pitch {:.2} Hz", median);
            Ok(median)
        }
        None => {
            warn!(
                "no voiced frames found, assuming a median pitch of {} Hz",
                FALLBACK_PITCH_HZ
            );
            Ok(FALLBACK_PITCH_HZ)
        }
    }
}

/// Detect pitch from a buffer.
/// Returns a tuple of wavelength (in samples) and NSDF peak value, or `None`
/// when no peak in `[min_lag, max_lag]` exceeds `peak_threshold`.
pub fn pitch_detect<T: Float>(
    fft: &Fft<T>,
    buf: &[T],
    min_lag: T,
    max_lag: T,
    peak_threshold: T,
) -> Option<(T, T)> {
    let nsdf = compute_nsdf(fft, buf);
    let end = (max_lag.ceil().to_usize().unwrap_or(0) + 3).min(nsdf.len());
    let mut peaks = compute_peaks(&nsdf[..end]);
    peaks.retain(|p| min_lag <= p.0 && p.0 <= max_lag);
    let max_peak = peaks.iter().fold(T::zero(), |a, p| a.max(p.1));
    if peak_threshold < max_peak {
        peaks
            .iter()
            .find(|p| max_peak * lit::<T>(KEY_MAXIMUM_RATIO) <= p.1)
            .copied()
    } else {
        None
    }
}

/// Normalized Square Difference Function (NSDF)
///
/// `fft` must be at least twice as long as `buf` so the autocorrelation does
/// not wrap around.
pub fn compute_nsdf<T: Float>(fft: &Fft<T>, buf: &[T]) -> Vec<T> {
    debug_assert!(fft.size() >= 2 * buf.len());
    let spectrum = fft.spectrum(buf);
    compute_nsdf_from_spectrum(fft, buf, spectrum)
}

pub fn compute_nsdf_from_spectrum<T: Float>(
    fft: &Fft<T>,
    buf: &[T],
    mut spectrum: Vec<Complex<T>>,
) -> Vec<T> {
    for x in &mut spectrum {
        *x = Complex::from(x.norm_sqr());
    }
    fft.inverse(&mut spectrum);

    let len = buf.len();
    let two = lit::<T>(2.0);
    let scale = from_usize::<T>(fft.size());
    let mut nsdf = vec![T::zero(); len];
    let mut m = T::epsilon();
    for i in 0..len {
        let inv = len - i - 1;
        m = m + buf[i].powi(2) + buf[inv].powi(2);
        nsdf[inv] = two * spectrum[inv].re / (m * scale);
    }

    nsdf
}

/// Positive-lobe maxima of `nsdf` after its first negative crossing, refined
/// by parabolic interpolation. Returns `(lag, value)` pairs.
pub fn compute_peaks<T: Float>(nsdf: &[T]) -> Vec<(T, T)> {
    let zero = T::zero();
    let two = lit::<T>(2.0);
    let four = lit::<T>(4.0);
    let mut peak = (zero, zero);
    let mut peaks = Vec::with_capacity(32);
    let mut is_first = true;

    for i in 0..nsdf.len().saturating_sub(2) {
        if nsdf[i + 1] < zero {
            if zero < peak.1 {
                peaks.push(peak);
                peak = (zero, zero);
            }
            is_first = false;
            continue;
        }

        if !is_first && nsdf[i + 1] - nsdf[i] > zero && nsdf[i + 2] - nsdf[i + 1] <= zero {
            let t = two * (nsdf[i] - two * nsdf[i + 1] + nsdf[i + 2]);
            let (d, c) = if t < zero {
                let d = (nsdf[i] - nsdf[i + 2]) / t;
                (d, nsdf[i + 1] - t * d * d / four)
            } else {
                (zero, nsdf[i + 1])
            };
            if peak.1 < c {
                peak = (from_usize::<T>(i + 1) + d, c);
            }
        }
    }
    if zero < peak.1 {
        peaks.push(peak);
    }
    peaks
}
