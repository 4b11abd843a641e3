//! Resampling to the new length, then a spectral pass that moves harmonics and
//! formants back to their targets.

use log::{debug, info, warn};

use crate::{
    error::{Error, Result},
    pitch_detection::{analyze_pitch, PitchRange, PitchTrack},
    pitch_shift::pitch_shifter,
    resample::resample,
    transform::Transformer,
    voice_change::{envelope_order, process_spectrum},
    waveform::Waveform,
};

/// Per-frame pitch multipliers are kept inside `[1 / MAX_PITCH_MULTIPLIER, MAX_PITCH_MULTIPLIER]`.
pub const MAX_PITCH_MULTIPLIER: f64 = 16.0;

/// Smallest STFT window, in samples.
const MIN_WINDOW_SIZE: usize = 64;

/// Parameters of [`change_gender`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenderChange {
    pub pitch_floor: f64,
    pub pitch_ceiling: f64,
    pub formant_ratio: f64,
    /// Median pitch of the result in Hz; 0 keeps the original median.
    pub new_pitch_median: f64,
    /// Scales the excursions of the pitch contour around its median.
    pub pitch_range_factor: f64,
    pub duration_ratio: f64,
}

impl Default for GenderChange {
    fn default() -> Self {
        Self {
            pitch_floor: 75.0,
            pitch_ceiling: 600.0,
            formant_ratio: 1.1,
            new_pitch_median: 0.0,
            pitch_range_factor: 1.0,
            duration_ratio: 1.0,
        }
    }
}

impl GenderChange {
    /// Checks every field and returns the pitch search range.
    pub fn validate(&self) -> Result<PitchRange> {
        let range = PitchRange::new(self.pitch_floor, self.pitch_ceiling)?;
        positive("formant ratio", self.formant_ratio)?;
        positive("duration ratio", self.duration_ratio)?;
        non_negative("new pitch median", self.new_pitch_median)?;
        non_negative("pitch range factor", self.pitch_range_factor)?;
        Ok(range)
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter(format!(
            "{} must be zero or positive, got {}",
            name, value
        )))
    }
}

/// Pitch multiplier over time, derived from the source pitch track.
#[derive(Debug, Clone, Copy)]
enum PitchMultiplier<'a> {
    Identity,
    Track {
        track: &'a PitchTrack,
        factor: f64,
        new_median: f64,
        range_factor: f64,
    },
}

impl<'a> PitchMultiplier<'a> {
    fn new(track: &'a PitchTrack, new_pitch_median: f64, range_factor: f64) -> Self {
        let Some(median) = track.voiced_median() else {
            warn!("no voiced frames found, leaving the pitch unchanged");
            return Self::Identity;
        };
        let (factor, new_median) = if new_pitch_median > 0.0 {
            (new_pitch_median / median, new_pitch_median)
        } else {
            (1.0, median)
        };
        debug!(
            "source median {:.2} Hz, target median {:.2} Hz",
            median, new_median
        );
        Self::Track {
            track,
            factor,
            new_median,
            range_factor,
        }
    }

    /// Multiplier for the frame at `time` seconds of the source.
    fn at(&self, time: f64) -> f64 {
        let Self::Track {
            track,
            factor,
            new_median,
            range_factor,
        } = *self
        else {
            return 1.0;
        };
        let f0 = track.frequency_at(time);
        let k = if f0 > 0.0 {
            // new_median + (f0 * factor - new_median) * range_factor, over f0
            range_factor * factor + (1.0 - range_factor) * new_median / f0
        } else {
            factor
        };
        k.clamp(1.0 / MAX_PITCH_MULTIPLIER, MAX_PITCH_MULTIPLIER)
    }
}

/// STFT window for a pitch floor: the next power of two covering three
/// periods of the lowest pitch.
pub fn window_size(sample_rate: u32, pitch_floor: f64) -> usize {
    let samples = (sample_rate as f64 * 3.0 / pitch_floor).ceil() as usize;
    samples.next_power_of_two().max(MIN_WINDOW_SIZE)
}

/// Changes the formants, pitch and duration of every channel of `sound`.
///
/// The pitch is analysed on the mono mix so all channels get the same pitch
/// contour. The result has the channel count and sample rate of the input and
/// `round(len * duration_ratio)` samples per channel.
pub fn change_gender(sound: &Waveform, params: &GenderChange) -> Result<Waveform> {
    let range = params.validate()?;
    if sound.num_channels() == 0 {
        return Err(Error::InvalidParameter("waveform has no channels".into()));
    }
    let sample_rate = sound.sample_rate();
    if sample_rate == 0 {
        return Err(Error::InvalidParameter("sample rate must be positive".into()));
    }

    info!(
        "changing gender: formant ratio {}, new pitch median {} Hz, pitch range factor {}, duration ratio {}",
        params.formant_ratio,
        params.new_pitch_median,
        params.pitch_range_factor,
        params.duration_ratio
    );

    let track = analyze_pitch(&sound.mix_to_mono(), sample_rate, range)?;
    let multiplier = PitchMultiplier::new(&track, params.new_pitch_median, params.pitch_range_factor);

    let sr = sample_rate as f64;
    let duration_ratio = params.duration_ratio;
    let output_len = (sound.len() as f64 * duration_ratio).round() as usize;
    let window_size = window_size(sample_rate, range.floor());
    let slide_size = window_size / 4;
    let order = envelope_order(sample_rate, range.ceiling(), window_size);
    let formant_ratio = params.formant_ratio * duration_ratio;
    debug!(
        "window {} samples, hop {}, envelope order {}, output length {}",
        window_size, slide_size, order, output_len
    );

    let transformer = Transformer::<f64>::new(window_size, slide_size);
    let half_window = window_size as f64 / 2.0;

    let channels = sound
        .channels()
        .iter()
        .map(|channel| {
            let buf: Vec<f64> = channel.iter().map(|&x| x as f64).collect();
            let stretched = resample(&buf, output_len);

            let mut pitch_shift = pitch_shifter(window_size);
            transformer
                .process(&stretched, |fft, offset, spectrum| {
                    let source_time = (offset as f64 + half_window) / sr / duration_ratio;
                    let pitch_ratio = multiplier.at(source_time) * duration_ratio;
                    process_spectrum(
                        slide_size,
                        fft,
                        &mut pitch_shift,
                        order,
                        formant_ratio,
                        pitch_ratio,
                        spectrum,
                    );
                })
                .into_iter()
                .map(|x| x as f32)
                .collect()
        })
        .collect();

    Waveform::new(channels, sample_rate)
}
