use std::path::{Path, PathBuf};

use log::info;

use crate::{
    error::Result,
    gender::{change_gender, GenderChange},
    pitch_detection::{estimate_median_pitch, PitchRange},
    wav,
    waveform::Waveform,
};

pub const DEFAULT_FORMANT_RATIO: f64 = 1.10;
pub const DEFAULT_PITCH_RATIO: f64 = 1.0;
pub const DEFAULT_DURATION_RATIO: f64 = 1.0;
pub const DEFAULT_F0_MIN: f64 = 75.0;
pub const DEFAULT_F0_MAX: f64 = 500.0;

/// Pitch contour excursions are kept as they are.
const PITCH_RANGE_FACTOR: f64 = 1.0;

/// Settings of one formant shift run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftParams {
    pub formant_ratio: f64,
    /// Multiplier applied to the median pitch of the input.
    pub pitch_ratio: f64,
    pub duration_ratio: f64,
    /// Pitch search floor in Hz.
    pub f0_min: f64,
    /// Pitch search ceiling in Hz.
    pub f0_max: f64,
}

impl Default for ShiftParams {
    fn default() -> Self {
        Self {
            formant_ratio: DEFAULT_FORMANT_RATIO,
            pitch_ratio: DEFAULT_PITCH_RATIO,
            duration_ratio: DEFAULT_DURATION_RATIO,
            f0_min: DEFAULT_F0_MIN,
            f0_max: DEFAULT_F0_MAX,
        }
    }
}

/// Shifts the formants (and optionally pitch and duration) of `sound` and
/// returns the result mixed down to mono, at the sample rate the transformer
/// reports.
///
/// The target pitch median is the input's median pitch times `pitch_ratio`.
/// Recordings without any voiced frame are treated as having a 200 Hz median.
pub fn shift_waveform(sound: &Waveform, params: &ShiftParams) -> Result<Waveform> {
    let range = PitchRange::new(params.f0_min, params.f0_max)?;
    let median = estimate_median_pitch(&sound.mix_to_mono(), sound.sample_rate(), range)?;
    let new_pitch_median = median * params.pitch_ratio;
    info!(
        "median pitch {:.2} Hz, target {:.2} Hz",
        median, new_pitch_median
    );

    let changed = change_gender(
        sound,
        &GenderChange {
            pitch_floor: params.f0_min,
            pitch_ceiling: params.f0_max,
            formant_ratio: params.formant_ratio,
            new_pitch_median,
            pitch_range_factor: PITCH_RANGE_FACTOR,
            duration_ratio: params.duration_ratio,
        },
    )?;
    let sample_rate = changed.sample_rate();
    Ok(Waveform::from_mono(changed.into_mono(), sample_rate))
}

/// Reads `input`, shifts it with `params` and writes a mono WAV to `output`.
/// Returns the path written.
pub fn formant_shift(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    params: &ShiftParams,
) -> Result<PathBuf> {
    let input = input.as_ref();
    let output = output.as_ref();

    let sound = wav::load(input)?;
    info!(
        "read {} ({} channel(s), {} Hz, {:.2}s)",
        input.display(),
        sound.num_channels(),
        sound.sample_rate(),
        sound.duration_secs()
    );

    let shifted = shift_waveform(&sound, params)?;
    let sample_rate = shifted.sample_rate();
    let samples = shifted.into_mono();

    wav::save(output, &samples, sample_rate)?;
    info!("wrote {} samples to {}", samples.len(), output.display());
    Ok(output.to_path_buf())
}
