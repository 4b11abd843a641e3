//! Formant shifting of speech recordings.
//!
//! [`formant_shift`] reads a WAV file, moves its formants by a ratio, changes
//! pitch and duration if asked, and writes a mono WAV. The building blocks
//! (pitch tracking, phase-vocoder pitch shifting, cepstral envelope warping)
//! are public for use on in-memory [`Waveform`]s.

pub mod error;
pub mod fft;
pub mod float;
pub mod gender;
pub mod pitch_detection;
pub mod pitch_shift;
pub mod resample;
pub mod shift;
pub mod transform;
pub mod voice_change;
pub mod wav;
pub mod waveform;
pub mod windows;

pub use error::{Error, Result};
pub use gender::{change_gender, GenderChange};
pub use pitch_detection::{estimate_median_pitch, PitchRange, FALLBACK_PITCH_HZ};
pub use shift::{formant_shift, shift_waveform, ShiftParams};
pub use waveform::Waveform;
