//! Error types for the formant-shift crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, transforming or writing audio.
#[derive(Debug, Error)]
pub enum Error {
    /// A file could not be opened or created.
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not a readable WAV file.
    #[error("invalid WAV data: {0}")]
    Wav(#[from] hound::Error),
    /// A WAV encoding hound can parse but this crate does not convert.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    /// Pitch search bounds are not positive or not ordered.
    #[error("invalid pitch range: floor {floor} Hz and ceiling {ceiling} Hz must be positive with floor < ceiling")]
    InvalidPitchRange { floor: f64, ceiling: f64 },
    /// A transform parameter or the input waveform was rejected.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
