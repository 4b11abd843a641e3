use std::{
    fs::File,
    io::{BufReader, BufWriter, Read},
    path::Path,
};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::{
    error::{Error, Result},
    waveform::Waveform,
};

/// Loads a PCM or float WAV file of any channel count.
pub fn load(path: impl AsRef<Path>) -> Result<Waveform> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let sound = read(BufReader::new(file))?;
    debug!(
        "loaded {}: {} channel(s), {} Hz, {:.3}s",
        path.display(),
        sound.num_channels(),
        sound.sample_rate(),
        sound.duration_secs()
    );
    Ok(sound)
}

/// Decodes WAV data, normalizing integer samples to `[-1, 1)`.
pub fn read<R: Read>(reader: R) -> Result<Waveform> {
    let mut reader = WavReader::new(reader)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec {
        WavSpec {
            sample_format: SampleFormat::Float,
            bits_per_sample: 32,
            ..
        } => reader.samples::<f32>().collect::<Result<_, _>>()?,
        WavSpec {
            sample_format: SampleFormat::Int,
            bits_per_sample: bits @ 1..=32,
            ..
        } => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|x| x.map(|x| x as f32 * scale))
                .collect::<Result<_, _>>()?
        }
        WavSpec {
            sample_format,
            bits_per_sample,
            ..
        } => {
            return Err(Error::UnsupportedFormat(format!(
                "{}-bit {:?}",
                bits_per_sample, sample_format
            )))
        }
    };

    Ok(Waveform::from_interleaved(
        &interleaved,
        spec.channels as usize,
        spec.sample_rate,
    ))
}

/// Writes mono samples as a 32-bit float WAV file.
pub fn save(path: impl AsRef<Path>, samples: &[f32], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::new(BufWriter::new(file), spec)?;
    for &x in samples {
        writer.write_sample(x)?;
    }
    writer.finalize()?;
    debug!(
        "wrote {}: {} samples at {} Hz",
        path.display(),
        samples.len(),
        sample_rate
    );
    Ok(())
}
