use crate::error::{Error, Result};

/// Planar multi-channel audio at a fixed sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl Waveform {
    /// Builds a waveform from per-channel sample vectors of equal length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if let Some(first) = channels.first() {
            if let Some(ch) = channels.iter().position(|c| c.len() != first.len()) {
                return Err(Error::InvalidParameter(format!(
                    "channel {} has {} samples, channel 0 has {}",
                    ch,
                    channels[ch].len(),
                    first.len()
                )));
            }
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Splits interleaved frames into channels. A trailing partial frame is dropped.
    pub fn from_interleaved(samples: &[f32], num_channels: usize, sample_rate: u32) -> Self {
        let num_channels = num_channels.max(1);
        let frames = samples.len() / num_channels;
        let channels = (0..num_channels)
            .map(|ch| {
                samples
                    .iter()
                    .skip(ch)
                    .step_by(num_channels)
                    .take(frames)
                    .copied()
                    .collect()
            })
            .collect();
        Self {
            channels,
            sample_rate,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Sample-wise mean of all channels.
    pub fn mix_to_mono(&self) -> Vec<f32> {
        match self.channels.as_slice() {
            [] => Vec::new(),
            [mono] => mono.clone(),
            channels => average(channels),
        }
    }

    /// Reduces to a single channel: multi-channel audio is averaged, a single
    /// channel is returned as is.
    pub fn into_mono(mut self) -> Vec<f32> {
        match self.channels.len() {
            0 => Vec::new(),
            1 => self.channels.swap_remove(0),
            _ => average(&self.channels),
        }
    }
}

fn average(channels: &[Vec<f32>]) -> Vec<f32> {
    let len = channels.iter().map(Vec::len).min().unwrap_or(0);
    let scale = 1.0 / channels.len() as f32;
    (0..len)
        .map(|i| channels.iter().map(|c| c[i]).sum::<f32>() * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_is_averaged() {
        let sound = Waveform::new(vec![vec![1.0, 0.5, -1.0], vec![0.0, 0.5, 1.0]], 16000).unwrap();
        assert_eq!(sound.into_mono(), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_three_channels_are_averaged() {
        let sound =
            Waveform::new(vec![vec![0.3, 0.0], vec![0.6, 0.0], vec![0.9, 0.3]], 8000).unwrap();
        let mono = sound.mix_to_mono();
        assert!((mono[0] - 0.6).abs() < 1e-6);
        assert!((mono[1] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_mono_is_returned_unchanged() {
        let samples = vec![0.25, -0.75, 0.125];
        let sound = Waveform::from_mono(samples.clone(), 22050);
        assert_eq!(sound.mix_to_mono(), samples);
        assert_eq!(sound.into_mono(), samples);
    }

    #[test]
    fn test_no_channels() {
        let sound = Waveform::new(Vec::new(), 16000).unwrap();
        assert!(sound.is_empty());
        assert!(sound.into_mono().is_empty());
    }

    #[test]
    fn test_mismatched_channel_lengths_rejected() {
        let err = Waveform::new(vec![vec![0.0; 4], vec![0.0; 3]], 16000).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
    }

    #[test]
    fn test_from_interleaved() {
        let sound = Waveform::from_interleaved(&[1.0, 2.0, 3.0, 4.0, 5.0], 2, 44100);
        assert_eq!(sound.num_channels(), 2);
        assert_eq!(sound.channels()[0], vec![1.0, 3.0]);
        assert_eq!(sound.channels()[1], vec![2.0, 4.0]);
        assert_eq!(sound.len(), 2);
    }

    #[test]
    fn test_duration() {
        let sound = Waveform::from_mono(vec![0.0; 8000], 16000);
        assert!((sound.duration_secs() - 0.5).abs() < 1e-12);
    }
}
