use crate::{Result, TimelineError};

/// Decoded audio handed over by whichever component sourced the track.
///
/// Samples are kept per channel. The engine only ever reads the signal.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioSignal {
    /// Creates a signal from one sample buffer per channel. All channels must
    /// hold the same number of samples and the sample rate must be positive.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(TimelineError::InvalidSignal(
                "sample rate must be positive".to_string(),
            ));
        }

        if let Some(first) = channels.first() {
            let frames = first.len();
            if let Some(index) = channels.iter().position(|ch| ch.len() != frames) {
                return Err(TimelineError::InvalidSignal(format!(
                    "channel {index} holds {} samples, expected {frames}",
                    channels[index].len()
                )));
            }
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Convenience constructor for single channel audio.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    /// Splits interleaved frames (`L R L R ...`) into per-channel buffers.
    /// A trailing incomplete frame is dropped.
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: usize,
        samples: &[f32],
    ) -> Result<Self> {
        if channel_count == 0 {
            return Err(TimelineError::InvalidSignal(
                "interleaved audio needs at least one channel".to_string(),
            ));
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns the samples of one channel, if present.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Number of samples per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Length of the signal in seconds.
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_duration_from_sample_count() {
        let signal = AudioSignal::mono(100, vec![0.0; 250]).unwrap();
        assert_eq!(signal.frames(), 250);
        assert_eq!(signal.channel_count(), 1);
        assert!((signal.duration() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_sample_rate_and_ragged_channels() {
        assert!(matches!(
            AudioSignal::mono(0, vec![0.0; 4]),
            Err(TimelineError::InvalidSignal(_))
        ));

        let err = AudioSignal::new(44_100, vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(format!("{err}").contains("channel 1"));
    }

    #[test]
    fn deinterleaves_frames() {
        let signal = AudioSignal::from_interleaved(10, 2, &[1.0, -1.0, 2.0, -2.0, 3.0]).unwrap();
        assert_eq!(signal.channel(0).unwrap(), &[1.0, 2.0]);
        assert_eq!(signal.channel(1).unwrap(), &[-1.0, -2.0]);
        assert!(signal.channel(2).is_none());
    }

    #[test]
    fn signal_without_channels_has_zero_duration() {
        let signal = AudioSignal::new(48_000, Vec::new()).unwrap();
        assert_eq!(signal.duration(), 0.0);
    }
}
