//! Synthesized waveform container.

/// Sample rate of every synthesized utterance.
pub const SAMPLE_RATE: u32 = 16_000;

/// Mono `f32` waveform in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap samples produced at [`SAMPLE_RATE`].
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate: SAMPLE_RATE,
        }
    }

    /// `len` samples of silence.
    pub fn silence(len: usize) -> Self {
        Self::new(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_at_16k() {
        let buf = AudioBuffer::silence(16_000);
        assert_eq!(buf.sample_rate, SAMPLE_RATE);
        assert!((buf.duration_secs() - 1.0).abs() < 1e-6);
        assert_eq!(buf.peak(), 0.0);
    }

    #[test]
    fn peak_uses_absolute_value() {
        let buf = AudioBuffer::new(vec![0.1, -0.7, 0.4]);
        assert!((buf.peak() - 0.7).abs() < 1e-6);
        assert_eq!(buf.len(), 3);
        assert!(!buf.is_empty());
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        let buf = AudioBuffer {
            samples: vec![0.0; 10],
            sample_rate: 0,
        };
        assert_eq!(buf.duration_secs(), 0.0);
    }
}
