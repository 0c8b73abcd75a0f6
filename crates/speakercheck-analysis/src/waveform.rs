//! Recorded audio handed to the analysis engine.

/// A single-channel recording and its sample rate.
///
/// Only channel 0 of a multi-channel capture is kept; the analysis never looks
/// at the other channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: f32,
}

impl Waveform {
    /// Wrap mono samples.
    pub fn from_mono(samples: Vec<f32>, sample_rate: f32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Extract channel 0 from interleaved frames.
    ///
    /// A `channels` value of 0 is treated as mono. A trailing partial frame
    /// still contributes its first sample.
    pub fn from_interleaved(data: &[f32], channels: usize, sample_rate: f32) -> Self {
        let step = channels.max(1);
        let samples = data.iter().step_by(step).copied().collect();
        Self {
            samples,
            sample_rate,
        }
    }

    /// Channel-0 samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the recording holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recording length in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate > 0.0 {
            self.samples.len() as f32 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Consume the waveform, returning its samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}
