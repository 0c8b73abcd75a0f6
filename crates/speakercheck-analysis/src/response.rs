//! Frequency response of a recorded sweep.
//!
//! The recording is located with the onset detector, cut into windows, and
//! every window is labelled with the frequency the sweep was playing when the
//! window began:
//!
//! ```text
//! t_i = i * window_samples / sample_rate
//! frequency_i = f(t_i)
//! magnitude_i = rms(window_i)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::onset::{ONSET_THRESHOLD, detect_onset};
use crate::sweep::SweepSpec;
use crate::waveform::Waveform;
use crate::window::{WindowPlan, sample_windows};

/// Number of points in a sweep response unless configured otherwise.
pub const DEFAULT_RESOLUTION: usize = 200;

/// Magnitude-vs-frequency curve.
///
/// `frequencies` and `magnitudes` are index-aligned and of equal length.
/// Magnitudes are linear RMS levels (not calibrated SPL).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Frequency of each point in Hz.
    pub frequencies: Vec<f32>,
    /// Linear magnitude of each point.
    pub magnitudes: Vec<f32>,
}

impl AnalysisResult {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.frequencies.len().min(self.magnitudes.len())
    }

    /// True if the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(frequency, magnitude)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }
}

/// Analysis output together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseReport {
    /// The response curve, always `resolution` points long.
    pub result: AnalysisResult,
    /// Detected onset (first analysed sample).
    pub start_index: usize,
    /// Window length in samples.
    pub window_samples: usize,
    /// Windows that fitted inside the recording.
    pub measured_windows: usize,
}

impl ResponseReport {
    /// True if every window lay inside the recording.
    pub fn is_complete(&self) -> bool {
        self.measured_windows == self.result.len()
    }
}

/// Builds a frequency response from a recording of a known sweep.
///
/// # Example
///
/// ```rust,ignore
/// use speakercheck_analysis::{FrequencyResponseBuilder, SweepSpec, Waveform};
///
/// let builder = FrequencyResponseBuilder::new(SweepSpec::default());
/// let result = builder.analyze(&Waveform::from_mono(recording, 48000.0));
/// assert_eq!(result.len(), 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyResponseBuilder {
    sweep: SweepSpec,
    resolution: usize,
    onset_threshold: f32,
}

impl FrequencyResponseBuilder {
    /// Builder for `sweep` with the default resolution and onset threshold.
    pub fn new(sweep: SweepSpec) -> Self {
        Self {
            sweep,
            resolution: DEFAULT_RESOLUTION,
            onset_threshold: ONSET_THRESHOLD,
        }
    }

    /// Set the number of output points (at least 1).
    pub fn with_resolution(mut self, resolution: usize) -> Result<Self> {
        if resolution == 0 {
            return Err(AnalysisError::InvalidResolution);
        }
        self.resolution = resolution;
        Ok(self)
    }

    /// Set the amplitude the onset detector looks for.
    pub fn with_onset_threshold(mut self, threshold: f32) -> Self {
        self.onset_threshold = threshold.abs();
        self
    }

    /// The sweep this builder assumes was played.
    pub fn sweep(&self) -> &SweepSpec {
        &self.sweep
    }

    /// Number of output points.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Compute the response curve.
    pub fn analyze(&self, waveform: &Waveform) -> AnalysisResult {
        self.analyze_detailed(waveform).result
    }

    /// Compute the response curve and report onset and window coverage.
    pub fn analyze_detailed(&self, waveform: &Waveform) -> ResponseReport {
        let samples = waveform.samples();
        let sample_rate = waveform.sample_rate();
        let start_index = detect_onset(samples, self.onset_threshold);

        let plan = WindowPlan::new(
            start_index,
            sample_rate,
            self.sweep.duration_secs(),
            self.resolution,
        );
        let windows = sample_windows(samples, &plan);

        let frequencies = (0..self.resolution)
            .map(|i| {
                let t = if sample_rate > 0.0 {
                    plan.offset(i) as f32 / sample_rate
                } else {
                    0.0
                };
                self.sweep.frequency_at(t)
            })
            .collect();

        if windows.measured < self.resolution {
            tracing::warn!(
                measured = windows.measured,
                resolution = self.resolution,
                start_index,
                samples = samples.len(),
                "recording ends before the sweep does; trailing points are zero"
            );
        } else {
            tracing::debug!(
                start_index,
                window_samples = plan.window_samples,
                "sweep response measured"
            );
        }

        ResponseReport {
            result: AnalysisResult {
                frequencies,
                magnitudes: windows.magnitudes,
            },
            start_index,
            window_samples: plan.window_samples,
            measured_windows: windows.measured,
        }
    }
}

impl Default for FrequencyResponseBuilder {
    fn default() -> Self {
        Self::new(SweepSpec::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(level: f32, len: usize, sample_rate: f32) -> Waveform {
        Waveform::from_mono(vec![level; len], sample_rate)
    }

    #[test]
    fn default_shape() {
        let builder = FrequencyResponseBuilder::default();
        assert_eq!(builder.resolution(), 200);
        let result = builder.analyze(&constant(0.5, 480_000, 48000.0));
        assert_eq!(result.len(), 200);
        assert!((result.frequencies[0] - 20.0).abs() < 1e-3);
    }

    #[test]
    fn last_point_is_one_window_before_end() {
        let sweep = SweepSpec::new(100.0, 10000.0, 1.0).unwrap();
        let builder = FrequencyResponseBuilder::new(sweep).with_resolution(100).unwrap();
        let result = builder.analyze(&constant(0.5, 48000, 48000.0));
        // window = 480 samples = 10 ms; last window starts at 0.99 s
        let expected = sweep.frequency_at(0.99);
        assert!((result.frequencies[99] - expected).abs() / expected < 1e-4);
    }

    #[test]
    fn onset_skips_latency() {
        let mut samples = vec![0.0; 1000];
        samples.extend(vec![0.25; 48000]);
        let sweep = SweepSpec::new(20.0, 20000.0, 1.0).unwrap();
        let report = FrequencyResponseBuilder::new(sweep)
            .analyze_detailed(&Waveform::from_mono(samples, 48000.0));
        assert_eq!(report.start_index, 1000);
        assert!(report.is_complete());
        assert!(report.result.magnitudes.iter().all(|&m| (m - 0.25).abs() < 1e-5));
    }

    #[test]
    fn truncated_recording_reports_coverage() {
        let sweep = SweepSpec::new(20.0, 20000.0, 1.0).unwrap();
        let report = FrequencyResponseBuilder::new(sweep)
            .with_resolution(10)
            .unwrap()
            .analyze_detailed(&constant(0.5, 2500, 10000.0));
        assert_eq!(report.window_samples, 1000);
        assert_eq!(report.measured_windows, 2);
        assert!(!report.is_complete());
        assert_eq!(report.result.len(), 10);
        assert!(report.result.magnitudes[2..].iter().all(|&m| m == 0.0));
        assert!(
            report
                .result
                .frequencies
                .windows(2)
                .all(|w| w[0] <= w[1])
        );
    }

    #[test]
    fn custom_onset_threshold() {
        let mut samples = vec![0.05; 100];
        samples.extend(vec![0.5; 1000]);
        let sweep = SweepSpec::new(20.0, 20000.0, 0.1).unwrap();
        let report = FrequencyResponseBuilder::new(sweep)
            .with_onset_threshold(0.1)
            .analyze_detailed(&Waveform::from_mono(samples, 1000.0));
        assert_eq!(report.start_index, 100);
    }

    #[test]
    fn zero_resolution_rejected() {
        let err = FrequencyResponseBuilder::default().with_resolution(0);
        assert_eq!(err.unwrap_err(), AnalysisError::InvalidResolution);
    }

    #[test]
    fn empty_recording_is_all_zero() {
        let result =
            FrequencyResponseBuilder::default().analyze(&Waveform::from_mono(Vec::new(), 48000.0));
        assert_eq!(result.len(), 200);
        assert!(result.magnitudes.iter().all(|&m| m == 0.0));
    }

    #[test]
    fn iter_pairs() {
        let result = AnalysisResult {
            frequencies: vec![100.0, 200.0],
            magnitudes: vec![0.1, 0.2],
        };
        let pairs: Vec<_> = result.iter().collect();
        assert_eq!(pairs, vec![(100.0, 0.1), (200.0, 0.2)]);
    }
}
