//! Single-tone level estimation.
//!
//! Tone tests play one fixed frequency, so time-to-frequency mapping does not
//! apply. Instead the recording is windowed, transformed, and the energy of
//! the spectral peak nearest the played frequency is converted back to an RMS
//! level. Summing the peak's main lobe makes the estimate independent of where
//! the tone falls between FFT bins.

use serde::{Deserialize, Serialize};

use crate::deviation::{SILENCE_DB, SILENCE_FLOOR};
use crate::error::{AnalysisError, Result};
use crate::fft::{Fft, Window};
use crate::onset::{ONSET_THRESHOLD, detect_onset};
use crate::response::AnalysisResult;
use crate::waveform::Waveform;

/// Default FFT length for tone analysis.
pub const DEFAULT_FFT_SIZE: usize = 8192;

/// Half-width of the peak search band, in octaves.
const SEARCH_OCTAVES: f32 = 1.0 / 6.0;

/// Bins either side of the peak summed into the tone's energy, for a segment
/// that fills the whole FFT. Zero-padded segments widen the lobe in proportion.
const LOBE_BINS: usize = 4;

/// Level of a recorded tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToneMeasurement {
    /// Frequency that was played, in Hz.
    pub target_frequency: f32,
    /// Energy-weighted frequency of the detected peak, in Hz.
    pub detected_frequency: f32,
    /// RMS level of the tone (linear).
    pub magnitude: f32,
    /// `magnitude` in dBFS, floored at -60 dB.
    pub level_db: f32,
    /// First analysed sample.
    pub onset: usize,
}

impl ToneMeasurement {
    /// One-point response so tone tests share the sweep result format.
    pub fn to_analysis(&self) -> AnalysisResult {
        AnalysisResult {
            frequencies: vec![self.target_frequency],
            magnitudes: vec![self.magnitude],
        }
    }
}

/// FFT-based single-frequency magnitude estimator.
#[derive(Debug, Clone)]
pub struct ToneAnalyzer {
    fft_size: usize,
    window: Window,
    onset_threshold: f32,
}

impl ToneAnalyzer {
    /// Create an analyzer with the given FFT size (power of 2 recommended).
    pub fn new(fft_size: usize) -> Self {
        Self {
            fft_size: fft_size.max(2),
            window: Window::Hann,
            onset_threshold: ONSET_THRESHOLD,
        }
    }

    /// Taper applied before the FFT.
    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Set the amplitude the onset detector looks for.
    pub fn with_onset_threshold(mut self, threshold: f32) -> Self {
        self.onset_threshold = threshold.abs();
        self
    }

    /// Measure the level of `frequency` in `waveform`.
    ///
    /// Analysis starts at the detected onset and covers at most `fft_size`
    /// samples. A recording with nothing after the onset measures as silence.
    pub fn analyze(&self, waveform: &Waveform, frequency: f32) -> Result<ToneMeasurement> {
        let sample_rate = waveform.sample_rate();
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        let nyquist = sample_rate / 2.0;
        if !(frequency.is_finite() && frequency > 0.0 && frequency < nyquist) {
            return Err(AnalysisError::InvalidToneFrequency { frequency, nyquist });
        }

        let samples = waveform.samples();
        let onset = detect_onset(samples, self.onset_threshold);
        let end = (onset + self.fft_size).min(samples.len());
        let mut segment = samples[onset.min(end)..end].to_vec();

        if segment.is_empty() {
            tracing::warn!(frequency, "no samples to analyse for tone");
            return Ok(ToneMeasurement {
                target_frequency: frequency,
                detected_frequency: 0.0,
                magnitude: 0.0,
                level_db: SILENCE_DB,
                onset,
            });
        }

        let window_energy = self.window.energy(segment.len());
        self.window.apply(&mut segment);

        let fft = Fft::new(self.fft_size);
        let power = fft.power_spectrum(&segment);
        let bin_width = fft.bin_width(sample_rate);
        let last_bin = power.len() - 1;

        let band = 2.0_f32.powf(SEARCH_OCTAVES);
        let lo = ((frequency / band / bin_width).floor() as usize).min(last_bin);
        let hi = ((frequency * band / bin_width).ceil() as usize).min(last_bin);
        let peak = (lo..=hi)
            .max_by(|&a, &b| power[a].total_cmp(&power[b]))
            .unwrap_or(lo);

        let lobe_bins = LOBE_BINS * self.fft_size.div_ceil(segment.len());
        let lobe = peak.saturating_sub(lobe_bins)..=(peak + lobe_bins).min(last_bin);
        let lobe_power: f32 = power[lobe.clone()].iter().sum();
        let weighted: f32 = lobe.map(|k| k as f32 * power[k]).sum();

        // Parseval: a sine of amplitude A puts N * A^2 * sum(w^2) / 4 into the
        // positive-frequency half of the spectrum.
        let magnitude = if window_energy > 0.0 {
            (2.0 * lobe_power / (self.fft_size as f32 * window_energy)).sqrt()
        } else {
            0.0
        };
        let detected_frequency = if lobe_power > 0.0 {
            weighted / lobe_power * bin_width
        } else {
            frequency
        };
        let level_db = if magnitude > SILENCE_FLOOR {
            20.0 * magnitude.log10()
        } else {
            SILENCE_DB
        };

        tracing::debug!(
            frequency,
            detected_frequency,
            magnitude,
            level_db,
            onset,
            "tone measured"
        );

        Ok(ToneMeasurement {
            target_frequency: frequency,
            detected_frequency,
            magnitude,
            level_db,
            onset,
        })
    }
}

impl Default for ToneAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_FFT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(
        frequency: f32,
        amplitude: f32,
        sample_rate: f32,
        silence: usize,
        len: usize,
    ) -> Waveform {
        let mut samples = vec![0.0; silence];
        samples.extend(
            (0..len).map(|i| amplitude * (2.0 * PI * frequency * i as f32 / sample_rate).sin()),
        );
        Waveform::from_mono(samples, sample_rate)
    }

    #[test]
    fn recovers_rms_level() {
        let wave = tone(1000.0, 0.5, 48000.0, 14400, 48000);
        let m = ToneAnalyzer::default().analyze(&wave, 1000.0).unwrap();
        let expected_db = 20.0 * (0.5 / 2.0_f32.sqrt()).log10();
        assert!((m.level_db - expected_db).abs() < 0.5, "{} vs {}", m.level_db, expected_db);
        assert!((m.detected_frequency - 1000.0).abs() < 5.0, "{}", m.detected_frequency);
        assert!(m.onset >= 14400 && m.onset <= 14401);
    }

    #[test]
    fn between_bins_is_accurate() {
        // bin width at 44.1 kHz / 8192 is 5.383 Hz; 1235.5 Hz sits at bin 229.5
        let wave = tone(1235.5, 0.2, 44100.0, 0, 20000);
        let m = ToneAnalyzer::default().analyze(&wave, 1235.5).unwrap();
        let expected = 0.2 / 2.0_f32.sqrt();
        assert!((20.0 * (m.magnitude / expected).log10()).abs() < 0.2);
    }

    #[test]
    fn short_segment_is_accurate() {
        let expected = 0.5 / 2.0_f32.sqrt();
        for len in [1000, 2400, 4800] {
            let wave = tone(1000.0, 0.5, 48000.0, 0, len);
            let m = ToneAnalyzer::default().analyze(&wave, 1000.0).unwrap();
            let err_db = 20.0 * (m.magnitude / expected).log10();
            assert!(err_db.abs() < 0.2, "len {len}: {err_db} dB");
            assert!((m.detected_frequency - 1000.0).abs() < 20.0, "{}", m.detected_frequency);
        }
    }

    #[test]
    fn silence_measures_floor() {
        let wave = Waveform::from_mono(vec![0.0; 10000], 48000.0);
        let m = ToneAnalyzer::default().analyze(&wave, 1000.0).unwrap();
        assert_eq!(m.level_db, SILENCE_DB);
        assert_eq!(m.magnitude, 0.0);
    }

    #[test]
    fn rejects_out_of_band_frequency() {
        let wave = Waveform::from_mono(vec![0.0; 100], 48000.0);
        let analyzer = ToneAnalyzer::default();
        assert!(matches!(
            analyzer.analyze(&wave, 30000.0),
            Err(AnalysisError::InvalidToneFrequency { .. })
        ));
        assert!(analyzer.analyze(&wave, 0.0).is_err());
        let bad_rate = Waveform::from_mono(vec![0.0; 100], 0.0);
        assert!(matches!(
            analyzer.analyze(&bad_rate, 1000.0),
            Err(AnalysisError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn one_point_analysis() {
        let m = ToneMeasurement {
            target_frequency: 1000.0,
            detected_frequency: 1001.0,
            magnitude: 0.3,
            level_db: -10.46,
            onset: 0,
        };
        let result = m.to_analysis();
        assert_eq!(result.frequencies, vec![1000.0]);
        assert_eq!(result.magnitudes, vec![0.3]);
    }
}
