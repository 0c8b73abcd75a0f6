//! Excitation signals played during a measurement.

use speakercheck_analysis::{AnalysisError, SweepSpec};
use speakercheck_config::{Channel, MeasurementSettings, TestType};
use std::f64::consts::PI;

use crate::Result;

/// Signal played through the speaker under test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Excitation {
    /// Constant-frequency sine.
    Tone {
        /// Frequency in Hz.
        frequency: f32,
        /// Length in seconds.
        duration_secs: f32,
    },
    /// Exponential sine sweep.
    Sweep(SweepSpec),
}

impl Excitation {
    /// The excitation a test of `test_type` plays under `settings`.
    pub fn for_test(test_type: TestType, settings: &MeasurementSettings) -> Self {
        match test_type {
            TestType::Tone => Excitation::Tone {
                frequency: settings.tone_frequency,
                duration_secs: settings.tone_duration_secs,
            },
            TestType::Sweep => Excitation::Sweep(settings.sweep),
        }
    }

    /// Test type this excitation belongs to.
    pub fn test_type(&self) -> TestType {
        match self {
            Excitation::Tone { .. } => TestType::Tone,
            Excitation::Sweep(_) => TestType::Sweep,
        }
    }

    /// Length in seconds.
    pub fn duration_secs(&self) -> f32 {
        match self {
            Excitation::Tone { duration_secs, .. } => *duration_secs,
            Excitation::Sweep(sweep) => sweep.duration_secs(),
        }
    }

    /// Number of frames at `sample_rate`.
    pub fn num_frames(&self, sample_rate: u32) -> usize {
        (sample_rate as f32 * self.duration_secs()).floor() as usize
    }

    /// Render mono samples with peak `amplitude`.
    ///
    /// Sweeps use the closed-form phase of [`SweepSpec::phase_at`], so the
    /// instantaneous frequency at every sample is exactly what the response
    /// builder assumes.
    pub fn render(&self, sample_rate: u32, amplitude: f32) -> Result<Vec<f32>> {
        self.validate(sample_rate)?;
        let sr = f64::from(sample_rate);
        let amplitude = f64::from(amplitude);
        let frames = self.num_frames(sample_rate);

        let samples = match self {
            Excitation::Tone { frequency, .. } => {
                let omega = 2.0 * PI * f64::from(*frequency) / sr;
                (0..frames)
                    .map(|i| (amplitude * (omega * i as f64).sin()) as f32)
                    .collect()
            }
            Excitation::Sweep(sweep) => (0..frames)
                .map(|i| (amplitude * sweep.phase_at(i as f64 / sr).sin()) as f32)
                .collect(),
        };
        Ok(samples)
    }

    /// Render interleaved frames routed to `channel`.
    ///
    /// The mono signal is placed with equal-power panning across the first two
    /// output channels (see [`pan_gains`]). A mono output carries the signal
    /// unpanned; channels beyond the second are silent.
    pub fn render_panned(
        &self,
        sample_rate: u32,
        amplitude: f32,
        channel: Channel,
        output_channels: u16,
    ) -> Result<Vec<f32>> {
        let mono = self.render(sample_rate, amplitude)?;
        let channels = usize::from(output_channels.max(1));
        if channels == 1 {
            return Ok(mono);
        }

        let (gain_l, gain_r) = pan_gains(channel.pan());
        let mut out = vec![0.0; mono.len() * channels];
        for (frame, &sample) in out.chunks_exact_mut(channels).zip(&mono) {
            frame[0] = sample * gain_l;
            frame[1] = sample * gain_r;
        }
        Ok(out)
    }

    fn validate(&self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(AnalysisError::InvalidSampleRate(0.0).into());
        }
        if let Excitation::Tone { frequency, .. } = self {
            let nyquist = sample_rate as f32 / 2.0;
            if !(frequency.is_finite() && *frequency > 0.0 && *frequency < nyquist) {
                return Err(AnalysisError::InvalidToneFrequency {
                    frequency: *frequency,
                    nyquist,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Equal-power stereo gains for `pan` in [-1, 1].
///
/// `gain_l = cos((pan + 1) * pi / 4)`, `gain_r = sin((pan + 1) * pi / 4)`:
/// -1 is left only, +1 right only, 0 both at -3 dB.
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let x = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (x.cos(), x.sin())
}
