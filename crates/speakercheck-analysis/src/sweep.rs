//! Exponential sine sweep model.
//!
//! A logarithmic sweep spends equal time per octave: its instantaneous
//! frequency grows geometrically,
//!
//! ```text
//! f(t) = f_start * (f_end / f_start)^(t / T)
//! ```
//!
//! The same [`SweepSpec`] value must drive both the signal generator and the
//! analysis, otherwise the time-to-frequency labelling is silently wrong.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{AnalysisError, Result};

/// Parameters of an exponential (constant-percentage) sweep.
///
/// Deserialized values go through [`SweepSpec::new`], so a persisted sweep is
/// validated exactly like one built in code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SweepFields")]
pub struct SweepSpec {
    start_freq: f32,
    end_freq: f32,
    duration_secs: f32,
}

impl SweepSpec {
    /// Format version of the sweep description, bumped whenever the
    /// generation formula or the meaning of a field changes.
    pub const VERSION: u32 = 1;

    /// Default sweep: 20 Hz to 20 kHz over 10 seconds.
    pub const DEFAULT: SweepSpec = SweepSpec {
        start_freq: 20.0,
        end_freq: 20000.0,
        duration_secs: 10.0,
    };

    /// Create a validated sweep description.
    ///
    /// # Arguments
    /// * `start_freq` - Start frequency in Hz (must be > 0)
    /// * `end_freq` - End frequency in Hz (must be > `start_freq`)
    /// * `duration_secs` - Sweep duration in seconds (must be > 0)
    pub fn new(start_freq: f32, end_freq: f32, duration_secs: f32) -> Result<Self> {
        let invalid = |reason| AnalysisError::InvalidSweep {
            start_freq,
            end_freq,
            duration_secs,
            reason,
        };

        if !(start_freq.is_finite() && end_freq.is_finite() && duration_secs.is_finite()) {
            return Err(invalid("parameters must be finite"));
        }
        if start_freq <= 0.0 {
            return Err(invalid("start frequency must be positive"));
        }
        if start_freq >= end_freq {
            return Err(invalid("start frequency must be below end frequency"));
        }
        if duration_secs <= 0.0 {
            return Err(invalid("duration must be positive"));
        }

        Ok(Self {
            start_freq,
            end_freq,
            duration_secs,
        })
    }

    /// Start frequency in Hz.
    pub fn start_freq(&self) -> f32 {
        self.start_freq
    }

    /// End frequency in Hz.
    pub fn end_freq(&self) -> f32 {
        self.end_freq
    }

    /// Sweep duration in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.duration_secs
    }

    /// Per-second frequency growth factor `k = (f_end / f_start)^(1 / T)`.
    pub fn growth_rate(&self) -> f32 {
        (self.end_freq / self.start_freq).powf(1.0 / self.duration_secs)
    }

    /// Instantaneous frequency in Hz at `t` seconds after the sweep started.
    ///
    /// `t` is not clamped; callers sampling past the end of the sweep get the
    /// extrapolated geometric continuation.
    pub fn frequency_at(&self, t: f32) -> f32 {
        self.start_freq * (self.end_freq / self.start_freq).powf(t / self.duration_secs)
    }

    /// Closed-form phase in radians at `t` seconds.
    ///
    /// The derivative of this phase divided by `2π` is exactly
    /// [`frequency_at`](Self::frequency_at), so a generator built on it
    /// produces the sweep the analysis assumes. Computed in `f64` because the
    /// accumulated phase of a long sweep exceeds the precision of `f32`.
    pub fn phase_at(&self, t: f64) -> f64 {
        let start = f64::from(self.start_freq);
        let duration = f64::from(self.duration_secs);
        let ln_ratio = (f64::from(self.end_freq) / start).ln();
        2.0 * PI * start * duration / ln_ratio * ((ln_ratio * t / duration).exp() - 1.0)
    }

    /// Number of samples covered by the sweep at `sample_rate`.
    pub fn num_samples(&self, sample_rate: f32) -> usize {
        (sample_rate * self.duration_secs).floor() as usize
    }
}

/// Unvalidated wire form of [`SweepSpec`].
#[derive(Deserialize)]
struct SweepFields {
    start_freq: f32,
    end_freq: f32,
    duration_secs: f32,
}

impl TryFrom<SweepFields> for SweepSpec {
    type Error = AnalysisError;

    fn try_from(fields: SweepFields) -> Result<Self> {
        Self::new(fields.start_freq, fields.end_freq, fields.duration_secs)
    }
}

impl Default for SweepSpec {
    fn default() -> Self {
        Self::DEFAULT
    }
}
