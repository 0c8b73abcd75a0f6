//! Error types for analysis configuration.

use thiserror::Error;

/// Errors raised when constructing analysis parameters.
///
/// Running an analysis over a well-formed [`Waveform`](crate::Waveform) never
/// fails; only invalid parameters are rejected, and they are rejected up front.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Sweep parameters do not describe an increasing exponential sweep.
    #[error("invalid sweep {start_freq} Hz -> {end_freq} Hz over {duration_secs} s: {reason}")]
    InvalidSweep {
        /// Requested start frequency in Hz.
        start_freq: f32,
        /// Requested end frequency in Hz.
        end_freq: f32,
        /// Requested duration in seconds.
        duration_secs: f32,
        /// Which constraint was violated.
        reason: &'static str,
    },

    /// Resolution must be at least one point.
    #[error("resolution must be at least 1 point")]
    InvalidResolution,

    /// Sample rate must be positive and finite.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),

    /// Tone frequency must be positive and below Nyquist.
    #[error("tone frequency {frequency} Hz is outside (0, {nyquist}) Hz")]
    InvalidToneFrequency {
        /// Requested tone frequency in Hz.
        frequency: f32,
        /// Nyquist frequency of the recording in Hz.
        nyquist: f32,
    },
}

/// Convenience result type for analysis configuration.
pub type Result<T> = std::result::Result<T, AnalysisError>;
