//! Speakercheck Analysis - frequency response engine for loudspeaker tests
//!
//! Turns a microphone recording of a known excitation into a
//! magnitude-vs-frequency curve:
//!
//! - [`sweep`] - Exponential sweep model (time to frequency)
//! - [`onset`] - Leading silence / latency detection
//! - [`window`] - Windowed RMS magnitude sampling
//! - [`response`] - Frequency response builder
//! - [`deviation`] - Deviation-from-flat curve with severity bands
//! - [`tone`] - Single-tone level estimation
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`export`] - FRD and CSV export
//!
//! ## Example Workflow
//!
//! ```rust,ignore
//! use speakercheck_analysis::{FrequencyResponseBuilder, SweepSpec, Waveform, deviation_curve};
//!
//! // 1. The same sweep drives generation and analysis
//! let sweep = SweepSpec::new(20.0, 20000.0, 10.0)?;
//!
//! // 2. Play it and record the speaker (external)
//! let recording = Waveform::from_mono(samples, 48000.0);
//!
//! // 3. Build the response and compare against flat
//! let result = FrequencyResponseBuilder::new(sweep).analyze(&recording);
//! for point in deviation_curve(&result) {
//!     println!("{:>8.1} Hz {:+6.1} dB {}", point.frequency, point.deviation_db, point.severity);
//! }
//! ```

pub mod deviation;
pub mod error;
pub mod export;
pub mod fft;
pub mod onset;
pub mod response;
pub mod sweep;
pub mod tone;
pub mod waveform;
pub mod window;

// Re-export main types
pub use deviation::{
    DeviationPoint, DeviationSummary, Severity, deviation_curve, deviation_db, reference_level,
};
pub use error::{AnalysisError, Result};
pub use fft::{Fft, Window};
pub use onset::{ONSET_THRESHOLD, detect_onset};
pub use response::{AnalysisResult, DEFAULT_RESOLUTION, FrequencyResponseBuilder, ResponseReport};
pub use sweep::SweepSpec;
pub use tone::{ToneAnalyzer, ToneMeasurement};
pub use waveform::Waveform;
pub use window::{WindowMagnitudes, WindowPlan, rms, sample_windows};
