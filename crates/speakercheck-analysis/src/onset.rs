//! Onset detection: where the useful signal starts in a recording.

/// Default amplitude a sample must exceed to count as signal.
pub const ONSET_THRESHOLD: f32 = 0.01;

/// Index of the first sample whose absolute value exceeds `threshold`.
///
/// Returns 0 when no sample qualifies (including an empty buffer), so callers
/// fall back to analysing from the start of the recording.
pub fn detect_onset(samples: &[f32], threshold: f32) -> usize {
    samples
        .iter()
        .position(|s| s.abs() > threshold)
        .unwrap_or(0)
}
