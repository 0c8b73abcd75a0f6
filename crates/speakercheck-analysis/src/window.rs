//! Windowed magnitude sampling.
//!
//! The region of a recording covered by the sweep is cut into `resolution`
//! equal, contiguous windows and each window is reduced to its RMS level.

/// Compute RMS (Root Mean Square) level of a signal.
///
/// Returns RMS value in linear scale (not dB). An empty slice has RMS 0.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }

    let sum_sq: f32 = signal.iter().map(|&x| x * x).sum();
    (sum_sq / signal.len() as f32).sqrt()
}

/// Layout of the analysis windows over a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    /// First sample of window 0.
    pub start_index: usize,
    /// Length of every window in samples.
    pub window_samples: usize,
    /// Number of windows (output points).
    pub resolution: usize,
}

impl WindowPlan {
    /// Plan `resolution` windows covering `floor(sample_rate * duration_secs)`
    /// samples starting at `start_index`.
    pub fn new(
        start_index: usize,
        sample_rate: f32,
        duration_secs: f32,
        resolution: usize,
    ) -> Self {
        let valid_samples = (sample_rate * duration_secs).floor() as usize;
        let window_samples = valid_samples.checked_div(resolution).unwrap_or(0);
        Self {
            start_index,
            window_samples,
            resolution,
        }
    }

    /// Sample range `[begin, end)` of window `index`.
    pub fn span(&self, index: usize) -> (usize, usize) {
        let begin = self.start_index + index * self.window_samples;
        (begin, begin + self.window_samples)
    }

    /// Offset of window `index` from the start of the sweep, in samples.
    pub fn offset(&self, index: usize) -> usize {
        index * self.window_samples
    }
}

/// Per-window RMS magnitudes for a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMagnitudes {
    /// One value per window; always `plan.resolution` long.
    pub magnitudes: Vec<f32>,
    /// Windows that fitted inside the buffer and were measured.
    pub measured: usize,
}

/// Measure every window of `plan` over `samples`.
///
/// Sampling stops at the first window whose end lies past the buffer; that
/// window and every later one keep magnitude 0.0. The output length never
/// depends on the buffer length.
pub fn sample_windows(samples: &[f32], plan: &WindowPlan) -> WindowMagnitudes {
    let mut magnitudes = vec![0.0; plan.resolution];
    let mut measured = 0;

    for (i, magnitude) in magnitudes.iter_mut().enumerate() {
        let (begin, end) = plan.span(i);
        if end > samples.len() {
            break;
        }
        *magnitude = rms(&samples[begin..end]);
        measured += 1;
    }

    WindowMagnitudes {
        magnitudes,
        measured,
    }
}
