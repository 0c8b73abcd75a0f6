//! Real-input FFT and analysis windows for the tone estimator.

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Taper applied before transforming a tone segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    /// No taper.
    Rectangular,
    /// Raised cosine; four-bin main lobe.
    #[default]
    Hann,
    /// Three-term Blackman; lower sidelobes, six-bin main lobe.
    Blackman,
}

impl Window {
    /// Coefficient `i` of an `n`-point periodic window.
    pub fn coefficient(&self, i: usize, n: usize) -> f32 {
        let x = 2.0 * PI * i as f32 / n.max(1) as f32;
        match self {
            Window::Rectangular => 1.0,
            Window::Hann => 0.5 - 0.5 * x.cos(),
            Window::Blackman => 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos(),
        }
    }

    /// Taper `buffer` in place.
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.coefficient(i, n);
        }
    }

    /// All `size` coefficients.
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        (0..size).map(|i| self.coefficient(i, size)).collect()
    }

    /// Sum of squared coefficients, used to undo the window's power loss.
    pub fn energy(&self, size: usize) -> f32 {
        (0..size).map(|i| self.coefficient(i, size).powi(2)).sum()
    }
}

/// Planned forward FFT of a fixed size.
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
}

impl Fft {
    /// Plan a transform of `size` points.
    pub fn new(size: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(size);
        Self { fft, size }
    }

    /// Transform length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Width of one bin in Hz at `sample_rate`.
    pub fn bin_width(&self, sample_rate: f32) -> f32 {
        sample_rate / self.size as f32
    }

    /// Positive-frequency half of the spectrum (`size/2 + 1` bins).
    ///
    /// Input longer than the transform is truncated, shorter input is
    /// zero-padded.
    pub fn forward(&self, input: &[f32]) -> Vec<Complex<f32>> {
        let mut buffer = vec![Complex::new(0.0, 0.0); self.size];
        for (slot, &x) in buffer.iter_mut().zip(input) {
            slot.re = x;
        }
        self.fft.process(&mut buffer);
        buffer.truncate(self.size / 2 + 1);
        buffer
    }

    /// `|X[k]|^2` for the positive-frequency bins.
    pub fn power_spectrum(&self, input: &[f32]) -> Vec<f32> {
        self.forward(input).iter().map(|c| c.norm_sqr()).collect()
    }
}

impl std::fmt::Debug for Fft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft").field("size", &self.size).finish()
    }
}
