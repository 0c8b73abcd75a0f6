//! WAV files for excitation signals and recordings.
//!
//! Excitations are written as 32-bit float so the generated sweep is stored
//! bit-exact. Recordings may come from any tool, so integer files of any
//! depth are accepted on the way in and scaled to `[-1, 1)`.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use speakercheck_analysis::Waveform;
use std::path::Path;

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Interleaved channels in the file.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth; 32 means float, anything else is integer PCM.
    pub bits_per_sample: u16,
}

impl WavSpec {
    /// Mono 32-bit float at `sample_rate`, the format recordings are saved in.
    pub fn mono(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
        }
    }

    fn is_float(&self) -> bool {
        self.bits_per_sample == 32
    }

    /// Full-scale value of an integer sample.
    fn int_scale(&self) -> f32 {
        (1i64 << (self.bits_per_sample.clamp(2, 32) - 1)) as f32
    }
}

impl Default for WavSpec {
    fn default() -> Self {
        Self::mono(48000)
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.is_float() {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Read a recording, keeping only channel 0.
///
/// The measurement microphone is expected on the first channel; the other
/// channels of a multi-channel capture are discarded. Float files holding NaN
/// or infinite samples are rejected.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Waveform, WavSpec)> {
    let reader = WavReader::open(path)?;
    let format = reader.spec().sample_format;
    let spec = WavSpec::from(reader.spec());

    let interleaved: Vec<f32> = if format == SampleFormat::Float {
        let samples: Vec<f32> = reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?;
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(Error::NonFiniteSample(index / usize::from(spec.channels.max(1))));
        }
        samples
    } else {
        let scale = spec.int_scale();
        reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / scale))
            .collect::<std::result::Result<_, _>>()?
    };

    let waveform = Waveform::from_interleaved(
        &interleaved,
        usize::from(spec.channels),
        spec.sample_rate as f32,
    );
    tracing::debug!(
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        frames = waveform.len(),
        "read WAV"
    );
    Ok((waveform, spec))
}

/// Write interleaved samples holding `spec.channels` channels.
///
/// Integer output is clamped to full scale.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[f32], spec: WavSpec) -> Result<()> {
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.is_float() {
        samples.iter().try_for_each(|&s| writer.write_sample(s))?;
    } else {
        let scale = spec.int_scale();
        samples
            .iter()
            .try_for_each(|&s| writer.write_sample((s * scale).clamp(-scale, scale - 1.0) as i32))?;
    }

    writer.finalize()?;
    Ok(())
}
