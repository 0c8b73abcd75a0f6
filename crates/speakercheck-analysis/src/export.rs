//! Export formats for analysis results.
//!
//! Provides interoperability with standard audio measurement tools:
//! - FRD format (frequency response data, compatible with REW)
//! - CSV format with the deviation curve for spreadsheets

use crate::deviation::deviation_curve;
use crate::response::AnalysisResult;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Floor applied before converting a linear magnitude to dB for export.
const MIN_EXPORT_MAGNITUDE: f32 = 1e-10;

/// Export a response to FRD format (REW compatible).
///
/// FRD (Frequency Response Data) is a simple text format:
/// - `*` comment lines
/// - One measurement per line: `frequency_hz magnitude_db phase_deg`
///
/// The analysis is magnitude-only, so phase is written as 0.
///
/// # Example
///
/// ```rust,ignore
/// use speakercheck_analysis::export::export_frd;
///
/// export_frd(&result, "speaker.frd")?;
/// ```
pub fn export_frd(result: &AnalysisResult, path: impl AsRef<Path>) -> std::io::Result<()> {
    let mut file = BufWriter::new(std::fs::File::create(path)?);

    writeln!(file, "* Frequency Response Data exported by speakercheck")?;
    writeln!(file, "* Freq(Hz) SPL(dB) Phase(degrees)")?;

    for (freq, mag) in result.iter() {
        let mag_db = 20.0 * mag.max(MIN_EXPORT_MAGNITUDE).log10();
        writeln!(file, "{:.6} {:.6} {:.6}", freq, mag_db, 0.0)?;
    }

    file.flush()
}

/// Import a response from FRD format.
///
/// Comment lines (`*` or `#`) and lines that do not start with two numbers
/// are skipped. Magnitudes are converted from dB back to linear.
pub fn import_frd(path: impl AsRef<Path>) -> std::io::Result<AnalysisResult> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut frequencies = Vec::new();
    let mut magnitudes = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with('*') {
            continue;
        }

        let mut parts = line.split_whitespace();
        if let (Some(freq), Some(mag)) = (parts.next(), parts.next())
            && let (Ok(freq), Ok(mag_db)) = (freq.parse::<f32>(), mag.parse::<f32>())
        {
            frequencies.push(freq);
            magnitudes.push(10.0_f32.powf(mag_db / 20.0));
        }
    }

    Ok(AnalysisResult {
        frequencies,
        magnitudes,
    })
}

/// Export a response and its deviation curve to CSV.
///
/// Columns: `frequency_hz,magnitude,deviation_db,severity`.
pub fn export_csv(result: &AnalysisResult, path: impl AsRef<Path>) -> std::io::Result<()> {
    let mut file = BufWriter::new(std::fs::File::create(path)?);

    writeln!(file, "frequency_hz,magnitude,deviation_db,severity")?;
    for (point, magnitude) in deviation_curve(result).iter().zip(&result.magnitudes) {
        writeln!(
            file,
            "{:.3},{:.6},{:.3},{}",
            point.frequency, magnitude, point.deviation_db, point.severity
        )?;
    }

    file.flush()
}
