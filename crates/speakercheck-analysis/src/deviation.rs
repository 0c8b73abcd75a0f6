//! Deviation from a flat response, banded by severity.
//!
//! Every point is compared against a reference level (the mean of all
//! points above the noise floor) and classified:
//!
//! | |deviation|   | Severity  |
//! |---------------|-----------|
//! | < 3 dB        | good      |
//! | < 6 dB        | warning   |
//! | otherwise     | problem   |
//!
//! The bands summarise the curve for display; they are not a pass/fail
//! standard.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::response::AnalysisResult;

/// Magnitudes at or below this level are ignored when computing the reference.
pub const NOISE_FLOOR: f32 = 0.01;

/// Reference used when no magnitude exceeds [`NOISE_FLOOR`].
pub const FALLBACK_REFERENCE: f32 = 0.5;

/// Magnitudes at or below this level are reported as [`SILENCE_DB`].
pub const SILENCE_FLOOR: f32 = 0.001;

/// Deviation reported for silent points.
pub const SILENCE_DB: f32 = -60.0;

/// Upper bound (exclusive) of |deviation| for [`Severity::Good`].
pub const GOOD_LIMIT_DB: f32 = 3.0;

/// Upper bound (exclusive) of |deviation| for [`Severity::Warning`].
pub const WARNING_LIMIT_DB: f32 = 6.0;

/// Qualitative deviation band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Within ±3 dB of the reference.
    Good,
    /// Within ±6 dB of the reference.
    Warning,
    /// 6 dB or more away from the reference.
    Problem,
}

impl Severity {
    /// Band a deviation in dB.
    pub fn classify(deviation_db: f32) -> Self {
        let abs = deviation_db.abs();
        if abs < GOOD_LIMIT_DB {
            Severity::Good
        } else if abs < WARNING_LIMIT_DB {
            Severity::Warning
        } else {
            Severity::Problem
        }
    }

    /// Lowercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Good => "good",
            Severity::Warning => "warning",
            Severity::Problem => "problem",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One point of the deviation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviationPoint {
    /// Frequency in Hz.
    pub frequency: f32,
    /// Deviation from the reference level in dB.
    pub deviation_db: f32,
    /// Band of `deviation_db`.
    pub severity: Severity,
}

/// Mean of the magnitudes above [`NOISE_FLOOR`], or [`FALLBACK_REFERENCE`].
pub fn reference_level(magnitudes: &[f32]) -> f32 {
    let (sum, count) = magnitudes
        .iter()
        .filter(|&&m| m > NOISE_FLOOR)
        .fold((0.0f32, 0usize), |(sum, count), &m| (sum + m, count + 1));

    if count == 0 {
        FALLBACK_REFERENCE
    } else {
        sum / count as f32
    }
}

/// Deviation of `magnitude` from `reference` in dB, floored for silence.
pub fn deviation_db(magnitude: f32, reference: f32) -> f32 {
    if magnitude > SILENCE_FLOOR {
        20.0 * (magnitude / reference).log10()
    } else {
        SILENCE_DB
    }
}

/// Deviation curve of a response, one point per input point.
pub fn deviation_curve(result: &AnalysisResult) -> Vec<DeviationPoint> {
    let reference = reference_level(&result.magnitudes);
    result
        .iter()
        .map(|(frequency, magnitude)| {
            let deviation_db = deviation_db(magnitude, reference);
            DeviationPoint {
                frequency,
                deviation_db,
                severity: Severity::classify(deviation_db),
            }
        })
        .collect()
}

/// Aggregate view of a deviation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeviationSummary {
    /// Reference level the curve was normalised against.
    pub reference: f32,
    /// Points in the good band.
    pub good: usize,
    /// Points in the warning band.
    pub warning: usize,
    /// Points in the problem band.
    pub problem: usize,
    /// Point with the largest |deviation|, if any.
    pub worst: Option<DeviationPoint>,
}

impl DeviationSummary {
    /// Summarise `points`, which were computed against `reference`.
    pub fn from_points(points: &[DeviationPoint], reference: f32) -> Self {
        let mut summary = Self {
            reference,
            good: 0,
            warning: 0,
            problem: 0,
            worst: None,
        };

        for point in points {
            match point.severity {
                Severity::Good => summary.good += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Problem => summary.problem += 1,
            }
            let worse = summary
                .worst
                .is_none_or(|w| point.deviation_db.abs() > w.deviation_db.abs());
            if worse {
                summary.worst = Some(*point);
            }
        }

        summary
    }

    /// Summarise a response directly.
    pub fn of(result: &AnalysisResult) -> Self {
        Self::from_points(&deviation_curve(result), reference_level(&result.magnitudes))
    }

    /// Total number of points.
    pub fn total(&self) -> usize {
        self.good + self.warning + self.problem
    }

    /// Most severe band present, if any points were summarised.
    pub fn overall(&self) -> Option<Severity> {
        self.worst.map(|w| w.severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_of(magnitudes: Vec<f32>) -> AnalysisResult {
        let frequencies = (0..magnitudes.len()).map(|i| 100.0 * (i + 1) as f32).collect();
        AnalysisResult {
            frequencies,
            magnitudes,
        }
    }

    #[test]
    fn flat_response_is_all_good() {
        let curve = deviation_curve(&result_of(vec![0.3; 50]));
        assert!(curve.iter().all(|p| p.deviation_db.abs() < 1e-4));
        assert!(curve.iter().all(|p| p.severity == Severity::Good));
    }

    #[test]
    fn four_times_average_is_problem() {
        // 7 * 0.05 + 0.35 = 0.7, mean 0.0875; 0.35 / 0.0875 = 4
        let mut magnitudes = vec![0.05; 7];
        magnitudes.push(0.35);
        let curve = deviation_curve(&result_of(magnitudes));
        let peak = curve[7];
        assert!((peak.deviation_db - 12.04).abs() < 0.01, "{}", peak.deviation_db);
        assert_eq!(peak.severity, Severity::Problem);
    }

    #[test]
    fn reference_ignores_noise_floor() {
        assert!((reference_level(&[0.2, 0.4, 0.005, 0.0]) - 0.3).abs() < 1e-6);
        assert_eq!(reference_level(&[0.01, 0.0, 0.009]), FALLBACK_REFERENCE);
        assert_eq!(reference_level(&[]), FALLBACK_REFERENCE);
    }

    #[test]
    fn silence_floor() {
        assert_eq!(deviation_db(0.001, 0.5), SILENCE_DB);
        assert_eq!(deviation_db(0.0, 0.5), SILENCE_DB);
        assert!(deviation_db(0.0011, 0.5) > SILENCE_DB);
    }

    #[test]
    fn band_edges() {
        assert_eq!(Severity::classify(2.99), Severity::Good);
        assert_eq!(Severity::classify(3.0), Severity::Warning);
        assert_eq!(Severity::classify(-5.99), Severity::Warning);
        assert_eq!(Severity::classify(-6.0), Severity::Problem);
        assert_eq!(Severity::classify(SILENCE_DB), Severity::Problem);
    }

    #[test]
    fn summary_counts_and_worst() {
        let points = [
            DeviationPoint {
                frequency: 100.0,
                deviation_db: 1.0,
                severity: Severity::Good,
            },
            DeviationPoint {
                frequency: 200.0,
                deviation_db: -4.0,
                severity: Severity::Warning,
            },
            DeviationPoint {
                frequency: 300.0,
                deviation_db: 9.0,
                severity: Severity::Problem,
            },
            DeviationPoint {
                frequency: 400.0,
                deviation_db: -2.0,
                severity: Severity::Good,
            },
        ];
        let summary = DeviationSummary::from_points(&points, 0.3);
        assert_eq!((summary.good, summary.warning, summary.problem), (2, 1, 1));
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.worst.map(|p| p.frequency), Some(300.0));
        assert_eq!(summary.overall(), Some(Severity::Problem));
    }

    #[test]
    fn empty_summary() {
        let summary = DeviationSummary::of(&AnalysisResult::default());
        assert_eq!(summary.total(), 0);
        assert!(summary.worst.is_none());
        assert_eq!(summary.reference, FALLBACK_REFERENCE);
    }

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Warning.to_string(), "warning");
        assert_eq!(Severity::Problem.as_str(), "problem");
    }
}
