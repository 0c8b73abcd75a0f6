//! Property-based tests for the response builder and deviation estimator.

use proptest::prelude::*;
use speakercheck_analysis::{
    AnalysisResult, FrequencyResponseBuilder, Severity, SweepSpec, Waveform, deviation_curve,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any valid sweep, resolution and recording length, the response has
    /// exactly `resolution` points and non-decreasing frequencies.
    #[test]
    fn response_shape_and_order(
        start in 1.0f32..2000.0,
        ratio in 2.0f32..1000.0,
        duration in 0.05f32..5.0,
        sample_rate in prop::sample::select(vec![8000.0f32, 22050.0, 44100.0, 48000.0, 96000.0]),
        resolution in 1usize..400,
        len in 0usize..20000,
        silence in 0usize..2000,
    ) {
        let sweep = SweepSpec::new(start, start * ratio, duration).unwrap();
        let mut samples = vec![0.0; silence.min(len)];
        samples.resize(len, 0.5);
        let wave = Waveform::from_mono(samples, sample_rate);

        let report = FrequencyResponseBuilder::new(sweep)
            .with_resolution(resolution)
            .unwrap()
            .analyze_detailed(&wave);

        prop_assert_eq!(report.result.frequencies.len(), resolution);
        prop_assert_eq!(report.result.magnitudes.len(), resolution);
        prop_assert!(report.measured_windows <= resolution);
        prop_assert!(report.result.frequencies.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(report.result.magnitudes.iter().all(|m| m.is_finite()));
        prop_assert!(
            report.result.magnitudes[report.measured_windows..].iter().all(|&m| m == 0.0)
        );
    }

    /// Every deviation point is banded according to its |dB| value.
    #[test]
    fn severity_matches_thresholds(
        magnitudes in prop::collection::vec(0.0f32..1.0, 1..300),
    ) {
        let result = AnalysisResult {
            frequencies: (0..magnitudes.len()).map(|i| 20.0 + i as f32).collect(),
            magnitudes,
        };

        for point in deviation_curve(&result) {
            prop_assert!(point.deviation_db.is_finite());
            let abs = point.deviation_db.abs();
            let expected = if abs < 3.0 {
                Severity::Good
            } else if abs < 6.0 {
                Severity::Warning
            } else {
                Severity::Problem
            };
            prop_assert_eq!(point.severity, expected);
        }
    }

    /// A curve scaled by a constant gain has the same deviation curve.
    #[test]
    fn deviation_is_gain_invariant(
        magnitudes in prop::collection::vec(0.05f32..1.0, 1..100),
        gain in 0.5f32..2.0,
    ) {
        let frequencies: Vec<f32> = (0..magnitudes.len()).map(|i| 100.0 * (i + 1) as f32).collect();
        let base = AnalysisResult {
            frequencies: frequencies.clone(),
            magnitudes: magnitudes.clone(),
        };
        let scaled = AnalysisResult {
            frequencies,
            magnitudes: magnitudes.iter().map(|m| m * gain).collect(),
        };

        for (a, b) in deviation_curve(&base).iter().zip(deviation_curve(&scaled).iter()) {
            prop_assert!((a.deviation_db - b.deviation_db).abs() < 1e-3);
        }
    }
}
