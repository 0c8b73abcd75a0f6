//! End-to-end measurements through the loopback backend.

use speakercheck_analysis::{
    DeviationSummary, FrequencyResponseBuilder, Severity, SweepSpec, ToneAnalyzer,
    deviation_curve,
};
use speakercheck_config::{Channel, MeasurementSettings, TestType};
use speakercheck_io::{
    Excitation, LoopbackBackend, MeasurementContext, WavSpec, read_wav, write_wav,
};

const LATENCY: usize = 480;

fn context(gain: f32) -> MeasurementContext {
    let settings = MeasurementSettings {
        buffer_size: 256,
        tail_secs: 0.1,
        sweep: SweepSpec::new(1000.0, 10000.0, 1.0).unwrap(),
        tone_duration_secs: 0.5,
        ..MeasurementSettings::default()
    };
    let backend = LoopbackBackend::new(LATENCY, gain).with_speed(20.0);
    MeasurementContext::new(Box::new(backend), settings)
}

#[test]
fn loopback_sweep_is_flat_and_onset_matches_latency() {
    let mut context = context(1.0);
    let excitation = Excitation::for_test(TestType::Sweep, context.settings());
    let sweep = context.settings().sweep;
    let measurement = context.run(&excitation, Channel::Left).unwrap();
    context.close();

    let report = FrequencyResponseBuilder::new(sweep)
        .with_resolution(100)
        .unwrap()
        .analyze_detailed(&measurement.recording);

    assert!(report.is_complete());
    assert!(
        (LATENCY..LATENCY + 8).contains(&report.start_index),
        "onset {} for latency {LATENCY}",
        report.start_index
    );

    let curve = deviation_curve(&report.result);
    assert!(curve.iter().all(|p| p.severity == Severity::Good));
    let summary = DeviationSummary::of(&report.result);
    assert_eq!(summary.good, 100);
    assert!(summary.worst.unwrap().deviation_db.abs() < 0.5);
}

#[test]
fn loopback_tone_level() {
    let mut context = context(0.5);
    let excitation = Excitation::for_test(TestType::Tone, context.settings());
    let measurement = context.run(&excitation, Channel::Both).unwrap();

    // Both channels at -3 dB sum to sqrt(2); peak 0.5 * 0.5 * sqrt(2), RMS 0.25.
    let expected = 0.25;
    let tone = ToneAnalyzer::default()
        .analyze(&measurement.recording, 1000.0)
        .unwrap();
    assert!(
        (tone.magnitude - expected).abs() < 0.01,
        "magnitude {}",
        tone.magnitude
    );
    assert!((tone.detected_frequency - 1000.0).abs() < 5.0);
}

#[test]
fn context_runs_repeatedly() {
    let mut context = context(1.0);
    let tone = Excitation::Tone {
        frequency: 500.0,
        duration_secs: 0.1,
    };
    for channel in [Channel::Left, Channel::Right, Channel::Both] {
        let measurement = context.run(&tone, channel).unwrap();
        assert_eq!(measurement.recording.len(), 4800 + 4800);
    }
}

#[test]
fn recording_survives_wav_round_trip() {
    let mut context = context(1.0);
    let excitation = Excitation::for_test(TestType::Sweep, context.settings());
    let sweep = context.settings().sweep;
    let measurement = context.run(&excitation, Channel::Right).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recording.wav");
    write_wav(&path, measurement.recording.samples(), WavSpec::default()).unwrap();
    let (reloaded, spec) = read_wav(&path).unwrap();
    assert_eq!(spec.sample_rate, 48000);

    let builder = FrequencyResponseBuilder::new(sweep);
    assert_eq!(
        builder.analyze(&measurement.recording),
        builder.analyze(&reloaded)
    );
}
