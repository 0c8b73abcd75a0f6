//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::Args;
use speakercheck_analysis::export::{export_csv, export_frd};
use speakercheck_analysis::{
    AnalysisResult, DeviationSummary, FrequencyResponseBuilder, ResponseReport, Severity,
    SweepSpec, ToneAnalyzer, ToneMeasurement, Waveform, deviation_curve, reference_level,
};
use speakercheck_config::{
    Channel, FileStore, HistoryLog, MeasurementSettings, TestRecord, TestType, default_config_path,
    history_dir,
};
use std::path::{Path, PathBuf};

/// Options accepted by every subcommand.
#[derive(Args)]
pub struct GlobalOpts {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory the test history is stored in
    #[arg(long, global = true, value_name = "PATH")]
    pub history_dir: Option<PathBuf>,
}

impl GlobalOpts {
    /// Load settings from `--config`, or the default file if it exists.
    pub fn settings(&self) -> anyhow::Result<MeasurementSettings> {
        match &self.config {
            Some(path) => MeasurementSettings::load(path)
                .with_context(|| format!("loading settings from {}", path.display())),
            None => Ok(MeasurementSettings::load_or_default(default_config_path())?),
        }
    }

    /// Open the history log.
    pub fn history(&self) -> HistoryLog<FileStore> {
        let dir = self.history_dir.clone().unwrap_or_else(history_dir);
        HistoryLog::open(FileStore::new(dir))
    }
}

/// Sweep overrides on top of the configured sweep.
#[derive(Args, Default)]
pub struct SweepOpts {
    /// Sweep start frequency in Hz
    #[arg(long)]
    pub start: Option<f32>,

    /// Sweep end frequency in Hz
    #[arg(long)]
    pub end: Option<f32>,

    /// Sweep duration in seconds
    #[arg(long)]
    pub duration: Option<f32>,
}

impl SweepOpts {
    /// Apply the overrides to `base`.
    pub fn resolve(&self, base: SweepSpec) -> anyhow::Result<SweepSpec> {
        Ok(SweepSpec::new(
            self.start.unwrap_or(base.start_freq()),
            self.end.unwrap_or(base.end_freq()),
            self.duration.unwrap_or(base.duration_secs()),
        )?)
    }
}

/// Result of analysing one recording.
pub enum Outcome {
    /// Swept response.
    Sweep {
        /// Response with window bookkeeping.
        report: ResponseReport,
        /// Sweep the recording was analysed against.
        sweep: SweepSpec,
    },
    /// Single tone level.
    Tone(ToneMeasurement),
}

impl Outcome {
    pub fn test_type(&self) -> TestType {
        match self {
            Outcome::Sweep { .. } => TestType::Sweep,
            Outcome::Tone(_) => TestType::Tone,
        }
    }

    pub fn result(&self) -> AnalysisResult {
        match self {
            Outcome::Sweep { report, .. } => report.result.clone(),
            Outcome::Tone(tone) => tone.to_analysis(),
        }
    }

    /// History record for this outcome.
    pub fn record(&self, channel: Channel) -> TestRecord {
        let record = TestRecord::new(self.test_type(), channel, self.result());
        match self {
            Outcome::Sweep { sweep, .. } => record.with_sweep(*sweep),
            Outcome::Tone(_) => record,
        }
    }
}

/// Analyse `waveform` as a sweep or tone recording.
pub fn analyze_waveform(
    waveform: &Waveform,
    test_type: TestType,
    sweep: SweepSpec,
    resolution: usize,
    tone_frequency: f32,
) -> anyhow::Result<Outcome> {
    match test_type {
        TestType::Sweep => {
            let report = FrequencyResponseBuilder::new(sweep)
                .with_resolution(resolution)?
                .analyze_detailed(waveform);
            Ok(Outcome::Sweep { report, sweep })
        }
        TestType::Tone => Ok(Outcome::Tone(
            ToneAnalyzer::default().analyze(waveform, tone_frequency)?,
        )),
    }
}

/// Print an outcome as text or JSON.
pub fn print_outcome(outcome: &Outcome, json: bool, all_points: bool) -> anyhow::Result<()> {
    let result = outcome.result();

    if json {
        let tone = match outcome {
            Outcome::Tone(tone) => Some(tone),
            Outcome::Sweep { .. } => None,
        };
        let value = serde_json::json!({
            "type": outcome.test_type(),
            "analysis": result,
            "deviation": deviation_curve(&result),
            "summary": DeviationSummary::of(&result),
            "tone": tone,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match outcome {
        Outcome::Sweep { report, sweep } => {
            println!(
                "Sweep {:.0} Hz -> {:.0} Hz over {:.1} s",
                sweep.start_freq(),
                sweep.end_freq(),
                sweep.duration_secs()
            );
            println!(
                "  Onset: sample {} | window: {} samples",
                report.start_index, report.window_samples
            );
            if !report.is_complete() {
                println!(
                    "  [!] Recording too short: {}/{} windows measured",
                    report.measured_windows,
                    report.result.len()
                );
            }
            println!();
            print_response(&result, all_points);
        }
        Outcome::Tone(tone) => {
            println!("Tone {:.1} Hz", tone.target_frequency);
            println!("  Detected: {:.1} Hz", tone.detected_frequency);
            println!("  Level:    {:.4} ({:.1} dBFS)", tone.magnitude, tone.level_db);
            println!("  Onset:    sample {}", tone.onset);
        }
    }
    Ok(())
}

/// Print the deviation summary and the points outside the good band.
pub fn print_response(result: &AnalysisResult, all_points: bool) {
    let points = deviation_curve(result);
    let summary = DeviationSummary::from_points(&points, reference_level(&result.magnitudes));

    println!("Reference level: {:.4}", summary.reference);
    println!(
        "Points: {} good, {} warning, {} problem",
        summary.good, summary.warning, summary.problem
    );
    if let Some(worst) = summary.worst {
        println!(
            "Largest deviation: {:+.1} dB at {:.0} Hz ({})",
            worst.deviation_db, worst.frequency, worst.severity
        );
    }

    let rows: Vec<_> = points
        .iter()
        .zip(&result.magnitudes)
        .filter(|(p, _)| all_points || p.severity != Severity::Good)
        .collect();
    if rows.is_empty() {
        return;
    }

    println!();
    println!("{:>10}  {:>10}  {:>9}  Severity", "Freq (Hz)", "Magnitude", "Dev (dB)");
    println!("{}", "-".repeat(44));
    for (point, magnitude) in rows {
        println!(
            "{:>10.1}  {:>10.4}  {:>+9.1}  {}",
            point.frequency, magnitude, point.deviation_db, point.severity
        );
    }
}

/// Write FRD and/or CSV exports of `result`.
///
/// `quiet` suppresses the confirmation lines, e.g. when stdout carries JSON.
pub fn export_result(
    result: &AnalysisResult,
    frd: Option<&Path>,
    csv: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    if let Some(path) = frd {
        export_frd(result, path).with_context(|| format!("writing {}", path.display()))?;
        if !quiet {
            println!("Wrote {}", path.display());
        }
    }
    if let Some(path) = csv {
        export_csv(result, path).with_context(|| format!("writing {}", path.display()))?;
        if !quiet {
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

/// Save `record` to the history, warning instead of failing on write errors.
pub fn save_record(globals: &GlobalOpts, record: TestRecord, quiet: bool) {
    let mut history = globals.history();
    let id = record.id().to_string();
    match history.save(record) {
        Ok(()) if !quiet => println!("Saved to history as {id}"),
        Ok(()) => {}
        Err(e) => eprintln!("Warning: test not saved to history: {e}"),
    }
}
