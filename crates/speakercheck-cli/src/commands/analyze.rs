//! Recorded response analysis command.

use super::common::{
    GlobalOpts, SweepOpts, analyze_waveform, export_result, print_outcome, save_record,
};
use clap::Args;
use speakercheck_config::{Channel, TestType};
use speakercheck_io::read_wav;
use std::path::PathBuf;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Recorded WAV file (channel 0 is analysed)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Test the recording was made with: sweep or tone
    #[arg(long = "type", default_value = "sweep")]
    test_type: TestType,

    #[command(flatten)]
    sweep: SweepOpts,

    /// Number of response points
    #[arg(long)]
    resolution: Option<usize>,

    /// Tone frequency in Hz
    #[arg(long)]
    freq: Option<f32>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Show every response point, not only the out-of-band ones
    #[arg(long)]
    all: bool,

    /// Export the response as an FRD file
    #[arg(long, value_name = "PATH")]
    frd: Option<PathBuf>,

    /// Export the response and deviations as CSV
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Save the result to the test history
    #[arg(long)]
    save: bool,

    /// Speaker channel recorded, stored with --save
    #[arg(long, default_value = "both")]
    channel: Channel,
}

pub fn run(args: AnalyzeArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let settings = globals.settings()?;
    let sweep = args.sweep.resolve(settings.sweep)?;

    let (waveform, spec) = read_wav(&args.input)?;
    if waveform.is_empty() {
        anyhow::bail!("{} contains no samples", args.input.display());
    }
    if !args.json {
        println!(
            "Analyzing {} ({:.2}s, {} Hz, {} ch)",
            args.input.display(),
            waveform.duration_secs(),
            spec.sample_rate,
            spec.channels
        );
        println!();
    }

    let outcome = analyze_waveform(
        &waveform,
        args.test_type,
        sweep,
        args.resolution.unwrap_or(settings.resolution),
        args.freq.unwrap_or(settings.tone_frequency),
    )?;
    print_outcome(&outcome, args.json, args.all)?;
    export_result(
        &outcome.result(),
        args.frd.as_deref(),
        args.csv.as_deref(),
        args.json,
    )?;

    if args.save {
        save_record(globals, outcome.record(args.channel), args.json);
    }
    Ok(())
}
