//! Live measurement command: play an excitation and record the response.

use super::common::{
    GlobalOpts, SweepOpts, analyze_waveform, export_result, print_outcome, save_record,
};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use speakercheck_config::{Channel, TestType};
use speakercheck_io::{
    AudioBackend, CpalBackend, Excitation, LoopbackBackend, MeasurementContext, WavSpec, write_wav,
};
use std::path::PathBuf;
use std::sync::atomic::Ordering;

/// Progress bar resolution.
const PROGRESS_STEPS: u64 = 1000;

#[derive(Args)]
pub struct MeasureArgs {
    /// Test to run: sweep or tone
    #[arg(long = "type", default_value = "sweep")]
    test_type: TestType,

    /// Speaker channel to drive: left, right or both
    #[arg(long, default_value = "both")]
    channel: Channel,

    /// Input device (name or partial match)
    #[arg(short, long)]
    input: Option<String>,

    /// Output device (name or partial match)
    #[arg(short, long)]
    output: Option<String>,

    /// Route playback straight back into capture instead of using devices
    #[arg(long)]
    loopback: bool,

    /// Loopback delay in samples
    #[arg(long, default_value = "0")]
    latency: usize,

    /// Loopback gain (linear)
    #[arg(long, default_value = "1.0")]
    gain: f32,

    #[command(flatten)]
    sweep: SweepOpts,

    /// Tone frequency in Hz
    #[arg(long)]
    freq: Option<f32>,

    /// Number of response points
    #[arg(long)]
    resolution: Option<usize>,

    /// Also write the raw recording to a WAV file
    #[arg(long, value_name = "PATH")]
    record: Option<PathBuf>,

    /// Do not save the result to the test history
    #[arg(long)]
    no_save: bool,

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
}

pub fn run(args: MeasureArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let mut settings = globals.settings()?;
    settings.sweep = args.sweep.resolve(settings.sweep)?;
    if let Some(freq) = args.freq {
        settings.tone_frequency = freq;
    }
    if let Some(resolution) = args.resolution {
        settings.resolution = resolution;
    }
    if args.input.is_some() {
        settings.input_device = args.input.clone();
    }
    if args.output.is_some() {
        settings.output_device = args.output.clone();
    }

    let backend: Box<dyn AudioBackend> = if args.loopback {
        Box::new(LoopbackBackend::new(args.latency, args.gain))
    } else {
        Box::new(CpalBackend::new())
    };

    let excitation = Excitation::for_test(args.test_type, &settings);
    let duration = excitation.duration_secs() + settings.tail_secs.max(0.0);
    let mut context = MeasurementContext::new(backend, settings.clone());

    if !args.json {
        println!(
            "Measuring {} on {} channel via {} ({:.1}s)",
            args.test_type,
            args.channel,
            context.backend_name(),
            duration
        );
        println!("  Input:  {}", settings.input_device.as_deref().unwrap_or("default"));
        println!("  Output: {}", settings.output_device.as_deref().unwrap_or("default"));
        println!("\nPress Ctrl+C to stop...\n");
    }

    let stop = context.stop_flag();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })?;

    let pb = if args.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(PROGRESS_STEPS)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {percent}%")?
            .progress_chars("##-"),
    );

    let result = context.run_with_progress(&excitation, args.channel, |p| {
        pb.set_position((p * PROGRESS_STEPS as f32) as u64);
    });
    pb.finish_and_clear();
    context.close();
    let measurement = result?;
    let recording = measurement.recording;

    if let Some(path) = &args.record {
        let spec = WavSpec::mono(recording.sample_rate() as u32);
        write_wav(path, recording.samples(), spec)?;
        tracing::debug!(path = %path.display(), frames = recording.len(), "recording written");
        if !args.json {
            println!("Recording written to {}", path.display());
        }
    }

    if measurement.cancelled {
        anyhow::bail!("Measurement stopped before completion; nothing saved");
    }
    if measurement.dropped_blocks > 0 {
        eprintln!(
            "Warning: {} capture blocks were dropped; the response may have gaps",
            measurement.dropped_blocks
        );
    }

    let outcome = analyze_waveform(
        &recording,
        args.test_type,
        settings.sweep,
        settings.resolution,
        settings.tone_frequency,
    )?;
    print_outcome(&outcome, args.json, args.all)?;
    export_result(
        &outcome.result(),
        args.frd.as_deref(),
        args.csv.as_deref(),
        args.json,
    )?;

    if !args.no_save {
        save_record(globals, outcome.record(args.channel), args.json);
    }
    Ok(())
}
