//! Excitation signal generation command.

use super::common::{GlobalOpts, SweepOpts};
use clap::{Args, Subcommand};
use speakercheck_config::Channel;
use speakercheck_io::{Excitation, WavSpec, write_wav};
use std::path::PathBuf;

#[derive(Args)]
pub struct GenerateArgs {
    #[command(subcommand)]
    command: GenerateCommand,
}

/// Output format shared by every generator.
#[derive(Args)]
struct OutputOpts {
    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Sample rate (defaults to the configured rate)
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Peak amplitude 0-1 (defaults to the configured amplitude)
    #[arg(long)]
    amplitude: Option<f32>,

    /// Speaker channel: left, right or both
    #[arg(long, default_value = "both")]
    channel: Channel,

    /// Number of channels in the file
    #[arg(long, default_value = "1")]
    channels: u16,
}

#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate the exponential sine sweep used by sweep tests
    Sweep {
        #[command(flatten)]
        out: OutputOpts,

        #[command(flatten)]
        sweep: SweepOpts,
    },

    /// Generate the sine tone used by tone tests
    Tone {
        #[command(flatten)]
        out: OutputOpts,

        /// Frequency in Hz
        #[arg(long)]
        freq: Option<f32>,

        /// Duration in seconds
        #[arg(long)]
        duration: Option<f32>,
    },
}

pub fn run(args: GenerateArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let settings = globals.settings()?;

    let (excitation, out) = match args.command {
        GenerateCommand::Sweep { out, sweep } => {
            let sweep = sweep.resolve(settings.sweep)?;
            println!(
                "Generating sweep: {} Hz -> {} Hz, {:.2}s",
                sweep.start_freq(),
                sweep.end_freq(),
                sweep.duration_secs()
            );
            (Excitation::Sweep(sweep), out)
        }
        GenerateCommand::Tone {
            out,
            freq,
            duration,
        } => {
            let frequency = freq.unwrap_or(settings.tone_frequency);
            let duration_secs = duration.unwrap_or(settings.tone_duration_secs);
            if !(duration_secs.is_finite() && duration_secs > 0.0) {
                anyhow::bail!("Duration must be positive, got {duration_secs}");
            }
            println!("Generating tone: {frequency} Hz, {duration_secs:.2}s");
            (
                Excitation::Tone {
                    frequency,
                    duration_secs,
                },
                out,
            )
        }
    };

    let sample_rate = out.sample_rate.unwrap_or(settings.sample_rate);
    let amplitude = out.amplitude.unwrap_or(settings.amplitude);
    if !(0.0..=1.0).contains(&amplitude) {
        anyhow::bail!("Amplitude must be between 0 and 1, got {amplitude}");
    }
    let channels = out.channels.max(1);

    let samples = excitation.render_panned(sample_rate, amplitude, out.channel, channels)?;
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
    };
    write_wav(&out.output, &samples, spec)?;

    println!(
        "Wrote {} frames ({} ch, {} Hz) to {}",
        samples.len() / usize::from(channels),
        channels,
        sample_rate,
        out.output.display()
    );
    Ok(())
}
