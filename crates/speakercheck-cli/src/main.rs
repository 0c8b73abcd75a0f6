//! speakercheck CLI - loudspeaker frequency response checker.

mod commands;

use clap::{Parser, Subcommand};
use commands::common::GlobalOpts;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "speakercheck")]
#[command(author, version, about = "Loudspeaker frequency response checker", long_about = None)]
struct Cli {
    #[command(flatten)]
    globals: GlobalOpts,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate excitation signals as WAV files
    Generate(commands::generate::GenerateArgs),

    /// Analyze a recorded response
    Analyze(commands::analyze::AnalyzeArgs),

    /// Play an excitation and record the speaker's response
    Measure(commands::measure::MeasureArgs),

    /// Show saved test results
    History(commands::history::HistoryArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "speakercheck starting");

    match cli.command {
        Commands::Generate(args) => commands::generate::run(args, &cli.globals),
        Commands::Analyze(args) => commands::analyze::run(args, &cli.globals),
        Commands::Measure(args) => commands::measure::run(args, &cli.globals),
        Commands::History(args) => commands::history::run(args, &cli.globals),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
