//! Test history command.

use super::common::{GlobalOpts, export_result, print_response};
use chrono::Local;
use clap::{Args, Subcommand};
use speakercheck_analysis::DeviationSummary;
use std::path::PathBuf;

#[derive(Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    command: Option<HistoryCommand>,
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// List saved tests, most recent first
    List,

    /// Show one saved test
    Show {
        /// Test id, unique id prefix, or 1-based position in the list
        id: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,

        /// Show every response point
        #[arg(long)]
        all: bool,

        /// Export the response as an FRD file
        #[arg(long, value_name = "PATH")]
        frd: Option<PathBuf>,

        /// Export the response and deviations as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },
}

pub fn run(args: HistoryArgs, globals: &GlobalOpts) -> anyhow::Result<()> {
    let history = globals.history();

    match args.command.unwrap_or(HistoryCommand::List) {
        HistoryCommand::List => {
            if history.is_empty() {
                println!("No saved tests.");
                return Ok(());
            }

            println!(
                "{:>3}  {:<16}  {:<19}  {:<5}  {:<5}  {:>6}  Result",
                "#", "Id", "Date", "Type", "Chan", "Points"
            );
            println!("{}", "-".repeat(76));
            for (i, record) in history.records().iter().enumerate() {
                let summary = DeviationSummary::of(record.analysis());
                let verdict = summary.overall().map_or("-", |s| s.as_str());
                println!(
                    "{:>3}  {:<16}  {:<19}  {:<5}  {:<5}  {:>6}  {}",
                    i + 1,
                    record.id(),
                    record
                        .timestamp()
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string(),
                    record.test_type().as_str(),
                    record.channel().as_str(),
                    record.analysis().len(),
                    verdict
                );
            }
        }

        HistoryCommand::Show {
            id,
            json,
            all,
            frd,
            csv,
        } => {
            let Some(record) = history.find(&id) else {
                anyhow::bail!(
                    "No saved test matches '{}'. Use 'speakercheck history list' to see saved tests.",
                    id
                );
            };

            if json {
                println!("{}", serde_json::to_string_pretty(record)?);
            } else {
                println!("Test {}", record.id());
                println!(
                    "  Date:    {}",
                    record
                        .timestamp()
                        .with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S%.3f %:z")
                );
                println!("  Type:    {}", record.test_type());
                println!("  Channel: {}", record.channel());
                if let Some(sweep) = record.sweep() {
                    println!(
                        "  Sweep:   {:.0} Hz -> {:.0} Hz over {:.1} s",
                        sweep.start_freq(),
                        sweep.end_freq(),
                        sweep.duration_secs()
                    );
                }
                println!();
                print_response(record.analysis(), all);
            }
            export_result(record.analysis(), frd.as_deref(), csv.as_deref(), json)?;
        }
    }

    Ok(())
}
