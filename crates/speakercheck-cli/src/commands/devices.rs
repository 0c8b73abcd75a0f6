//! Audio device listing command.

use clap::Args;
use speakercheck_io::{AudioBackend, AudioDevice, CpalBackend, LoopbackBackend};

#[derive(Args)]
pub struct DevicesArgs {
    /// List the built-in loopback device instead of system devices
    #[arg(long)]
    loopback: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend: Box<dyn AudioBackend> = if args.loopback {
        Box::new(LoopbackBackend::default())
    } else {
        Box::new(CpalBackend::new())
    };

    let devices = backend.list_devices()?;
    if devices.is_empty() {
        println!("No audio devices found.");
        println!("Use 'speakercheck measure --loopback' to run without hardware.");
        return Ok(());
    }

    let default_input = backend.default_input_device()?;
    let default_output = backend.default_output_device()?;

    println!("Audio Devices ({})", backend.name());
    println!("==================\n");

    print_section("Input Devices:", devices.iter().filter(|d| d.is_input), default_input.as_ref());
    print_section(
        "Output Devices:",
        devices.iter().filter(|d| d.is_output),
        default_output.as_ref(),
    );

    let inputs = devices.iter().filter(|d| d.is_input).count();
    let outputs = devices.iter().filter(|d| d.is_output).count();
    println!("Total: {inputs} input(s), {outputs} output(s)");
    println!();
    println!("Tip: Use a partial name with --input/--output:");
    println!("  speakercheck measure --input \"USB\" --output \"USB\" --channel left");
    Ok(())
}

fn print_section<'a>(
    title: &str,
    devices: impl Iterator<Item = &'a AudioDevice>,
    default: Option<&AudioDevice>,
) {
    let devices: Vec<_> = devices.collect();
    if devices.is_empty() {
        return;
    }
    println!("{title}");
    for (idx, device) in devices.iter().enumerate() {
        let marker = if default.is_some_and(|d| d.name == device.name) {
            " (default)"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz, {}){}",
            idx,
            device.name,
            device.default_sample_rate,
            device.direction(),
            marker
        );
    }
    println!();
}
