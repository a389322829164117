// NES Emulator - Main Entry Point
//
// Headless runner: loads a ROM, runs it for a number of frames and optionally
// writes a screenshot, a save-state slot and the battery save file.

use anyhow::{Context, Result};
use clap::Parser;
use nes_machine::emulator::{encode_png, EmulatorConfig, CONFIG_FILE};
use nes_machine::Emulator;
use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;

/// Headless NES runner
#[derive(Parser, Debug)]
#[command(name = "nes-machine", version)]
#[command(about = "Run an iNES ROM headless for a number of frames", long_about = None)]
struct Args {
    /// Path to the iNES ROM file
    rom: PathBuf,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 60)]
    frames: u64,

    /// Write the last frame to this PNG file
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Save the final state into this slot
    #[arg(long, value_name = "SLOT")]
    save_state: Option<u8>,

    /// Restore this slot before running
    #[arg(long, value_name = "SLOT")]
    load_state: Option<u8>,

    /// Battery save file: loaded before running and written back afterwards
    #[arg(long, value_name = "PATH")]
    battery: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log every executed instruction (same as RUST_LOG=trace)
    #[arg(long)]
    trace: bool,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.trace { "trace" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(&args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = EmulatorConfig::load_or_default_from(&args.config);
    let mut emulator = Emulator::with_config(config);

    let battery = match &args.battery {
        Some(path) if path.exists() => Some(
            fs::read(path).with_context(|| format!("reading save file {}", path.display()))?,
        ),
        _ => None,
    };

    emulator
        .load_rom_file(&args.rom, battery.as_deref())
        .with_context(|| format!("loading {}", args.rom.display()))?;

    if let Some(slot) = args.load_state {
        emulator
            .load_state(slot)
            .with_context(|| format!("loading state slot {}", slot))?;
    }

    for frame in 0..args.frames {
        emulator.frame().with_context(|| {
            format!(
                "frame {} stopped at PC ${:04X}",
                frame,
                emulator.cpu().pc
            )
        })?;
    }

    if let Some(path) = &args.screenshot {
        let file = fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        encode_png(emulator.frame_buffer(), BufWriter::new(file))
            .with_context(|| format!("writing {}", path.display()))?;
        log::info!("Screenshot saved to {}", path.display());
    }

    if let Some(slot) = args.save_state {
        emulator
            .save_state(slot)
            .with_context(|| format!("saving state slot {}", slot))?;
    }

    if let (Some(path), Some(ram)) = (&args.battery, emulator.save_file()) {
        fs::write(path, ram).with_context(|| format!("writing save file {}", path.display()))?;
    }

    let cpu = emulator.cpu();
    println!(
        "{} frames, {} CPU cycles, PC=${:04X}",
        emulator.bus().ppu().frame(),
        cpu.cycles,
        cpu.pc
    );
    Ok(())
}
