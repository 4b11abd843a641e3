//! Command-line front end: shift the formants of one WAV file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use env_logger::{Builder, Env};
use formant_shift::{
    formant_shift,
    shift::{
        DEFAULT_DURATION_RATIO, DEFAULT_F0_MAX, DEFAULT_F0_MIN, DEFAULT_FORMANT_RATIO,
        DEFAULT_PITCH_RATIO,
    },
    ShiftParams,
};

#[derive(Parser)]
#[command(name = "formant-shift")]
#[command(about = "Shift the formants of a speech recording", long_about = None)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Input WAV file.
    #[arg(long, short)]
    input: PathBuf,
    /// Output WAV file (mono, 32-bit float).
    #[arg(long, short)]
    output: PathBuf,
    /// Formant frequency multiplier (>1 raises formants).
    #[arg(long, default_value_t = DEFAULT_FORMANT_RATIO)]
    formant_ratio: f64,
    /// Multiplier applied to the median pitch.
    #[arg(long, default_value_t = DEFAULT_PITCH_RATIO)]
    pitch_ratio: f64,
    /// Duration multiplier.
    #[arg(long, default_value_t = DEFAULT_DURATION_RATIO)]
    duration_ratio: f64,
    /// Pitch search floor in Hz.
    #[arg(long, default_value_t = DEFAULT_F0_MIN)]
    f0_min: f64,
    /// Pitch search ceiling in Hz.
    #[arg(long, default_value_t = DEFAULT_F0_MAX)]
    f0_max: f64,
    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    Builder::from_env(Env::default().default_filter_or(level)).init();

    let params = ShiftParams {
        formant_ratio: cli.formant_ratio,
        pitch_ratio: cli.pitch_ratio,
        duration_ratio: cli.duration_ratio,
        f0_min: cli.f0_min,
        f0_max: cli.f0_max,
    };
    let saved = formant_shift(&cli.input, &cli.output, &params)
        .with_context(|| format!("failed to shift {}", cli.input.display()))?;

    println!("Saved to: {}", saved.display());
    Ok(())
}
