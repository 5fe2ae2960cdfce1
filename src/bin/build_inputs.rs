use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;
use zkp_email_presence::{config::Config, field_to_hex, PatternKind};

fn get_max_input_file_size(config: &Config) -> u64 {
    std::env::var("ZKP_MAX_INPUT_FILE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.proof.max_input_size)
}

/// Builds the circuit signal set for a raw email without proving it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Signal set output file, overriding the configured one
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let params = config.circuit_params()?;

    let metadata = fs::metadata(&args.input).context("Failed to read input file metadata")?;
    let max_size = get_max_input_file_size(&config);
    if metadata.len() > max_size {
        return Err(anyhow::anyhow!(
            "Input file too large: {} bytes (max {} bytes). Set ZKP_MAX_INPUT_FILE_SIZE to raise the limit.",
            metadata.len(),
            max_size
        ));
    }

    println!("Loading email from: {}", args.input.display());
    let raw = fs::read(&args.input).context("Failed to read input file")?;

    let assignment = params
        .builder()
        .build(&raw)
        .context("Failed to build circuit inputs")?;
    info!("Built assignment for {} input bytes", raw.len());

    for kind in PatternKind::ALL {
        println!(
            "  {:<7} at offset {}",
            kind,
            assignment.selector(kind).offset()
        );
    }
    println!("Commitment: {}", field_to_hex(assignment.commitment()));

    let output_path = args.output.unwrap_or(config.proof.signals_file);
    let json = assignment.to_signals().to_json()?;
    fs::write(&output_path, json).context("Failed to write signal set")?;
    println!("Signal set written to: {}", output_path.display());

    Ok(())
}
