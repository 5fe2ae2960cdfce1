use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use zkp_email_presence::{
    config::Config, field_to_hex, types::ProofOutput, EmailPresenceProver, SignalSet,
};

/// Can be overridden via `ZKP_MAX_INPUT_FILE_SIZE` environment variable
fn get_max_input_file_size(config: &Config) -> u64 {
    std::env::var("ZKP_MAX_INPUT_FILE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.proof.max_input_size)
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw email file to prove pattern presence for
    #[arg(short, long, conflicts_with = "signals")]
    input: Option<PathBuf>,

    /// Prebuilt signal set JSON, re-validated before proving
    #[arg(short, long)]
    signals: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Proof output file, overriding the configured one
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn read_limited(path: &Path, max_size: u64) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata of {}", path.display()))?;
    debug!("{} is {} bytes", path.display(), metadata.len());

    if metadata.len() > max_size {
        return Err(anyhow::anyhow!(
            "Input file too large: {} bytes (max {} bytes). Set ZKP_MAX_INPUT_FILE_SIZE to raise the limit.",
            metadata.len(),
            max_size
        ));
    }

    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let params = config.circuit_params()?;
    let max_input_size = get_max_input_file_size(&config);
    info!(
        "Circuit: max_len {}, k {}, {} chunks",
        params.max_len(),
        params.k(),
        params.chunk_count()
    );

    let assignment = match (&args.input, &args.signals) {
        (Some(input), None) => {
            println!("Loading email from: {}", input.display());
            let raw = read_limited(input, max_input_size)?;
            println!("Building inputs from {} bytes...", raw.len());
            params
                .builder()
                .build(&raw)
                .context("Failed to build circuit inputs")?
        }
        (None, Some(signals)) => {
            println!("Loading signal set from: {}", signals.display());
            let raw = read_limited(signals, max_input_size)?;
            let json = String::from_utf8(raw).context("Signal set is not valid UTF-8")?;
            SignalSet::from_json(&json)?
                .into_assignment(params.max_len())
                .context("Signal set failed validation")?
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Exactly one of --input or --signals must be given"
            ))
        }
    };
    if assignment.patterns() != params.patterns() {
        return Err(anyhow::anyhow!(
            "Signal set patterns differ from the configured patterns"
        ));
    }

    println!("Commitment: {}", field_to_hex(assignment.commitment()));

    let mut prover = EmailPresenceProver::new(params.clone());
    println!("Generating parameters (k = {})...", params.k());
    let srs = prover.setup();

    println!("Generating ZK proof (this may take a while)...");
    let artifact = prover
        .generate_proof(&srs, &assignment)
        .context("Failed to create proof")?;
    println!("ZK proof generated, size: {} bytes", artifact.proof.len());

    let output = ProofOutput::from_artifact(&artifact, &params)?;
    let output_path = args.output.unwrap_or(config.proof.output_file);

    println!("Writing proof to: {}", output_path.display());
    let json_output =
        serde_json::to_string_pretty(&output).context("Failed to serialize proof to JSON")?;
    fs::write(&output_path, json_output).context("Failed to write proof file")?;

    println!("Proof successfully generated and saved!");
    println!("Commitment: {}", output.commitment);

    Ok(())
}
