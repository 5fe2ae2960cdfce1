use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use std::fs;
use std::path::{Path, PathBuf};
use zkp_email_presence::{config::Config, types::ProofOutput, EmailPresenceProver};

/// Can be overridden via `ZKP_MAX_PROOF_FILE_SIZE` environment variable
fn get_max_proof_file_size(config: &Config) -> u64 {
    std::env::var("ZKP_MAX_PROOF_FILE_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.proof.max_file_size)
}

/// Can be overridden via `ZKP_MAX_ZK_PROOF_SIZE` environment variable
fn get_max_zk_proof_size(config: &Config) -> usize {
    std::env::var("ZKP_MAX_ZK_PROOF_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(config.proof.max_zk_proof_size)
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    proof_file: String,

    /// TOML configuration file; the proof must match its circuit
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let params = config.circuit_params()?;

    let proof_path = Path::new(&args.proof_file);
    if !proof_path.exists() {
        return Err(anyhow::anyhow!(
            "Proof file does not exist: {}",
            args.proof_file
        ));
    }

    info!("Loading proof from: {}", args.proof_file);
    println!("Loading proof from: {}", args.proof_file);

    let metadata = fs::metadata(proof_path).context("Failed to read proof file metadata")?;
    debug!("Proof file size: {} bytes", metadata.len());

    let max_proof_file_size = get_max_proof_file_size(&config);
    if metadata.len() > max_proof_file_size {
        return Err(anyhow::anyhow!(
            "Proof file too large: {} bytes (max {} bytes). This may indicate a corrupted or invalid proof file. Set ZKP_MAX_PROOF_FILE_SIZE to raise the limit.",
            metadata.len(),
            max_proof_file_size
        ));
    }

    let proof_content = fs::read_to_string(proof_path).context("Failed to read proof file")?;

    info!("Parsing proof JSON...");
    println!("Parsing proof JSON...");
    let proof: ProofOutput =
        serde_json::from_str(&proof_content).context("Failed to parse proof JSON")?;

    proof
        .validate_with(&config.security, get_max_zk_proof_size(&config))
        .context("Proof validation failed. The proof structure is invalid or stale.")?;
    info!("Proof validation passed");

    if proof.circuit_params()? != params {
        return Err(anyhow::anyhow!(
            "Proof was generated for a different circuit (max_len {}, k {}) than configured (max_len {}, k {})",
            proof.max_len,
            proof.circuit_k,
            params.max_len(),
            params.k()
        ));
    }

    println!("Proof details:");
    println!("  Commitment: {}", proof.commitment);
    println!("  Buffer length: {} bytes", proof.max_len);
    println!("  Circuit k: {}", proof.circuit_k);
    println!("  Timestamp: {}", proof.timestamp);

    let commitment = proof.commitment_field()?;
    let proof_bytes = proof.proof_bytes()?;
    println!("  ZK Proof Size: {} bytes", proof_bytes.len());

    info!("Verifying ZK proof...");
    println!("Verifying ZK proof...");
    let mut prover = EmailPresenceProver::new(params);
    let srs = prover.setup();

    println!("Generating ZK-SNARK keys...");
    let verified = prover
        .verify_proof(&srs, &proof_bytes, commitment)
        .context("Failed to generate verification keys")?;

    if verified {
        info!("Proof verification PASSED");
        println!("\n✓ Proof verification PASSED!");
        println!("The prover has demonstrated that the committed email buffer");
        println!("contains the configured From, To and domain patterns.");
        Ok(())
    } else {
        error!("Proof verification FAILED");
        println!("\n✗ Proof verification FAILED!");
        Err(anyhow::anyhow!("Proof verification failed"))
    }
}
