//! Serialized proof output format.

use crate::circuit::CircuitParams;
use crate::config::{PatternsConfig, SecurityConfig};
use crate::prover::ProofArtifact;
use crate::utils::{field_from_hex, field_to_hex};
use anyhow::{Context, Result};
use log::debug;
use pasta_curves::pallas;
use serde::{Deserialize, Serialize};

/// Output structure for zero-knowledge proofs.
///
/// Contains everything a verifier needs: the public commitment, the proof
/// bytes and the circuit shape the proof was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOutput {
    /// Public commitment as a `0x`-prefixed big-endian hex integer.
    pub commitment: String,
    /// Hex-encoded proof transcript.
    pub zkp_proof: String,
    /// Buffer length of the circuit.
    pub max_len: usize,
    /// Circuit size parameter (`2^k` rows).
    pub circuit_k: u32,
    /// Pattern literals the circuit was built with.
    pub patterns: PatternsConfig,
    /// Unix timestamp when proof was generated
    pub timestamp: u64,
}

fn now_secs() -> Result<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| anyhow::anyhow!("System clock unavailable: {}", e))
}

impl ProofOutput {
    /// Wraps a proof artifact with the parameters it was produced under,
    /// stamped with the current time.
    ///
    /// # Errors
    /// Returns an error if the system clock is unavailable.
    pub fn from_artifact(artifact: &ProofArtifact, params: &CircuitParams) -> Result<Self> {
        Ok(Self {
            commitment: field_to_hex(artifact.commitment),
            zkp_proof: hex::encode(&artifact.proof),
            max_len: params.max_len(),
            circuit_k: params.k(),
            patterns: PatternsConfig::from(params.patterns()),
            timestamp: now_secs()?,
        })
    }

    /// Parsed public commitment.
    ///
    /// # Errors
    /// Returns an error if the hex string is malformed or not canonical.
    pub fn commitment_field(&self) -> Result<pallas::Base> {
        field_from_hex(&self.commitment).context("Invalid commitment in proof output")
    }

    /// Decoded proof bytes.
    ///
    /// # Errors
    /// Returns an error if the proof is not valid hex.
    pub fn proof_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(self.zkp_proof.trim())
            .map_err(|e| anyhow::anyhow!("Invalid proof hex: {e}. The proof data is corrupted."))
    }

    /// Circuit parameters recorded in this output.
    ///
    /// # Errors
    /// Returns an error if the recorded patterns or buffer length are invalid,
    /// or if `circuit_k` disagrees with them.
    pub fn circuit_params(&self) -> Result<CircuitParams> {
        let patterns = self.patterns.to_pattern_set()?;
        let params = CircuitParams::new(self.max_len, patterns)
            .context("Invalid circuit parameters in proof output")?;
        if params.k() != self.circuit_k {
            return Err(anyhow::anyhow!(
                "Circuit k mismatch: proof output says {}, max_len {} requires {}",
                self.circuit_k,
                self.max_len,
                params.k()
            ));
        }
        Ok(params)
    }

    /// Validates the proof output structure with default freshness limits.
    ///
    /// # Errors
    /// See [`ProofOutput::validate_with`].
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&SecurityConfig::default(), usize::MAX)
    }

    /// Validates the proof output structure.
    ///
    /// Checks field presence, timestamp freshness, hex encoding, the proof
    /// size limit and consistency of the recorded circuit parameters.
    ///
    /// # Errors
    /// Returns an error if validation fails, including:
    /// - Empty commitment or proof
    /// - Timestamp too far in the future or older than the maximum age
    /// - Invalid hex encoding or non-canonical commitment
    /// - Proof larger than `max_proof_size` bytes
    /// - Inconsistent `max_len`, `circuit_k` or patterns
    pub fn validate_with(&self, security: &SecurityConfig, max_proof_size: usize) -> Result<()> {
        debug!("Starting proof output validation");
        debug!("Commitment: {}", self.commitment);
        debug!("ZK proof hex length: {}", self.zkp_proof.len());
        debug!("max_len: {}, k: {}", self.max_len, self.circuit_k);
        debug!("Timestamp: {}", self.timestamp);

        if self.commitment.is_empty() {
            return Err(anyhow::anyhow!(
                "Commitment cannot be empty. Expected a 0x-prefixed field element."
            ));
        }
        if self.zkp_proof.is_empty() {
            return Err(anyhow::anyhow!(
                "ZK proof cannot be empty. The proof data is missing."
            ));
        }

        let current_timestamp = now_secs()?;
        debug!("Current timestamp: {}", current_timestamp);

        if self.timestamp > current_timestamp.saturating_add(security.timestamp_tolerance_secs) {
            return Err(anyhow::anyhow!(
                "Timestamp is too far in the future: {} (current: {}, tolerance: {}s). Please check system clock and proof timestamp.",
                self.timestamp,
                current_timestamp,
                security.timestamp_tolerance_secs
            ));
        }

        if current_timestamp > self.timestamp.saturating_add(security.timestamp_max_age_secs) {
            return Err(anyhow::anyhow!(
                "Timestamp is too old: {} (current: {}, max age: {}s). This proof may be expired. Please generate a fresh proof.",
                self.timestamp,
                current_timestamp,
                security.timestamp_max_age_secs
            ));
        }

        self.commitment_field()?;

        let proof = self.proof_bytes()?;
        if proof.len() > max_proof_size {
            return Err(anyhow::anyhow!(
                "ZK proof is {} bytes, exceeding the limit of {} bytes",
                proof.len(),
                max_proof_size
            ));
        }

        self.circuit_params()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternSet;
    use crate::utils::poseidon_hash;

    fn sample_output() -> ProofOutput {
        let params = CircuitParams::new(64, PatternSet::default()).unwrap();
        let artifact = ProofArtifact {
            proof: vec![1, 2, 3, 4],
            commitment: poseidon_hash(pallas::Base::from(1), pallas::Base::from(2)),
        };
        ProofOutput::from_artifact(&artifact, &params).unwrap()
    }

    #[test]
    fn test_from_artifact_records_params() {
        let output = sample_output();
        assert_eq!(output.max_len, 64);
        assert_eq!(output.circuit_k, 8);
        assert_eq!(output.zkp_proof, "01020304");
        assert_eq!(output.patterns.to, "To:");
        assert!(output.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip() {
        let output = sample_output();
        let json = serde_json::to_string(&output).unwrap();
        let parsed: ProofOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, output);
        assert_eq!(parsed.proof_bytes().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_proof_is_rejected() {
        let mut output = sample_output();
        output.zkp_proof.clear();
        assert!(output.validate().unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_future_timestamp_is_rejected() {
        let mut output = sample_output();
        output.timestamp += 10_000;
        assert!(output
            .validate()
            .unwrap_err()
            .to_string()
            .contains("future"));
    }

    #[test]
    fn test_expired_timestamp_is_rejected() {
        let mut output = sample_output();
        output.timestamp -= SecurityConfig::default().timestamp_max_age_secs + 60;
        assert!(output.validate().unwrap_err().to_string().contains("old"));
    }

    #[test]
    fn test_extreme_security_limits_do_not_overflow() {
        let security = SecurityConfig {
            timestamp_tolerance_secs: u64::MAX,
            timestamp_max_age_secs: u64::MAX,
        };
        let mut output = sample_output();
        assert!(output.validate_with(&security, usize::MAX).is_ok());

        output.timestamp = u64::MAX;
        assert!(output.validate_with(&security, usize::MAX).is_ok());
    }

    #[test]
    fn test_oversized_proof_is_rejected() {
        let output = sample_output();
        let err = output
            .validate_with(&SecurityConfig::default(), 2)
            .unwrap_err();
        assert!(err.to_string().contains("exceeding the limit"));
    }

    #[test]
    fn test_k_mismatch_is_rejected() {
        let mut output = sample_output();
        output.circuit_k = 14;
        assert!(output.validate().is_err());
    }

    #[test]
    fn test_bad_commitment_hex_is_rejected() {
        let mut output = sample_output();
        output.commitment = "0x1234".to_string();
        assert!(output.validate().is_err());
    }
}
