//! Configuration file support.
//!
//! Circuit size, pattern literals, file size limits and proof freshness
//! windows are loaded from TOML. Every field has a default, so a partial file
//! or no file at all yields the reference configuration.

use crate::circuit::CircuitParams;
use crate::patterns::{PatternSet, DOMAIN_PATTERN, FROM_PATTERN, TO_PATTERN};
use crate::MAX_LEN;
use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_MAX_INPUT_FILE_SIZE: u64 = 1024 * 1024;
const DEFAULT_MAX_PROOF_FILE_SIZE: u64 = 1024 * 1024;
const DEFAULT_MAX_ZK_PROOF_SIZE: usize = 512 * 1024;
const DEFAULT_TIMESTAMP_TOLERANCE_SECS: u64 = 300;
const DEFAULT_TIMESTAMP_MAX_AGE_SECS: u64 = 86400;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub circuit: CircuitConfig,
    #[serde(default)]
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub proof: ProofConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitConfig {
    #[serde(default = "default_max_len")]
    pub max_len: usize,
}

/// Pattern literals as text. Each must keep the byte length of its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternsConfig {
    #[serde(default = "default_from_pattern")]
    pub from: String,
    #[serde(default = "default_to_pattern")]
    pub to: String,
    #[serde(default = "default_domain_pattern")]
    pub domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofConfig {
    #[serde(default = "default_max_input_file_size")]
    pub max_input_size: u64,
    #[serde(default = "default_max_proof_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_max_zk_proof_size")]
    pub max_zk_proof_size: usize,
    #[serde(default = "default_proof_output_file")]
    pub output_file: PathBuf,
    #[serde(default = "default_signals_output_file")]
    pub signals_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_timestamp_tolerance_secs")]
    pub timestamp_tolerance_secs: u64,
    #[serde(default = "default_timestamp_max_age_secs")]
    pub timestamp_max_age_secs: u64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            max_len: MAX_LEN,
        }
    }
}

impl Default for PatternsConfig {
    fn default() -> Self {
        Self {
            from: default_from_pattern(),
            to: default_to_pattern(),
            domain: default_domain_pattern(),
        }
    }
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            max_input_size: DEFAULT_MAX_INPUT_FILE_SIZE,
            max_file_size: DEFAULT_MAX_PROOF_FILE_SIZE,
            max_zk_proof_size: DEFAULT_MAX_ZK_PROOF_SIZE,
            output_file: default_proof_output_file(),
            signals_file: default_signals_output_file(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            timestamp_tolerance_secs: DEFAULT_TIMESTAMP_TOLERANCE_SECS,
            timestamp_max_age_secs: DEFAULT_TIMESTAMP_MAX_AGE_SECS,
        }
    }
}

fn default_max_len() -> usize {
    MAX_LEN
}

fn default_from_pattern() -> String {
    String::from_utf8_lossy(FROM_PATTERN).into_owned()
}

fn default_to_pattern() -> String {
    String::from_utf8_lossy(TO_PATTERN).into_owned()
}

fn default_domain_pattern() -> String {
    String::from_utf8_lossy(DOMAIN_PATTERN).into_owned()
}

fn default_max_input_file_size() -> u64 {
    DEFAULT_MAX_INPUT_FILE_SIZE
}

fn default_max_proof_file_size() -> u64 {
    DEFAULT_MAX_PROOF_FILE_SIZE
}

fn default_max_zk_proof_size() -> usize {
    DEFAULT_MAX_ZK_PROOF_SIZE
}

fn default_proof_output_file() -> PathBuf {
    PathBuf::from("proof.json")
}

fn default_signals_output_file() -> PathBuf {
    PathBuf::from("signals.json")
}

fn default_timestamp_tolerance_secs() -> u64 {
    DEFAULT_TIMESTAMP_TOLERANCE_SECS
}

fn default_timestamp_max_age_secs() -> u64 {
    DEFAULT_TIMESTAMP_MAX_AGE_SECS
}

impl PatternsConfig {
    /// # Errors
    /// Returns an error if a literal has the wrong byte length for its slot.
    pub fn to_pattern_set(&self) -> Result<PatternSet> {
        PatternSet::new(
            self.from.as_bytes(),
            self.to.as_bytes(),
            self.domain.as_bytes(),
        )
        .context("Invalid pattern configuration")
    }
}

impl From<&PatternSet> for PatternsConfig {
    fn from(set: &PatternSet) -> Self {
        use crate::patterns::{display_pattern, PatternKind};
        Self {
            from: display_pattern(set.get(PatternKind::From)),
            to: display_pattern(set.get(PatternKind::To)),
            domain: display_pattern(set.get(PatternKind::Domain)),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads `path`, falling back to the defaults with a warning if the file
    /// is missing or malformed.
    pub fn load_from_file_or_default(path: &PathBuf) -> Self {
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Using default configuration: {e:#}");
                Self::default()
            }
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Circuit parameters described by this configuration.
    ///
    /// # Errors
    /// Returns an error if the patterns or the buffer length are invalid.
    pub fn circuit_params(&self) -> Result<CircuitParams> {
        let patterns = self.patterns.to_pattern_set()?;
        CircuitParams::new(self.circuit.max_len, patterns).context("Invalid circuit configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.circuit.max_len, 8192);
        assert_eq!(config.patterns.domain, "@gmail.com");
        assert_eq!(config.proof.max_file_size, DEFAULT_MAX_PROOF_FILE_SIZE);
        assert_eq!(
            config.security.timestamp_tolerance_secs,
            DEFAULT_TIMESTAMP_TOLERANCE_SECS
        );
        assert_eq!(config.circuit_params().unwrap(), CircuitParams::default());
    }

    #[test]
    fn test_serialize_deserialize_config() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.circuit.max_len, deserialized.circuit.max_len);
        assert_eq!(config.patterns, deserialized.patterns);
        assert_eq!(config.proof.output_file, deserialized.proof.output_file);
    }

    #[test]
    fn test_custom_config() {
        let config_toml = r#"
            [circuit]
            max_len = 1024

            [patterns]
            domain = "@yahoo.com"

            [proof]
            output_file = "custom_proof.json"
        "#;

        let config: Config = toml::from_str(config_toml).unwrap();
        assert_eq!(config.circuit.max_len, 1024);
        assert_eq!(config.patterns.from, "From:");
        assert_eq!(config.proof.output_file, PathBuf::from("custom_proof.json"));

        let params = config.circuit_params().unwrap();
        assert_eq!(params.max_len(), 1024);
        assert_eq!(
            params.patterns().get(crate::patterns::PatternKind::Domain),
            b"@yahoo.com"
        );
    }

    #[test]
    fn test_invalid_pattern_length_is_rejected() {
        let config: Config = toml::from_str("[patterns]\nto = \"Cc:x\"\n").unwrap();
        assert!(config.circuit_params().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.circuit.max_len = 256;

        config.save_to_file(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.circuit.max_len, 256);
    }

    #[test]
    fn test_malformed_file_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[circuit]\nmax_len = \"not a number\"\n").unwrap();

        assert!(Config::load_from_file(&path).is_err());
        let config = Config::load_from_file_or_default(&path);
        assert_eq!(config.circuit.max_len, MAX_LEN);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = Config::load_from_file_or_default(&PathBuf::from("/nonexistent/config.toml"));
        assert_eq!(config.circuit.max_len, MAX_LEN);
    }
}
