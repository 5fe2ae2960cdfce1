//! ZKP Email Pattern Presence Proof System
//!
//! This library proves that a committed, fixed-length email buffer contains
//! the header patterns `From:` and `To:` and the domain `@gmail.com`, without
//! revealing the buffer or where the patterns occur.
//!
//! # Components
//!
//! - [`InputBuilder`]: pads raw input, locates the patterns, builds one-hot
//!   selectors and computes the Poseidon commitment
//! - [`EmailPresenceCircuit`]: Halo2 circuit enforcing byte ranges, the
//!   commitment fold and the three substring matches
//! - [`EmailPresenceProver`]: key generation, proving and verification
//! - [`SignalSet`]: JSON form of an assignment
//! - [`ProofOutput`]: serialized proof output format
//!
//! # Example
//!
//! ```no_run
//! use zkp_email_presence::{build, EmailPresenceProver};
//!
//! let raw = b"From: alice@example.com\r\nTo: bob@gmail.com\r\n\r\nHi";
//! let assignment = build(raw).unwrap();
//!
//! let mut prover = EmailPresenceProver::default();
//! let srs = prover.setup();
//! let artifact = prover.generate_proof(&srs, &assignment).unwrap();
//! assert!(prover
//!     .verify_proof(&srs, &artifact.proof, assignment.commitment())
//!     .unwrap());
//! ```

pub mod assignment;
pub mod builder;
pub mod circuit;
pub mod config;
pub mod encoding;
pub mod error;
pub mod gadgets;
pub mod patterns;
pub mod prover;
pub mod types;
pub mod utils;

pub use assignment::{Assignment, SignalSet};
pub use builder::{build, InputBuilder};
pub use circuit::{CircuitParams, EmailPresenceCircuit};
pub use error::{BuildError, ProverError};
pub use patterns::{PatternKind, PatternSet};
pub use prover::{EmailPresenceProver, ProofArtifact};
pub use types::ProofOutput;
pub use utils::{field_from_hex, field_to_hex, poseidon_hash};

/// Buffer length of the reference circuit, in bytes.
///
/// Inputs are zero-padded or truncated to exactly this many bytes before the
/// pattern search and the commitment.
///
/// # Security Considerations
///
/// The buffer length is part of the circuit shape. Changing it changes `k`
/// and requires regenerating all proving and verifying keys; prover and
/// verifier must agree on it.
pub const MAX_LEN: usize = 8192;
