//! Halo2 circuit proving that a committed buffer contains the three patterns.
//!
//! The circuit has one public input, the commitment. Everything else is
//! private advice:
//!
//! - the buffer, one byte per row, range checked through an 8-bit
//!   decomposition and folded into 31-byte chunk encodings
//! - the Poseidon fold `h_{i+1} = H(h_i, chunk_i)` from `h_0 = 0`, constrained
//!   to equal the instance value
//! - three one-hot selectors with their substring-match constraints
//!
//! The layout depends only on [`CircuitParams`], never on the witness, so
//! keys generated from [`EmailPresenceCircuit::new`] serve every assignment
//! of the same size.

use crate::assignment::Assignment;
use crate::builder::InputBuilder;
use crate::encoding::chunk_count;
use crate::error::BuildError;
use crate::gadgets::{ByteChunkConfig, SubstringConfig};
use crate::patterns::{PatternKind, PatternSet};
use crate::MAX_LEN;
use halo2_gadgets::poseidon::{
    primitives::{ConstantLength, P128Pow5T3},
    Hash as PoseidonHash, Pow5Chip, Pow5Config,
};
use halo2_proofs::{
    circuit::{Layouter, SimpleFloorPlanner, Value},
    plonk::{Circuit, Column, ConstraintSystem, Error, Instance, Selector},
};
use pasta_curves::pallas;

type Fp = pallas::Base;

const POSEIDON_WIDTH: usize = 3;
const POSEIDON_RATE: usize = 2;

/// Upper bound on rows one Poseidon fold step occupies, including the
/// constants its initial state pins.
const ROWS_PER_HASH: usize = 48;

/// Rows kept free for blinding factors and pinned constants.
const RESERVED_ROWS: usize = 64;

/// Size parameters shared by the builder, the circuit and the prover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitParams {
    max_len: usize,
    patterns: PatternSet,
}

impl Default for CircuitParams {
    fn default() -> Self {
        Self {
            max_len: MAX_LEN,
            patterns: PatternSet::default(),
        }
    }
}

impl CircuitParams {
    /// # Errors
    /// Returns [`BuildError::InvalidMaxLen`] if `max_len` cannot hold the
    /// longest pattern.
    pub fn new(max_len: usize, patterns: PatternSet) -> Result<Self, BuildError> {
        let min = patterns.max_pattern_len();
        if max_len < min {
            return Err(BuildError::InvalidMaxLen { max_len, min });
        }
        Ok(Self { max_len, patterns })
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[must_use]
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    #[must_use]
    pub fn chunk_count(&self) -> usize {
        chunk_count(self.max_len)
    }

    /// Smallest `k` such that `2^k` rows hold the whole layout.
    ///
    /// The buffer region and the Poseidon regions use disjoint columns and
    /// sit side by side, so the taller of the two decides.
    #[must_use]
    pub fn k(&self) -> u32 {
        let rows = (self.max_len + 1).max(self.chunk_count() * ROWS_PER_HASH) + RESERVED_ROWS;
        rows.next_power_of_two().trailing_zeros()
    }

    /// Input builder producing assignments for this circuit.
    #[must_use]
    pub fn builder(&self) -> InputBuilder {
        InputBuilder::from(self)
    }
}

/// Field-level witness: the buffer and the three selectors.
///
/// Kept separate from [`Assignment`] so that arbitrary field values, not just
/// bytes and bits, can be fed to the constraint system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitWitness {
    pub buffer: Vec<Fp>,
    pub selectors: [Vec<Fp>; 3],
}

impl From<&Assignment> for CircuitWitness {
    fn from(assignment: &Assignment) -> Self {
        let buffer = assignment
            .buffer()
            .iter()
            .map(|&b| Fp::from(u64::from(b)))
            .collect();
        let selectors = PatternKind::ALL.map(|kind| {
            assignment
                .selector(kind)
                .to_values()
                .into_iter()
                .map(Fp::from)
                .collect()
        });
        Self { buffer, selectors }
    }
}

#[derive(Debug, Clone)]
pub struct EmailPresenceConfig {
    buffer: ByteChunkConfig,
    substrings: [SubstringConfig; 3],
    q_body: Selector,
    q_last: Selector,
    poseidon: Pow5Config<Fp, POSEIDON_WIDTH, POSEIDON_RATE>,
    instance: Column<Instance>,
}

#[derive(Debug, Clone, Default)]
pub struct EmailPresenceCircuit {
    params: CircuitParams,
    witness: Option<CircuitWitness>,
}

impl EmailPresenceCircuit {
    /// Witness-free circuit, used for key generation.
    #[must_use]
    pub fn new(params: CircuitParams) -> Self {
        Self {
            params,
            witness: None,
        }
    }

    /// Circuit carrying a builder-produced assignment.
    ///
    /// # Errors
    /// Returns [`BuildError::InvalidSignal`] if the assignment was built for a
    /// different buffer length or pattern set.
    pub fn from_assignment(
        params: CircuitParams,
        assignment: &Assignment,
    ) -> Result<Self, BuildError> {
        if assignment.max_len() != params.max_len {
            return Err(BuildError::InvalidSignal {
                name: "buffer".to_string(),
                reason: format!(
                    "assignment has {} bytes, circuit expects {}",
                    assignment.max_len(),
                    params.max_len
                ),
            });
        }
        if assignment.patterns() != &params.patterns {
            return Err(BuildError::InvalidSignal {
                name: "patterns".to_string(),
                reason: "assignment patterns differ from circuit patterns".to_string(),
            });
        }
        Ok(Self {
            params,
            witness: Some(CircuitWitness::from(assignment)),
        })
    }

    /// Circuit carrying a raw field-level witness.
    #[must_use]
    pub fn with_witness(params: CircuitParams, witness: CircuitWitness) -> Self {
        Self {
            params,
            witness: Some(witness),
        }
    }

    #[must_use]
    pub fn params(&self) -> &CircuitParams {
        &self.params
    }

    fn witness_values(&self) -> Result<(Vec<Value<Fp>>, [Vec<Value<Fp>>; 3]), Error> {
        let len = self.params.max_len;
        match &self.witness {
            Some(witness) => {
                if witness.buffer.len() != len || witness.selectors.iter().any(|s| s.len() != len)
                {
                    return Err(Error::Synthesis);
                }
                let buffer = witness.buffer.iter().copied().map(Value::known).collect();
                let selectors = witness
                    .selectors
                    .clone()
                    .map(|s| s.into_iter().map(Value::known).collect());
                Ok((buffer, selectors))
            }
            None => Ok((
                vec![Value::unknown(); len],
                [(); 3].map(|_| vec![Value::unknown(); len]),
            )),
        }
    }
}

impl Circuit<Fp> for EmailPresenceCircuit {
    type Config = EmailPresenceConfig;
    type FloorPlanner = SimpleFloorPlanner;

    fn without_witnesses(&self) -> Self {
        Self::new(self.params.clone())
    }

    fn configure(meta: &mut ConstraintSystem<Fp>) -> Self::Config {
        let buffer = ByteChunkConfig::configure(meta);

        let q_body = meta.selector();
        let q_last = meta.selector();
        let substrings = PatternKind::ALL.map(|kind| {
            SubstringConfig::configure(meta, buffer.byte, kind.len(), q_body, q_last)
        });

        let state = [(); POSEIDON_WIDTH].map(|_| meta.advice_column());
        let partial_sbox = meta.advice_column();
        let rc_a = [(); POSEIDON_WIDTH].map(|_| meta.fixed_column());
        let rc_b = [(); POSEIDON_WIDTH].map(|_| meta.fixed_column());
        meta.enable_constant(rc_b[0]);
        for column in state {
            meta.enable_equality(column);
        }
        let poseidon = Pow5Chip::configure::<P128Pow5T3>(meta, state, partial_sbox, rc_a, rc_b);

        let instance = meta.instance_column();
        meta.enable_equality(instance);

        EmailPresenceConfig {
            buffer,
            substrings,
            q_body,
            q_last,
            poseidon,
            instance,
        }
    }

    fn synthesize(
        &self,
        config: Self::Config,
        mut layouter: impl Layouter<Fp>,
    ) -> Result<(), Error> {
        let len = self.params.max_len;
        let (buffer, selectors) = self.witness_values()?;

        let chunks = layouter.assign_region(
            || "email buffer",
            |mut region| {
                for row in 0..len {
                    if row + 1 < len {
                        config.q_body.enable(&mut region, row)?;
                    } else {
                        config.q_last.enable(&mut region, row)?;
                    }
                }

                let chunks = config.buffer.assign(&mut region, &buffer)?;
                for kind in PatternKind::ALL {
                    config.substrings[kind.index()].assign(
                        &mut region,
                        self.params.patterns.get(kind),
                        &selectors[kind.index()],
                    )?;
                }
                Ok(chunks)
            },
        )?;

        let mut digest = layouter.assign_region(
            || "initial accumulator",
            |mut region| {
                region.assign_advice_from_constant(|| "h_0", config.buffer.acc, 0, Fp::zero())
            },
        )?;
        for (i, chunk) in chunks.into_iter().enumerate() {
            let hasher = PoseidonHash::<
                _,
                _,
                P128Pow5T3,
                ConstantLength<2>,
                POSEIDON_WIDTH,
                POSEIDON_RATE,
            >::init(
                Pow5Chip::construct(config.poseidon.clone()),
                layouter.namespace(|| format!("chunk {i} init")),
            )?;
            digest = hasher.hash(
                layouter.namespace(|| format!("chunk {i} fold")),
                [digest, chunk],
            )?;
        }

        layouter.constrain_instance(digest.cell(), config.instance, 0)
    }
}
