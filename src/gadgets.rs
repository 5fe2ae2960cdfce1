//! Column layouts and gates used by [`EmailPresenceCircuit`].
//!
//! Both gadgets lay out one row per buffer position inside a single region,
//! so gates can reach neighbouring bytes through rotations.
//!
//! [`EmailPresenceCircuit`]: crate::circuit::EmailPresenceCircuit

use crate::encoding::{BYTE_BASE, CHUNK_SIZE};
use halo2_proofs::{
    circuit::{AssignedCell, Region, Value},
    plonk::{Advice, Column, ConstraintSystem, Constraints, Error, Expression, Selector},
    poly::Rotation,
};
use pasta_curves::group::ff::PrimeField;
use pasta_curves::pallas;

type Fp = pallas::Base;

pub const BYTE_BITS: usize = 8;

/// Whether `row` is the last row of its chunk in a buffer of `len` rows.
#[must_use]
pub fn is_chunk_tail(row: usize, len: usize) -> bool {
    row % CHUNK_SIZE == CHUNK_SIZE - 1 || row + 1 == len
}

/// Low bit `j` of a field element's canonical little-endian representation.
fn bit_of(value: Fp, j: usize) -> Fp {
    Fp::from(u64::from((value.to_repr()[0] >> j) & 1))
}

/// Byte range check and chunk accumulation.
///
/// Each row holds one buffer byte, its eight bits and the chunk accumulator
///
/// ```text
/// acc[t] = byte[t]                      at a chunk tail
/// acc[t] = byte[t] + 256 * acc[t + 1]   elsewhere
/// ```
///
/// so the accumulator at a chunk's first row is `Σ byte[i] * 256^i`.
#[derive(Debug, Clone)]
pub struct ByteChunkConfig {
    pub byte: Column<Advice>,
    pub bits: [Column<Advice>; BYTE_BITS],
    pub acc: Column<Advice>,
    q_range: Selector,
    q_chunk_tail: Selector,
    q_chunk_link: Selector,
}

impl ByteChunkConfig {
    pub fn configure(meta: &mut ConstraintSystem<Fp>) -> Self {
        let byte = meta.advice_column();
        let bits = [(); BYTE_BITS].map(|_| meta.advice_column());
        let acc = meta.advice_column();
        meta.enable_equality(acc);

        let q_range = meta.selector();
        let q_chunk_tail = meta.selector();
        let q_chunk_link = meta.selector();

        meta.create_gate("byte range check", |meta| {
            let q = meta.query_selector(q_range);
            let value = meta.query_advice(byte, Rotation::cur());
            let bit_exprs: Vec<Expression<Fp>> = bits
                .iter()
                .map(|&column| meta.query_advice(column, Rotation::cur()))
                .collect();

            let recomposed = bit_exprs
                .iter()
                .rev()
                .fold(Expression::Constant(Fp::zero()), |acc, bit| {
                    acc * Fp::from(2) + bit.clone()
                });
            let boolean = bit_exprs
                .into_iter()
                .map(|bit| bit.clone() * (Expression::Constant(Fp::one()) - bit));

            Constraints::with_selector(q, boolean.chain(std::iter::once(value - recomposed)))
        });

        meta.create_gate("chunk tail", |meta| {
            let q = meta.query_selector(q_chunk_tail);
            let value = meta.query_advice(byte, Rotation::cur());
            let acc = meta.query_advice(acc, Rotation::cur());

            Constraints::with_selector(q, [("tail equals byte", acc - value)])
        });

        meta.create_gate("chunk link", |meta| {
            let q = meta.query_selector(q_chunk_link);
            let value = meta.query_advice(byte, Rotation::cur());
            let acc_cur = meta.query_advice(acc, Rotation::cur());
            let acc_next = meta.query_advice(acc, Rotation::next());

            Constraints::with_selector(
                q,
                [(
                    "horner step",
                    acc_cur - (value + acc_next * Fp::from(BYTE_BASE)),
                )],
            )
        });

        Self {
            byte,
            bits,
            acc,
            q_range,
            q_chunk_tail,
            q_chunk_link,
        }
    }

    /// Assigns every buffer row starting at offset 0 and returns the chunk
    /// encoding cells in fold order.
    pub fn assign(
        &self,
        region: &mut Region<'_, Fp>,
        bytes: &[Value<Fp>],
    ) -> Result<Vec<AssignedCell<Fp, Fp>>, Error> {
        let len = bytes.len();
        let base = Value::known(Fp::from(BYTE_BASE));

        let mut acc = vec![Value::known(Fp::zero()); len];
        for row in (0..len).rev() {
            acc[row] = if is_chunk_tail(row, len) {
                bytes[row]
            } else {
                bytes[row] + acc[row + 1] * base
            };
        }

        let mut chunks = Vec::with_capacity(len.div_ceil(CHUNK_SIZE));
        for (row, value) in bytes.iter().enumerate() {
            self.q_range.enable(region, row)?;
            region.assign_advice(|| "byte", self.byte, row, || *value)?;
            for (j, column) in self.bits.iter().enumerate() {
                region.assign_advice(
                    || format!("bit {j}"),
                    *column,
                    row,
                    || value.map(|v| bit_of(v, j)),
                )?;
            }

            if is_chunk_tail(row, len) {
                self.q_chunk_tail.enable(region, row)?;
            } else {
                self.q_chunk_link.enable(region, row)?;
            }
            let cell = region.assign_advice(|| "chunk acc", self.acc, row, || acc[row])?;
            if row % CHUNK_SIZE == 0 {
                chunks.push(cell);
            }
        }

        Ok(chunks)
    }
}

/// One-hot selector and substring match for a single fixed-length pattern.
///
/// For every row `t` inside the valid window and every pattern byte `i`:
///
/// ```text
/// selector[t] * (byte[t + i] - pattern_i[t]) = 0
/// ```
///
/// `pattern_i` is a broadcast column, equal on every row and pinned to the
/// literal at row 0. The selector is boolean inside the window, zero outside,
/// and its running sum starting at row 0 must be exactly one.
#[derive(Debug, Clone)]
pub struct SubstringConfig {
    pub selector: Column<Advice>,
    pub running_sum: Column<Advice>,
    pub pattern: Vec<Column<Advice>>,
    q_window: Selector,
    q_outside: Selector,
}

impl SubstringConfig {
    /// `q_body` must be enabled on every row but the last, `q_last` on the
    /// last row only.
    pub fn configure(
        meta: &mut ConstraintSystem<Fp>,
        byte: Column<Advice>,
        pattern_len: usize,
        q_body: Selector,
        q_last: Selector,
    ) -> Self {
        let selector = meta.advice_column();
        let running_sum = meta.advice_column();
        meta.enable_equality(running_sum);
        let pattern: Vec<Column<Advice>> = (0..pattern_len)
            .map(|_| {
                let column = meta.advice_column();
                meta.enable_equality(column);
                column
            })
            .collect();

        let q_window = meta.selector();
        let q_outside = meta.selector();

        meta.create_gate("substring match", |meta| {
            let q = meta.query_selector(q_window);
            let sel = meta.query_advice(selector, Rotation::cur());
            let boolean = sel.clone() * (Expression::Constant(Fp::one()) - sel.clone());

            let matches: Vec<Expression<Fp>> = pattern
                .iter()
                .enumerate()
                .map(|(i, &column)| {
                    let byte = meta.query_advice(byte, Rotation(i as i32));
                    let expected = meta.query_advice(column, Rotation::cur());
                    sel.clone() * (byte - expected)
                })
                .collect();

            Constraints::with_selector(q, std::iter::once(boolean).chain(matches))
        });

        meta.create_gate("selector outside window", |meta| {
            let q = meta.query_selector(q_outside);
            let sel = meta.query_advice(selector, Rotation::cur());

            Constraints::with_selector(q, [("zero outside window", sel)])
        });

        meta.create_gate("selector running sum", |meta| {
            let q = meta.query_selector(q_body);
            let sel = meta.query_advice(selector, Rotation::cur());
            let sum_cur = meta.query_advice(running_sum, Rotation::cur());
            let sum_next = meta.query_advice(running_sum, Rotation::next());

            Constraints::with_selector(q, [("sum step", sum_cur - (sel + sum_next))])
        });

        meta.create_gate("selector running sum tail", |meta| {
            let q = meta.query_selector(q_last);
            let sel = meta.query_advice(selector, Rotation::cur());
            let sum = meta.query_advice(running_sum, Rotation::cur());

            Constraints::with_selector(q, [("sum tail", sum - sel)])
        });

        meta.create_gate("pattern broadcast", |meta| {
            let q = meta.query_selector(q_body);
            let constant: Vec<Expression<Fp>> = pattern
                .iter()
                .map(|&column| {
                    meta.query_advice(column, Rotation::cur())
                        - meta.query_advice(column, Rotation::next())
                })
                .collect();

            Constraints::with_selector(q, constant)
        });

        Self {
            selector,
            running_sum,
            pattern,
            q_window,
            q_outside,
        }
    }

    /// Assigns the selector, its running sum and the broadcast pattern over
    /// `selector.len()` rows starting at offset 0.
    pub fn assign(
        &self,
        region: &mut Region<'_, Fp>,
        pattern: &[u8],
        selector: &[Value<Fp>],
    ) -> Result<(), Error> {
        let len = selector.len();
        if pattern.len() != self.pattern.len() || pattern.len() > len {
            return Err(Error::Synthesis);
        }
        let last_start = len - pattern.len();

        let mut sums = vec![Value::known(Fp::zero()); len];
        for row in (0..len).rev() {
            sums[row] = if row + 1 == len {
                selector[row]
            } else {
                selector[row] + sums[row + 1]
            };
        }

        for (row, value) in selector.iter().enumerate() {
            if row <= last_start {
                self.q_window.enable(region, row)?;
            } else {
                self.q_outside.enable(region, row)?;
            }
            region.assign_advice(|| "selector", self.selector, row, || *value)?;

            let sum = region.assign_advice(|| "running sum", self.running_sum, row, || sums[row])?;
            if row == 0 {
                region.constrain_constant(sum.cell(), Fp::one())?;
            }

            for (i, (&column, &literal)) in self.pattern.iter().zip(pattern).enumerate() {
                let literal = Fp::from(u64::from(literal));
                if row == 0 {
                    region.assign_advice_from_constant(
                        || format!("pattern byte {i}"),
                        column,
                        row,
                        literal,
                    )?;
                } else {
                    region.assign_advice(
                        || format!("pattern byte {i}"),
                        column,
                        row,
                        || Value::known(literal),
                    )?;
                }
            }
        }

        Ok(())
    }
}
