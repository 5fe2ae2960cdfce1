use halo2_proofs::dev::{MockProver, VerifyFailure};
use pasta_curves::pallas;
use zkp_email_presence::{
    circuit::{CircuitParams, CircuitWitness, EmailPresenceCircuit},
    encoding::{BYTE_BASE, CHUNK_SIZE},
    poseidon_hash, Assignment, PatternKind, PatternSet, MAX_LEN,
};

type Fp = pallas::Base;

const TEST_LEN: usize = 64;
const SAMPLE: &[u8] = b"From: a@x.com\r\nTo: b@gmail.com\r\n";

fn small_params() -> CircuitParams {
    CircuitParams::new(TEST_LEN, PatternSet::default()).unwrap()
}

fn build(raw: &[u8]) -> Assignment {
    small_params().builder().build(raw).unwrap()
}

/// Commitment fold over field elements, so non-byte values can be committed.
fn field_commit(buffer: &[Fp]) -> Fp {
    let base = Fp::from(BYTE_BASE);
    buffer
        .chunks(CHUNK_SIZE)
        .map(|chunk| chunk.iter().rev().fold(Fp::zero(), |acc, b| acc * base + b))
        .fold(Fp::zero(), poseidon_hash)
}

fn run(witness: CircuitWitness, commitment: Fp) -> Result<(), Vec<VerifyFailure>> {
    let params = small_params();
    let k = params.k();
    let circuit = EmailPresenceCircuit::with_witness(params, witness);
    MockProver::run(k, &circuit, vec![vec![commitment]])
        .unwrap()
        .verify()
}

fn failure_text(failures: &[VerifyFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn one_hot(offset: usize) -> Vec<Fp> {
    let mut selector = vec![Fp::zero(); TEST_LEN];
    selector[offset] = Fp::one();
    selector
}

#[test]
fn test_built_assignment_is_accepted() {
    let assignment = build(SAMPLE);
    let params = small_params();
    let circuit = EmailPresenceCircuit::from_assignment(params.clone(), &assignment).unwrap();

    let prover = MockProver::run(params.k(), &circuit, vec![assignment.public_inputs()]).unwrap();
    assert_eq!(prover.verify(), Ok(()));
}

#[test]
fn test_boundary_offsets_are_accepted() {
    let mut raw = vec![b' '; TEST_LEN];
    raw[0..3].copy_from_slice(b"To:");
    raw[3..8].copy_from_slice(b"From:");
    raw[TEST_LEN - 10..].copy_from_slice(b"@gmail.com");

    let assignment = build(&raw);
    assert_eq!(assignment.selector(PatternKind::To).offset(), 0);
    assert_eq!(
        assignment.selector(PatternKind::Domain).offset(),
        TEST_LEN - 10
    );

    let witness = CircuitWitness::from(&assignment);
    assert_eq!(run(witness, assignment.commitment()), Ok(()));
}

fn run_reference_size(raw: &[u8]) -> Result<(), Vec<VerifyFailure>> {
    let params = CircuitParams::default();
    assert_eq!(params.max_len(), MAX_LEN);
    assert_eq!(params.k(), 14);

    let assignment = params.builder().build(raw).unwrap();
    let circuit = EmailPresenceCircuit::from_assignment(params.clone(), &assignment).unwrap();
    MockProver::run(params.k(), &circuit, vec![assignment.public_inputs()])
        .unwrap()
        .verify()
}

#[test]
fn test_reference_size_circuit_is_satisfied() {
    let raw = b"From: a@x.com\r\nTo: b@x.com\r\nsome@gmail.com body";
    assert_eq!(run_reference_size(raw), Ok(()));
}

#[test]
fn test_reference_size_last_offset_is_satisfied() {
    let mut raw = vec![b'.'; MAX_LEN];
    raw[..5].copy_from_slice(b"From:");
    raw[MAX_LEN / 2..MAX_LEN / 2 + 3].copy_from_slice(b"To:");
    raw[MAX_LEN - 10..].copy_from_slice(b"@gmail.com");
    assert_eq!(run_reference_size(&raw), Ok(()));
}

#[test]
fn test_custom_patterns_are_enforced() {
    let patterns = PatternSet::new(b"FROM:", b"TO:", b"@yahoo.com").unwrap();
    let params = CircuitParams::new(TEST_LEN, patterns).unwrap();
    let assignment = params
        .builder()
        .build(b"FROM: a@x.com TO: b@yahoo.com")
        .unwrap();
    let circuit = EmailPresenceCircuit::from_assignment(params.clone(), &assignment).unwrap();

    let prover = MockProver::run(params.k(), &circuit, vec![vec![assignment.commitment()]]).unwrap();
    assert_eq!(prover.verify(), Ok(()));
}

#[test]
fn test_wrong_commitment_is_rejected() {
    let assignment = build(SAMPLE);
    let witness = CircuitWitness::from(&assignment);
    let wrong = assignment.commitment() + Fp::one();
    assert!(run(witness, wrong).is_err());
}

#[test]
fn test_tampered_buffer_breaks_commitment() {
    let assignment = build(SAMPLE);
    let mut witness = CircuitWitness::from(&assignment);
    witness.buffer[50] = Fp::from(u64::from(b'z'));
    assert!(run(witness, assignment.commitment()).is_err());
}

#[test]
fn test_mismatched_window_fails_substring_match() {
    let assignment = build(SAMPLE);
    let to_offset = assignment.selector(PatternKind::To).offset();

    let mut witness = CircuitWitness::from(&assignment);
    witness.buffer[to_offset + 1] = Fp::from(u64::from(b'x'));
    let commitment = field_commit(&witness.buffer);

    let failures = run(witness, commitment).unwrap_err();
    assert!(failure_text(&failures).contains("substring match"));
}

#[test]
fn test_shifted_selector_is_rejected() {
    let assignment = build(SAMPLE);
    let from_offset = assignment.selector(PatternKind::From).offset();

    let mut witness = CircuitWitness::from(&assignment);
    witness.selectors[PatternKind::From.index()] = one_hot(from_offset + 1);

    let failures = run(witness, assignment.commitment()).unwrap_err();
    assert!(failure_text(&failures).contains("substring match"));
}

#[test]
fn test_zero_selector_is_rejected() {
    let assignment = build(SAMPLE);
    let mut witness = CircuitWitness::from(&assignment);
    witness.selectors[PatternKind::Domain.index()] = vec![Fp::zero(); TEST_LEN];
    assert!(run(witness, assignment.commitment()).is_err());
}

#[test]
fn test_two_hot_selector_is_rejected() {
    let raw = b"From: a To: b To: c@gmail.com";
    let assignment = build(raw);

    let mut witness = CircuitWitness::from(&assignment);
    let selector = &mut witness.selectors[PatternKind::To.index()];
    assert_eq!(selector[8], Fp::one());
    selector[14] = Fp::one();

    assert!(run(witness, assignment.commitment()).is_err());
}

#[test]
fn test_non_boolean_selector_is_rejected() {
    let assignment = build(SAMPLE);
    let to_offset = assignment.selector(PatternKind::To).offset();

    let mut witness = CircuitWitness::from(&assignment);
    let selector = &mut witness.selectors[PatternKind::To.index()];
    selector[to_offset] = Fp::from(2);
    selector[40] = -Fp::one();

    assert!(run(witness, assignment.commitment()).is_err());
}

#[test]
fn test_selector_outside_window_is_rejected() {
    let mut raw = SAMPLE.to_vec();
    raw.resize(TEST_LEN, b' ');
    let assignment = build(&raw);

    let mut witness = CircuitWitness::from(&assignment);
    witness.selectors[PatternKind::Domain.index()] = one_hot(TEST_LEN - 2);

    let failures = run(witness, assignment.commitment()).unwrap_err();
    assert!(failure_text(&failures).contains("selector outside window"));
}

#[test]
fn test_non_byte_value_fails_range_check() {
    let assignment = build(SAMPLE);
    let mut witness = CircuitWitness::from(&assignment);
    witness.buffer[40] = Fp::from(256);
    let commitment = field_commit(&witness.buffer);

    let failures = run(witness, commitment).unwrap_err();
    assert!(failure_text(&failures).contains("byte range check"));
}

#[test]
fn test_field_commit_matches_builder() {
    let assignment = build(SAMPLE);
    let witness = CircuitWitness::from(&assignment);
    assert_eq!(field_commit(&witness.buffer), assignment.commitment());
}

#[test]
fn test_witness_length_mismatch_is_synthesis_error() {
    let assignment = build(SAMPLE);
    let mut witness = CircuitWitness::from(&assignment);
    witness.buffer.pop();

    let params = small_params();
    let circuit = EmailPresenceCircuit::with_witness(params.clone(), witness);
    assert!(MockProver::run(params.k(), &circuit, vec![vec![assignment.commitment()]]).is_err());
}
