//! Proof generation and verification over the halo2 IPA backend.
//!
//! The backend does the cryptography; this module owns key caching and the
//! order in which public inputs are presented: a single instance column
//! holding `[commitment]`.

use crate::assignment::Assignment;
use crate::circuit::{CircuitParams, EmailPresenceCircuit};
use crate::error::ProverError;
use halo2_proofs::{
    plonk::{
        create_proof, keygen_pk, keygen_vk, verify_proof, ProvingKey, SingleVerifier,
        VerifyingKey,
    },
    poly::commitment::Params,
    transcript::{Blake2bRead, Blake2bWrite, Challenge255},
};
use log::{debug, info, warn};
use pasta_curves::{pallas, vesta};
use std::sync::Arc;

/// A succinct proof together with the public commitment it attests to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofArtifact {
    pub proof: Vec<u8>,
    pub commitment: pallas::Base,
}

/// Prover utility for one circuit size, with cached keys.
pub struct EmailPresenceProver {
    params: CircuitParams,
    vk: Option<Arc<VerifyingKey<vesta::Affine>>>,
    pk: Option<Arc<ProvingKey<vesta::Affine>>>,
}

impl Default for EmailPresenceProver {
    fn default() -> Self {
        Self::new(CircuitParams::default())
    }
}

impl EmailPresenceProver {
    /// Create a new prover with no cached keys.
    pub fn new(params: CircuitParams) -> Self {
        Self {
            params,
            vk: None,
            pk: None,
        }
    }

    /// Create a prover with pre-generated keys.
    pub fn with_keys(
        params: CircuitParams,
        vk: Arc<VerifyingKey<vesta::Affine>>,
        pk: Arc<ProvingKey<vesta::Affine>>,
    ) -> Self {
        Self {
            params,
            vk: Some(vk),
            pk: Some(pk),
        }
    }

    #[must_use]
    pub fn params(&self) -> &CircuitParams {
        &self.params
    }

    /// Public parameters sized for this circuit.
    #[must_use]
    pub fn setup(&self) -> Params<vesta::Affine> {
        Params::<vesta::Affine>::new(self.params.k())
    }

    /// Generate keys from the witness-free circuit and cache them.
    ///
    /// # Errors
    /// Returns [`ProverError::Backend`] if key generation fails, for example
    /// when `srs` is too small for the circuit.
    pub fn generate_and_cache_keys(
        &mut self,
        srs: &Params<vesta::Affine>,
    ) -> Result<(Arc<VerifyingKey<vesta::Affine>>, Arc<ProvingKey<vesta::Affine>>), ProverError>
    {
        info!(
            "Generating keys for max_len {} (k = {})",
            self.params.max_len(),
            self.params.k()
        );
        let circuit = EmailPresenceCircuit::new(self.params.clone());
        let vk = keygen_vk(srs, &circuit)?;
        let pk = keygen_pk(srs, vk.clone(), &circuit)?;

        let vk = Arc::new(vk);
        let pk = Arc::new(pk);
        self.vk = Some(vk.clone());
        self.pk = Some(pk.clone());
        Ok((vk, pk))
    }

    fn proving_key(
        &mut self,
        srs: &Params<vesta::Affine>,
    ) -> Result<Arc<ProvingKey<vesta::Affine>>, ProverError> {
        if let Some(pk) = &self.pk {
            return Ok(pk.clone());
        }
        Ok(self.generate_and_cache_keys(srs)?.1)
    }

    fn verifying_key(
        &mut self,
        srs: &Params<vesta::Affine>,
    ) -> Result<Arc<VerifyingKey<vesta::Affine>>, ProverError> {
        if let Some(vk) = &self.vk {
            return Ok(vk.clone());
        }
        let vk = Arc::new(keygen_vk(
            srs,
            &EmailPresenceCircuit::new(self.params.clone()),
        )?);
        self.vk = Some(vk.clone());
        Ok(vk)
    }

    /// Generates a proof for a builder-produced assignment.
    ///
    /// # Errors
    /// - [`ProverError::Build`] if the assignment does not fit this circuit
    /// - [`ProverError::Backend`] if key generation or proving fails; an
    ///   unsatisfied assignment surfaces here as the backend's own error
    pub fn generate_proof(
        &mut self,
        srs: &Params<vesta::Affine>,
        assignment: &Assignment,
    ) -> Result<ProofArtifact, ProverError> {
        let circuit = EmailPresenceCircuit::from_assignment(self.params.clone(), assignment)?;
        let pk = self.proving_key(srs)?;
        let public_inputs = assignment.public_inputs();

        debug!("Creating proof for commitment {:?}", assignment.commitment());
        let mut transcript = Blake2bWrite::<_, vesta::Affine, Challenge255<_>>::init(vec![]);
        let public_inputs_slice: &[&[&[pallas::Base]]] = &[&[&public_inputs]];
        create_proof(
            srs,
            &pk,
            &[circuit],
            public_inputs_slice,
            rand::rngs::OsRng,
            &mut transcript,
        )?;

        let proof = transcript.finalize();
        info!("Proof generated, {} bytes", proof.len());
        Ok(ProofArtifact {
            proof,
            commitment: assignment.commitment(),
        })
    }

    /// Builds the assignment for `raw` and proves it, strictly in that order.
    ///
    /// # Errors
    /// Build errors are returned before any proving work starts.
    pub fn prove(
        &mut self,
        srs: &Params<vesta::Affine>,
        raw: &[u8],
    ) -> Result<ProofArtifact, ProverError> {
        let assignment = self.params.builder().build(raw)?;
        self.generate_proof(srs, &assignment)
    }

    /// Checks `proof` against `commitment`.
    ///
    /// Returns `Ok(false)` for a proof the backend rejects.
    ///
    /// # Errors
    /// Returns [`ProverError::Backend`] only if the verifying key cannot be
    /// generated.
    pub fn verify_proof(
        &mut self,
        srs: &Params<vesta::Affine>,
        proof: &[u8],
        commitment: pallas::Base,
    ) -> Result<bool, ProverError> {
        let vk = self.verifying_key(srs)?;

        let strategy = SingleVerifier::new(srs);
        let mut transcript = Blake2bRead::<_, vesta::Affine, Challenge255<_>>::init(proof);
        let public_inputs = [commitment];
        let public_inputs_slice: &[&[&[pallas::Base]]] = &[&[&public_inputs]];
        let result = verify_proof(srs, &vk, strategy, public_inputs_slice, &mut transcript);

        if let Err(e) = &result {
            warn!("Proof rejected: {e:?}");
        }
        Ok(result.is_ok())
    }
}
