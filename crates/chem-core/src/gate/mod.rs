//! Orquestador de envíos: block-list, validación, parseo, normalización,
//! hashkey, deduplicación y entrega al pipeline.

mod policy;
mod stage;

use std::sync::Arc;

use chemengine::ChemToolkit;
use chrono::Utc;
use log::{debug, error, info, warn};

use crate::errors::{GateError, StoreError};
use crate::fingerprint::{compute_key, FingerprintedStructure};
use crate::lease::KeyLeases;
use crate::model::{RawSubmission, SubmissionOutcome};
use crate::normalize::{MoleculeNormalizer, NormalizedMolecule};
use crate::pipeline::{ComputationPipeline, PipelineRequest};
use crate::sanitize::sanitize_diagnostic;
use crate::store::{ResultStore, UpsertOutcome};
pub use policy::GatePolicy;
pub use stage::SubmissionStage;
use stage::StageTracker;

/// Punto de entrada de los envíos. Barato de clonar: todo lo compartido va
/// detrás de `Arc`.
#[derive(Clone)]
pub struct SubmissionGate {
    toolkit: Arc<dyn ChemToolkit>,
    store: Arc<dyn ResultStore>,
    pipeline: Arc<dyn ComputationPipeline>,
    policy: Arc<GatePolicy>,
    leases: KeyLeases,
}

impl SubmissionGate {
    pub fn new(toolkit: Arc<dyn ChemToolkit>,
               store: Arc<dyn ResultStore>,
               pipeline: Arc<dyn ComputationPipeline>,
               policy: GatePolicy)
               -> Self {
        Self { toolkit,
               store,
               pipeline,
               policy: Arc::new(policy),
               leases: KeyLeases::new() }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Procesa un envío dentro del presupuesto de reloj de la política.
    pub async fn submit(&self, raw: RawSubmission, client: &str) -> Result<SubmissionOutcome, GateError> {
        let budget = self.policy.budget;
        match tokio::time::timeout(budget, self.run(raw, client)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("submission from {client} exceeded budget of {budget:?}");
                Err(GateError::Timeout { budget })
            }
        }
    }

    async fn run(&self, raw: RawSubmission, client: &str) -> Result<SubmissionOutcome, GateError> {
        let mut tracker = StageTracker::new(client);

        if self.policy.is_blocked(client) {
            return Err(reject(&mut tracker, GateError::BlockedClient));
        }
        if raw.structure_text.trim().is_empty() {
            return Err(reject(&mut tracker, GateError::MalformedInput));
        }
        tracker.advance(SubmissionStage::Validated);

        let toolkit = Arc::clone(&self.toolkit);
        let limit = self.policy.heavy_atom_limit;
        let prepared = tokio::task::spawn_blocking(move || prepare(toolkit.as_ref(), &raw, limit)).await;
        let (normalized, fingerprint) = match prepared {
            Ok(Ok(ready)) => ready,
            Ok(Err(e)) => return Err(reject(&mut tracker, e)),
            Err(join) => {
                error!("normalization task failed: {join}");
                return Err(reject(&mut tracker, GateError::InternalPipeline));
            }
        };
        tracker.advance(SubmissionStage::Parsed);
        tracker.advance(SubmissionStage::Normalized);
        tracker.advance(SubmissionStage::Fingerprinted);

        let key = fingerprint.key.clone();
        let _lease = self.leases.acquire(&key).await;

        let lookup_key = key.clone();
        let existing = self.with_store(move |s| s.lookup(&lookup_key)).await?;
        if existing.is_some() {
            let touch_key = key.clone();
            if !self.with_store(move |s| s.touch(&touch_key, Utc::now())).await? {
                warn!("{key} vanished before its timestamp could be refreshed");
            }
            info!("{key} exists");
            tracker.advance(SubmissionStage::Deduplicated);
            tracker.advance(SubmissionStage::Completed);
            return Ok(SubmissionOutcome::Deduplicated { hashkey: key });
        }

        info!("{key} create");
        tracker.advance(SubmissionStage::Computed);
        let structure = fingerprint.canonical_text.clone();
        let request = PipelineRequest { canonical_text: fingerprint.canonical_text,
                                        molecule: normalized.into_inner(),
                                        key: key.clone() };
        let output = match self.pipeline.run(request, &self.policy.pipeline_settings).await {
            Ok(output) => output,
            Err(e) => {
                error!("{key} PipelineError: {e}");
                error!("{structure}");
                tracker.advance(SubmissionStage::Errored);
                return Err(GateError::InternalPipeline);
            }
        };

        if let Some(record) = output.record {
            match self.with_store(move |s| s.upsert(record)).await? {
                UpsertOutcome::Inserted => debug!("{key} stored"),
                UpsertOutcome::AlreadyPresent => warn!("{key} already stored by another worker"),
            }
        }
        tracker.advance(SubmissionStage::Completed);
        Ok(SubmissionOutcome::Computed { hashkey: key,
                                         payload: output.payload })
    }

    /// Ejecuta una operación del store en el pool bloqueante.
    async fn with_store<T, F>(&self, op: F) -> Result<T, GateError>
        where T: Send + 'static,
              F: FnOnce(&dyn ResultStore) -> Result<T, StoreError> + Send + 'static
    {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || op(store.as_ref())).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("result store failure: {e}");
                Err(GateError::Store)
            }
            Err(join) => {
                error!("result store task failed: {join}");
                Err(GateError::Store)
            }
        }
    }
}

fn reject(tracker: &mut StageTracker, err: GateError) -> GateError {
    info!("submission rejected at {}: {} ({})", tracker.stage(), err.code(), err);
    tracker.advance(SubmissionStage::Rejected);
    err
}

/// Parseo, normalización y hashkey (CPU intensivo, síncrono).
fn prepare(toolkit: &dyn ChemToolkit,
           raw: &RawSubmission,
           heavy_atom_limit: usize)
           -> Result<(NormalizedMolecule, FingerprintedStructure), GateError> {
    let molecule = toolkit.parse_molblock(&raw.structure_text)
                          .map_err(|e| GateError::StructureParse(sanitize_diagnostic(&e.to_string())))?;
    let normalized = MoleculeNormalizer::new(toolkit, heavy_atom_limit).normalize(molecule, raw.add_hydrogens)?;
    let fingerprint = compute_key(toolkit, normalized.molecule());
    Ok((normalized, fingerprint))
}
