#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chem_core::{CalculationRecord, ComputationPipeline, GatePolicy, InMemoryResultStore, PipelineError, PipelineOutput,
                PipelineRequest, PipelineSettings, SubmissionGate};
use chem_domain::Molecule;
use chemengine::{ChemToolkit, EngineError, NativeToolkit, OptimizationReport};
use serde_json::json;

/// Toolkit nativo que cuenta parseos y puede forzar fallos de embedding.
#[derive(Default)]
pub struct CountingToolkit {
    inner: NativeToolkit,
    pub parses: AtomicUsize,
    pub fail_embedding: AtomicBool,
}

impl ChemToolkit for CountingToolkit {
    fn parse_molblock(&self, text: &str) -> Result<Molecule, EngineError> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        self.inner.parse_molblock(text)
    }

    fn write_molblock(&self, mol: &Molecule) -> String {
        self.inner.write_molblock(mol)
    }

    fn to_smiles(&self, mol: &Molecule) -> Result<String, EngineError> {
        self.inner.to_smiles(mol)
    }

    fn from_smiles(&self, smiles: &str) -> Result<Molecule, EngineError> {
        self.inner.from_smiles(smiles)
    }

    fn add_hydrogens(&self, mol: &mut Molecule) -> Result<usize, EngineError> {
        self.inner.add_hydrogens(mol)
    }

    fn embed(&self, mol: &mut Molecule, count: usize) -> Result<(), EngineError> {
        if self.fail_embedding.load(Ordering::SeqCst) {
            return Err(EngineError::Embedding("forced failure".into()));
        }
        self.inner.embed(mol, count)
    }

    fn optimize(&self, mol: &mut Molecule) -> Result<OptimizationReport, EngineError> {
        self.inner.optimize(mol)
    }
}

/// Pipeline que registra las peticiones; opcionalmente tarda o falla.
#[derive(Default)]
pub struct RecordingPipeline {
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<PipelineRequest>>,
    pub delay: Duration,
    pub fail: bool,
}

impl RecordingPipeline {
    pub fn slow(delay: Duration) -> Self {
        Self { delay,
               ..Default::default() }
    }

    pub fn failing() -> Self {
        Self { fail: true,
               ..Default::default() }
    }

    pub fn last_request(&self) -> Option<PipelineRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ComputationPipeline for RecordingPipeline {
    async fn run(&self, request: PipelineRequest, _settings: &PipelineSettings) -> Result<PipelineOutput, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = request.key.clone();
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(PipelineError::Failed("backend unavailable".into()));
        }
        let payload = json!({ "hashkey": key, "status": "computed" });
        Ok(PipelineOutput { record: Some(CalculationRecord::new(key, payload.clone())),
                            payload })
    }
}

pub struct Harness {
    pub gate: SubmissionGate,
    pub toolkit: Arc<CountingToolkit>,
    pub store: Arc<InMemoryResultStore>,
    pub pipeline: Arc<RecordingPipeline>,
}

pub fn harness(pipeline: RecordingPipeline, policy: GatePolicy) -> Harness {
    let toolkit = Arc::new(CountingToolkit::default());
    let store = Arc::new(InMemoryResultStore::new());
    let pipeline = Arc::new(pipeline);
    let gate = SubmissionGate::new(toolkit.clone(), store.clone(), pipeline.clone(), policy);
    Harness { gate,
              toolkit,
              store,
              pipeline }
}

/// Molfile 3D generado a partir de SMILES.
pub fn molblock(smiles: &str, with_hydrogens: bool) -> String {
    let tk = NativeToolkit::new();
    let mut mol = tk.from_smiles(smiles).unwrap();
    if with_hydrogens {
        tk.add_hydrogens(&mut mol).unwrap();
    }
    tk.embed(&mut mol, 1).unwrap();
    tk.write_molblock(&mol)
}

/// Molfile 2D (todas las coordenadas en cero).
pub fn flat_molblock(smiles: &str) -> String {
    let tk = NativeToolkit::new();
    tk.write_molblock(&tk.from_smiles(smiles).unwrap())
}

/// Reemplaza las tres líneas de cabecera.
pub fn with_header(block: &str, name: &str, program_line: &str, comment: &str) -> String {
    let body: Vec<&str> = block.splitn(4, '\n').collect();
    format!("{name}\n{program_line}\n{comment}\n{}", body[3])
}
