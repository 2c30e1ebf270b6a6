//! Frontera con el backend de química cuántica.

mod spool;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chem_domain::Molecule;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PipelineError;
use crate::model::CalculationRecord;
pub use spool::SpoolPipeline;

/// Entrada validada del pipeline.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub canonical_text: String,
    pub molecule: Molecule,
    pub key: String,
}

/// Ajustes opacos del backend (`MOLCALC_PIPELINE_*`), pasados tal cual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub values: BTreeMap<String, String>,
}

impl PipelineSettings {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Respuesta para el cliente.
    pub payload: Value,
    /// Registro a persistir, si el backend lo produjo.
    pub record: Option<CalculationRecord>,
}

#[async_trait]
pub trait ComputationPipeline: Send + Sync {
    async fn run(&self, request: PipelineRequest, settings: &PipelineSettings) -> Result<PipelineOutput, PipelineError>;
}
