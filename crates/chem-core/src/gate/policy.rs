use std::collections::HashSet;
use std::time::Duration;

use crate::constants::{DEFAULT_SUBMIT_BUDGET, HEAVY_ATOM_LIMIT};
use crate::pipeline::PipelineSettings;

/// Configuración del gate, fijada al arrancar (nunca por petición).
#[derive(Debug, Clone, PartialEq)]
pub struct GatePolicy {
    pub blocked_clients: HashSet<String>,
    pub heavy_atom_limit: usize,
    /// Presupuesto de reloj compartido por todas las etapas del envío.
    pub budget: Duration,
    pub pipeline_settings: PipelineSettings,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self { blocked_clients: HashSet::new(),
               heavy_atom_limit: HEAVY_ATOM_LIMIT,
               budget: DEFAULT_SUBMIT_BUDGET,
               pipeline_settings: PipelineSettings::default() }
    }
}

impl GatePolicy {
    pub fn is_blocked(&self, client: &str) -> bool {
        self.blocked_clients.contains(client)
    }
}
