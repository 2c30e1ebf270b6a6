use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Envío tal como llega del cliente.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSubmission {
    /// Texto molfile/SDF.
    pub structure_text: String,
    #[serde(default = "default_add_hydrogens")]
    pub add_hydrogens: bool,
}

fn default_add_hydrogens() -> bool {
    true
}

impl RawSubmission {
    pub fn new(structure_text: impl Into<String>) -> Self {
        Self { structure_text: structure_text.into(),
               add_hydrogens: true }
    }

    pub fn with_hydrogens(mut self, add_hydrogens: bool) -> Self {
        self.add_hydrogens = add_hydrogens;
        self
    }
}

/// Resultado exitoso de un envío.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// La estructura ya tenía un cálculo; sólo se refrescó su timestamp.
    Deduplicated { hashkey: String },
    /// Se invocó el pipeline de cómputo.
    Computed { hashkey: String, payload: Value },
}

impl SubmissionOutcome {
    pub fn hashkey(&self) -> &str {
        match self {
            SubmissionOutcome::Deduplicated { hashkey } | SubmissionOutcome::Computed { hashkey, .. } => hashkey,
        }
    }

    pub fn is_deduplicated(&self) -> bool {
        matches!(self, SubmissionOutcome::Deduplicated { .. })
    }

    /// Payload de respuesta: `{hashkey}` en un acierto, el del pipeline si no.
    pub fn into_payload(self) -> Value {
        match self {
            SubmissionOutcome::Deduplicated { hashkey } => json!({ "hashkey": hashkey }),
            SubmissionOutcome::Computed { payload, .. } => payload,
        }
    }
}
