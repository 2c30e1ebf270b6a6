//! Errores del core de envíos.
//!
//! Cada error expuesto al cliente tiene un `code()` estable y un
//! `user_message()` sin detalles internos; los detalles se registran en el
//! log del servidor.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

/// Rechazos del normalizador: la molécula es válida como texto pero no
/// cumple las condiciones para calcularse.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum RejectionError {
    #[error("geometry unavailable: {0}")]
    GeometryUnavailable(String),
    #[error("too many heavy atoms: {count} > {limit}")]
    TooManyHeavyAtoms { count: usize, limit: usize },
}

/// Fallos del almacén de resultados.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Fallo opaco del pipeline de cómputo.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline failed: {0}")]
    Failed(String),
    #[error("pipeline io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pipeline serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Resultado negativo de `SubmissionGate::submit`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GateError {
    #[error("client is block-listed")]
    BlockedClient,
    #[error("empty request")]
    EmptyRequest,
    #[error("structure text is missing")]
    MalformedInput,
    #[error("structure could not be parsed: {0}")]
    StructureParse(String),
    #[error("geometry unavailable")]
    GeometryUnavailable,
    #[error("too many heavy atoms: {count} > {limit}")]
    TooManyHeavyAtoms { count: usize, limit: usize },
    #[error("submission exceeded its budget of {budget:?}")]
    Timeout { budget: Duration },
    #[error("result store failure")]
    Store,
    #[error("internal pipeline failure")]
    InternalPipeline,
}

impl GateError {
    pub fn code(&self) -> &'static str {
        match self {
            GateError::BlockedClient => "Error 194 - blocked ip",
            GateError::EmptyRequest => "Error 128 - empty post",
            GateError::MalformedInput => "Error 132 - sdf key error",
            GateError::StructureParse(_) | GateError::GeometryUnavailable => "Error 141 - rdkit error",
            GateError::TooManyHeavyAtoms { .. } => "Error 194 - max atoms error",
            GateError::Timeout { .. } => "Error 408 - timeout",
            GateError::Store => "Error 503 - store error",
            GateError::InternalPipeline => "293",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            GateError::BlockedClient => "IP address has been blocked for misuse".into(),
            GateError::EmptyRequest => "Error. Empty post.".into(),
            GateError::MalformedInput => "Error. Missing information.".into(),
            GateError::StructureParse(msg) => msg.clone(),
            GateError::GeometryUnavailable => {
                "Error. Server was unable to generate conformations for this molecule".into()
            }
            GateError::TooManyHeavyAtoms { limit, .. } => format!("Max {limit} heavy atoms."),
            GateError::Timeout { .. } => "Error. The submission took too long, please try again.".into(),
            GateError::Store => "Error. Calculation storage is unavailable, please try again.".into(),
            GateError::InternalPipeline => "Internal server error. Uncaught exception".into(),
        }
    }

    /// El cliente puede reintentar el mismo envío.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::Timeout { .. } | GateError::Store)
    }

    /// Payload `{error, message}` que ve el cliente.
    pub fn to_payload(&self) -> Value {
        error_payload(self.code(), &self.user_message())
    }
}

impl From<RejectionError> for GateError {
    fn from(e: RejectionError) -> Self {
        match e {
            RejectionError::GeometryUnavailable(_) => GateError::GeometryUnavailable,
            RejectionError::TooManyHeavyAtoms { count, limit } => GateError::TooManyHeavyAtoms { count, limit },
        }
    }
}

/// Dirección de una conversión de formato.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionKind {
    SdfToSmiles,
    SmilesToSdf,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConversionError {
    #[error("empty request")]
    EmptyRequest(ConversionKind),
    #[error("missing input")]
    MissingInput(ConversionKind),
    #[error("conversion failed: {message}")]
    Toolkit { kind: ConversionKind, message: String },
}

impl ConversionError {
    pub fn kind(&self) -> ConversionKind {
        match self {
            ConversionError::EmptyRequest(k) | ConversionError::MissingInput(k) => *k,
            ConversionError::Toolkit { kind, .. } => *kind,
        }
    }

    pub fn code(&self) -> &'static str {
        match (self, self.kind()) {
            (ConversionError::EmptyRequest(_), ConversionKind::SdfToSmiles) => "Error 55 - Missing key",
            (ConversionError::MissingInput(_), ConversionKind::SdfToSmiles) => "Error 60 - get error",
            (ConversionError::Toolkit { .. }, ConversionKind::SdfToSmiles) => "Error 69 - rdkit error",
            (ConversionError::EmptyRequest(_), ConversionKind::SmilesToSdf) => "Error 53 - Missing key",
            (_, ConversionKind::SmilesToSdf) => "Error 58 - get error",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ConversionError::Toolkit { message, .. } => message.clone(),
            _ => "Error. Missing information.".into(),
        }
    }

    pub fn to_payload(&self) -> Value {
        error_payload(self.code(), &self.user_message())
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LookupError {
    #[error("calculation not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn error_payload(code: &str, message: &str) -> Value {
    json!({ "error": code, "message": message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_codes_follow_service_contract() {
        assert_eq!(GateError::InternalPipeline.code(), "293");
        assert_eq!(GateError::MalformedInput.to_payload(),
                   json!({"error": "Error 132 - sdf key error", "message": "Error. Missing information."}));
        let too_big = GateError::TooManyHeavyAtoms { count: 11, limit: 10 };
        assert_eq!(too_big.code(), "Error 194 - max atoms error");
        assert!(too_big.user_message().contains("10"));
        assert!(GateError::Timeout { budget: Duration::from_secs(1) }.is_retryable());
        assert!(!GateError::InternalPipeline.is_retryable());
    }

    #[test]
    fn rejection_maps_to_gate_error() {
        let e: GateError = RejectionError::GeometryUnavailable("nan".into()).into();
        assert_eq!(e, GateError::GeometryUnavailable);
        assert_eq!(e.code(), "Error 141 - rdkit error");
    }

    #[test]
    fn conversion_codes_depend_on_direction() {
        assert_eq!(ConversionError::EmptyRequest(ConversionKind::SdfToSmiles).code(), "Error 55 - Missing key");
        assert_eq!(ConversionError::MissingInput(ConversionKind::SmilesToSdf).code(), "Error 58 - get error");
        let e = ConversionError::Toolkit { kind: ConversionKind::SdfToSmiles,
                                           message: "bad".into() };
        assert_eq!(e.to_payload(), json!({"error": "Error 69 - rdkit error", "message": "bad"}));
    }
}
