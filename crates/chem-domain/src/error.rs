use thiserror::Error;

/// Errores del modelo molecular (invariantes estructurales).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Error de validación: {0}")]
    ValidationError(String),
}
