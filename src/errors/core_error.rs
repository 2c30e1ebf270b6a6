use chem_persistence::PersistenceError;
use thiserror::Error;

/// Errores de arranque y de la capa de aplicación.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_variant_format() {
        let err = CoreError::Config("MOLCALC_MAX_HEAVY_ATOMS=abc".into());
        assert_eq!(err.to_string(), "Error de configuración: MOLCALC_MAX_HEAVY_ATOMS=abc");
    }

    #[test]
    fn test_persistence_variant_from() {
        let err: CoreError = PersistenceError::TransientIo("pool".into()).into();
        assert!(err.to_string().starts_with("Error de persistencia:"));
    }
}
