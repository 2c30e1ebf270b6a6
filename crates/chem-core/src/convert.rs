//! Conversión molfile <-> SMILES para el editor.

use std::sync::Arc;

use chemengine::{ChemToolkit, EngineError};

use crate::errors::{ConversionError, ConversionKind};
use crate::sanitize::sanitize_diagnostic;

#[derive(Clone)]
pub struct ConversionService {
    toolkit: Arc<dyn ChemToolkit>,
}

impl ConversionService {
    pub fn new(toolkit: Arc<dyn ChemToolkit>) -> Self {
        Self { toolkit }
    }

    pub fn sdf_to_smiles(&self, sdf: &str) -> Result<String, ConversionError> {
        let kind = ConversionKind::SdfToSmiles;
        if sdf.trim().is_empty() {
            return Err(ConversionError::MissingInput(kind));
        }
        let molecule = self.toolkit.parse_molblock(sdf).map_err(|e| toolkit_error(kind, &e))?;
        self.toolkit.to_smiles(&molecule).map_err(|e| toolkit_error(kind, &e))
    }

    /// Devuelve un molfile con un conformero 3D generado.
    pub fn smiles_to_sdf(&self, smiles: &str) -> Result<String, ConversionError> {
        let kind = ConversionKind::SmilesToSdf;
        if smiles.trim().is_empty() {
            return Err(ConversionError::MissingInput(kind));
        }
        let mut molecule = self.toolkit.from_smiles(smiles).map_err(|e| toolkit_error(kind, &e))?;
        self.toolkit.embed(&mut molecule, 1).map_err(|e| toolkit_error(kind, &e))?;
        Ok(self.toolkit.write_molblock(&molecule))
    }
}

fn toolkit_error(kind: ConversionKind, err: &EngineError) -> ConversionError {
    ConversionError::Toolkit { kind,
                               message: sanitize_diagnostic(&err.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemengine::NativeToolkit;

    fn service() -> ConversionService {
        ConversionService::new(Arc::new(NativeToolkit::new()))
    }

    #[test]
    fn smiles_round_trips_through_molfile() {
        let svc = service();
        let sdf = svc.smiles_to_sdf("CC(=O)O").unwrap();
        assert!(sdf.lines().nth(1).is_some_and(|l| l.ends_with("3D")));
        assert_eq!(svc.sdf_to_smiles(&sdf).unwrap(), "CC(=O)O");
    }

    #[test]
    fn bad_smiles_message_is_sanitized() {
        let err = service().smiles_to_sdf("C1CC").unwrap_err();
        match &err {
            ConversionError::Toolkit { message, .. } => {
                assert!(!message.contains("[#"));
                assert!(message.contains("unclosed ring"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.code(), "Error 58 - get error");
    }

    #[test]
    fn blank_input_is_missing_information() {
        assert_eq!(service().sdf_to_smiles("  ").unwrap_err(),
                   ConversionError::MissingInput(ConversionKind::SdfToSmiles));
    }
}
