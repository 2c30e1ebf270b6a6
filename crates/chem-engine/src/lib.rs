//! Toolkit químico nativo.
//!
//! Expone el trait [`ChemToolkit`], que es la frontera entre el pipeline de
//! envíos y cualquier implementación de química (lectura/escritura de
//! molfile y SMILES, adición de hidrógenos, embedding y optimización 3D), y
//! una implementación en Rust puro: [`NativeToolkit`].

pub mod geometry;
pub mod hydrogens;
pub mod molfile;
pub mod smiles;

use chem_domain::{DomainError, Molecule};
use chrono::Utc;
use thiserror::Error;

pub use geometry::OptimizationReport;

/// Errores del toolkit. Los mensajes de parseo conservan el formato crudo
/// (incluido el marcador de posición) y se sanean antes de mostrarse.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("[molfile #{line}] {details}")]
    Molfile { line: usize, details: String },
    #[error("SMILES Parse Error: {details} [#{position}]")]
    Smiles { position: usize, details: String },
    #[error("Error de conversión: {0}")]
    Conversion(String),
    #[error("Error generando conformeros: {0}")]
    Embedding(String),
    #[error("Error optimizando geometría: {0}")]
    Optimization(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl EngineError {
    /// Errores atribuibles al texto de entrada (no a la geometría).
    pub fn is_parse_error(&self) -> bool {
        matches!(self, EngineError::Molfile { .. } | EngineError::Smiles { .. })
    }
}

/// Capacidades químicas que el pipeline necesita. Las implementaciones deben
/// ser seguras para compartir entre hilos: el gate las invoca desde tareas
/// bloqueantes.
pub trait ChemToolkit: Send + Sync {
    fn parse_molblock(&self, text: &str) -> Result<Molecule, EngineError>;
    fn write_molblock(&self, mol: &Molecule) -> String;
    fn to_smiles(&self, mol: &Molecule) -> Result<String, EngineError>;
    fn from_smiles(&self, smiles: &str) -> Result<Molecule, EngineError>;
    /// Agrega hidrógenos explícitos; devuelve cuántos se agregaron.
    fn add_hydrogens(&self, mol: &mut Molecule) -> Result<usize, EngineError>;
    /// Reemplaza los conformeros por `count` conformeros 3D.
    fn embed(&self, mol: &mut Molecule, count: usize) -> Result<(), EngineError>;
    fn optimize(&self, mol: &mut Molecule) -> Result<OptimizationReport, EngineError>;
}

/// Implementación nativa, sin estado.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeToolkit;

impl NativeToolkit {
    /// Nombre de programa escrito en la línea 2 de los molfiles.
    pub const PROGRAM: &'static str = "chemeng";

    pub fn new() -> Self {
        NativeToolkit
    }
}

impl ChemToolkit for NativeToolkit {
    fn parse_molblock(&self, text: &str) -> Result<Molecule, EngineError> {
        molfile::read(text)
    }

    fn write_molblock(&self, mol: &Molecule) -> String {
        molfile::write(mol, Self::PROGRAM, Utc::now())
    }

    fn to_smiles(&self, mol: &Molecule) -> Result<String, EngineError> {
        smiles::write(mol)
    }

    fn from_smiles(&self, text: &str) -> Result<Molecule, EngineError> {
        smiles::read(text)
    }

    fn add_hydrogens(&self, mol: &mut Molecule) -> Result<usize, EngineError> {
        hydrogens::add_hydrogens(mol)
    }

    fn embed(&self, mol: &mut Molecule, count: usize) -> Result<(), EngineError> {
        geometry::embed(mol, count)
    }

    fn optimize(&self, mol: &mut Molecule) -> Result<OptimizationReport, EngineError> {
        geometry::optimize(mol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smiles_to_molblock_and_back() {
        let tk = NativeToolkit::new();
        let mut mol = tk.from_smiles("OCC").unwrap();
        tk.embed(&mut mol, 1).unwrap();
        let block = tk.write_molblock(&mol);
        let parsed = tk.parse_molblock(&block).unwrap();
        assert!(parsed.has_3d_conformer());
        assert_eq!(parsed.atomic_numbers(), vec![8, 6, 6]);
        assert_eq!(tk.to_smiles(&parsed).unwrap(), "OCC");
    }

    #[test]
    fn error_messages_carry_position_markers() {
        let tk = NativeToolkit::new();
        let err = tk.from_smiles("C(C").unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().starts_with("SMILES Parse Error:"));
        assert!(err.to_string().ends_with("[#3]"));
    }
}
