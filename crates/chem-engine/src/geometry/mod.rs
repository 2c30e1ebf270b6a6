//! Geometría 3D: campo de fuerzas de restricciones de distancia, embedding
//! determinista y optimización por descenso de gradiente.

mod embed;
mod forcefield;
mod optimize;

use chem_domain::Molecule;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::EngineError;
pub use embed::embed;
use forcefield::ForceField;

const OPTIMIZE_ITERATIONS: usize = 2000;
const OPTIMIZE_TOLERANCE: f64 = 1e-4;

/// Resumen de `optimize` sobre todos los conformeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    /// Energía final por conformero.
    pub energies: Vec<f64>,
    pub iterations: usize,
    /// `false` si algún conformero agotó las iteraciones.
    pub converged: bool,
}

/// Optimiza en sitio todos los conformeros de la molécula.
pub fn optimize(mol: &mut Molecule) -> Result<OptimizationReport, EngineError> {
    if mol.conformers().is_empty() {
        return Err(EngineError::Optimization("molecule has no conformer".into()));
    }
    let ff = ForceField::build(mol);
    let mut report = OptimizationReport { energies: Vec::new(),
                                          iterations: 0,
                                          converged: true };
    let mut optimized = mol.conformers().to_vec();
    for (idx, conformer) in optimized.iter_mut().enumerate() {
        let result = optimize::minimize(&ff, conformer.positions_mut(), OPTIMIZE_ITERATIONS, OPTIMIZE_TOLERANCE);
        if !result.energy.is_finite() || conformer.positions().iter().flatten().any(|v| !v.is_finite()) {
            return Err(EngineError::Optimization(format!("conformer {idx} diverged")));
        }
        if !result.converged {
            warn!("optimize: conformer {} not converged after {} iterations", idx, result.iterations);
        }
        report.energies.push(result.energy);
        report.iterations = report.iterations.max(result.iterations);
        report.converged &= result.converged;
    }
    mol.set_conformers(optimized)?;
    Ok(report)
}
