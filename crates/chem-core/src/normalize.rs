//! Normalización previa al hashkey: geometría 3D, hidrógenos explícitos y
//! techo de átomos pesados.

use chem_domain::Molecule;
use chemengine::ChemToolkit;
use log::{debug, warn};

use crate::errors::RejectionError;

/// Molécula con al menos un conformero 3D, hidrógenos explícitos cuando se
/// pidieron y como mucho `heavy_atom_limit` átomos pesados.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMolecule(Molecule);

impl NormalizedMolecule {
    pub fn molecule(&self) -> &Molecule {
        &self.0
    }

    pub fn into_inner(self) -> Molecule {
        self.0
    }
}

pub struct MoleculeNormalizer<'a> {
    toolkit: &'a dyn ChemToolkit,
    heavy_atom_limit: usize,
}

impl<'a> MoleculeNormalizer<'a> {
    pub fn new(toolkit: &'a dyn ChemToolkit, heavy_atom_limit: usize) -> Self {
        Self { toolkit,
               heavy_atom_limit }
    }

    pub fn normalize(&self, mut molecule: Molecule, add_hydrogens: bool) -> Result<NormalizedMolecule, RejectionError> {
        // Los hidrógenos no cambian el conteo de pesados: se puede rechazar
        // antes de cualquier trabajo de geometría.
        self.check_heavy_atoms(&molecule)?;

        if !molecule.has_3d_conformer() {
            debug!("normalize: no 3D conformer, embedding {}", molecule.formula());
            self.toolkit
                .embed(&mut molecule, 1)
                .map_err(|e| RejectionError::GeometryUnavailable(e.to_string()))?;
        }

        if add_hydrogens && !molecule.has_hydrogens() {
            let added = self.toolkit
                            .add_hydrogens(&mut molecule)
                            .map_err(|e| RejectionError::GeometryUnavailable(e.to_string()))?;
            debug!("normalize: added {added} hydrogens, re-embedding");
            self.toolkit
                .embed(&mut molecule, 1)
                .map_err(|e| RejectionError::GeometryUnavailable(e.to_string()))?;
            let report = self.toolkit
                             .optimize(&mut molecule)
                             .map_err(|e| RejectionError::GeometryUnavailable(e.to_string()))?;
            if !report.converged {
                warn!("normalize: optimization did not converge after {} iterations, keeping geometry",
                      report.iterations);
            }
        }

        self.check_heavy_atoms(&molecule)?;
        Ok(NormalizedMolecule(molecule))
    }

    fn check_heavy_atoms(&self, molecule: &Molecule) -> Result<(), RejectionError> {
        let count = molecule.heavy_atom_count();
        if count > self.heavy_atom_limit {
            return Err(RejectionError::TooManyHeavyAtoms { count,
                                                           limit: self.heavy_atom_limit });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chemengine::NativeToolkit;

    #[test]
    fn flat_molecule_gets_3d_conformer_and_hydrogens() {
        let tk = NativeToolkit::new();
        let mol = tk.from_smiles("CO").unwrap();
        let normalized = MoleculeNormalizer::new(&tk, 10).normalize(mol, true).unwrap();
        let m = normalized.molecule();
        assert!(m.has_3d_conformer());
        assert_eq!(m.atom_count(), 6);
        assert_eq!(m.heavy_atom_count(), 2);
    }

    #[test]
    fn hydrogens_are_left_alone_when_not_requested() {
        let tk = NativeToolkit::new();
        let mol = tk.from_smiles("CO").unwrap();
        let normalized = MoleculeNormalizer::new(&tk, 10).normalize(mol, false).unwrap();
        assert!(!normalized.molecule().has_hydrogens());
        assert!(normalized.molecule().has_3d_conformer());
    }

    #[test]
    fn heavy_atom_ceiling_is_inclusive() {
        let tk = NativeToolkit::new();
        let ten = tk.from_smiles("CCCCCCCCCC").unwrap();
        assert!(MoleculeNormalizer::new(&tk, 10).normalize(ten, false).is_ok());
        let eleven = tk.from_smiles("CCCCCCCCCCC").unwrap();
        assert_eq!(MoleculeNormalizer::new(&tk, 10).normalize(eleven, false).unwrap_err(),
                   RejectionError::TooManyHeavyAtoms { count: 11, limit: 10 });
    }

    #[test]
    fn oversized_molecule_is_rejected_before_embedding() {
        let tk = NativeToolkit::new();
        let chain = tk.from_smiles(&"C".repeat(150)).unwrap();
        assert!(!chain.has_3d_conformer());
        let started = std::time::Instant::now();
        let err = MoleculeNormalizer::new(&tk, 10).normalize(chain, true).unwrap_err();
        assert_eq!(err, RejectionError::TooManyHeavyAtoms { count: 150, limit: 10 });
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn empty_molecule_has_no_geometry() {
        let tk = NativeToolkit::new();
        let err = MoleculeNormalizer::new(&tk, 10).normalize(Molecule::new(""), true).unwrap_err();
        assert!(matches!(err, RejectionError::GeometryUnavailable(_)));
    }
}
