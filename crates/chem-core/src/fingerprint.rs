//! Hashkey de contenido de una molécula normalizada.

use chem_domain::Molecule;
use chemengine::ChemToolkit;
use serde::Serialize;

use crate::hashing::{canonical_molblock, hash_str};

/// Texto canónico (molfile con cabecera en blanco) y su hashkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintedStructure {
    pub canonical_text: String,
    pub key: String,
}

/// Serializa, descarta la cabecera y hashea. El mismo contenido molecular
/// produce la misma clave sin importar nombre, programa o fecha.
pub fn compute_key(toolkit: &dyn ChemToolkit, molecule: &Molecule) -> FingerprintedStructure {
    let canonical_text = canonical_molblock(&toolkit.write_molblock(molecule));
    let key = hash_str(&canonical_text);
    FingerprintedStructure { canonical_text, key }
}
