use std::collections::VecDeque;

use chem_domain::{Conformer, Molecule};
use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::forcefield::{ideal_bond_length, ForceField};
use super::optimize::minimize;
use crate::EngineError;

/// Semilla fija: el mismo grafo produce siempre las mismas coordenadas.
const EMBED_SEED: u64 = 0x6d6f_6c63_616c_63;
const EMBED_ITERATIONS: usize = 500;
const EMBED_TOLERANCE: f64 = 1e-3;
/// Separación entre fragmentos desconectados (Å).
const FRAGMENT_SPACING: f64 = 5.0;

/// Genera `count` conformeros 3D y reemplaza los existentes.
pub fn embed(mol: &mut Molecule, count: usize) -> Result<(), EngineError> {
    if mol.atom_count() == 0 {
        return Err(EngineError::Embedding("molecule has no atoms".into()));
    }
    let ff = ForceField::build(mol);
    let mut conformers = Vec::with_capacity(count.max(1));
    for k in 0..count.max(1) {
        let seed = EMBED_SEED ^ (mol.atom_count() as u64) ^ ((k as u64) << 32);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut positions = initial_coordinates(mol, &mut rng);
        let result = minimize(&ff, &mut positions, EMBED_ITERATIONS, EMBED_TOLERANCE);
        if !result.energy.is_finite() || positions.iter().flatten().any(|v| !v.is_finite()) {
            return Err(EngineError::Embedding(format!("conformer {k} has non-finite coordinates")));
        }
        debug!("embed conformer={} energy={:.4} iterations={} converged={}",
               k, result.energy, result.iterations, result.converged);
        conformers.push(Conformer::new_3d(positions));
    }
    mol.set_conformers(conformers)?;
    Ok(())
}

/// Coloca cada átomo a distancia de enlace de un vecino ya colocado, en una
/// dirección aleatoria (recorrido en anchura por fragmento).
fn initial_coordinates(mol: &Molecule, rng: &mut ChaCha8Rng) -> Vec<[f64; 3]> {
    let n = mol.atom_count();
    let mut positions = vec![[0.0; 3]; n];
    let mut placed = vec![false; n];
    let mut fragment = 0usize;
    for root in 0..n {
        if placed[root] {
            continue;
        }
        positions[root] = [fragment as f64 * FRAGMENT_SPACING, 0.0, 0.0];
        placed[root] = true;
        fragment += 1;
        let mut queue = VecDeque::from([root]);
        while let Some(atom) = queue.pop_front() {
            for (nb, order) in mol.neighbors(atom) {
                if placed[nb] {
                    continue;
                }
                let length = ideal_bond_length(mol, atom, nb, order);
                let dir = random_unit_vector(rng);
                let origin = positions[atom];
                positions[nb] = [origin[0] + length * dir[0], origin[1] + length * dir[1], origin[2] + length * dir[2]];
                placed[nb] = true;
                queue.push_back(nb);
            }
        }
    }
    positions
}

fn random_unit_vector(rng: &mut ChaCha8Rng) -> [f64; 3] {
    loop {
        let v: [f64; 3] = [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)];
        let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        if norm > 1e-3 && norm <= 1.0 {
            return [v[0] / norm, v[1] / norm, v[2] / norm];
        }
    }
}
