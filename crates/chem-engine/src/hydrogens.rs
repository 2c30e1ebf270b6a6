use chem_domain::{Atom, BondOrder, Element, Molecule};

use crate::EngineError;

/// Direcciones aproximadamente tetraédricas para repartir los H nuevos.
const SPREAD: [[f64; 3]; 4] = [[1.0, 1.0, 1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, -1.0], [1.0, -1.0, -1.0]];

/// Convierte los hidrógenos implícitos en átomos explícitos enlazados a su
/// átomo pesado. Si hay conformeros, los H se colocan a distancia de enlace
/// en dirección opuesta a los vecinos existentes. Devuelve cuántos se
/// agregaron.
pub fn add_hydrogens(mol: &mut Molecule) -> Result<usize, EngineError> {
    let heavy: Vec<(usize, u8)> = (0..mol.atom_count()).map(|idx| (idx, mol.implicit_hydrogens(idx)))
                                                       .filter(|(_, n)| *n > 0)
                                                       .collect();
    let mut added = 0;
    for (parent, count) in heavy {
        let placements: Vec<Vec<[f64; 3]>> =
            mol.conformers()
               .iter()
               .map(|c| (0..count as usize).map(|k| place(mol, c.positions(), parent, k)).collect())
               .collect();
        for k in 0..count as usize {
            let h = mol.add_atom(Atom::new(Element::H), [0.0; 3]);
            for (conformer, positions) in mol.conformers_mut().iter_mut().zip(&placements) {
                conformer.positions_mut()[h] = positions[k];
            }
            mol.add_bond(parent, h, BondOrder::Single)?;
            added += 1;
        }
    }
    Ok(added)
}

fn place(mol: &Molecule, positions: &[[f64; 3]], parent: usize, k: usize) -> [f64; 3] {
    let origin = positions[parent];
    let mut away = [0.0f64; 3];
    for (nb, _) in mol.neighbors(parent) {
        let d = sub(origin, positions[nb]);
        let len = norm(d);
        if len > 1e-6 {
            for axis in 0..3 {
                away[axis] += d[axis] / len;
            }
        }
    }
    let spread = SPREAD[k % SPREAD.len()];
    let mut dir = [0.0; 3];
    for axis in 0..3 {
        dir[axis] = away[axis] + 0.6 * spread[axis];
    }
    let mut len = norm(dir);
    if len < 1e-9 {
        dir = spread;
        len = norm(dir);
    }
    let length = mol.atoms()[parent].element.covalent_radius() + Element::H.covalent_radius();
    [origin[0] + length * dir[0] / len, origin[1] + length * dir[1] / len, origin[2] + length * dir[2] / len]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles;
    use chem_domain::Conformer;

    #[test]
    fn adds_hydrogens_to_satisfy_valence() {
        let mut mol = smiles::read("CC=O").unwrap();
        let added = add_hydrogens(&mut mol).unwrap();
        assert_eq!(added, 4);
        assert_eq!(mol.atom_count(), 7);
        assert!((0..mol.atom_count()).all(|i| mol.implicit_hydrogens(i) == 0));
        assert_eq!(mol.formula(), "C2H4O");
    }

    #[test]
    fn bracket_counts_are_honoured() {
        let mut mol = smiles::read("[NH4+]").unwrap();
        assert_eq!(add_hydrogens(&mut mol).unwrap(), 4);
        assert_eq!(mol.implicit_hydrogens(0), 0);
        assert_eq!(add_hydrogens(&mut mol).unwrap(), 0);
    }

    #[test]
    fn new_hydrogens_get_coordinates_near_parent() {
        let mut mol = smiles::read("O").unwrap();
        mol.set_conformers(vec![Conformer::new_3d(vec![[1.0, 1.0, 1.0]])]).unwrap();
        add_hydrogens(&mut mol).unwrap();
        let pos = mol.conformer().unwrap().positions();
        assert_eq!(pos.len(), 3);
        for h in &pos[1..] {
            let d = norm(sub(*h, pos[0]));
            assert!((d - 0.97).abs() < 1e-9);
        }
        assert_ne!(pos[1], pos[2]);
    }
}
