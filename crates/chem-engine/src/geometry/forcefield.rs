use chem_domain::{BondOrder, Molecule};

const BOND_WEIGHT: f64 = 1.0;
const ANGLE_WEIGHT: f64 = 0.5;
const REPULSION_WEIGHT: f64 = 0.2;
/// Distancia mínima entre pares no enlazados, en múltiplos de la suma de
/// radios covalentes.
const CONTACT_FACTOR: f64 = 1.6;

/// Longitud ideal de enlace: suma de radios covalentes escalada por orden.
pub fn ideal_bond_length(mol: &Molecule, i: usize, j: usize, order: BondOrder) -> f64 {
    let atoms = mol.atoms();
    let sum = atoms[i].element.covalent_radius() + atoms[j].element.covalent_radius();
    let factor = match order {
        BondOrder::Single => 1.0,
        BondOrder::Double => 0.87,
        BondOrder::Triple => 0.78,
        BondOrder::Aromatic => 0.91,
    };
    sum * factor
}

/// Ángulo ideal (radianes) alrededor de `center` según su hibridación.
fn ideal_angle(mol: &Molecule, center: usize) -> f64 {
    let mut doubles = 0;
    let mut triple = false;
    let mut aromatic = false;
    for (_, order) in mol.neighbors(center) {
        match order {
            BondOrder::Double => doubles += 1,
            BondOrder::Triple => triple = true,
            BondOrder::Aromatic => aromatic = true,
            BondOrder::Single => {}
        }
    }
    let degrees = if triple || doubles >= 2 {
        180.0
    } else if doubles == 1 || aromatic {
        120.0
    } else {
        109.47
    };
    f64::to_radians(degrees)
}

#[derive(Debug, Clone, Copy)]
struct DistanceTerm {
    i: usize,
    j: usize,
    target: f64,
    weight: f64,
}

/// Campo de fuerzas de restricciones de distancia: enlaces (1-2), ángulos
/// expresados como distancias 1-3 y repulsión entre el resto de pares.
#[derive(Debug, Clone)]
pub struct ForceField {
    terms: Vec<DistanceTerm>,
    contacts: Vec<DistanceTerm>,
}

impl ForceField {
    pub fn build(mol: &Molecule) -> Self {
        let n = mol.atom_count();
        let mut bonded = vec![vec![false; n]; n];
        let mut terms = Vec::new();
        let mut lengths = vec![vec![0.0f64; n]; n];

        for bond in mol.bonds() {
            let target = ideal_bond_length(mol, bond.i, bond.j, bond.order);
            lengths[bond.i][bond.j] = target;
            lengths[bond.j][bond.i] = target;
            bonded[bond.i][bond.j] = true;
            bonded[bond.j][bond.i] = true;
            terms.push(DistanceTerm { i: bond.i,
                                      j: bond.j,
                                      target,
                                      weight: BOND_WEIGHT });
        }

        for center in 0..n {
            let neighbors: Vec<usize> = mol.neighbors(center).map(|(nb, _)| nb).collect();
            let cos = ideal_angle(mol, center).cos();
            for (k, &a) in neighbors.iter().enumerate() {
                for &c in &neighbors[k + 1..] {
                    if bonded[a][c] {
                        continue;
                    }
                    let (da, dc) = (lengths[center][a], lengths[center][c]);
                    let target = (da * da + dc * dc - 2.0 * da * dc * cos).sqrt();
                    bonded[a][c] = true;
                    bonded[c][a] = true;
                    terms.push(DistanceTerm { i: a,
                                              j: c,
                                              target,
                                              weight: ANGLE_WEIGHT });
                }
            }
        }

        let atoms = mol.atoms();
        let mut contacts = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if bonded[i][j] {
                    continue;
                }
                let target = CONTACT_FACTOR * (atoms[i].element.covalent_radius() + atoms[j].element.covalent_radius());
                contacts.push(DistanceTerm { i,
                                             j,
                                             target,
                                             weight: REPULSION_WEIGHT });
            }
        }
        Self { terms, contacts }
    }

    /// Energía total; acumula el gradiente en `grad` (que se pone a cero).
    pub fn energy_and_gradient(&self, pos: &[[f64; 3]], grad: &mut [[f64; 3]]) -> f64 {
        for g in grad.iter_mut() {
            *g = [0.0; 3];
        }
        let mut energy = 0.0;
        for term in &self.terms {
            energy += accumulate(term, pos, grad, false);
        }
        for term in &self.contacts {
            energy += accumulate(term, pos, grad, true);
        }
        energy
    }

    #[cfg(test)]
    pub fn energy(&self, pos: &[[f64; 3]]) -> f64 {
        let mut scratch = vec![[0.0; 3]; pos.len()];
        self.energy_and_gradient(pos, &mut scratch)
    }
}

fn accumulate(term: &DistanceTerm, pos: &[[f64; 3]], grad: &mut [[f64; 3]], repulsive_only: bool) -> f64 {
    let (a, b) = (pos[term.i], pos[term.j]);
    let delta = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    let d = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
    let diff = d - term.target;
    if repulsive_only && diff >= 0.0 {
        return 0.0;
    }
    if d > 1e-8 {
        let scale = 2.0 * term.weight * diff / d;
        for k in 0..3 {
            grad[term.i][k] += scale * delta[k];
            grad[term.j][k] -= scale * delta[k];
        }
    }
    term.weight * diff * diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use chem_domain::{Atom, Element};

    fn water() -> Molecule {
        let mut m = Molecule::new("water");
        let o = m.add_atom(Atom::new(Element::O), [0.0; 3]);
        for _ in 0..2 {
            let h = m.add_atom(Atom::new(Element::H), [0.0; 3]);
            m.add_bond(o, h, BondOrder::Single).unwrap();
        }
        m
    }

    #[test]
    fn ideal_geometry_has_zero_bonded_energy() {
        let m = water();
        let ff = ForceField::build(&m);
        let r = ideal_bond_length(&m, 0, 1, BondOrder::Single);
        let half = f64::to_radians(109.47) / 2.0;
        let pos = vec![[0.0, 0.0, 0.0], [r * half.sin(), r * half.cos(), 0.0], [-r * half.sin(), r * half.cos(), 0.0]];
        assert!(ff.energy(&pos) < 1e-6);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let m = water();
        let ff = ForceField::build(&m);
        let pos = vec![[0.1, 0.0, 0.2], [1.3, 0.1, 0.0], [-0.4, 0.9, 0.3]];
        let mut grad = vec![[0.0; 3]; 3];
        ff.energy_and_gradient(&pos, &mut grad);
        let h = 1e-6;
        for atom in 0..3 {
            for k in 0..3 {
                let mut plus = pos.clone();
                plus[atom][k] += h;
                let mut minus = pos.clone();
                minus[atom][k] -= h;
                let numeric = (ff.energy(&plus) - ff.energy(&minus)) / (2.0 * h);
                assert!((numeric - grad[atom][k]).abs() < 1e-4, "atom {atom} axis {k}");
            }
        }
    }
}
