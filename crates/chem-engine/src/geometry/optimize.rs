use super::forcefield::ForceField;

/// Resultado de una minimización.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimization {
    pub energy: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Descenso de gradiente con paso adaptativo. Converge cuando la mayor
/// componente del gradiente cae por debajo de `tolerance`.
pub fn minimize(ff: &ForceField, positions: &mut [[f64; 3]], max_iterations: usize, tolerance: f64) -> Minimization {
    let n = positions.len();
    let mut grad = vec![[0.0; 3]; n];
    let mut trial = positions.to_vec();
    let mut trial_grad = vec![[0.0; 3]; n];
    let mut energy = ff.energy_and_gradient(positions, &mut grad);
    let mut step = 0.1;

    for iteration in 0..max_iterations {
        let largest = grad.iter().flatten().fold(0.0f64, |acc, g| acc.max(g.abs()));
        if largest < tolerance {
            return Minimization { energy,
                                  iterations: iteration,
                                  converged: true };
        }
        for (t, (p, g)) in trial.iter_mut().zip(positions.iter().zip(&grad)) {
            for k in 0..3 {
                t[k] = p[k] - step * g[k];
            }
        }
        let trial_energy = ff.energy_and_gradient(&trial, &mut trial_grad);
        if trial_energy <= energy {
            positions.copy_from_slice(&trial);
            std::mem::swap(&mut grad, &mut trial_grad);
            energy = trial_energy;
            step = (step * 1.2).min(1.0);
        } else {
            step *= 0.5;
            if step < 1e-12 {
                // Sin descenso posible: mínimo numérico.
                return Minimization { energy,
                                      iterations: iteration,
                                      converged: true };
            }
        }
    }
    let largest = grad.iter().flatten().fold(0.0f64, |acc, g| acc.max(g.abs()));
    Minimization { energy,
                   iterations: max_iterations,
                   converged: largest < tolerance }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chem_domain::{Atom, BondOrder, Element, Molecule};

    #[test]
    fn stretched_bond_relaxes_to_ideal_length() {
        let mut m = Molecule::new("hf");
        let h = m.add_atom(Atom::new(Element::H), [0.0; 3]);
        let f = m.add_atom(Atom::new(Element::F), [0.0; 3]);
        m.add_bond(h, f, BondOrder::Single).unwrap();
        let ff = ForceField::build(&m);
        let mut pos = vec![[0.0, 0.0, 0.0], [2.5, 0.0, 0.0]];
        let result = minimize(&ff, &mut pos, 1000, 1e-6);
        assert!(result.converged);
        assert!((pos[1][0] - pos[0][0] - 0.88).abs() < 1e-3);
    }

    #[test]
    fn zero_iterations_reports_not_converged() {
        let mut m = Molecule::new("hf");
        m.add_atom(Atom::new(Element::H), [0.0; 3]);
        m.add_atom(Atom::new(Element::F), [0.0; 3]);
        m.add_bond(0, 1, BondOrder::Single).unwrap();
        let ff = ForceField::build(&m);
        let mut pos = vec![[0.0, 0.0, 0.0], [2.5, 0.0, 0.0]];
        assert!(!minimize(&ff, &mut pos, 0, 1e-6).converged);
    }
}
