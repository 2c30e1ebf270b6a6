use std::collections::{BTreeSet, HashMap};

use chem_domain::{BondOrder, Molecule};

use crate::EngineError;

/// Un enlace de cierre de anillo: se abre en `from` (antecesor en el DFS) y se
/// cierra en `to`.
#[derive(Debug, Clone, Copy)]
struct RingBond {
    from: usize,
    to: usize,
    order: BondOrder,
}

struct Layout {
    children: Vec<Vec<usize>>,
    opens: Vec<Vec<usize>>,
    closes: Vec<Vec<usize>>,
    rings: Vec<RingBond>,
}

/// Escribe la molécula como SMILES. Los hidrógenos explícitos neutros unidos a
/// un átomo pesado se pliegan en el conteo de H de ese átomo. Se usan
/// corchetes sólo cuando la forma orgánica no reproduciría el átomo.
pub fn write(mol: &Molecule) -> Result<String, EngineError> {
    if mol.atom_count() == 0 {
        return Err(EngineError::Conversion("molecule has no atoms".into()));
    }
    let suppressed = suppressed_hydrogens(mol);
    let visible: Vec<usize> = (0..mol.atom_count()).filter(|i| !suppressed[*i]).collect();

    let mut visited = vec![false; mol.atom_count()];
    let mut components = Vec::new();
    for &root in &visible {
        if visited[root] {
            continue;
        }
        let layout = layout_component(mol, root, &suppressed, &mut visited);
        components.push(emit_component(mol, root, &layout, &suppressed));
    }
    Ok(components.join("."))
}

/// H neutro, sin isótopo, con un único vecino pesado.
fn suppressed_hydrogens(mol: &Molecule) -> Vec<bool> {
    mol.atoms()
       .iter()
       .enumerate()
       .map(|(idx, atom)| {
           if !atom.is_hydrogen() || atom.charge != 0 || atom.isotope.is_some() || mol.degree(idx) != 1 {
               return false;
           }
           mol.neighbors(idx).all(|(n, _)| !mol.atoms()[n].is_hydrogen())
       })
       .collect()
}

fn layout_component(mol: &Molecule, root: usize, suppressed: &[bool], visited: &mut [bool]) -> Layout {
    let n = mol.atom_count();
    let mut layout = Layout { children: vec![Vec::new(); n],
                              opens: vec![Vec::new(); n],
                              closes: vec![Vec::new(); n],
                              rings: Vec::new() };
    let mut seen_edges: BTreeSet<(usize, usize)> = BTreeSet::new();
    // Pila explícita: (átomo, padre)
    let mut stack: Vec<(usize, Option<usize>)> = vec![(root, None)];
    while let Some((atom, parent)) = stack.pop() {
        if visited[atom] {
            continue;
        }
        visited[atom] = true;
        if let Some(p) = parent {
            layout.children[p].push(atom);
            seen_edges.insert(edge_key(p, atom));
        }
        let mut neighbors: Vec<(usize, BondOrder)> = mol.neighbors(atom).filter(|(nb, _)| !suppressed[*nb]).collect();
        neighbors.sort_by_key(|(nb, _)| *nb);
        // Los vecinos ya visitados (y que no son el padre) son cierres de anillo.
        for &(nb, order) in &neighbors {
            if visited[nb] && Some(nb) != parent && seen_edges.insert(edge_key(atom, nb)) {
                let ring = layout.rings.len();
                layout.rings.push(RingBond { from: nb, to: atom, order });
                layout.opens[nb].push(ring);
                layout.closes[atom].push(ring);
            }
        }
        // Orden inverso para visitar primero el vecino de menor índice.
        for &(nb, _) in neighbors.iter().rev() {
            if !visited[nb] {
                stack.push((nb, Some(atom)));
            }
        }
    }
    layout
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

fn emit_component(mol: &Molecule, root: usize, layout: &Layout, suppressed: &[bool]) -> String {
    let mut out = String::new();
    let mut digits: BTreeSet<u32> = (1..=99).collect();
    let mut assigned: HashMap<usize, u32> = HashMap::new();

    // Pila de trabajo: Emit(átomo, padre) o Text(")") para cerrar ramas.
    enum Step {
        Atom(usize, Option<usize>),
        Text(&'static str),
    }
    let mut work = vec![Step::Atom(root, None)];
    while let Some(step) = work.pop() {
        let (atom, parent) = match step {
            Step::Text(t) => {
                out.push_str(t);
                continue;
            }
            Step::Atom(a, p) => (a, p),
        };
        if let Some(p) = parent {
            if let Some(bond) = mol.bond_between(p, atom) {
                out.push_str(bond_symbol(mol, p, atom, bond.order));
            }
        }
        out.push_str(&atom_token(mol, atom, suppressed));

        for &ring in &layout.closes[atom] {
            if let Some(d) = assigned.remove(&ring) {
                out.push_str(&ring_label(d));
                digits.insert(d);
            }
        }
        for &ring in &layout.opens[atom] {
            let RingBond { from, to, order } = layout.rings[ring];
            let d = digits.pop_first().unwrap_or(99);
            assigned.insert(ring, d);
            out.push_str(bond_symbol(mol, from, to, order));
            out.push_str(&ring_label(d));
        }

        // Todas las ramas salvo la última van entre paréntesis.
        let children = &layout.children[atom];
        if let Some((last, rest)) = children.split_last() {
            work.push(Step::Atom(*last, Some(atom)));
            for &child in rest.iter().rev() {
                work.push(Step::Text(")"));
                work.push(Step::Atom(child, Some(atom)));
                work.push(Step::Text("("));
            }
        }
    }
    out
}

fn ring_label(d: u32) -> String {
    if d < 10 {
        d.to_string()
    } else {
        format!("%{d:02}")
    }
}

fn bond_symbol(mol: &Molecule, a: usize, b: usize, order: BondOrder) -> &'static str {
    let both_aromatic = mol.atoms()[a].aromatic && mol.atoms()[b].aromatic;
    match order {
        BondOrder::Single if both_aromatic => "-",
        BondOrder::Single => "",
        BondOrder::Double => "=",
        BondOrder::Triple => "#",
        BondOrder::Aromatic if both_aromatic => "",
        BondOrder::Aromatic => ":",
    }
}

fn atom_token(mol: &Molecule, idx: usize, suppressed: &[bool]) -> String {
    let atom = &mol.atoms()[idx];
    let folded = mol.neighbors(idx).filter(|(n, _)| suppressed[*n]).count() as u8;
    let hydrogens = mol.implicit_hydrogens(idx).saturating_add(folded);

    let symbol = if atom.aromatic {
        atom.element.symbol().to_ascii_lowercase()
    } else {
        atom.element.symbol().to_string()
    };
    // H que un lector deduciría para la forma sin corchetes.
    let heavy_valence = mol.explicit_valence(idx).saturating_sub(folded);
    let inferred = atom.element
                       .default_valences()
                       .iter()
                       .find(|&&v| v >= heavy_valence)
                       .map_or(0, |v| v - heavy_valence);
    let aromatic_ok = !atom.aromatic || matches!(symbol.as_str(), "b" | "c" | "n" | "o" | "p" | "s");
    let bare = atom.element.is_organic_subset()
               && atom.charge == 0
               && atom.isotope.is_none()
               && aromatic_ok
               && hydrogens == inferred;
    if bare {
        return symbol;
    }

    let mut token = String::from("[");
    if let Some(iso) = atom.isotope {
        token.push_str(&iso.to_string());
    }
    token.push_str(&symbol);
    match hydrogens {
        0 => {}
        1 => token.push('H'),
        n => token.push_str(&format!("H{n}")),
    }
    match atom.charge {
        0 => {}
        1 => token.push('+'),
        -1 => token.push('-'),
        c if c > 0 => token.push_str(&format!("+{c}")),
        c => token.push_str(&format!("-{}", c.unsigned_abs())),
    }
    token.push(']');
    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::reader;
    use chem_domain::{Atom, Element};

    fn roundtrip(smiles: &str) -> String {
        write(&reader::read(smiles).unwrap()).unwrap()
    }

    #[test]
    fn writes_simple_chains_and_branches() {
        assert_eq!(roundtrip("CCO"), "CCO");
        assert_eq!(roundtrip("CC(=O)O"), "CC(=O)O");
        assert_eq!(roundtrip("C#N"), "C#N");
    }

    #[test]
    fn writes_ring_closures() {
        assert_eq!(roundtrip("c1ccccc1"), "c1ccccc1");
        assert_eq!(roundtrip("C1CCCCC1"), "C1CCCCC1");
    }

    #[test]
    fn writes_charged_and_disconnected() {
        assert_eq!(roundtrip("[NH4+].[Cl-]"), "[NH4+].[Cl-]");
        assert_eq!(roundtrip("[13CH4]"), "[13CH4]");
        assert_eq!(roundtrip("[CH4]"), "C");
        assert_eq!(roundtrip("[Na+].[OH-]"), "[Na+].[OH-]");
    }

    #[test]
    fn folds_explicit_hydrogens() {
        let mut mol = Molecule::new("methanol");
        let c = mol.add_atom(Atom::new(Element::C), [0.0; 3]);
        let o = mol.add_atom(Atom::new(Element::O), [0.0; 3]);
        mol.add_bond(c, o, BondOrder::Single).unwrap();
        for _ in 0..3 {
            let h = mol.add_atom(Atom::new(Element::H), [0.0; 3]);
            mol.add_bond(c, h, BondOrder::Single).unwrap();
        }
        let h = mol.add_atom(Atom::new(Element::H), [0.0; 3]);
        mol.add_bond(o, h, BondOrder::Single).unwrap();
        assert_eq!(write(&mol).unwrap(), "CO");
    }

    #[test]
    fn molecular_hydrogen_is_kept() {
        assert_eq!(roundtrip("[H][H]"), "[H][H]");
    }

    #[test]
    fn aromatic_nitrogen_with_hydrogen_is_bracketed() {
        assert_eq!(roundtrip("c1cc[nH]c1"), "c1cc[nH]c1");
    }

    #[test]
    fn empty_molecule_is_an_error() {
        assert!(write(&Molecule::new("")).is_err());
    }
}
