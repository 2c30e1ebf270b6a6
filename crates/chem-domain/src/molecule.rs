// molecule.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Atom, Bond, BondOrder, DomainError, Element};

/// Una disposición 3D concreta de los átomos de la molécula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conformer {
    positions: Vec<[f64; 3]>,
    is_3d: bool,
}

impl Conformer {
    /// Crea un conformero; se marca 3D cuando alguna coordenada z es no nula.
    pub fn new(positions: Vec<[f64; 3]>) -> Self {
        let is_3d = positions.iter().any(|p| p[2].abs() > 1e-4);
        Self { positions, is_3d }
    }

    /// Conformero producido por embedding: 3D aunque resulte plano.
    pub fn new_3d(positions: Vec<[f64; 3]>) -> Self {
        Self { positions, is_3d: true }
    }

    pub fn positions(&self) -> &[[f64; 3]] {
        &self.positions
    }

    pub fn positions_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.positions
    }

    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Handle en memoria de una molécula: átomos, enlaces y cero o más
/// conformeros. Nunca se persiste directamente; sólo serializado a texto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub name: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    conformers: Vec<Conformer>,
}

impl Molecule {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               ..Default::default() }
    }

    /// Construye una molécula validando índices de enlaces y longitudes de
    /// conformeros.
    pub fn from_parts(name: impl Into<String>,
                      atoms: Vec<Atom>,
                      bonds: Vec<Bond>,
                      conformers: Vec<Conformer>)
                      -> Result<Self, DomainError> {
        let mut mol = Molecule { name: name.into(),
                                 atoms,
                                 bonds: Vec::with_capacity(bonds.len()),
                                 conformers: Vec::new() };
        for b in bonds {
            mol.add_bond(b.i, b.j, b.order)?;
        }
        mol.set_conformers(conformers)?;
        Ok(mol)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atoms_mut(&mut self) -> &mut [Atom] {
        &mut self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn conformers(&self) -> &[Conformer] {
        &self.conformers
    }

    /// Acceso mutable a las posiciones; la longitud de cada conformero no
    /// puede cambiar por esta vía.
    pub fn conformers_mut(&mut self) -> &mut [Conformer] {
        &mut self.conformers
    }

    /// Primer conformero, si existe.
    pub fn conformer(&self) -> Option<&Conformer> {
        self.conformers.first()
    }

    pub fn conformer_mut(&mut self) -> Option<&mut Conformer> {
        self.conformers.first_mut()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Agrega un átomo y extiende todos los conformeros con `position`.
    pub fn add_atom(&mut self, atom: Atom, position: [f64; 3]) -> usize {
        self.atoms.push(atom);
        for c in &mut self.conformers {
            c.positions.push(position);
        }
        self.atoms.len() - 1
    }

    pub fn add_bond(&mut self, i: usize, j: usize, order: BondOrder) -> Result<(), DomainError> {
        let n = self.atoms.len();
        if i >= n || j >= n {
            return Err(DomainError::ValidationError(format!("enlace {i}-{j} fuera de rango ({n} átomos)")));
        }
        if i == j {
            return Err(DomainError::ValidationError(format!("enlace del átomo {i} consigo mismo")));
        }
        if self.bond_between(i, j).is_some() {
            return Err(DomainError::ValidationError(format!("enlace duplicado {i}-{j}")));
        }
        self.bonds.push(Bond::new(i, j, order));
        Ok(())
    }

    /// Reemplaza todos los conformeros. Cada uno debe cubrir todos los átomos.
    pub fn set_conformers(&mut self, conformers: Vec<Conformer>) -> Result<(), DomainError> {
        if let Some(bad) = conformers.iter().find(|c| c.len() != self.atoms.len()) {
            return Err(DomainError::ValidationError(format!("conformero con {} posiciones para {} átomos",
                                                            bad.len(),
                                                            self.atoms.len())));
        }
        self.conformers = conformers;
        Ok(())
    }

    pub fn has_3d_conformer(&self) -> bool {
        self.conformers.iter().any(Conformer::is_3d)
    }

    pub fn bond_between(&self, i: usize, j: usize) -> Option<&Bond> {
        self.bonds.iter().find(|b| (b.i == i && b.j == j) || (b.i == j && b.j == i))
    }

    /// Vecinos del átomo `idx` junto con el orden del enlace.
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, BondOrder)> + '_ {
        self.bonds.iter().filter_map(move |b| b.partner(idx).map(|p| (p, b.order)))
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.neighbors(idx).count()
    }

    /// Números atómicos en el orden de los átomos.
    pub fn atomic_numbers(&self) -> Vec<u8> {
        self.atoms.iter().map(|a| a.element.atomic_number()).collect()
    }

    pub fn has_hydrogens(&self) -> bool {
        self.atoms.iter().any(Atom::is_hydrogen)
    }

    /// Átomos pesados: todo átomo con número atómico distinto de 1.
    pub fn heavy_atom_count(&self) -> usize {
        self.atoms.iter().filter(|a| !a.is_hydrogen()).count()
    }

    pub fn hydrogen_neighbors(&self, idx: usize) -> u8 {
        self.neighbors(idx).filter(|(n, _)| self.atoms[*n].is_hydrogen()).count() as u8
    }

    /// Valencia usada por enlaces explícitos. Los enlaces aromáticos cuentan
    /// 1 cada uno más 1 extra por átomo aromático (aprox. 1.5 por enlace).
    pub fn explicit_valence(&self, idx: usize) -> u8 {
        let mut valence = 0u8;
        let mut aromatic = false;
        for (_, order) in self.neighbors(idx) {
            valence = valence.saturating_add(order.valence_contribution());
            aromatic |= order == BondOrder::Aromatic;
        }
        if aromatic {
            valence = valence.saturating_add(1);
        }
        valence
    }

    /// Hidrógenos implícitos (no representados como átomos) del átomo `idx`.
    pub fn implicit_hydrogens(&self, idx: usize) -> u8 {
        let atom = &self.atoms[idx];
        if atom.is_hydrogen() {
            return 0;
        }
        if let Some(declared) = atom.hydrogen_count {
            return declared.saturating_sub(self.hydrogen_neighbors(idx));
        }
        let used = self.explicit_valence(idx) as i16;
        let charge = atom.charge as i16;
        for &valence in atom.element.default_valences() {
            let target = if atom.element.is_pnictogen_or_chalcogen() {
                valence as i16 + charge
            } else if atom.element == Element::B {
                valence as i16 - charge
            } else {
                valence as i16 - charge.abs()
            };
            if target >= used {
                return (target - used) as u8;
            }
        }
        0
    }

    /// Fórmula en notación Hill (C, H, luego alfabético), incluyendo
    /// hidrógenos implícitos.
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut implicit = 0usize;
        for (idx, atom) in self.atoms.iter().enumerate() {
            *counts.entry(atom.element.symbol()).or_default() += 1;
            implicit += self.implicit_hydrogens(idx) as usize;
        }
        if implicit > 0 {
            *counts.entry("H").or_default() += implicit;
        }
        let mut out = String::new();
        let mut push = |sym: &str, n: usize| {
            out.push_str(sym);
            if n > 1 {
                out.push_str(&n.to_string());
            }
        };
        let carbon = counts.remove("C");
        let hydrogen = counts.remove("H");
        if let Some(n) = carbon {
            push("C", n);
            if let Some(h) = hydrogen {
                push("H", h);
            }
        } else if let Some(h) = hydrogen {
            counts.insert("H", h);
        }
        for (sym, n) in counts {
            push(sym, n);
        }
        out
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,
               "<molecule {} atoms={} bonds={} conformers={}>",
               self.formula(),
               self.atoms.len(),
               self.bonds.len(),
               self.conformers.len())
    }
}
