// atom.rs
use serde::{Deserialize, Serialize};

use crate::Element;

/// Átomo de una molécula (sin coordenadas; las posiciones viven en los
/// conformeros).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    pub element: Element,
    pub charge: i8,
    pub isotope: Option<u16>,
    /// Conteo total de hidrógenos declarado explícitamente (átomos entre
    /// corchetes en SMILES). `None` => se deriva de la valencia.
    pub hydrogen_count: Option<u8>,
    pub aromatic: bool,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self { element,
               charge: 0,
               isotope: None,
               hydrogen_count: None,
               aromatic: false }
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }
}

/// Orden de enlace soportado por los formatos de intercambio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Código CTfile (molfile V2000).
    pub fn ctfile_code(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }

    pub fn from_ctfile_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            4 => Some(BondOrder::Aromatic),
            _ => None,
        }
    }

    /// Contribución entera a la valencia; los aromáticos cuentan 1 y el
    /// exceso se corrige por átomo (ver `Molecule::explicit_valence`).
    pub fn valence_contribution(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

/// Enlace no dirigido entre los átomos `i` y `j` (índices base 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bond {
    pub i: usize,
    pub j: usize,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(i: usize, j: usize, order: BondOrder) -> Self {
        Self { i, j, order }
    }

    /// Devuelve el otro extremo si `atom` participa en el enlace.
    pub fn partner(&self, atom: usize) -> Option<usize> {
        if self.i == atom {
            Some(self.j)
        } else if self.j == atom {
            Some(self.i)
        } else {
            None
        }
    }
}
