// element.rs
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::DomainError;

/// Símbolos de la tabla periódica indexados por número atómico - 1.
const SYMBOLS: [&str; 86] = ["H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
                             "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
                             "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
                             "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
                             "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
                             "Pb", "Bi", "Po", "At", "Rn"];

/// Elemento químico identificado por su número atómico.
///
/// Se representa como newtype sobre `u8` para mantener `Atom` compacto y
/// `Copy`. Sólo se aceptan números atómicos 1..=86.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Element(u8);

impl Element {
    pub const H: Element = Element(1);
    pub const B: Element = Element(5);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const F: Element = Element(9);
    pub const P: Element = Element(15);
    pub const S: Element = Element(16);
    pub const CL: Element = Element(17);
    pub const BR: Element = Element(35);
    pub const I: Element = Element(53);

    /// Construye un elemento desde su número atómico.
    pub fn from_atomic_number(z: u8) -> Result<Self, DomainError> {
        if (1..=SYMBOLS.len() as u8).contains(&z) {
            Ok(Element(z))
        } else {
            Err(DomainError::ValidationError(format!("número atómico fuera de rango: {z}")))
        }
    }

    /// Busca un elemento por símbolo. Acepta mayúsculas/minúsculas
    /// arbitrarias ("CL", "cl" y "Cl" son equivalentes).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let symbol = symbol.trim();
        SYMBOLS.iter()
               .position(|s| s.eq_ignore_ascii_case(symbol))
               .map(|idx| Element(idx as u8 + 1))
    }

    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    pub fn symbol(&self) -> &'static str {
        SYMBOLS[(self.0 - 1) as usize]
    }

    pub fn is_hydrogen(&self) -> bool {
        self.0 == 1
    }

    /// Radio covalente aproximado (Å) usado para longitudes de enlace ideales.
    pub fn covalent_radius(&self) -> f64 {
        match self.0 {
            1 => 0.31,
            5 => 0.84,
            6 => 0.76,
            7 => 0.71,
            8 => 0.66,
            9 => 0.57,
            14 => 1.11,
            15 => 1.07,
            16 => 1.05,
            17 => 1.02,
            34 => 1.20,
            35 => 1.20,
            53 => 1.39,
            _ => 1.50,
        }
    }

    /// Valencias estándar en orden ascendente. Vacío para elementos sin
    /// modelo de hidrógenos implícitos (metales, gases nobles).
    pub fn default_valences(&self) -> &'static [u8] {
        match self.0 {
            1 => &[1],
            5 => &[3],
            6 => &[4],
            7 => &[3, 5],
            8 => &[2],
            9 | 17 | 35 | 53 => &[1],
            14 => &[4],
            15 => &[3, 5],
            16 | 34 => &[2, 4, 6],
            _ => &[],
        }
    }

    /// Elementos que pueden escribirse sin corchetes en SMILES.
    pub fn is_organic_subset(&self) -> bool {
        matches!(self.0, 5 | 6 | 7 | 8 | 9 | 15 | 16 | 17 | 35 | 53)
    }

    /// Grupo 15/16: una carga positiva aumenta la valencia disponible.
    pub(crate) fn is_pnictogen_or_chalcogen(&self) -> bool {
        matches!(self.0, 7 | 8 | 15 | 16 | 33 | 34)
    }
}

impl TryFrom<u8> for Element {
    type Error = DomainError;

    fn try_from(z: u8) -> Result<Self, Self::Error> {
        Element::from_atomic_number(z)
    }
}

impl From<Element> for u8 {
    fn from(e: Element) -> u8 {
        e.0
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
