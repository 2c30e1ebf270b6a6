//! chem-domain: modelo molecular en memoria.
//!
//! - `Element`: elemento químico (número atómico, símbolo, radios, valencias).
//! - `Atom` / `Bond` / `BondOrder`: grafo molecular.
//! - `Molecule` / `Conformer`: handle de molécula con cero o más geometrías 3D.
//!
//! Este crate no conoce formatos de texto ni algoritmos de geometría; eso vive
//! en `chemengine`.
pub mod atom;
pub mod element;
pub mod error;
pub mod molecule;

pub use atom::{Atom, Bond, BondOrder};
pub use element::Element;
pub use error::DomainError;
pub use molecule::{Conformer, Molecule};
