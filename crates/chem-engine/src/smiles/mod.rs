//! Lectura y escritura de SMILES (subconjunto orgánico, átomos entre
//! corchetes, ramas, cierres de anillo y componentes desconectados).
//! No se conserva estereoquímica.

mod reader;
mod writer;

pub use reader::read;
pub use writer::write;
