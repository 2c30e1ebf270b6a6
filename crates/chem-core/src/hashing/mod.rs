//! Módulo de hashing y canonicalización del molfile.

pub mod canonical;
pub mod hash;

pub use canonical::canonical_molblock;
pub use hash::hash_str;
