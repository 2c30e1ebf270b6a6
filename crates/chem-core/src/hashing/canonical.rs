//! Canonicalización del texto molfile para el hashkey.

use crate::constants::{CANONICAL_HEADER, HEADER_LINES};

/// Reemplaza las tres primeras líneas (nombre, programa/fecha, comentario)
/// por líneas vacías y conserva el resto byte a byte. Un texto con menos de
/// tres líneas queda reducido a la cabecera canónica.
pub fn canonical_molblock(text: &str) -> String {
    let mut rest = text;
    for _ in 0..HEADER_LINES {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => {
                rest = "";
                break;
            }
        }
    }
    let mut out = String::with_capacity(CANONICAL_HEADER.len() + rest.len());
    out.push_str(CANONICAL_HEADER);
    out.push_str(rest);
    out
}
