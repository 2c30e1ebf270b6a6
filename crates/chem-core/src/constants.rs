//! Constantes del pipeline de envíos.
//!
//! `CANONICAL_HEADER` y `KEY_BYTES` participan en el cálculo del hashkey:
//! cambiarlos invalida la deduplicación contra registros existentes.

use std::time::Duration;

/// Techo de átomos pesados (número atómico distinto de 1) por defecto.
pub const HEAVY_ATOM_LIMIT: usize = 10;

/// Presupuesto de reloj por envío cuando no se configura otro.
pub const DEFAULT_SUBMIT_BUDGET: Duration = Duration::from_secs(60);

/// Líneas de cabecera del molfile que se descartan al canonicalizar.
pub const HEADER_LINES: usize = 3;

/// Cabecera canónica: tres líneas vacías.
pub const CANONICAL_HEADER: &str = "\n\n\n";

/// Longitud del hash de contenido (128 bits).
pub const KEY_BYTES: usize = 16;

/// Clave reservada que nunca corresponde a un cálculo.
pub const RESERVED_NOT_FOUND_KEY: &str = "404";
