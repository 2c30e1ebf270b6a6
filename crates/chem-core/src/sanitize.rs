//! Saneamiento de diagnósticos del toolkit antes de mostrarlos al cliente.
//!
//! Heurística textual: se quitan los tokens entre corchetes (marcas de hora,
//! posiciones `[#14]`, prefijos `[molfile #5]`) y los índices `# N`. El texto
//! crudo siempre queda en el log.

use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

pub const GENERIC_PARSE_MESSAGE: &str = "Error. Unable to read the molecule structure.";

static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid bracket pattern"));
static INDEX_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\s?\d+").expect("valid index pattern"));

pub fn sanitize_diagnostic(raw: &str) -> String {
    info!("toolkit diagnostic: {raw}");
    let stripped = BRACKETED.replace_all(raw, " ");
    let stripped = INDEX_TOKEN.replace_all(&stripped, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        GENERIC_PARSE_MESSAGE.to_string()
    } else {
        collapsed
    }
}
