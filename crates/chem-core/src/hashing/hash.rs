//! Hash de contenido: BLAKE3 en modo XOF truncado a `KEY_BYTES`.

use blake3::Hasher;

use crate::constants::KEY_BYTES;

/// Hashea un string y devuelve hex de 128 bits (32 caracteres).
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    let mut out = [0u8; KEY_BYTES];
    h.finalize_xof().fill(&mut out);
    let mut hex = String::with_capacity(KEY_BYTES * 2);
    for b in out {
        hex.push_str(&format!("{b:02x}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_128_bit_lowercase_hex() {
        let h = hash_str("benzene");
        assert_eq!(h.len(), 32);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(h, hash_str("benzene"));
        assert_ne!(h, hash_str("benzene "));
    }

    #[test]
    fn xof_prefix_matches_default_digest() {
        let full = blake3::hash(b"abc").to_hex().to_string();
        assert_eq!(hash_str("abc"), &full[..32]);
    }
}
