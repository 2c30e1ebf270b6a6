use chem_core::constants::RESERVED_NOT_FOUND_KEY;
use chem_core::hashing::{canonical_molblock, hash_str};

#[test]
fn hash_str_produces_hex_32() {
    let h = hash_str("\n\n\n  1  0  0  0  0  0  0  0  0  0999 V2000\n");
    // 128 bits en hex
    assert_eq!(h.len(), 32);
    assert_eq!(h, hash_str("\n\n\n  1  0  0  0  0  0  0  0  0  0999 V2000\n"));
}

#[test]
fn canonical_text_ignores_header_noise() {
    let a = "water\n  chemeng  0101241200 3D\nfirst upload\n  3  2  0\nbody\n";
    let b = "\n  RDKit          3D\n\n  3  2  0\nbody\n";
    assert_eq!(hash_str(&canonical_molblock(a)), hash_str(&canonical_molblock(b)));
    assert_ne!(hash_str(&canonical_molblock(a)), hash_str(&canonical_molblock("x\ny\nz\n  3  2  1\nbody\n")));
}

#[test]
fn reserved_key_is_not_a_hash() {
    assert_ne!(hash_str(""), RESERVED_NOT_FOUND_KEY);
}
