use chem_domain::{Atom, BondOrder, Conformer, Element, Molecule};
use serde_json::json;

fn water() -> Molecule {
    let mut m = Molecule::new("water");
    let o = m.add_atom(Atom::new(Element::O), [0.0; 3]);
    let h1 = m.add_atom(Atom::new(Element::H), [0.0; 3]);
    let h2 = m.add_atom(Atom::new(Element::H), [0.0; 3]);
    m.add_bond(o, h1, BondOrder::Single).unwrap();
    m.add_bond(o, h2, BondOrder::Single).unwrap();
    m
}

#[test]
fn test_add_atom_extends_existing_conformers() {
    let mut m = Molecule::new("methane");
    m.add_atom(Atom::new(Element::C), [0.0; 3]);
    m.set_conformers(vec![Conformer::new(vec![[0.0, 0.0, 0.5]])]).unwrap();
    let h = m.add_atom(Atom::new(Element::H), [1.0, 0.0, 0.0]);
    assert_eq!(m.conformer().unwrap().positions()[h], [1.0, 0.0, 0.0]);
    assert!(m.has_3d_conformer());
}

#[test]
fn test_water_counts() {
    let m = water();
    assert_eq!(m.atomic_numbers(), vec![8, 1, 1]);
    assert_eq!(m.heavy_atom_count(), 1);
    assert_eq!(m.implicit_hydrogens(0), 0);
    assert_eq!(m.formula(), "H2O");
}

#[test]
fn test_element_serializes_as_atomic_number() {
    let atom = Atom::new(Element::CL);
    let value = serde_json::to_value(&atom).unwrap();
    assert_eq!(value["element"], json!(17));
    let back: Atom = serde_json::from_value(value).unwrap();
    assert_eq!(back, atom);
    assert!(serde_json::from_value::<Element>(json!(0)).is_err());
}

#[test]
fn test_bracket_hydrogen_count_overrides_valence() {
    let mut m = Molecule::new("pyrrole-n");
    let mut n = Atom::new(Element::N);
    n.hydrogen_count = Some(1);
    n.aromatic = true;
    m.add_atom(n, [0.0; 3]);
    assert_eq!(m.implicit_hydrogens(0), 1);
    let h = m.add_atom(Atom::new(Element::H), [0.0; 3]);
    m.add_bond(0, h, BondOrder::Single).unwrap();
    assert_eq!(m.implicit_hydrogens(0), 0);
}
