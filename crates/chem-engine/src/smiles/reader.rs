use std::collections::HashMap;

use chem_domain::{Atom, BondOrder, Element, Molecule};

use crate::EngineError;

/// Símbolo de enlace explícito leído en la cadena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BondSymbol {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondSymbol {
    fn order(self) -> BondOrder {
        match self {
            BondSymbol::Single => BondOrder::Single,
            BondSymbol::Double => BondOrder::Double,
            BondSymbol::Triple => BondOrder::Triple,
            BondSymbol::Aromatic => BondOrder::Aromatic,
        }
    }
}

struct RingOpening {
    atom: usize,
    bond: Option<BondSymbol>,
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    input: &'a str,
    mol: Molecule,
    prev: Option<usize>,
    branches: Vec<Option<usize>>,
    pending: Option<BondSymbol>,
    rings: HashMap<u32, RingOpening>,
}

/// Parsea una cadena SMILES (subconjunto orgánico + átomos entre corchetes).
/// La molécula resultante no tiene conformeros.
pub fn read(smiles: &str) -> Result<Molecule, EngineError> {
    let trimmed = smiles.trim();
    // Un SMILES puede llevar un título separado por espacio.
    let body = trimmed.split_whitespace().next().unwrap_or("");
    if body.is_empty() {
        return Err(EngineError::Smiles { position: 0,
                                         details: "empty SMILES string".into() });
    }
    let mut parser = Parser { chars: body.chars().collect(),
                              pos: 0,
                              input: body,
                              mol: Molecule::new(""),
                              prev: None,
                              branches: Vec::new(),
                              pending: None,
                              rings: HashMap::new() };
    parser.run()?;
    Ok(parser.mol)
}

impl<'a> Parser<'a> {
    fn fail(&self, details: impl Into<String>) -> EngineError {
        EngineError::Smiles { position: self.pos,
                              details: format!("{} while parsing '{}'", details.into(), self.input) }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn run(&mut self) -> Result<(), EngineError> {
        while let Some(c) = self.peek() {
            match c {
                '-' | '/' | '\\' => self.bond(BondSymbol::Single)?,
                '=' => self.bond(BondSymbol::Double)?,
                '#' => self.bond(BondSymbol::Triple)?,
                ':' => self.bond(BondSymbol::Aromatic)?,
                '$' => return Err(self.fail("quadruple bonds are not supported")),
                '(' => {
                    if self.prev.is_none() {
                        return Err(self.fail("branch opened before any atom"));
                    }
                    self.branches.push(self.prev);
                    self.pos += 1;
                }
                ')' => {
                    if self.pending.is_some() {
                        return Err(self.fail("bond symbol before ')'"));
                    }
                    let restored = self.branches.pop().ok_or_else(|| self.fail("unmatched ')'"))?;
                    self.prev = restored;
                    self.pos += 1;
                }
                '.' => {
                    if self.pending.is_some() || !self.branches.is_empty() {
                        return Err(self.fail("'.' inside a branch or after a bond symbol"));
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '0'..='9' | '%' => self.ring_closure()?,
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.attach(atom)?;
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.attach(atom)?;
                }
            }
        }
        if self.pending.is_some() {
            return Err(self.fail("SMILES ends with a bond symbol"));
        }
        if !self.branches.is_empty() {
            return Err(self.fail("unclosed branch"));
        }
        if let Some(digit) = self.rings.keys().min() {
            return Err(self.fail(format!("unclosed ring bond {digit}")));
        }
        Ok(())
    }

    fn bond(&mut self, symbol: BondSymbol) -> Result<(), EngineError> {
        if self.prev.is_none() || self.pending.is_some() {
            return Err(self.fail("unexpected bond symbol"));
        }
        self.pending = Some(symbol);
        self.pos += 1;
        Ok(())
    }

    fn implicit_order(&self, a: usize, b: usize) -> BondOrder {
        let atoms = self.mol.atoms();
        if atoms[a].aromatic && atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn attach(&mut self, atom: Atom) -> Result<(), EngineError> {
        let idx = self.mol.add_atom(atom, [0.0; 3]);
        if let Some(prev) = self.prev {
            let order = self.pending
                            .take()
                            .map(BondSymbol::order)
                            .unwrap_or_else(|| self.implicit_order(prev, idx));
            self.mol
                .add_bond(prev, idx, order)
                .map_err(|e| self.fail(e.to_string()))?;
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn ring_closure(&mut self) -> Result<(), EngineError> {
        let current = self.prev.ok_or_else(|| self.fail("ring bond before any atom"))?;
        let digit = if self.peek() == Some('%') {
            let d1 = self.peek_at(1).and_then(|c| c.to_digit(10));
            let d2 = self.peek_at(2).and_then(|c| c.to_digit(10));
            match (d1, d2) {
                (Some(a), Some(b)) => {
                    self.pos += 3;
                    a * 10 + b
                }
                _ => return Err(self.fail("'%' must be followed by two digits")),
            }
        } else {
            let d = self.peek().and_then(|c| c.to_digit(10)).unwrap_or(0);
            self.pos += 1;
            d
        };
        let bond = self.pending.take();
        match self.rings.remove(&digit) {
            Some(open) => {
                let order = match (open.bond, bond) {
                    (Some(a), Some(b)) if a != b => return Err(self.fail(format!("conflicting bond symbols for ring bond {digit}"))),
                    (Some(a), _) | (None, Some(a)) => a.order(),
                    (None, None) => self.implicit_order(open.atom, current),
                };
                self.mol
                    .add_bond(open.atom, current, order)
                    .map_err(|e| self.fail(e.to_string()))?;
            }
            None => {
                self.rings.insert(digit, RingOpening { atom: current, bond });
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, EngineError> {
        let c = self.peek().ok_or_else(|| self.fail("unexpected end of input"))?;
        let (element, aromatic, width) = match (c, self.peek_at(1)) {
            ('C', Some('l')) => (Element::CL, false, 2),
            ('B', Some('r')) => (Element::BR, false, 2),
            ('B', _) => (Element::B, false, 1),
            ('C', _) => (Element::C, false, 1),
            ('N', _) => (Element::N, false, 1),
            ('O', _) => (Element::O, false, 1),
            ('P', _) => (Element::P, false, 1),
            ('S', _) => (Element::S, false, 1),
            ('F', _) => (Element::F, false, 1),
            ('I', _) => (Element::I, false, 1),
            ('b', _) => (Element::B, true, 1),
            ('c', _) => (Element::C, true, 1),
            ('n', _) => (Element::N, true, 1),
            ('o', _) => (Element::O, true, 1),
            ('p', _) => (Element::P, true, 1),
            ('s', _) => (Element::S, true, 1),
            ('*', _) => return Err(self.fail("wildcard atoms are not supported")),
            _ => return Err(self.fail(format!("unexpected character '{c}'"))),
        };
        self.pos += width;
        Ok(Atom { aromatic,
                  ..Atom::new(element) })
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        self.chars[start..self.pos].iter().collect::<String>().parse().ok()
    }

    fn bracket_atom(&mut self) -> Result<Atom, EngineError> {
        self.pos += 1; // '['
        let isotope = self.read_number();

        let first = self.peek().ok_or_else(|| self.fail("unterminated bracket atom"))?;
        let (element, aromatic) = if first.is_ascii_lowercase() {
            let two: String = [first, self.peek_at(1).unwrap_or(' ')].iter().collect();
            if two == "se" || two == "as" {
                self.pos += 2;
                (Element::from_symbol(&two), true)
            } else if matches!(first, 'b' | 'c' | 'n' | 'o' | 'p' | 's') {
                self.pos += 1;
                (Element::from_symbol(&first.to_string()), true)
            } else {
                return Err(self.fail(format!("invalid aromatic symbol '{first}'")));
            }
        } else if first.is_ascii_uppercase() {
            let two = self.peek_at(1)
                          .filter(|c| c.is_ascii_lowercase())
                          .map(|c| format!("{first}{c}"))
                          .and_then(|s| Element::from_symbol(&s));
            match two {
                Some(e) => {
                    self.pos += 2;
                    (Some(e), false)
                }
                None => {
                    self.pos += 1;
                    (Element::from_symbol(&first.to_string()), false)
                }
            }
        } else {
            return Err(self.fail(format!("unexpected character '{first}' in bracket atom")));
        };
        let element = element.ok_or_else(|| self.fail("unknown element in bracket atom"))?;

        // Quiralidad: se acepta y se descarta (incluye clases @TH1, @SP2, ...).
        if self.peek() == Some('@') {
            while self.peek() == Some('@') {
                self.pos += 1;
            }
            let class = (self.peek(), self.peek_at(1));
            if matches!(class, (Some('T'), Some('H' | 'B')) | (Some('A'), Some('L')) | (Some('S'), Some('P')) | (Some('O'), Some('H'))) {
                self.pos += 2;
                self.read_number();
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some('H') {
            self.pos += 1;
            hydrogens = match self.read_number() {
                Some(n) => u8::try_from(n).map_err(|_| self.fail("hydrogen count out of range"))?,
                None => 1,
            };
        }

        let mut charge: i32 = 0;
        while let Some(sign @ ('+' | '-')) = self.peek() {
            let unit = if sign == '+' { 1 } else { -1 };
            self.pos += 1;
            match self.read_number() {
                Some(n) => charge += unit * n as i32,
                None => charge += unit,
            }
        }
        if self.peek() == Some(':') {
            self.pos += 1;
            self.read_number().ok_or_else(|| self.fail("atom class must be numeric"))?;
        }
        if self.peek() != Some(']') {
            return Err(self.fail("unterminated bracket atom"));
        }
        self.pos += 1;

        let charge = i8::try_from(charge).map_err(|_| self.fail("charge out of range"))?;
        let isotope = isotope.map(|v| u16::try_from(v).map_err(|_| self.fail("isotope out of range")))
                             .transpose()?;
        Ok(Atom { element,
                  charge,
                  isotope,
                  hydrogen_count: Some(hydrogens),
                  aromatic })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain_with_branch_and_double_bond() {
        let mol = read("CC(=O)O").unwrap();
        assert_eq!(mol.atomic_numbers(), vec![6, 6, 8, 8]);
        assert_eq!(mol.bond_count(), 3);
        assert_eq!(mol.bond_between(1, 2).unwrap().order, BondOrder::Double);
        assert_eq!(mol.bond_between(1, 3).unwrap().order, BondOrder::Single);
        assert_eq!(mol.formula(), "C2H4O2");
    }

    #[test]
    fn parses_aromatic_ring_closure() {
        let mol = read("c1ccccc1").unwrap();
        assert_eq!(mol.bond_count(), 6);
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(mol.formula(), "C6H6");
    }

    #[test]
    fn parses_bracket_atoms() {
        let mol = read("[NH4+].[Cl-]").unwrap();
        assert_eq!(mol.atoms()[0].charge, 1);
        assert_eq!(mol.atoms()[0].hydrogen_count, Some(4));
        assert_eq!(mol.atoms()[1].element, Element::CL);
        assert_eq!(mol.atoms()[1].charge, -1);
        assert_eq!(mol.bond_count(), 0);

        let mol = read("[13CH3][C@@H](O)C").unwrap();
        assert_eq!(mol.atoms()[0].isotope, Some(13));
        assert_eq!(mol.atoms()[1].hydrogen_count, Some(1));
        assert_eq!(mol.formula(), "C3H8O");
    }

    #[test]
    fn two_letter_organic_symbols() {
        let mol = read("ClCBr").unwrap();
        assert_eq!(mol.atomic_numbers(), vec![17, 6, 35]);
    }

    #[test]
    fn reports_position_of_syntax_errors() {
        match read("CC(C") {
            Err(EngineError::Smiles { details, .. }) => assert!(details.contains("unclosed branch")),
            other => panic!("unexpected: {other:?}"),
        }
        match read("C1CC") {
            Err(EngineError::Smiles { details, .. }) => assert!(details.contains("unclosed ring")),
            other => panic!("unexpected: {other:?}"),
        }
        match read("CCX") {
            Err(EngineError::Smiles { position, .. }) => assert_eq!(position, 2),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(read("").is_err());
        assert!(read("C=").is_err());
    }
}
