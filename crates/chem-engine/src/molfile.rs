//! Codec molfile V2000 (formato "ledger": cabecera de 3 líneas, línea de
//! conteos, bloque de átomos, bloque de enlaces y propiedades `M  `).
//!
//! Sólo se lee el primer registro de un SD file (`$$$$` termina).

use chem_domain::{Atom, BondOrder, Conformer, Element, Molecule};
use chrono::{DateTime, Utc};

use crate::EngineError;

/// Número de líneas de la cabecera de metadatos (nombre, programa/fecha,
/// comentario).
pub const HEADER_LINES: usize = 3;

fn err(line: usize, details: impl Into<String>) -> EngineError {
    EngineError::Molfile { line,
                           details: details.into() }
}

/// Extrae una columna de ancho fijo (posiciones base 0, fin exclusivo).
fn column(raw: &str, start: usize, end: usize) -> &str {
    let end = end.min(raw.len());
    if start >= end {
        return "";
    }
    raw.get(start..end).unwrap_or("").trim()
}

fn charge_from_code(code: i32) -> Option<i8> {
    match code {
        0 | 4 => Some(0),
        1 => Some(3),
        2 => Some(2),
        3 => Some(1),
        5 => Some(-1),
        6 => Some(-2),
        7 => Some(-3),
        _ => None,
    }
}

fn code_from_charge(charge: i8) -> u8 {
    match charge {
        3 => 1,
        2 => 2,
        1 => 3,
        -1 => 5,
        -2 => 6,
        -3 => 7,
        _ => 0,
    }
}

/// Lee un bloque molfile V2000 y construye la molécula.
pub fn read(text: &str) -> Result<Molecule, EngineError> {
    let lines: Vec<&str> = text.lines().take_while(|l| l.trim() != "$$$$").collect();
    if lines.len() < HEADER_LINES + 1 {
        return Err(err(lines.len().max(1), "molfile must contain a 3-line header and a counts line"));
    }

    let counts = lines[3];
    if counts.contains("V3000") {
        return Err(err(4, "V3000 molfiles are not supported"));
    }
    let atom_count = column(counts, 0, 3).parse::<usize>()
                                         .map_err(|_| err(4, format!("cannot convert '{}' to atom count", column(counts, 0, 3))))?;
    let bond_count = column(counts, 3, 6).parse::<usize>()
                                         .map_err(|_| err(4, format!("cannot convert '{}' to bond count", column(counts, 3, 6))))?;

    let atom_start = HEADER_LINES + 1;
    let bond_start = atom_start + atom_count;
    if lines.len() < bond_start + bond_count {
        return Err(err(lines.len(), "molfile ended before atoms/bonds were fully specified"));
    }

    let mut mol = Molecule::new(lines[0].trim());
    let mut positions = Vec::with_capacity(atom_count);

    for (offset, raw) in lines[atom_start..bond_start].iter().enumerate() {
        let ln = atom_start + offset + 1;
        let coord = |s: usize, e: usize, axis: &str| {
            column(raw, s, e).parse::<f64>()
                             .map_err(|_| err(ln, format!("cannot convert '{}' to {axis} coordinate", column(raw, s, e))))
        };
        let x = coord(0, 10, "x")?;
        let y = coord(10, 20, "y")?;
        let z = coord(20, 30, "z")?;
        let symbol = column(raw, 31, 34);
        let (element, isotope) = match symbol {
            "D" => (Element::H, Some(2)),
            "T" => (Element::H, Some(3)),
            "A" | "Q" | "L" | "*" | "R#" => return Err(err(ln, format!("query atom '{symbol}' is not supported"))),
            s => (Element::from_symbol(s).ok_or_else(|| err(ln, format!("unknown element symbol '{s}'")))?, None),
        };
        let charge_field = column(raw, 36, 39);
        let charge = if charge_field.is_empty() {
            0
        } else {
            let code = charge_field.parse::<i32>()
                                   .map_err(|_| err(ln, format!("cannot convert '{charge_field}' to charge code")))?;
            charge_from_code(code).ok_or_else(|| err(ln, format!("invalid charge code {code}")))?
        };
        let mut atom = Atom::new(element).with_charge(charge);
        atom.isotope = isotope;
        mol.add_atom(atom, [x, y, z]);
        positions.push([x, y, z]);
    }

    for (offset, raw) in lines[bond_start..bond_start + bond_count].iter().enumerate() {
        let ln = bond_start + offset + 1;
        let index = |s: usize, e: usize| {
            column(raw, s, e).parse::<usize>()
                             .map_err(|_| err(ln, format!("cannot convert '{}' to atom index", column(raw, s, e))))
        };
        let a1 = index(0, 3)?;
        let a2 = index(3, 6)?;
        let code = column(raw, 6, 9).parse::<u8>()
                                    .map_err(|_| err(ln, "invalid bond order value"))?;
        let order = BondOrder::from_ctfile_code(code).ok_or_else(|| err(ln, format!("unsupported bond order {code}")))?;
        if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count {
            return Err(err(ln, "bond references atom outside declared range"));
        }
        mol.add_bond(a1 - 1, a2 - 1, order)
           .map_err(|e| err(ln, e.to_string()))?;
    }

    read_properties(&mut mol, &lines, bond_start + bond_count)?;

    // Aromaticidad a nivel de átomo derivada de los enlaces tipo 4.
    let aromatic: Vec<usize> = mol.bonds()
                                  .iter()
                                  .filter(|b| b.order == BondOrder::Aromatic)
                                  .flat_map(|b| [b.i, b.j])
                                  .collect();
    for idx in aromatic {
        mol.atoms_mut()[idx].aromatic = true;
    }

    if atom_count > 0 {
        // La dimensión de la cabecera no cuenta: sólo las coordenadas.
        mol.set_conformers(vec![Conformer::new(positions)])?;
    }
    Ok(mol)
}

/// Procesa el bloque de propiedades (`M  CHG`, `M  ISO`) hasta `M  END`.
/// Si existe algún `M  CHG`, las cargas del bloque de átomos se ignoran.
fn read_properties(mol: &mut Molecule, lines: &[&str], start: usize) -> Result<(), EngineError> {
    let mut charges_reset = false;
    for (offset, raw) in lines.iter().enumerate().skip(start) {
        let ln = offset + 1;
        if raw.starts_with("M  END") {
            break;
        }
        let is_chg = raw.starts_with("M  CHG");
        let is_iso = raw.starts_with("M  ISO");
        if !is_chg && !is_iso {
            continue;
        }
        let tokens: Vec<&str> = raw[6..].split_whitespace().collect();
        let declared = tokens.first()
                             .and_then(|t| t.parse::<usize>().ok())
                             .ok_or_else(|| err(ln, "invalid property entry count"))?;
        if declared > 8 || tokens.len() < 1 + declared * 2 {
            return Err(err(ln, "property line shorter than declared entry count"));
        }
        if is_chg && !charges_reset {
            for atom in mol.atoms_mut() {
                atom.charge = 0;
            }
            charges_reset = true;
        }
        for pair in tokens[1..1 + declared * 2].chunks(2) {
            let idx = pair[0].parse::<usize>()
                             .ok()
                             .filter(|i| *i >= 1 && *i <= mol.atom_count())
                             .ok_or_else(|| err(ln, format!("property references invalid atom '{}'", pair[0])))?;
            let value = pair[1].parse::<i32>()
                               .map_err(|_| err(ln, format!("cannot convert '{}' to property value", pair[1])))?;
            let atom = &mut mol.atoms_mut()[idx - 1];
            if is_chg {
                atom.charge = i8::try_from(value).map_err(|_| err(ln, format!("charge {value} out of range")))?;
            } else {
                atom.isotope = u16::try_from(value).ok().filter(|v| *v > 0);
            }
        }
    }
    Ok(())
}

/// Evita "-0.0000" en la salida para que la serialización sea estable.
fn clean(v: f64) -> f64 {
    if v.abs() < 5e-5 {
        0.0
    } else {
        v
    }
}

/// Serializa la molécula a molfile V2000. La segunda línea de la cabecera
/// incluye programa y fecha (`IIPPPPPPPPMMDDYYHHmmdd`).
pub fn write(mol: &Molecule, program: &str, timestamp: DateTime<Utc>) -> String {
    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };
    let dimension = match mol.conformer() {
        Some(c) if c.is_3d() => "3D",
        _ => "2D",
    };
    let program: String = program.chars().take(8).collect();

    line(mol.name.clone());
    line(format!("  {:<8}{}{}", program, timestamp.format("%m%d%y%H%M"), dimension));
    line(String::new());
    line(format!("{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000", mol.atom_count(), mol.bond_count()));

    let zeros = vec![[0.0; 3]; mol.atom_count()];
    let positions = mol.conformer().map(|c| c.positions()).unwrap_or(zeros.as_slice());
    for (atom, p) in mol.atoms().iter().zip(positions) {
        let symbol = match (atom.element.is_hydrogen(), atom.isotope) {
            (true, Some(2)) => "D",
            (true, Some(3)) => "T",
            _ => atom.element.symbol(),
        };
        line(format!("{:>10.4}{:>10.4}{:>10.4} {:<3} 0{:>3}  0  0  0  0  0  0  0  0  0  0",
                     clean(p[0]),
                     clean(p[1]),
                     clean(p[2]),
                     symbol,
                     code_from_charge(atom.charge)));
    }
    for b in mol.bonds() {
        line(format!("{:>3}{:>3}{:>3}  0", b.i + 1, b.j + 1, b.order.ctfile_code()));
    }

    let charged: Vec<(usize, i8)> = mol.atoms()
                                       .iter()
                                       .enumerate()
                                       .filter(|(_, a)| a.charge != 0)
                                       .map(|(i, a)| (i + 1, a.charge))
                                       .collect();
    for chunk in charged.chunks(8) {
        let entries: String = chunk.iter().map(|(i, c)| format!("{i:>4}{c:>4}")).collect();
        line(format!("M  CHG{:>3}{}", chunk.len(), entries));
    }
    let isotopes: Vec<(usize, u16)> = mol.atoms()
                                         .iter()
                                         .enumerate()
                                         .filter(|(_, a)| !a.element.is_hydrogen())
                                         .filter_map(|(i, a)| a.isotope.map(|iso| (i + 1, iso)))
                                         .collect();
    for chunk in isotopes.chunks(8) {
        let entries: String = chunk.iter().map(|(i, m)| format!("{i:>4}{m:>4}")).collect();
        line(format!("M  ISO{:>3}{}", chunk.len(), entries));
    }
    line("M  END".to_string());
    out
}
