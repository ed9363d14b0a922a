use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::io::section::{Marker, Section, SectionGrammar, number, split_fixed};
use crate::io::{Format, error::Error};
use crate::model::element;
use crate::model::molecule::Molecule;

const FORMAT: Format = Format::Pdb;

/// Marker words that turn a REMARK line into the start of a pseudo-section
/// when they follow REMARK on the next line.
const TAGGED: [&str; 3] = ["CONECT", "RESCON", "SEGRNG"];

#[derive(Debug, Clone)]
struct PendingBond {
    /// Tagged REMARK CONECT records name 1-based atom positions, standard
    /// CONECT records name serial numbers.
    by_position: bool,
    from: i64,
    to: i64,
    order: String,
    tacticity: i32,
    line: usize,
}

/// Reads wwPDB fixed-column records. CONECT partners name atom serial
/// numbers, so bonds are resolved once every atom has been read.
#[derive(Debug, Default)]
pub struct PdbGrammar {
    serials: Vec<Option<i64>>,
    bonds: Vec<PendingBond>,
}

/// Columns `[start, end)` of `line`, empty when the line is shorter.
fn col(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or_default()
}

fn record_name(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or_default()
}

/// Charges are written as `2+` or `1-`; plain numbers are accepted too.
fn formal_charge(field: &str) -> f64 {
    let field = field.trim();
    let parsed = match field.as_bytes() {
        [d @ b'0'..=b'9', b'+'] => Some(f64::from(d - b'0')),
        [d @ b'0'..=b'9', b'-'] => Some(-f64::from(d - b'0')),
        _ => field.parse().ok(),
    };
    parsed.unwrap_or(0.0)
}

/// Parses a bond partner token `atom[:order[:tacticity]]`.
fn partner(token: &str, line: usize) -> Result<(i64, String, i32), Error> {
    let mut parts = token.split(':');
    let atom = number(FORMAT, line, parts.next().unwrap_or_default(), "bonded atom")?;
    let order = match parts.next() {
        None => "1".to_string(),
        Some("1.5") => "ar".to_string(),
        Some(order) => number::<i64>(FORMAT, line, order, "bond order")?.to_string(),
    };
    let tacticity = match parts.next() {
        None => 0,
        Some(t) => number(FORMAT, line, t, "bond tacticity")?,
    };
    if parts.next().is_some() {
        return Err(Error::parse(
            FORMAT,
            line,
            format!("bond partner '{token}' has too many fields"),
        ));
    }
    Ok((atom, order, tacticity))
}

impl SectionGrammar for PdbGrammar {
    const FORMAT: Format = Format::Pdb;

    fn classify(
        &mut self,
        _line_no: usize,
        line: &str,
        next: Option<&str>,
        current: Option<&str>,
    ) -> Result<Option<Marker>, Error> {
        let marker = match record_name(line) {
            "REMARK" if current.is_none() => Some("REMARK"),
            "TITLE" => Some("TITLE"),
            "CRYST1" => Some("CRYST1"),
            "ATOM" | "HETATM" => Some("ATOM"),
            "REMARK" => next
                .and_then(|n| n.split_whitespace().nth(1))
                .and_then(|word| TAGGED.iter().find(|&&t| t == word).copied()),
            "CONECT" => Some("CONECT"),
            "END" => Some("END"),
            _ => None,
        };
        Ok(marker.map(|name| Marker::Open(name.to_string())))
    }

    fn process(&mut self, mol: &mut Molecule, section: &Section) -> Result<(), Error> {
        match section.name.as_str() {
            "REMARK" => {
                let text: Vec<&str> = section
                    .lines
                    .iter()
                    .map(|l| l.text.get(7..).unwrap_or_default().trim())
                    .filter(|t| !t.is_empty())
                    .collect();
                mol.description.push_str(&text.join(" "));
            }
            "TITLE" => {
                let title: Vec<&str> = section
                    .lines
                    .iter()
                    .filter(|l| record_name(&l.text) == "TITLE")
                    .map(|l| l.text.get(10..).unwrap_or_default().trim())
                    .collect();
                mol.title = Some(title.join(" "));
            }
            "CRYST1" => {
                for l in section.lines.iter().filter(|l| record_name(&l.text) == "CRYST1") {
                    let words: Vec<&str> = l.text.split_whitespace().collect();
                    if words.len() < 7 {
                        return Err(Error::parse(FORMAT, l.no, "CRYST1 needs three lengths and three angles"));
                    }
                    mol.box_x = number(FORMAT, l.no, words[1], "cell length a")?;
                    mol.box_y = number(FORMAT, l.no, words[2], "cell length b")?;
                    mol.box_z = number(FORMAT, l.no, words[3], "cell length c")?;
                    mol.box_alpha = number(FORMAT, l.no, words[4], "cell angle alpha")?;
                    mol.box_beta = number(FORMAT, l.no, words[5], "cell angle beta")?;
                    mol.box_gamma = number(FORMAT, l.no, words[6], "cell angle gamma")?;
                }
            }
            "ATOM" => {
                for l in &section.lines {
                    match record_name(&l.text) {
                        "ATOM" | "HETATM" => self.atom(mol, l.no, &l.text)?,
                        other => debug!("PDB record {other} at line {} skipped", l.no),
                    }
                }
            }
            "CONECT" => {
                for l in &section.lines {
                    let words: Vec<&str> = l.text.split_whitespace().collect();
                    match words.as_slice() {
                        ["CONECT", ..] => {
                            let from = number(FORMAT, l.no, col(&l.text, 6, 11), "atom serial")?;
                            for field in split_fixed(col(&l.text, 11, 31), 5) {
                                self.bonds.push(PendingBond {
                                    by_position: false,
                                    from,
                                    to: number(FORMAT, l.no, field, "bonded atom serial")?,
                                    order: "1".to_string(),
                                    tacticity: 0,
                                    line: l.no,
                                });
                            }
                        }
                        ["REMARK", "CONECT", from, partners @ ..] => {
                            let from = number(FORMAT, l.no, from, "atom id")?;
                            for token in partners {
                                let (to, order, tacticity) = partner(token, l.no)?;
                                self.bonds.push(PendingBond {
                                    by_position: true,
                                    from,
                                    to,
                                    order,
                                    tacticity,
                                    line: l.no,
                                });
                            }
                        }
                        _ => {}
                    }
                }
            }
            "END" => {}
            other => warn!("PDB section {other} is not read, skipping {} lines", section.lines.len()),
        }
        Ok(())
    }

    fn finish(&mut self, mol: &mut Molecule) -> Result<(), Error> {
        let by_serial: HashMap<i64, usize> = self
            .serials
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|s| (s, i)))
            .collect();
        let atoms = self.serials.len();
        let resolve = |id: i64, by_position: bool| {
            if by_position {
                usize::try_from(id - 1).ok().filter(|&i| i < atoms)
            } else {
                by_serial.get(&id).copied()
            }
        };

        // A pair listed again in the same direction raises the bond order, a
        // pair listed from its other end is the same bond.
        let mut emitted = HashSet::new();
        for bond in self.bonds.drain(..) {
            let (Some(a), Some(b)) = (
                resolve(bond.from, bond.by_position),
                resolve(bond.to, bond.by_position),
            ) else {
                warn!(
                    "PDB bond {}-{} at line {} names an unknown atom, skipped",
                    bond.from, bond.to, bond.line
                );
                continue;
            };
            if emitted.contains(&(b, a)) {
                continue;
            }
            emitted.insert((a, b));
            mol.bond_from.push(a);
            mol.bond_to.push(b);
            mol.bond_type.push(bond.order);
            mol.bond_tacticity.push(bond.tacticity);
        }
        Ok(())
    }
}

impl PdbGrammar {
    fn atom(&mut self, mol: &mut Molecule, no: usize, line: &str) -> Result<(), Error> {
        let name = col(line, 12, 16).trim().to_string();
        let resid: i32 = number(FORMAT, no, col(line, 22, 26), "residue number")?;
        let x = number(FORMAT, no, col(line, 30, 38), "x coordinate")?;
        let y = number(FORMAT, no, col(line, 38, 46), "y coordinate")?;
        let z = number(FORMAT, no, col(line, 46, 54), "z coordinate")?;

        let symbol = col(line, 76, 78).trim();
        if !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::parse(FORMAT, no, format!("invalid element '{symbol}'")));
        }
        let (atom_type, atomic_no) = if symbol.is_empty() {
            match element::guess_from_name(&name) {
                Some(z) => (
                    element::symbol(z).unwrap_or_default().to_ascii_uppercase(),
                    z,
                ),
                None => (name.clone(), 0),
            }
        } else {
            (symbol.to_string(), element::atomic_number(symbol).unwrap_or(0))
        };

        let optional = |start, end, what| {
            let field = col(line, start, end).trim();
            field.parse::<f64>().unwrap_or_else(|_| {
                if !field.is_empty() {
                    debug!("PDB line {no}: unreadable {what} '{field}'");
                }
                0.0
            })
        };

        self.serials.push(col(line, 6, 11).trim().parse().ok());
        mol.atom_name.push(name);
        mol.atom_altloc.push(col(line, 16, 17).trim().to_string());
        mol.atom_resname.push(col(line, 17, 20).trim().to_string());
        mol.atom_chain.push(col(line, 21, 22).trim().to_string());
        mol.atom_resid.push(resid - 1);
        mol.atom_icode.push(col(line, 26, 27).trim().to_string());
        mol.atom_x.push(x);
        mol.atom_y.push(y);
        mol.atom_z.push(z);
        mol.atom_occupancy.push(optional(54, 60, "occupancy"));
        mol.atom_temp_factor.push(optional(60, 66, "temperature factor"));
        mol.atom_segment.push(col(line, 72, 76).trim().to_string());
        mol.atom_type.push(atom_type);
        mol.atom_atomic_no.push(atomic_no);
        mol.atom_q.push(formal_charge(col(line, 78, 80)));
        Ok(())
    }
}
