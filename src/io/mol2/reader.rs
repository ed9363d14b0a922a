use log::warn;

use crate::io::section::{Marker, Section, SectionGrammar, number};
use crate::io::{Format, error::Error};
use crate::model::molecule::Molecule;

const FORMAT: Format = Format::Mol2;

/// Reads `@<TRIPOS>` sections. Comment lines are collected while reading and
/// appended to the description at the end.
#[derive(Debug, Default)]
pub struct Mol2Grammar {
    comments: Vec<String>,
    counts_read: bool,
}

fn round4(q: f64) -> f64 {
    (q * 1e4).round() / 1e4
}

fn fields<'a>(line: &'a str, min: usize, no: usize, what: &str) -> Result<Vec<&'a str>, Error> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < min {
        return Err(Error::parse(
            FORMAT,
            no,
            format!("{what} record needs at least {min} fields, found {}", parts.len()),
        ));
    }
    Ok(parts)
}

fn index(field: &str, no: usize, what: &str) -> Result<usize, Error> {
    let id: i64 = number(FORMAT, no, field, what)?;
    if id < 1 {
        return Err(Error::parse(FORMAT, no, format!("{what} {id} is not a 1-based id")));
    }
    Ok(id as usize - 1)
}

impl SectionGrammar for Mol2Grammar {
    const FORMAT: Format = Format::Mol2;

    fn classify(
        &mut self,
        line_no: usize,
        line: &str,
        _next: Option<&str>,
        _current: Option<&str>,
    ) -> Result<Option<Marker>, Error> {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            self.comments.push(trimmed.to_string());
            return Ok(Some(Marker::Skip));
        }
        if trimmed.starts_with("@<") {
            let name = trimmed
                .split_once('>')
                .map(|(_, name)| name.trim())
                .filter(|name| !name.is_empty())
                .ok_or_else(|| Error::parse(FORMAT, line_no, format!("invalid section marker '{trimmed}'")))?;
            return Ok(Some(Marker::Header(name.to_string())));
        }
        Ok(None)
    }

    fn process(&mut self, mol: &mut Molecule, section: &Section) -> Result<(), Error> {
        match section.name.as_str() {
            "MOLECULE" => self.molecule(mol, section)?,
            "ATOM" => {
                let rows = section
                    .lines
                    .iter()
                    .map(|l| fields(&l.text, 6, l.no, "ATOM").map(|f| (l.no, f)))
                    .collect::<Result<Vec<_>, _>>()?;
                // Optional columns present on any row are filled on every row.
                let widest = rows.iter().map(|(_, f)| f.len()).max().unwrap_or(0);
                for (no, f) in &rows {
                    let no = *no;
                    mol.atom_name.push(f[1].to_string());
                    mol.atom_x.push(number(FORMAT, no, f[2], "x coordinate")?);
                    mol.atom_y.push(number(FORMAT, no, f[3], "y coordinate")?);
                    mol.atom_z.push(number(FORMAT, no, f[4], "z coordinate")?);
                    mol.atom_type.push(f[5].to_string());
                    if widest > 6 {
                        let resid = match f.get(6) {
                            Some(resid) => index(resid, no, "substructure id")? as i32,
                            None => mol.atom_resid.last().copied().unwrap_or(0),
                        };
                        mol.atom_resid.push(resid);
                    }
                    if widest > 7 {
                        let resname = match f.get(7) {
                            Some(resname) => resname.to_string(),
                            None => mol.atom_resname.last().cloned().unwrap_or_default(),
                        };
                        mol.atom_resname.push(resname);
                    }
                    if widest > 8 {
                        let q = match f.get(8) {
                            Some(q) => round4(number(FORMAT, no, q, "charge")?),
                            None => 0.0,
                        };
                        mol.atom_q.push(q);
                    }
                    if widest > 9 {
                        let status = f.get(9).map_or_else(String::new, |s| s.to_string());
                        mol.atom_status_bit.push(status);
                    }
                }
                if self.counts_read && mol.atom_count() != mol.no_atoms {
                    return Err(Error::count_mismatch(
                        FORMAT,
                        "ATOM",
                        mol.no_atoms,
                        mol.atom_count(),
                    ));
                }
            }
            "BOND" => {
                let with_status = section
                    .lines
                    .iter()
                    .any(|l| l.text.split_whitespace().nth(4).is_some());
                for l in &section.lines {
                    let f = fields(&l.text, 4, l.no, "BOND")?;
                    mol.bond_from.push(index(f[1], l.no, "origin atom id")?);
                    mol.bond_to.push(index(f[2], l.no, "target atom id")?);
                    mol.bond_type.push(f[3].to_string());
                    if with_status {
                        let status = f.get(4).map_or_else(String::new, |s| s.to_string());
                        mol.bond_status_bit.push(status);
                    }
                }
                if self.counts_read && mol.bond_count() != mol.no_bonds {
                    return Err(Error::count_mismatch(
                        FORMAT,
                        "BOND",
                        mol.no_bonds,
                        mol.bond_count(),
                    ));
                }
            }
            "SUBSTRUCTURE" => {
                for l in &section.lines {
                    let f = fields(&l.text, 3, l.no, "SUBSTRUCTURE")?;
                    mol.residue_name.push(f[1].to_string());
                    mol.residue_start.push(index(f[2], l.no, "root atom id")?);
                    let optional = [
                        &mut mol.residue_type,
                        &mut mol.residue_dict_type,
                        &mut mol.residue_chain,
                        &mut mol.residue_sub_type,
                        &mut mol.residue_inter_bonds,
                        &mut mol.residue_status_bits,
                    ];
                    for (column, value) in optional.into_iter().zip(f.iter().skip(3)) {
                        column.push(value.to_string());
                    }
                    if f.len() > 9 {
                        mol.residue_comment.push(f[9..].join(" "));
                    }
                }
                if self.counts_read && mol.residue_name.len() != mol.no_residues {
                    warn!(
                        "MOL2 header declares {} substructures but {} were read",
                        mol.no_residues,
                        mol.residue_name.len()
                    );
                }
            }
            other => warn!("MOL2 section {other} is not read, skipping {} lines", section.lines.len()),
        }
        Ok(())
    }

    fn finish(&mut self, mol: &mut Molecule) -> Result<(), Error> {
        for comment in self.comments.drain(..) {
            mol.description.push_str(&comment);
            mol.description.push('\n');
        }
        Ok(())
    }
}

impl Mol2Grammar {
    /// MOLECULE lines are positional: their offset from the section marker
    /// decides their meaning, blank lines included.
    fn molecule(&mut self, mol: &mut Molecule, section: &Section) -> Result<(), Error> {
        for l in &section.lines {
            let text = l.text.trim();
            match l.no - section.start {
                1 => mol.title = Some(text.to_string()),
                2 => {
                    let mut counts = [0usize; 5];
                    for (slot, field) in counts.iter_mut().zip(text.split_whitespace()) {
                        *slot = number(FORMAT, l.no, field, "count")?;
                    }
                    let [atoms, bonds, residues, features, sets] = counts;
                    mol.no_atoms = atoms;
                    mol.no_bonds = bonds;
                    mol.no_residues = residues;
                    mol.no_features = features;
                    mol.no_sets = sets;
                    self.counts_read = true;
                }
                3 => mol.mol_type = Some(text.to_string()),
                4 => mol.charge_type = Some(text.to_string()),
                5 => mol.mol2_status_bits = Some(text.to_string()),
                6 => mol.mol2_comment = Some(text.to_string()),
                _ => warn!("MOL2 MOLECULE line {} ignored", l.no),
            }
        }
        Ok(())
    }
}
