use std::collections::HashMap;
use std::io::Write;

use crate::config::Mol2Config;
use crate::io::{Format, error::Error};
use crate::model::molecule::Molecule;

const FORMAT: Format = Format::Mol2;

/// One written BOND record: an unordered atom pair, the label of its first
/// occurrence and how many times the pair was listed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CollapsedBond<'a> {
    pub from: usize,
    pub to: usize,
    pub label: &'a str,
    pub status: Option<&'a str>,
    pub count: usize,
}

impl CollapsedBond<'_> {
    /// A pair listed k > 1 times is a bond of order k. Single entries keep
    /// their label, with the numeric aromatic order spelled `ar`.
    pub fn bond_type(&self) -> String {
        match (self.count, self.label) {
            (k, _) if k > 1 => k.to_string(),
            (_, "1.5") => "ar".to_string(),
            (_, label) => label.to_string(),
        }
    }
}

/// Merges parallel connectivity entries, keeping first-occurrence order.
pub(crate) fn collapse_bonds(mol: &Molecule) -> Vec<CollapsedBond<'_>> {
    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
    let mut bonds: Vec<CollapsedBond<'_>> = Vec::new();
    for (i, (&from, &to)) in mol.bond_from.iter().zip(&mol.bond_to).enumerate() {
        let key = (from.min(to), from.max(to));
        match seen.get(&key) {
            Some(&k) => bonds[k].count += 1,
            None => {
                seen.insert(key, bonds.len());
                bonds.push(CollapsedBond {
                    from,
                    to,
                    label: mol.bond_type.get(i).map_or("1", String::as_str),
                    status: mol.bond_status_bit.get(i).map(String::as_str),
                    count: 1,
                });
            }
        }
    }
    bonds
}

fn require_complete(mol: &Molecule) -> Result<(), Error> {
    let n = mol.atom_count();
    Error::require_len(FORMAT, "atom_name", n, mol.atom_name.len())?;
    Error::require_len(FORMAT, "atom_y", n, mol.atom_y.len())?;
    Error::require_len(FORMAT, "atom_z", n, mol.atom_z.len())?;
    Error::require_len(FORMAT, "atom_type", n, mol.atom_type.len())?;
    Error::require_len(FORMAT, "atom_resid", n, mol.atom_resid.len())?;
    if !mol.atom_q.is_empty() {
        Error::require_len(FORMAT, "atom_q", n, mol.atom_q.len())?;
    }
    Error::require_len(FORMAT, "bond_to", mol.bond_count(), mol.bond_to.len())?;
    Error::require_len(FORMAT, "bond_type", mol.bond_count(), mol.bond_type.len())?;
    Error::require_len(
        FORMAT,
        "residue_start",
        mol.residue_name.len(),
        mol.residue_start.len(),
    )?;

    let residues = mol.atom_resid.iter().max().map_or(0, |&r| r.max(0) as usize + 1);
    if mol.atom_resid.iter().any(|&r| r < 0) || mol.residue_name.len() < residues {
        return Err(Error::IncompleteRecord {
            format: FORMAT,
            field: "residue_name",
            expected: residues,
            found: mol.residue_name.len(),
        });
    }
    Ok(())
}

/// Writes MOLECULE, ATOM, BOND and SUBSTRUCTURE sections.
///
/// Residue names of atoms come from the residue table. Parallel bond entries
/// between the same two atoms are written as one record, so the bond count in
/// the header can be lower than the record's.
pub fn write(writer: &mut dyn Write, mol: &Molecule, config: &Mol2Config) -> Result<(), Error> {
    require_complete(mol)?;
    let bonds = collapse_bonds(mol);

    writeln!(writer, "@<TRIPOS>MOLECULE")?;
    writeln!(writer, "{}", mol.title.as_deref().unwrap_or_default())?;
    writeln!(
        writer,
        "{:>5} {:>5} {:>5} {} {}",
        mol.atom_count(),
        bonds.len(),
        mol.residue_name.len(),
        mol.no_features,
        mol.no_sets
    )?;
    writeln!(
        writer,
        "{}",
        mol.mol_type.as_deref().unwrap_or(config.mol_type.as_str())
    )?;
    writeln!(
        writer,
        "{}",
        mol.charge_type.as_deref().unwrap_or(config.charge_type.as_str())
    )?;
    if mol.mol2_status_bits.is_some() || mol.mol2_comment.is_some() {
        writeln!(writer, "{}", mol.mol2_status_bits.as_deref().unwrap_or_default())?;
    }
    if let Some(comment) = &mol.mol2_comment {
        writeln!(writer, "{comment}")?;
    }
    writeln!(writer)?;

    writeln!(writer, "@<TRIPOS>ATOM")?;
    for i in 0..mol.atom_count() {
        let resid = mol.atom_resid[i];
        write!(
            writer,
            "{:>7} {:<5}  {:>8.4}  {:>8.4}  {:>8.4}   {:>3} {:>3} {:<5}   {:>11.4}",
            i + 1,
            mol.atom_name[i],
            mol.atom_x[i],
            mol.atom_y[i],
            mol.atom_z[i],
            mol.atom_type[i],
            resid + 1,
            mol.residue_name[resid as usize],
            mol.atom_q.get(i).copied().unwrap_or(0.0)
        )?;
        match mol.atom_status_bit.get(i) {
            Some(status) if mol.atom_status_bit.len() == mol.atom_count() && !status.is_empty() => {
                writeln!(writer, " {status}")?
            }
            _ => writeln!(writer)?,
        }
    }

    writeln!(writer, "@<TRIPOS>BOND")?;
    for (i, bond) in bonds.iter().enumerate() {
        write!(
            writer,
            "{:>7}  {:>7}  {:>7}   {:>3} ",
            i + 1,
            bond.from + 1,
            bond.to + 1,
            bond.bond_type()
        )?;
        match bond.status {
            Some(status) => writeln!(writer, "{status}")?,
            None => writeln!(writer)?,
        }
    }

    writeln!(writer, "@<TRIPOS>SUBSTRUCTURE")?;
    for (r, name) in mol.residue_name.iter().enumerate() {
        let residue_type = mol
            .residue_type
            .get(r)
            .map_or(config.residue_type.as_str(), String::as_str);
        write!(
            writer,
            "{:>7}  {name:>7}  {:>7}   {residue_type:>7}",
            r + 1,
            mol.residue_start[r] + 1
        )?;
        for extra in [
            &mol.residue_dict_type,
            &mol.residue_chain,
            &mol.residue_sub_type,
            &mol.residue_inter_bonds,
            &mol.residue_status_bits,
            &mol.residue_comment,
        ] {
            match extra.get(r) {
                Some(value) if !value.is_empty() => write!(writer, " {value}")?,
                _ => break,
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bonded(pairs: &[(usize, usize, &str)]) -> Molecule {
        let mut mol = Molecule::new();
        for &(a, b, t) in pairs {
            mol.bond_from.push(a);
            mol.bond_to.push(b);
            mol.bond_type.push(t.to_string());
        }
        mol
    }

    #[test]
    fn parallel_entries_collapse_in_either_direction() {
        let mol = bonded(&[(0, 1, "1"), (1, 2, "1"), (1, 0, "1"), (0, 1, "1")]);
        let bonds = collapse_bonds(&mol);
        assert_eq!(bonds.len(), 2);
        assert_eq!((bonds[0].from, bonds[0].to, bonds[0].count), (0, 1, 3));
        assert_eq!(bonds[0].bond_type(), "3");
        assert_eq!(bonds[1].bond_type(), "1");
    }

    #[test]
    fn aromatic_order_is_spelled_ar() {
        let mol = bonded(&[(0, 1, "1.5"), (1, 2, "am"), (2, 3, "ar")]);
        let types: Vec<String> = collapse_bonds(&mol).iter().map(|b| b.bond_type()).collect();
        assert_eq!(types, vec!["ar", "am", "ar"]);
    }
}
