//! Normalization steps shared by the per-format build stages.
//!
//! Each step fills derived fields that a reader left empty or inconsistent.
//! Problems that leave the record usable are recorded as [`BuildWarning`]s in
//! a [`BuildReport`]; only residue ordering violations are returned as errors.
//! Running any step twice leaves the record unchanged.

use super::element;
use super::molecule::Molecule;
use crate::io::{Format, error::Error};
use log::warn;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildWarning {
    #[error("{table} has {found} entries, expected {expected}")]
    LengthMismatch {
        table: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Lennard-Jones coefficients are present but the nonbonded parameter index is missing")]
    MissingLjIndex,

    #[error("no atom carries type '{0}', its mass is unknown")]
    UnusedAtomType(String),

    #[error("atom {atom} ('{name}') has no recognizable element")]
    UnknownElement { atom: usize, name: String },

    #[error("bond types missing, assuming {0} single bonds")]
    DefaultBondTypes(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub warnings: Vec<BuildWarning>,
}

impl BuildReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and logs it.
    pub fn push(&mut self, warning: BuildWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub(crate) fn check_len(&mut self, table: &'static str, expected: usize, found: usize) {
        if expected != found {
            self.push(BuildWarning::LengthMismatch {
                table,
                expected,
                found,
            });
        }
    }
}

fn atom_total(mol: &Molecule) -> usize {
    match mol.atom_count() {
        0 => mol.no_atoms,
        n => n,
    }
}

/// Fills per-atom residue ids and names from the residue table when the
/// atoms carry no residue names.
pub fn expand_residues(mol: &mut Molecule) {
    if !mol.atom_resname.is_empty() || mol.residue_start.is_empty() {
        return;
    }
    let n = atom_total(mol);
    let mut resid = Vec::with_capacity(n);
    let mut resname = Vec::with_capacity(n);
    for (r, &start) in mol.residue_start.iter().enumerate() {
        let end = mol.residue_start.get(r + 1).copied().unwrap_or(n);
        let name = mol.residue_name.get(r).cloned().unwrap_or_default();
        for _ in start..end.max(start) {
            resid.push(r as i32);
            resname.push(name.clone());
        }
    }
    mol.atom_resid = resid;
    mol.atom_resname = resname;
}

/// Deduplicates atom types and rebuilds `atom_type_index`.
///
/// An existing `unique_atom_types` table is kept when it is duplicate free and
/// covers every atom type (for example the order fixed by a LAMMPS mass
/// table); otherwise it is rebuilt in first-occurrence order.
pub fn index_atom_types(mol: &mut Molecule) {
    let distinct: BTreeSet<&String> = mol.unique_atom_types.iter().collect();
    let consistent = !mol.unique_atom_types.is_empty()
        && distinct.len() == mol.unique_atom_types.len()
        && mol.atom_type.iter().all(|t| distinct.contains(t));

    if !consistent {
        let mut unique: Vec<String> = Vec::new();
        for t in &mol.atom_type {
            if !unique.contains(t) {
                unique.push(t.clone());
            }
        }
        mol.unique_atom_types = unique;
        mol.unique_atom_mass.clear();
    }

    mol.atom_type_index = mol
        .atom_type
        .iter()
        .filter_map(|t| mol.unique_atom_types.iter().position(|u| u == t))
        .collect();
    mol.no_atom_types = mol.unique_atom_types.len();
}

/// Builds the per-type mass table from the first atom of each type, falling
/// back to element masses when no per-atom masses are known.
pub fn type_masses(mol: &mut Molecule, report: &mut BuildReport) {
    if mol.unique_atom_mass.len() == mol.unique_atom_types.len() {
        return;
    }
    if mol.atom_mass.is_empty() && mol.atom_atomic_no.is_empty() {
        report.check_len("unique_atom_mass", mol.unique_atom_types.len(), 0);
        return;
    }

    let mut masses = Vec::with_capacity(mol.unique_atom_types.len());
    for (k, t) in mol.unique_atom_types.iter().enumerate() {
        let Some(first) = mol.atom_type_index.iter().position(|&i| i == k) else {
            report.push(BuildWarning::UnusedAtomType(t.clone()));
            masses.push(0.0);
            continue;
        };
        let mass = mol.atom_mass.get(first).copied().or_else(|| {
            mol.atom_atomic_no
                .get(first)
                .and_then(|&z| element::atomic_mass(z))
        });
        masses.push(mass.unwrap_or(0.0));
    }
    mol.unique_atom_mass = masses;
}

/// Builds per-type Lennard-Jones parameters from the AMBER per-type tables,
/// going through the `pair_ff_index` of the first atom of each type.
pub fn pair_coefficients(mol: &mut Molecule, report: &mut BuildReport) {
    let ntypes = mol.unique_atom_types.len();
    if mol.ff_lj_epsilon.len() == ntypes && mol.ff_lj_sigma.len() == ntypes {
        return;
    }
    if mol.pair_ff_index.is_empty() || mol.amber.lj_epsilon.is_empty() {
        report.check_len("ff_lj_epsilon", ntypes, mol.ff_lj_epsilon.len());
        return;
    }

    let mut epsilon = Vec::with_capacity(ntypes);
    let mut sigma = Vec::with_capacity(ntypes);
    for k in 0..ntypes {
        let pair = mol
            .atom_type_index
            .iter()
            .position(|&i| i == k)
            .and_then(|first| mol.pair_ff_index.get(first).copied());
        let params = pair.and_then(|p| {
            Some((
                *mol.amber.lj_epsilon.get(p)?,
                *mol.amber.lj_sigma.get(p)?,
            ))
        });
        match params {
            Some((e, s)) => {
                epsilon.push(e);
                sigma.push(s);
            }
            None => break,
        }
    }

    report.check_len("ff_lj_epsilon", ntypes, epsilon.len());
    if epsilon.len() == ntypes {
        mol.ff_lj_epsilon = epsilon;
        mol.ff_lj_sigma = sigma;
    }
}

/// Renumbers residue ids to a contiguous 0-based sequence in encounter order.
///
/// Residue ids must never decrease along the atom list.
pub fn renumber_residues(mol: &mut Molecule, format: Format) -> Result<(), Error> {
    let Some(&first) = mol.atom_resid.first() else {
        return Ok(());
    };
    let mut previous = first;
    let mut id = 0;
    for (atom, resid) in mol.atom_resid.iter_mut().enumerate() {
        if *resid < previous {
            return Err(Error::ResidueOrder {
                format,
                atom,
                previous,
                current: *resid,
            });
        }
        if *resid != previous {
            previous = *resid;
            id += 1;
        }
        *resid = id;
    }
    Ok(())
}

/// Makes residue ids monotonic across numbering resets.
///
/// A drop back to residue 0 starts a new block offset by one past the
/// previous id; offsets accumulate over several resets. Any other decrease is
/// an ordering error.
pub fn rebase_residue_resets(mol: &mut Molecule, format: Format) -> Result<(), Error> {
    let mut offset = 0;
    let mut previous: Option<i32> = None;
    for (atom, resid) in mol.atom_resid.iter_mut().enumerate() {
        let raw = *resid;
        if let Some(old) = previous.filter(|&old| raw < old) {
            if raw != 0 {
                return Err(Error::ResidueOrder {
                    format,
                    atom,
                    previous: old,
                    current: raw,
                });
            }
            offset += old + 1;
        }
        previous = Some(raw);
        *resid = raw + offset;
    }
    Ok(())
}

/// Rebuilds the residue table from per-atom residue ids when its length does
/// not match the number of distinct ids.
pub fn synthesize_residues(mol: &mut Molecule, report: &mut BuildReport) {
    let distinct: BTreeSet<i32> = mol.atom_resid.iter().copied().collect();
    if mol.residue_start.len() == distinct.len() && mol.residue_name.len() == distinct.len() {
        return;
    }

    let mut start = Vec::with_capacity(distinct.len());
    let mut name = Vec::with_capacity(distinct.len());
    let mut current = None;
    for (i, &resid) in mol.atom_resid.iter().enumerate() {
        if current != Some(resid) {
            current = Some(resid);
            start.push(i);
            name.push(mol.atom_resname.get(i).cloned().unwrap_or_default());
        }
    }
    report.check_len("residue_start", distinct.len(), start.len());

    mol.residue_start = start;
    mol.residue_name = name;
    mol.residue_type.clear();
}

/// Fills missing residue types with `residue_type`.
pub fn fill_residue_types(mol: &mut Molecule, residue_type: &str) {
    if mol.residue_type.len() != mol.residue_name.len() {
        mol.residue_type = vec![residue_type.to_string(); mol.residue_name.len()];
    }
}

/// Fills atomic numbers (guessed from atom names) and masses (from atomic
/// numbers) when they are absent.
pub fn fill_elements(mol: &mut Molecule, report: &mut BuildReport) {
    let n = mol.atom_count();
    if mol.atom_atomic_no.len() != n {
        mol.atom_atomic_no = mol
            .atom_name
            .iter()
            .enumerate()
            .map(|(i, name)| {
                element::guess_from_name(name).unwrap_or_else(|| {
                    report.push(BuildWarning::UnknownElement {
                        atom: i,
                        name: name.clone(),
                    });
                    0
                })
            })
            .collect();
    }
    if mol.atom_mass.len() != n && mol.atom_atomic_no.len() == n {
        mol.atom_mass = mol
            .atom_atomic_no
            .iter()
            .map(|&z| element::atomic_mass(z).unwrap_or(0.0))
            .collect();
    }
}
