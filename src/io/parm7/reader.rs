use super::POINTER_NAMES;
use crate::io::section::{self, ColumnFormat, Marker, Section, SectionGrammar, split_fixed};
use crate::io::{Format, error::Error};
use crate::model::molecule::Molecule;
use log::{debug, warn};

/// AMBER charges are stored premultiplied by this factor.
pub const CHARGE_SCALE: f64 = 18.2223;

#[derive(Debug, Default)]
pub struct Parm7Grammar;

impl SectionGrammar for Parm7Grammar {
    const FORMAT: Format = Format::Parm7;

    fn classify(
        &mut self,
        line_no: usize,
        line: &str,
        _next: Option<&str>,
        _current: Option<&str>,
    ) -> Result<Option<Marker>, Error> {
        if line.starts_with("%VERSION") {
            return Ok(Some(Marker::Open("VERSION".to_string())));
        }
        if line.starts_with("%FLAG") {
            let name = line
                .split_whitespace()
                .nth(1)
                .ok_or_else(|| Error::parse(Self::FORMAT, line_no, "%FLAG line without a name"))?;
            return Ok(Some(Marker::Header(name.to_string())));
        }
        if line.starts_with("%FORMAT") {
            let descriptor = line
                .split_once('(')
                .map(|(_, rest)| rest.trim_end().trim_end_matches(')'))
                .ok_or_else(|| Error::parse(Self::FORMAT, line_no, "%FORMAT line without a descriptor"))?;
            let format = ColumnFormat::parse(descriptor).ok_or_else(|| {
                Error::parse(
                    Self::FORMAT,
                    line_no,
                    format!("unsupported column format '{descriptor}'"),
                )
            })?;
            return Ok(Some(Marker::Format(format)));
        }
        if line.starts_with("%COMMENT") {
            return Ok(Some(Marker::Skip));
        }
        Ok(None)
    }

    fn process(&mut self, mol: &mut Molecule, section: &Section) -> Result<(), Error> {
        let items = section.fields();
        match section.name.as_str() {
            "VERSION" => {
                let version = section
                    .lines
                    .first()
                    .map(|l| l.text.trim_start_matches("%VERSION").trim().to_string())
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| Error::parse(Self::FORMAT, section.start, "empty %VERSION line"))?;
                mol.amber.version = Some(version);
            }
            "TITLE" => {
                mol.title = section
                    .lines
                    .first()
                    .map(|l| l.text.trim().to_string())
                    .filter(|t| !t.is_empty());
            }
            "POINTERS" => read_pointers(mol, &items)?,
            "ATOM_NAME" => {
                let names: Vec<String> = if items.len() == mol.no_atoms {
                    items.iter().map(|(_, v)| v.to_string()).collect()
                } else {
                    debug!(
                        "ATOM_NAME has {} whitespace fields for {} atoms, re-splitting at width 4",
                        items.len(),
                        mol.no_atoms
                    );
                    section
                        .lines
                        .iter()
                        .flat_map(|l| split_fixed(&l.text, 4))
                        .map(str::to_string)
                        .collect()
                };
                per_atom(mol, section, names.len())?;
                mol.atom_name = names;
            }
            "CHARGE" => {
                per_atom(mol, section, items.len())?;
                mol.atom_q = reals(&items, "charge")?
                    .into_iter()
                    .map(|q| q / CHARGE_SCALE)
                    .collect();
            }
            "ATOMIC_NUMBER" => {
                per_atom(mol, section, items.len())?;
                mol.atom_atomic_no = ints(&items, "atomic number")?
                    .into_iter()
                    .map(|z| z as i32)
                    .collect();
            }
            "MASS" => {
                per_atom(mol, section, items.len())?;
                mol.atom_mass = reals(&items, "mass")?;
            }
            "ATOM_TYPE_INDEX" => {
                per_atom(mol, section, items.len())?;
                mol.pair_ff_index = one_based(&items, "atom type index")?;
            }
            "NUMBER_EXCLUDED_ATOMS" => {
                per_atom(mol, section, items.len())?;
                mol.atom_no_excluded = ints(&items, "excluded atom count")?;
            }
            "NONBONDED_PARM_INDEX" => {
                let ntypes = mol.amber.ntypes();
                if items.len() != ntypes * ntypes {
                    return Err(Error::count_mismatch(
                        Self::FORMAT,
                        &section.name,
                        ntypes * ntypes,
                        items.len(),
                    ));
                }
                mol.amber.lj_index = ints(&items, "nonbonded parameter index")?;
            }
            "RESIDUE_LABEL" => {
                per_residue(mol, section, items.len())?;
                mol.residue_name = items.iter().map(|(_, v)| v.to_string()).collect();
            }
            "RESIDUE_POINTER" => {
                per_residue(mol, section, items.len())?;
                mol.residue_start = one_based(&items, "residue pointer")?;
            }
            "BONDS_INC_HYDROGEN" | "BONDS_WITHOUT_HYDROGEN" => {
                for t in tuples(section, &items, 3)? {
                    mol.bond_from.push(coordinate_index(t[0])?);
                    mol.bond_to.push(coordinate_index(t[1])?);
                    mol.bond_ff_index.push(one_based(&t[2..], "bond type")?[0]);
                }
            }
            "ANGLES_INC_HYDROGEN" | "ANGLES_WITHOUT_HYDROGEN" => {
                for t in tuples(section, &items, 4)? {
                    mol.angle_a.push(coordinate_index(t[0])?);
                    mol.angle_b.push(coordinate_index(t[1])?);
                    mol.angle_c.push(coordinate_index(t[2])?);
                    mol.angle_ff_index.push(one_based(&t[3..], "angle type")?[0]);
                }
            }
            "DIHEDRALS_INC_HYDROGEN" | "DIHEDRALS_WITHOUT_HYDROGEN" => {
                for t in tuples(section, &items, 5)? {
                    mol.dihed_a.push(coordinate_index(t[0])?);
                    mol.dihed_b.push(coordinate_index(t[1])?);
                    mol.dihed_c.push(coordinate_index(t[2])?);
                    mol.dihed_d.push(coordinate_index(t[3])?);
                    mol.dihed_ff_index.push(one_based(&t[4..], "dihedral type")?[0]);
                }
            }
            "AMBER_ATOM_TYPE" => {
                per_atom(mol, section, items.len())?;
                mol.atom_type = items.iter().map(|(_, v)| v.to_string()).collect();
            }
            "BOND_FORCE_CONSTANT" => mol.ff_bond_k = reals(&items, "bond force constant")?,
            "BOND_EQUIL_VALUE" => mol.ff_bond_eq = reals(&items, "bond length")?,
            "ANGLE_FORCE_CONSTANT" => mol.ff_angle_k = reals(&items, "angle force constant")?,
            "ANGLE_EQUIL_VALUE" => mol.ff_angle_eq = reals(&items, "angle")?,
            "DIHEDRAL_FORCE_CONSTANT" => {
                mol.ff_dihed_k = reals(&items, "dihedral force constant")?
            }
            "DIHEDRAL_PERIODICITY" => {
                mol.ff_dihed_periodicity = reals(&items, "dihedral periodicity")?
            }
            "DIHEDRAL_PHASE" => mol.ff_dihed_phase = reals(&items, "dihedral phase")?,
            "LENNARD_JONES_ACOEF" => mol.amber.lj_acoeff = reals(&items, "LJ A coefficient")?,
            "LENNARD_JONES_BCOEF" => mol.amber.lj_bcoeff = reals(&items, "LJ B coefficient")?,
            other => debug!("PARM7 section {other} ignored"),
        }
        Ok(())
    }
}

fn read_pointers(mol: &mut Molecule, items: &[(usize, &str)]) -> Result<(), Error> {
    if items.len() > POINTER_NAMES.len() {
        warn!(
            "PARM7 POINTERS has {} values, ignoring {} unknown trailing pointers",
            items.len(),
            items.len() - POINTER_NAMES.len()
        );
    }
    for (name, value) in POINTER_NAMES.iter().zip(ints(items, "pointer")?) {
        mol.amber.pointers.insert(name.to_string(), value);
    }

    let p = |name: &str| mol.amber.pointer(name).max(0) as usize;
    let (natom, nbonds, nangles, ndiheds, nres, natyp) = (
        p("NATOM"),
        p("NBONA") + p("NBONH"),
        p("NTHETH") + p("MTHETA"),
        p("NPHIH") + p("MPHIA"),
        p("NRES"),
        p("NATYP"),
    );
    mol.no_atoms = natom;
    mol.no_bonds = nbonds;
    mol.no_angles = nangles;
    mol.no_diheds = ndiheds;
    mol.no_residues = nres;
    mol.no_atom_types = natyp;
    Ok(())
}

fn per_atom(mol: &Molecule, section: &Section, found: usize) -> Result<(), Error> {
    if found != mol.no_atoms {
        return Err(Error::count_mismatch(
            Format::Parm7,
            &section.name,
            mol.no_atoms,
            found,
        ));
    }
    Ok(())
}

fn per_residue(mol: &Molecule, section: &Section, found: usize) -> Result<(), Error> {
    if found != mol.no_residues {
        return Err(Error::count_mismatch(
            Format::Parm7,
            &section.name,
            mol.no_residues,
            found,
        ));
    }
    Ok(())
}

fn tuples<'s, 'a>(
    section: &Section,
    items: &'s [(usize, &'a str)],
    size: usize,
) -> Result<std::slice::ChunksExact<'s, (usize, &'a str)>, Error> {
    if items.len() % size != 0 {
        return Err(Error::parse(
            Format::Parm7,
            section.line_no(),
            format!(
                "{} has {} values, not a multiple of {size}",
                section.name,
                items.len()
            ),
        ));
    }
    Ok(items.chunks_exact(size))
}

fn ints(items: &[(usize, &str)], what: &str) -> Result<Vec<i64>, Error> {
    items
        .iter()
        .map(|&(line, v)| section::number(Format::Parm7, line, v, what))
        .collect()
}

fn reals(items: &[(usize, &str)], what: &str) -> Result<Vec<f64>, Error> {
    items
        .iter()
        .map(|&(line, v)| section::number(Format::Parm7, line, v, what))
        .collect()
}

/// 1-based file indices to 0-based record indices.
fn one_based(items: &[(usize, &str)], what: &str) -> Result<Vec<usize>, Error> {
    items
        .iter()
        .map(|&(line, v)| {
            let i: i64 = section::number(Format::Parm7, line, v, what)?;
            if i < 1 {
                return Err(Error::parse(
                    Format::Parm7,
                    line,
                    format!("{what} {i} is not a 1-based index"),
                ));
            }
            Ok(i as usize - 1)
        })
        .collect()
}

/// Topology sections store atoms as coordinate-array offsets (3 * index),
/// negated to flag special 1-4 handling.
fn coordinate_index((line, v): (usize, &str)) -> Result<usize, Error> {
    let raw: i64 = section::number(Format::Parm7, line, v, "atom reference")?;
    Ok((raw.unsigned_abs() / 3) as usize)
}
