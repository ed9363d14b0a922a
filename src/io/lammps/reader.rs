use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;

use crate::io::section::{Marker, Section, SectionGrammar, number};
use crate::io::{Format, error::Error};
use crate::model::molecule::Molecule;

static COUNT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(atoms|bonds|angles|dihedrals|impropers)$")
        .expect("count line pattern is valid. This is a library bug.")
});

static TYPE_COUNT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(atom|bond|angle|dihedral|improper)\s+types$")
        .expect("type count pattern is valid. This is a library bug.")
});

static BOX_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+(\S+)\s+([xyz])lo\s+[xyz]hi$")
        .expect("box bounds pattern is valid. This is a library bug.")
});

const SECTIONS: [&str; 7] = [
    "Masses",
    "Atoms",
    "Velocities",
    "Bonds",
    "Angles",
    "Dihedrals",
    "Impropers",
];

const HEADER: &str = "HEADER";

#[derive(Debug, Clone)]
struct AtomRow {
    id: i64,
    mol: i64,
    type_id: usize,
    q: f64,
    xyz: [f64; 3],
    comment: Option<String>,
}

/// Reads the `full` atom style. Atoms and velocities are assembled once the
/// whole file has been seen so their order follows atom ids.
#[derive(Debug, Default)]
pub struct LammpsGrammar {
    atoms: Vec<AtomRow>,
    velocities: Vec<(i64, [f64; 3])>,
    box_lo: [Option<f64>; 3],
}

/// Splits `data # comment` into its data fields and trimmed comment.
fn split_comment(line: &str) -> (Vec<&str>, Option<&str>) {
    match line.split_once('#') {
        Some((data, comment)) => {
            let comment = comment.trim();
            (
                data.split_whitespace().collect(),
                (!comment.is_empty()).then_some(comment),
            )
        }
        None => (line.split_whitespace().collect(), None),
    }
}

fn require(fields: &[&str], n: usize, line: usize, what: &str) -> Result<(), Error> {
    if fields.len() < n {
        return Err(Error::parse(
            Format::Lammps,
            line,
            format!("{what} line needs {n} fields, found {}", fields.len()),
        ));
    }
    Ok(())
}

/// A 1-based id from the file as a 0-based index.
fn index(field: &str, line: usize, what: &str) -> Result<usize, Error> {
    let id: i64 = number(Format::Lammps, line, field, what)?;
    if id < 1 {
        return Err(Error::parse(
            Format::Lammps,
            line,
            format!("{what} {id} is not a 1-based id"),
        ));
    }
    Ok(id as usize - 1)
}

fn real(field: &str, line: usize, what: &str) -> Result<f64, Error> {
    number(Format::Lammps, line, field, what)
}

impl SectionGrammar for LammpsGrammar {
    const FORMAT: Format = Format::Lammps;

    fn classify(
        &mut self,
        _line_no: usize,
        line: &str,
        _next: Option<&str>,
        current: Option<&str>,
    ) -> Result<Option<Marker>, Error> {
        if current.is_none() {
            return Ok(Some(Marker::Open(HEADER.to_string())));
        }
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            return Ok(Some(Marker::Skip));
        }
        let keyword = trimmed.split('#').next().unwrap_or_default().trim();
        if SECTIONS.contains(&keyword) || keyword.ends_with("Coeffs") {
            return Ok(Some(Marker::Header(keyword.to_string())));
        }
        Ok(None)
    }

    fn process(&mut self, mol: &mut Molecule, section: &Section) -> Result<(), Error> {
        match section.name.as_str() {
            HEADER => self.header(mol, section)?,
            "Masses" => {
                for l in &section.lines {
                    let (f, comment) = split_comment(&l.text);
                    require(&f, 2, l.no, "Masses")?;
                    let type_id = index(f[0], l.no, "atom type id")?;
                    mol.unique_atom_mass.push(real(f[1], l.no, "mass")?);
                    mol.unique_atom_types
                        .push(comment.map_or_else(|| (type_id + 1).to_string(), str::to_string));
                }
            }
            "Atoms" => {
                for l in &section.lines {
                    let (f, comment) = split_comment(&l.text);
                    require(&f, 7, l.no, "Atoms")?;
                    self.atoms.push(AtomRow {
                        id: number(Format::Lammps, l.no, f[0], "atom id")?,
                        mol: number(Format::Lammps, l.no, f[1], "molecule id")?,
                        type_id: index(f[2], l.no, "atom type")?,
                        q: real(f[3], l.no, "charge")?,
                        xyz: [
                            real(f[4], l.no, "x coordinate")?,
                            real(f[5], l.no, "y coordinate")?,
                            real(f[6], l.no, "z coordinate")?,
                        ],
                        comment: comment.map(str::to_string),
                    });
                }
            }
            "Velocities" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 4, l.no, "Velocities")?;
                    self.velocities.push((
                        number(Format::Lammps, l.no, f[0], "atom id")?,
                        [
                            real(f[1], l.no, "x velocity")?,
                            real(f[2], l.no, "y velocity")?,
                            real(f[3], l.no, "z velocity")?,
                        ],
                    ));
                }
            }
            "Bonds" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 4, l.no, "Bonds")?;
                    mol.bond_ff_index.push(index(f[1], l.no, "bond type")?);
                    mol.bond_from.push(index(f[2], l.no, "atom id")?);
                    mol.bond_to.push(index(f[3], l.no, "atom id")?);
                }
            }
            "Angles" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 5, l.no, "Angles")?;
                    mol.angle_ff_index.push(index(f[1], l.no, "angle type")?);
                    mol.angle_a.push(index(f[2], l.no, "atom id")?);
                    mol.angle_b.push(index(f[3], l.no, "atom id")?);
                    mol.angle_c.push(index(f[4], l.no, "atom id")?);
                }
            }
            "Dihedrals" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 6, l.no, "Dihedrals")?;
                    mol.dihed_ff_index.push(index(f[1], l.no, "dihedral type")?);
                    mol.dihed_a.push(index(f[2], l.no, "atom id")?);
                    mol.dihed_b.push(index(f[3], l.no, "atom id")?);
                    mol.dihed_c.push(index(f[4], l.no, "atom id")?);
                    mol.dihed_d.push(index(f[5], l.no, "atom id")?);
                }
            }
            "Impropers" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 6, l.no, "Impropers")?;
                    mol.improper_ff_index.push(index(f[1], l.no, "improper type")?);
                    mol.improper_a.push(index(f[2], l.no, "atom id")?);
                    mol.improper_b.push(index(f[3], l.no, "atom id")?);
                    mol.improper_c.push(index(f[4], l.no, "atom id")?);
                    mol.improper_d.push(index(f[5], l.no, "atom id")?);
                }
            }
            "Pair Coeffs" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 3, l.no, "Pair Coeffs")?;
                    mol.ff_lj_epsilon.push(real(f[1], l.no, "epsilon")?);
                    mol.ff_lj_sigma.push(real(f[2], l.no, "sigma")?);
                }
            }
            "Bond Coeffs" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 3, l.no, "Bond Coeffs")?;
                    mol.ff_bond_k.push(real(f[1], l.no, "bond force constant")?);
                    mol.ff_bond_eq.push(real(f[2], l.no, "bond length")?);
                }
            }
            "Angle Coeffs" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 3, l.no, "Angle Coeffs")?;
                    mol.ff_angle_k.push(real(f[1], l.no, "angle force constant")?);
                    mol.ff_angle_eq
                        .push(real(f[2], l.no, "angle")?.to_radians());
                }
            }
            "Dihedral Coeffs" => {
                for l in &section.lines {
                    let (f, _) = split_comment(&l.text);
                    require(&f, 4, l.no, "Dihedral Coeffs")?;
                    let sign: i64 = number(Format::Lammps, l.no, f[2], "dihedral sign")?;
                    mol.ff_dihed_k.push(real(f[1], l.no, "dihedral force constant")?);
                    mol.ff_dihed_phase.push(if sign == -1 { PI } else { 0.0 });
                    mol.ff_dihed_periodicity
                        .push(real(f[3], l.no, "dihedral periodicity")?);
                }
            }
            other => warn!("LAMMPS section '{other}' is not read, skipping {} lines", section.lines.len()),
        }
        Ok(())
    }

    fn finish(&mut self, mol: &mut Molecule) -> Result<(), Error> {
        self.atoms.sort_by_key(|a| a.id);
        let position: HashMap<i64, usize> = self
            .atoms
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id, i))
            .collect();

        for atom in &self.atoms {
            let type_name = atom.comment.clone().unwrap_or_else(|| {
                mol.unique_atom_types
                    .get(atom.type_id)
                    .cloned()
                    .unwrap_or_else(|| (atom.type_id + 1).to_string())
            });
            mol.atom_name.push(type_name.clone());
            mol.atom_type.push(type_name);
            mol.atom_type_index.push(atom.type_id);
            mol.atom_resid.push((atom.mol - 1) as i32);
            mol.atom_resname.push(atom.mol.to_string());
            mol.atom_q.push(atom.q);
            mol.atom_x.push(atom.xyz[0]);
            mol.atom_y.push(atom.xyz[1]);
            mol.atom_z.push(atom.xyz[2]);
        }

        if !self.velocities.is_empty() {
            let n = self.atoms.len();
            let (mut vx, mut vy, mut vz) = (vec![0.0; n], vec![0.0; n], vec![0.0; n]);
            for (id, v) in &self.velocities {
                match position.get(id) {
                    Some(&i) => {
                        vx[i] = v[0];
                        vy[i] = v[1];
                        vz[i] = v[2];
                    }
                    None => warn!("LAMMPS velocity for unknown atom id {id} ignored"),
                }
            }
            mol.atom_vx = vx;
            mol.atom_vy = vy;
            mol.atom_vz = vz;
        }

        if let [Some(x), Some(y), Some(z)] = self.box_lo {
            mol.box_lo = Some([x, y, z]);
        }
        Ok(())
    }
}

impl LammpsGrammar {
    fn header(&mut self, mol: &mut Molecule, section: &Section) -> Result<(), Error> {
        // A blank title line is skipped by the reader, so the first line is
        // only the title when it is not a header keyword.
        for (k, l) in section.lines.iter().enumerate() {
            let text = l.text.split('#').next().unwrap_or_default().trim();
            if let Some(c) = COUNT_LINE.captures(text) {
                let n: usize = number(Format::Lammps, l.no, &c[1], "count")?;
                match &c[2] {
                    "atoms" => mol.no_atoms = n,
                    "bonds" => mol.no_bonds = n,
                    "angles" => mol.no_angles = n,
                    "dihedrals" => mol.no_diheds = n,
                    _ => mol.no_improper = n,
                }
            } else if let Some(c) = TYPE_COUNT_LINE.captures(text) {
                let n: usize = number(Format::Lammps, l.no, &c[1], "type count")?;
                match &c[2] {
                    "atom" => mol.no_atom_types = n,
                    "bond" => mol.no_bond_types = n,
                    "angle" => mol.no_angle_types = n,
                    "dihedral" => mol.no_dihed_types = n,
                    _ => mol.no_improper_types = n,
                }
            } else if let Some(c) = BOX_LINE.captures(text) {
                let lo = real(&c[1], l.no, "box lower bound")?;
                let hi = real(&c[2], l.no, "box upper bound")?;
                let axis = match &c[3] {
                    "x" => 0,
                    "y" => 1,
                    _ => 2,
                };
                self.box_lo[axis] = Some(lo);
                match axis {
                    0 => mol.box_x = hi - lo,
                    1 => mol.box_y = hi - lo,
                    _ => mol.box_z = hi - lo,
                }
            } else if k == 0 {
                let title = l.text.trim();
                mol.title = (!title.is_empty()).then(|| title.to_string());
            } else {
                debug!("LAMMPS header line {} ignored: {text}", l.no);
            }
        }
        Ok(())
    }
}
