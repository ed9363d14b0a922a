use crate::config::LammpsConfig;
use crate::io::{Format, error::Error};
use crate::model::molecule::Molecule;
use std::io::Write;

const FORMAT: Format = Format::Lammps;

/// Number of parameter types for one interaction kind: the coefficient table
/// length when present, otherwise the largest of the declared count and the
/// highest index in use.
fn type_count(table: &[f64], declared: usize, indices: &[usize]) -> usize {
    if !table.is_empty() {
        return table.len();
    }
    indices
        .iter()
        .max()
        .map_or(declared, |&m| declared.max(m + 1))
}

/// Lower and upper bound of one box axis.
fn bounds(length: f64, lo: Option<f64>, coords: &[f64], padding: f64) -> (f64, f64) {
    if length != 0.0 {
        let lo = lo.unwrap_or(0.0);
        return (lo, lo + length);
    }
    let min = coords.iter().copied().fold(f64::INFINITY, f64::min);
    let max = coords.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() && max.is_finite() {
        (min - padding, max + padding)
    } else {
        (-padding, padding)
    }
}

/// The `d` column of a harmonic dihedral: -1 for a phase of π, +1 otherwise.
/// A cosine that is zero up to rounding counts as positive.
fn dihedral_sign(phase: f64) -> i32 {
    if phase.cos() < -1e-9 { -1 } else { 1 }
}

fn require_complete(mol: &Molecule) -> Result<(), Error> {
    let n = mol.atom_count();
    Error::require_len(FORMAT, "atom_y", n, mol.atom_y.len())?;
    Error::require_len(FORMAT, "atom_z", n, mol.atom_z.len())?;
    Error::require_len(FORMAT, "atom_q", n, mol.atom_q.len())?;
    Error::require_len(FORMAT, "atom_type", n, mol.atom_type.len())?;
    Error::require_len(FORMAT, "atom_type_index", n, mol.atom_type_index.len())?;
    Error::require_len(FORMAT, "atom_resid", n, mol.atom_resid.len())?;

    let ntypes = mol.unique_atom_types.len();
    Error::require_len(FORMAT, "unique_atom_mass", ntypes, mol.unique_atom_mass.len())?;
    if !mol.ff_lj_epsilon.is_empty() {
        Error::require_len(FORMAT, "ff_lj_epsilon", ntypes, mol.ff_lj_epsilon.len())?;
        Error::require_len(FORMAT, "ff_lj_sigma", ntypes, mol.ff_lj_sigma.len())?;
    }

    let bonds = mol.bond_count();
    Error::require_len(FORMAT, "bond_to", bonds, mol.bond_to.len())?;
    Error::require_len(FORMAT, "bond_ff_index", bonds, mol.bond_ff_index.len())?;
    Error::require_len(FORMAT, "ff_bond_eq", mol.ff_bond_k.len(), mol.ff_bond_eq.len())?;

    let angles = mol.angle_a.len();
    Error::require_len(FORMAT, "angle_b", angles, mol.angle_b.len())?;
    Error::require_len(FORMAT, "angle_c", angles, mol.angle_c.len())?;
    Error::require_len(FORMAT, "angle_ff_index", angles, mol.angle_ff_index.len())?;
    Error::require_len(FORMAT, "ff_angle_eq", mol.ff_angle_k.len(), mol.ff_angle_eq.len())?;

    let diheds = mol.dihed_a.len();
    Error::require_len(FORMAT, "dihed_b", diheds, mol.dihed_b.len())?;
    Error::require_len(FORMAT, "dihed_c", diheds, mol.dihed_c.len())?;
    Error::require_len(FORMAT, "dihed_d", diheds, mol.dihed_d.len())?;
    Error::require_len(FORMAT, "dihed_ff_index", diheds, mol.dihed_ff_index.len())?;
    let dihed_types = mol.ff_dihed_k.len();
    Error::require_len(FORMAT, "ff_dihed_phase", dihed_types, mol.ff_dihed_phase.len())?;
    Error::require_len(
        FORMAT,
        "ff_dihed_periodicity",
        dihed_types,
        mol.ff_dihed_periodicity.len(),
    )?;
    Ok(())
}

/// Writes `mol` as a LAMMPS data file in the `full` atom style.
///
/// Impropers are not written. Box axes without a length get the atom extent
/// padded by `config.box_padding` on both sides.
pub fn write(writer: &mut dyn Write, mol: &Molecule, config: &LammpsConfig) -> Result<(), Error> {
    require_complete(mol)?;

    let n_bond_types = type_count(&mol.ff_bond_k, mol.no_bond_types, &mol.bond_ff_index);
    let n_angle_types = type_count(&mol.ff_angle_k, mol.no_angle_types, &mol.angle_ff_index);
    let n_dihed_types = type_count(&mol.ff_dihed_k, mol.no_dihed_types, &mol.dihed_ff_index);

    writeln!(writer, "{}", mol.title.as_deref().unwrap_or_default())?;
    writeln!(writer)?;
    writeln!(writer, "{} atoms", mol.atom_count())?;
    writeln!(writer, "{} bonds", mol.bond_count())?;
    writeln!(writer, "{} angles", mol.angle_a.len())?;
    writeln!(writer, "{} dihedrals", mol.dihed_a.len())?;
    writeln!(writer, "0 impropers")?;
    writeln!(writer)?;
    writeln!(writer, "{} atom types", mol.unique_atom_types.len())?;
    writeln!(writer, "{n_bond_types} bond types")?;
    writeln!(writer, "{n_angle_types} angle types")?;
    writeln!(writer, "{n_dihed_types} dihedral types")?;
    writeln!(writer)?;

    let lo = |axis: usize| mol.box_lo.map(|b| b[axis]);
    let axes = [
        ("x", mol.box_x, &mol.atom_x),
        ("y", mol.box_y, &mol.atom_y),
        ("z", mol.box_z, &mol.atom_z),
    ];
    for (axis, (name, length, coords)) in axes.into_iter().enumerate() {
        let (lo, hi) = bounds(length, lo(axis), coords, config.box_padding);
        writeln!(writer, "{lo:8.4} {hi:8.4} {name}lo {name}hi")?;
    }

    writeln!(writer)?;
    writeln!(writer, "Masses")?;
    writeln!(writer)?;
    for (i, (t, m)) in mol
        .unique_atom_types
        .iter()
        .zip(&mol.unique_atom_mass)
        .enumerate()
    {
        writeln!(writer, "{:>3}  {m:>6.3}   # {t}", i + 1)?;
    }

    if !mol.ff_lj_epsilon.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Pair Coeffs")?;
        writeln!(writer)?;
        for (i, t) in mol.unique_atom_types.iter().enumerate() {
            writeln!(
                writer,
                "{:>3}  {:>10.4}   {:>10.4}   # {t}",
                i + 1,
                mol.ff_lj_epsilon[i],
                mol.ff_lj_sigma[i]
            )?;
        }
    }

    if !mol.ff_bond_k.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Bond Coeffs")?;
        writeln!(writer)?;
        for (i, (k, r0)) in mol.ff_bond_k.iter().zip(&mol.ff_bond_eq).enumerate() {
            writeln!(writer, "{:>3}  {k:>6.3}   {r0:>6.3}", i + 1)?;
        }
    }

    if !mol.ff_angle_k.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Angle Coeffs")?;
        writeln!(writer)?;
        for (i, (k, theta)) in mol.ff_angle_k.iter().zip(&mol.ff_angle_eq).enumerate() {
            writeln!(writer, "{:>3}  {k:>6.3}  {:>6.3}", i + 1, theta.to_degrees())?;
        }
    }

    if !mol.ff_dihed_k.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Dihedral Coeffs")?;
        writeln!(writer)?;
        for i in 0..mol.ff_dihed_k.len() {
            let d = dihedral_sign(mol.ff_dihed_phase[i]);
            let n = mol.ff_dihed_periodicity[i].round() as i64;
            writeln!(writer, "{:>3}  {:>6.3}  {d:>2}  {n}", i + 1, mol.ff_dihed_k[i])?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "Atoms # full")?;
    writeln!(writer)?;
    for i in 0..mol.atom_count() {
        writeln!(
            writer,
            "{:>7} {:>4} {:>3} {:>10.6}  {:>8.4}  {:>8.4}  {:>8.4}   # {}",
            i + 1,
            mol.atom_resid[i] + 1,
            mol.atom_type_index[i] + 1,
            mol.atom_q[i],
            mol.atom_x[i],
            mol.atom_y[i],
            mol.atom_z[i],
            mol.atom_type[i]
        )?;
    }

    if mol.bond_count() > 0 {
        writeln!(writer)?;
        writeln!(writer, "Bonds")?;
        writeln!(writer)?;
        for i in 0..mol.bond_count() {
            writeln!(
                writer,
                "{:>7}  {:>5}  {:>7}  {:>7} ",
                i + 1,
                mol.bond_ff_index[i] + 1,
                mol.bond_from[i] + 1,
                mol.bond_to[i] + 1
            )?;
        }
    }

    if !mol.angle_a.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Angles")?;
        writeln!(writer)?;
        for i in 0..mol.angle_a.len() {
            writeln!(
                writer,
                "{:>7}  {:>3}  {:>5}  {:>5}  {:>5} ",
                i + 1,
                mol.angle_ff_index[i] + 1,
                mol.angle_a[i] + 1,
                mol.angle_b[i] + 1,
                mol.angle_c[i] + 1
            )?;
        }
    }

    if !mol.dihed_a.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Dihedrals")?;
        writeln!(writer)?;
        for i in 0..mol.dihed_a.len() {
            writeln!(
                writer,
                "{:>7}  {:>3}  {:>5}  {:>5}  {:>5}  {:>5} ",
                i + 1,
                mol.dihed_ff_index[i] + 1,
                mol.dihed_a[i] + 1,
                mol.dihed_b[i] + 1,
                mol.dihed_c[i] + 1,
                mol.dihed_d[i] + 1
            )?;
        }
    }
    Ok(())
}
