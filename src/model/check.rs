//! Structural consistency checks over a [`Molecule`].
//!
//! Every check logs each failure it finds at `error` level and returns a
//! boolean; none of them stop at the first problem, so a single call reports
//! every inconsistency in the record.

use super::molecule::Molecule;
use log::error;

fn len_ok(field: &str, len: usize, expected: usize) -> bool {
    if len == expected {
        true
    } else {
        error!("{field} has {len} entries, expected {expected}");
        false
    }
}

pub fn atoms_ok(mol: &Molecule) -> bool {
    let mut ok = true;
    if mol.no_atoms == 0 {
        error!("record has no atoms");
        ok = false;
    }
    if !mol.atom_q.is_empty() {
        ok &= len_ok("atom_q", mol.atom_q.len(), mol.no_atoms);
    }
    ok &= len_ok("atom_name", mol.atom_name.len(), mol.no_atoms);
    ok &= len_ok("atom_x", mol.atom_x.len(), mol.no_atoms);
    ok &= len_ok("atom_y", mol.atom_y.len(), mol.no_atoms);
    ok &= len_ok("atom_z", mol.atom_z.len(), mol.no_atoms);
    ok &= len_ok("atom_type", mol.atom_type.len(), mol.no_atoms);
    ok
}

pub fn bonds_ok(mol: &Molecule) -> bool {
    let mut ok = len_ok("bond_from", mol.bond_from.len(), mol.no_bonds);
    ok &= len_ok("bond_to", mol.bond_to.len(), mol.no_bonds);
    ok
}

pub fn residues_ok(mol: &Molecule) -> bool {
    let mut ok = len_ok("residue_name", mol.residue_name.len(), mol.no_residues);
    ok &= len_ok("residue_start", mol.residue_start.len(), mol.no_residues);
    ok
}

/// Runs the atom, bond and residue checks. All three always run.
pub fn check(mol: &Molecule) -> bool {
    let atoms = atoms_ok(mol);
    let bonds = bonds_ok(mol);
    let residues = residues_ok(mol);
    atoms && bonds && residues
}

fn bounded(field: &str, values: &[usize], limit: usize) -> bool {
    match values.iter().position(|&v| v >= limit) {
        Some(i) => {
            error!("{field}[{i}] = {} is out of range (limit {limit})", values[i]);
            false
        }
        None => true,
    }
}

/// Checks topology references against the atom count, residue starts for
/// strict monotonicity, type indices against the type table and force-field
/// indices against their parameter tables.
///
/// Force-field index arrays are only checked when the matching table is
/// populated.
pub fn indices_ok(mol: &Molecule) -> bool {
    let n = mol.atom_count();
    let mut ok = true;

    for (field, values) in [
        ("bond_from", &mol.bond_from),
        ("bond_to", &mol.bond_to),
        ("angle_a", &mol.angle_a),
        ("angle_b", &mol.angle_b),
        ("angle_c", &mol.angle_c),
        ("dihed_a", &mol.dihed_a),
        ("dihed_b", &mol.dihed_b),
        ("dihed_c", &mol.dihed_c),
        ("dihed_d", &mol.dihed_d),
        ("improper_a", &mol.improper_a),
        ("improper_b", &mol.improper_b),
        ("improper_c", &mol.improper_c),
        ("improper_d", &mol.improper_d),
        ("residue_start", &mol.residue_start),
    ] {
        ok &= bounded(field, values, n);
    }

    if let Some(i) = mol.residue_start.windows(2).position(|w| w[0] >= w[1]) {
        error!(
            "residue_start is not strictly increasing at residue {}",
            i + 1
        );
        ok = false;
    }

    ok &= bounded(
        "atom_type_index",
        &mol.atom_type_index,
        mol.unique_atom_types.len(),
    );
    for (i, (t, &k)) in mol.atom_type.iter().zip(&mol.atom_type_index).enumerate() {
        if mol.unique_atom_types.get(k).is_some_and(|u| u != t) {
            error!("atom_type_index[{i}] points at '{}' but atom type is '{t}'", mol.unique_atom_types[k]);
            ok = false;
        }
    }

    for (field, values, table) in [
        ("bond_ff_index", &mol.bond_ff_index, mol.ff_bond_k.len()),
        ("angle_ff_index", &mol.angle_ff_index, mol.ff_angle_k.len()),
        ("dihed_ff_index", &mol.dihed_ff_index, mol.ff_dihed_k.len()),
        (
            "improper_ff_index",
            &mol.improper_ff_index,
            mol.ff_improper_k.len(),
        ),
    ] {
        if table > 0 {
            ok &= bounded(field, values, table);
        }
    }
    if mol.amber.ntypes() > 0 {
        ok &= bounded("pair_ff_index", &mol.pair_ff_index, mol.amber.ntypes());
    }
    ok
}
