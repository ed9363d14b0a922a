use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::default_residue_type;

/// AMBER-specific tables kept alongside the canonical record.
///
/// The pointer table and the raw Lennard-Jones A/B coefficients are needed to
/// derive per-type epsilon/sigma during the PARM7 build step, so they travel
/// with the record instead of being discarded after reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmberTables {
    pub version: Option<String>,
    pub pointers: BTreeMap<String, i64>,
    pub lj_acoeff: Vec<f64>,
    pub lj_bcoeff: Vec<f64>,
    pub lj_index: Vec<i64>,
    pub lj_epsilon: Vec<f64>,
    pub lj_sigma: Vec<f64>,
    pub time: Option<f64>,
    pub temperature: Option<f64>,
}

impl AmberTables {
    /// Value of a named pointer, zero when the pointer table did not carry it.
    pub fn pointer(&self, name: &str) -> i64 {
        self.pointers.get(name).copied().unwrap_or(0)
    }

    #[inline]
    pub fn ntypes(&self) -> usize {
        self.pointer("NTYPES").max(0) as usize
    }
}

/// The canonical molecule record.
///
/// Every per-atom, per-bond, per-angle, per-dihedral and per-residue attribute
/// is stored as its own index-aligned array. An empty array means "not
/// supplied"; a non-empty one must be fully populated. All indices are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Molecule {
    pub title: Option<String>,
    pub description: String,
    pub source_format: Option<String>,
    pub mol_type: Option<String>,
    pub charge_type: Option<String>,

    pub no_atoms: usize,
    pub no_bonds: usize,
    pub no_angles: usize,
    pub no_diheds: usize,
    pub no_improper: usize,
    pub no_residues: usize,
    pub no_features: usize,
    pub no_sets: usize,

    pub no_atom_types: usize,
    pub no_bond_types: usize,
    pub no_angle_types: usize,
    pub no_dihed_types: usize,
    pub no_improper_types: usize,

    pub unique_atom_types: Vec<String>,
    pub unique_atom_mass: Vec<f64>,

    pub atom_name: Vec<String>,
    pub atom_x: Vec<f64>,
    pub atom_y: Vec<f64>,
    pub atom_z: Vec<f64>,
    pub atom_vx: Vec<f64>,
    pub atom_vy: Vec<f64>,
    pub atom_vz: Vec<f64>,
    pub atom_q: Vec<f64>,
    pub atom_type: Vec<String>,
    pub atom_type_index: Vec<usize>,
    pub atom_resname: Vec<String>,
    pub atom_resid: Vec<i32>,
    pub atom_mass: Vec<f64>,
    pub atom_atomic_no: Vec<i32>,

    pub atom_occupancy: Vec<f64>,
    pub atom_temp_factor: Vec<f64>,
    pub atom_chain: Vec<String>,
    pub atom_altloc: Vec<String>,
    pub atom_icode: Vec<String>,
    pub atom_segment: Vec<String>,
    pub atom_status_bit: Vec<String>,
    pub atom_no_excluded: Vec<i64>,

    pub bond_from: Vec<usize>,
    pub bond_to: Vec<usize>,
    pub bond_type: Vec<String>,
    pub bond_ff_index: Vec<usize>,
    pub bond_tacticity: Vec<i32>,
    pub bond_status_bit: Vec<String>,

    pub angle_a: Vec<usize>,
    pub angle_b: Vec<usize>,
    pub angle_c: Vec<usize>,
    pub angle_ff_index: Vec<usize>,

    pub dihed_a: Vec<usize>,
    pub dihed_b: Vec<usize>,
    pub dihed_c: Vec<usize>,
    pub dihed_d: Vec<usize>,
    pub dihed_ff_index: Vec<usize>,

    pub improper_a: Vec<usize>,
    pub improper_b: Vec<usize>,
    pub improper_c: Vec<usize>,
    pub improper_d: Vec<usize>,
    pub improper_ff_index: Vec<usize>,

    pub residue_name: Vec<String>,
    pub residue_start: Vec<usize>,
    pub residue_type: Vec<String>,
    pub residue_dict_type: Vec<String>,
    pub residue_chain: Vec<String>,
    pub residue_sub_type: Vec<String>,
    pub residue_inter_bonds: Vec<String>,
    pub residue_status_bits: Vec<String>,
    pub residue_comment: Vec<String>,

    pub box_x: f64,
    pub box_y: f64,
    pub box_z: f64,
    pub box_alpha: f64,
    pub box_beta: f64,
    pub box_gamma: f64,
    pub box_lo: Option<[f64; 3]>,

    pub ff_lj_epsilon: Vec<f64>,
    pub ff_lj_sigma: Vec<f64>,
    pub pair_ff_index: Vec<usize>,

    pub ff_bond_k: Vec<f64>,
    pub ff_bond_eq: Vec<f64>,

    pub ff_angle_k: Vec<f64>,
    pub ff_angle_eq: Vec<f64>,

    pub ff_dihed_k: Vec<f64>,
    pub ff_dihed_phase: Vec<f64>,
    pub ff_dihed_periodicity: Vec<f64>,

    pub ff_improper_k: Vec<f64>,
    pub ff_improper_phase: Vec<f64>,
    pub ff_improper_periodicity: Vec<f64>,

    pub mol2_status_bits: Option<String>,
    pub mol2_comment: Option<String>,

    pub amber: AmberTables,
}

impl Default for Molecule {
    fn default() -> Self {
        Self {
            title: None,
            description: String::new(),
            source_format: None,
            mol_type: None,
            charge_type: None,
            no_atoms: 0,
            no_bonds: 0,
            no_angles: 0,
            no_diheds: 0,
            no_improper: 0,
            no_residues: 0,
            no_features: 0,
            no_sets: 0,
            no_atom_types: 0,
            no_bond_types: 0,
            no_angle_types: 0,
            no_dihed_types: 0,
            no_improper_types: 0,
            unique_atom_types: Vec::new(),
            unique_atom_mass: Vec::new(),
            atom_name: Vec::new(),
            atom_x: Vec::new(),
            atom_y: Vec::new(),
            atom_z: Vec::new(),
            atom_vx: Vec::new(),
            atom_vy: Vec::new(),
            atom_vz: Vec::new(),
            atom_q: Vec::new(),
            atom_type: Vec::new(),
            atom_type_index: Vec::new(),
            atom_resname: Vec::new(),
            atom_resid: Vec::new(),
            atom_mass: Vec::new(),
            atom_atomic_no: Vec::new(),
            atom_occupancy: Vec::new(),
            atom_temp_factor: Vec::new(),
            atom_chain: Vec::new(),
            atom_altloc: Vec::new(),
            atom_icode: Vec::new(),
            atom_segment: Vec::new(),
            atom_status_bit: Vec::new(),
            atom_no_excluded: Vec::new(),
            bond_from: Vec::new(),
            bond_to: Vec::new(),
            bond_type: Vec::new(),
            bond_ff_index: Vec::new(),
            bond_tacticity: Vec::new(),
            bond_status_bit: Vec::new(),
            angle_a: Vec::new(),
            angle_b: Vec::new(),
            angle_c: Vec::new(),
            angle_ff_index: Vec::new(),
            dihed_a: Vec::new(),
            dihed_b: Vec::new(),
            dihed_c: Vec::new(),
            dihed_d: Vec::new(),
            dihed_ff_index: Vec::new(),
            improper_a: Vec::new(),
            improper_b: Vec::new(),
            improper_c: Vec::new(),
            improper_d: Vec::new(),
            improper_ff_index: Vec::new(),
            residue_name: Vec::new(),
            residue_start: Vec::new(),
            residue_type: Vec::new(),
            residue_dict_type: Vec::new(),
            residue_chain: Vec::new(),
            residue_sub_type: Vec::new(),
            residue_inter_bonds: Vec::new(),
            residue_status_bits: Vec::new(),
            residue_comment: Vec::new(),
            box_x: 0.0,
            box_y: 0.0,
            box_z: 0.0,
            box_alpha: 90.0,
            box_beta: 90.0,
            box_gamma: 90.0,
            box_lo: None,
            ff_lj_epsilon: Vec::new(),
            ff_lj_sigma: Vec::new(),
            pair_ff_index: Vec::new(),
            ff_bond_k: Vec::new(),
            ff_bond_eq: Vec::new(),
            ff_angle_k: Vec::new(),
            ff_angle_eq: Vec::new(),
            ff_dihed_k: Vec::new(),
            ff_dihed_phase: Vec::new(),
            ff_dihed_periodicity: Vec::new(),
            ff_improper_k: Vec::new(),
            ff_improper_phase: Vec::new(),
            ff_improper_periodicity: Vec::new(),
            mol2_status_bits: None,
            mol2_comment: None,
            amber: AmberTables::default(),
        }
    }
}

/// Criteria for [`Molecule::select`]. Unset fields match every atom.
#[derive(Debug, Clone, Default)]
pub struct AtomFilter<'a> {
    pub name: Option<&'a str>,
    pub atom_type: Option<&'a str>,
    pub resname: Option<&'a str>,
    pub resid: Option<i32>,
}

impl<'a> AtomFilter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn atom_type(mut self, atom_type: &'a str) -> Self {
        self.atom_type = Some(atom_type);
        self
    }

    pub fn resname(mut self, resname: &'a str) -> Self {
        self.resname = Some(resname);
        self
    }

    pub fn resid(mut self, resid: i32) -> Self {
        self.resid = Some(resid);
        self
    }
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of atoms actually stored, independent of the cached `no_atoms`.
    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atom_x.len()
    }

    #[inline]
    pub fn bond_count(&self) -> usize {
        self.bond_from.len()
    }

    #[inline]
    pub fn has_velocities(&self) -> bool {
        !self.atom_vx.is_empty()
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.box_x > 0.0 && self.box_y > 0.0 && self.box_z > 0.0
    }

    /// Atom index range `[start, end)` covered by residue `r`.
    pub fn residue_range(&self, r: usize) -> Option<(usize, usize)> {
        let start = *self.residue_start.get(r)?;
        let end = self
            .residue_start
            .get(r + 1)
            .copied()
            .unwrap_or(self.no_atoms.max(start));
        Some((start, end))
    }

    /// Refreshes the cached summary counts from the array lengths.
    ///
    /// Without `overwrite` only counts that are still zero are filled.
    pub fn update_summary(&mut self, overwrite: bool) {
        fn refresh(count: &mut usize, len: usize, overwrite: bool) {
            if overwrite || *count == 0 {
                *count = len;
            }
        }

        refresh(&mut self.no_atoms, self.atom_x.len(), overwrite);
        refresh(&mut self.no_bonds, self.bond_from.len(), overwrite);
        refresh(&mut self.no_angles, self.angle_a.len(), overwrite);
        refresh(&mut self.no_diheds, self.dihed_a.len(), overwrite);
        refresh(&mut self.no_improper, self.improper_a.len(), overwrite);
        refresh(&mut self.no_residues, self.residue_name.len(), overwrite);
        refresh(
            &mut self.no_atom_types,
            self.unique_atom_types.len(),
            overwrite,
        );
    }

    pub fn translate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.atom_x.iter_mut().for_each(|x| *x += dx);
        self.atom_y.iter_mut().for_each(|y| *y += dy);
        self.atom_z.iter_mut().for_each(|z| *z += dz);
    }

    /// Indices of the atoms matching every criterion set on `filter`.
    pub fn select(&self, filter: &AtomFilter<'_>) -> Vec<usize> {
        (0..self.atom_count())
            .filter(|&i| {
                filter
                    .name
                    .is_none_or(|n| self.atom_name.get(i).is_some_and(|v| v == n))
                    && filter
                        .atom_type
                        .is_none_or(|t| self.atom_type.get(i).is_some_and(|v| v == t))
                    && filter
                        .resname
                        .is_none_or(|r| self.atom_resname.get(i).is_some_and(|v| v == r))
                    && filter
                        .resid
                        .is_none_or(|r| self.atom_resid.get(i).is_some_and(|v| *v == r))
            })
            .collect()
    }

    /// Appends the atoms, topology and residues of `other` to this record.
    ///
    /// Atom references of `other` are shifted by this record's atom count and
    /// its residue ids by one past this record's largest residue id. Parameter
    /// tables are not merged: force-field indices of `other` are kept as they
    /// are and must refer to this record's tables.
    ///
    /// An array present on only one side is padded for the other side's atoms,
    /// bonds, angles, dihedrals, impropers or residues, so every array stays
    /// aligned with its count. Missing bond labels become `1`.
    pub fn insert(&mut self, other: &Molecule) {
        let n_self = self.atom_count();
        let n_other = other.atom_count();
        let resid_offset = self.atom_resid.iter().max().map_or(0, |m| m + 1);

        extend_aligned(&mut self.atom_name, &other.atom_name, n_self, n_other);
        extend_aligned(&mut self.atom_x, &other.atom_x, n_self, n_other);
        extend_aligned(&mut self.atom_y, &other.atom_y, n_self, n_other);
        extend_aligned(&mut self.atom_z, &other.atom_z, n_self, n_other);
        extend_aligned(&mut self.atom_vx, &other.atom_vx, n_self, n_other);
        extend_aligned(&mut self.atom_vy, &other.atom_vy, n_self, n_other);
        extend_aligned(&mut self.atom_vz, &other.atom_vz, n_self, n_other);
        extend_aligned(&mut self.atom_q, &other.atom_q, n_self, n_other);
        extend_aligned(&mut self.atom_type, &other.atom_type, n_self, n_other);
        extend_aligned(&mut self.atom_resname, &other.atom_resname, n_self, n_other);
        extend_aligned(&mut self.atom_mass, &other.atom_mass, n_self, n_other);
        extend_aligned(
            &mut self.atom_atomic_no,
            &other.atom_atomic_no,
            n_self,
            n_other,
        );
        extend_aligned(
            &mut self.atom_occupancy,
            &other.atom_occupancy,
            n_self,
            n_other,
        );
        extend_aligned(
            &mut self.atom_temp_factor,
            &other.atom_temp_factor,
            n_self,
            n_other,
        );
        extend_aligned(&mut self.atom_chain, &other.atom_chain, n_self, n_other);
        extend_aligned(&mut self.atom_altloc, &other.atom_altloc, n_self, n_other);
        extend_aligned(&mut self.atom_icode, &other.atom_icode, n_self, n_other);
        extend_aligned(&mut self.atom_segment, &other.atom_segment, n_self, n_other);
        extend_aligned(
            &mut self.pair_ff_index,
            &other.pair_ff_index,
            n_self,
            n_other,
        );

        let shifted_resid: Vec<i32> = other.atom_resid.iter().map(|r| r + resid_offset).collect();
        extend_aligned(&mut self.atom_resid, &shifted_resid, n_self, n_other);

        extend_aligned(
            &mut self.atom_status_bit,
            &other.atom_status_bit,
            n_self,
            n_other,
        );
        extend_aligned(
            &mut self.atom_no_excluded,
            &other.atom_no_excluded,
            n_self,
            n_other,
        );

        let shift = |v: &[usize]| -> Vec<usize> { v.iter().map(|i| i + n_self).collect() };

        let (b_self, b_other) = (self.bond_count(), other.bond_count());
        self.bond_from.extend(shift(&other.bond_from));
        self.bond_to.extend(shift(&other.bond_to));
        extend_filled(
            &mut self.bond_type,
            &other.bond_type,
            b_self,
            b_other,
            "1".to_string(),
        );
        extend_aligned(&mut self.bond_ff_index, &other.bond_ff_index, b_self, b_other);
        extend_aligned(&mut self.bond_tacticity, &other.bond_tacticity, b_self, b_other);
        extend_aligned(&mut self.bond_status_bit, &other.bond_status_bit, b_self, b_other);

        let (a_self, a_other) = (self.angle_a.len(), other.angle_a.len());
        self.angle_a.extend(shift(&other.angle_a));
        self.angle_b.extend(shift(&other.angle_b));
        self.angle_c.extend(shift(&other.angle_c));
        extend_aligned(&mut self.angle_ff_index, &other.angle_ff_index, a_self, a_other);

        let (d_self, d_other) = (self.dihed_a.len(), other.dihed_a.len());
        self.dihed_a.extend(shift(&other.dihed_a));
        self.dihed_b.extend(shift(&other.dihed_b));
        self.dihed_c.extend(shift(&other.dihed_c));
        self.dihed_d.extend(shift(&other.dihed_d));
        extend_aligned(&mut self.dihed_ff_index, &other.dihed_ff_index, d_self, d_other);

        let (i_self, i_other) = (self.improper_a.len(), other.improper_a.len());
        self.improper_a.extend(shift(&other.improper_a));
        self.improper_b.extend(shift(&other.improper_b));
        self.improper_c.extend(shift(&other.improper_c));
        self.improper_d.extend(shift(&other.improper_d));
        extend_aligned(
            &mut self.improper_ff_index,
            &other.improper_ff_index,
            i_self,
            i_other,
        );

        let (r_self, r_other) = (self.residue_name.len(), other.residue_name.len());
        self.residue_name.extend(other.residue_name.iter().cloned());
        self.residue_start.extend(shift(&other.residue_start));
        extend_filled(
            &mut self.residue_type,
            &other.residue_type,
            r_self,
            r_other,
            default_residue_type(),
        );
        for (dst, src) in [
            (&mut self.residue_dict_type, &other.residue_dict_type),
            (&mut self.residue_chain, &other.residue_chain),
            (&mut self.residue_sub_type, &other.residue_sub_type),
            (&mut self.residue_inter_bonds, &other.residue_inter_bonds),
            (&mut self.residue_status_bits, &other.residue_status_bits),
            (&mut self.residue_comment, &other.residue_comment),
        ] {
            extend_aligned(dst, src, r_self, r_other);
        }

        for t in other.unique_atom_types.iter().chain(&self.atom_type) {
            if !self.unique_atom_types.contains(t) {
                self.unique_atom_types.push(t.clone());
            }
        }
        self.atom_type_index = self
            .atom_type
            .iter()
            .filter_map(|t| self.unique_atom_types.iter().position(|u| u == t))
            .collect();

        self.update_summary(true);
    }
}

fn extend_aligned<T: Clone + Default>(dst: &mut Vec<T>, src: &[T], n_dst: usize, n_src: usize) {
    extend_filled(dst, src, n_dst, n_src, T::default());
}

/// Appends `src` to `dst`, padding whichever side is missing with `fill` so
/// the result stays aligned with `n_dst + n_src` entries.
fn extend_filled<T: Clone>(dst: &mut Vec<T>, src: &[T], n_dst: usize, n_src: usize, fill: T) {
    if dst.is_empty() && src.is_empty() {
        return;
    }
    if dst.is_empty() {
        dst.resize(n_dst, fill.clone());
    }
    if src.is_empty() {
        dst.extend(std::iter::repeat_n(fill, n_src));
    } else {
        dst.extend_from_slice(src);
    }
}
