//! AMBER PARM7 topologies and their RST7 coordinate companions.

use std::io::BufRead;

use super::section::SectionReader;
use super::{Format, MolFormat, error::Error};
use crate::model::build::{self, BuildReport, BuildWarning};
use crate::model::molecule::{AmberTables, Molecule};

pub mod reader;
pub mod rst7;

use reader::Parm7Grammar;

/// The POINTERS section values, in file order.
pub const POINTER_NAMES: [&str; 32] = [
    "NATOM", "NTYPES", "NBONH", "MBONA", "NTHETH", "MTHETA", "NPHIH", "MPHIA", "NHPARM", "NPARM",
    "NNB", "NRES", "NBONA", "NTHETA", "NPHIA", "NUMBND", "NUMANG", "NPTRA", "NATYP", "NPHB",
    "IFPERT", "NBPER", "NGPER", "NDPER", "MBPER", "MGPER", "MDPER", "IFBOX", "NMXRS", "IFCAP",
    "NUMEXTRA", "NCOPY",
];

/// Converts a Lennard-Jones A/B coefficient pair to `(epsilon, sigma)`.
///
/// Epsilon is zero when `A` is zero and sigma is zero when `B` is zero.
pub fn lj_from_ab(a: f64, b: f64) -> (f64, f64) {
    let epsilon = if a == 0.0 { 0.0 } else { 0.25 * b * b / a };
    let sigma = if b == 0.0 { 0.0 } else { (a / b).powf(1.0 / 6.0) };
    (epsilon, sigma)
}

/// Derives per-AMBER-type epsilon and sigma from the diagonal entries of the
/// A/B coefficient tables.
pub fn derive_lj(amber: &mut AmberTables, report: &mut BuildReport) {
    let ntypes = amber.ntypes();
    if amber.lj_acoeff.is_empty() || amber.lj_epsilon.len() == ntypes {
        return;
    }
    if amber.lj_index.len() < ntypes * ntypes {
        report.push(BuildWarning::MissingLjIndex);
        return;
    }

    let mut epsilon = Vec::with_capacity(ntypes);
    let mut sigma = Vec::with_capacity(ntypes);
    for i in 0..ntypes {
        let j = amber.lj_index[i * (ntypes + 1)] - 1;
        let pair = usize::try_from(j)
            .ok()
            .and_then(|j| Some((*amber.lj_acoeff.get(j)?, *amber.lj_bcoeff.get(j)?)));
        let Some((a, b)) = pair else {
            report.check_len("lj_acoeff", ntypes * (ntypes + 1) / 2, amber.lj_acoeff.len());
            return;
        };
        let (e, s) = lj_from_ab(a, b);
        epsilon.push(e);
        sigma.push(s);
    }
    amber.lj_epsilon = epsilon;
    amber.lj_sigma = sigma;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Parm7;

impl MolFormat for Parm7 {
    fn format(&self) -> Format {
        Format::Parm7
    }

    fn read(&self, reader: &mut dyn BufRead) -> Result<Molecule, Error> {
        let mut mol = Molecule::new();
        mol.source_format = Some("AMBER PARM7".to_string());
        let mut grammar = Parm7Grammar;
        SectionReader::new(&mut grammar).read_into(reader, &mut mol)?;
        Ok(mol)
    }

    fn build(&self, mol: &mut Molecule) -> Result<BuildReport, Error> {
        let mut report = BuildReport::new();

        build::expand_residues(mol);

        mol.no_bond_types = mol.ff_bond_k.len();
        mol.no_angle_types = mol.ff_angle_k.len();
        mol.no_dihed_types = mol.ff_dihed_k.len();

        derive_lj(&mut mol.amber, &mut report);
        let ntypes = mol.amber.ntypes();
        report.check_len("lj_epsilon", ntypes, mol.amber.lj_epsilon.len());

        build::index_atom_types(mol);
        report.check_len("atom_type_index", mol.no_atoms, mol.atom_type_index.len());

        build::pair_coefficients(mol, &mut report);
        build::type_masses(mol, &mut report);
        mol.update_summary(false);

        Ok(report)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::check;
    use std::io::Cursor;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    /// A two-residue, four-atom topology with two AMBER types.
    pub(crate) const SAMPLE: &str = "\
%VERSION  VERSION_STAMP = V0001.000  DATE = 01/01/24  00:00:00
%FLAG TITLE
%FORMAT(20a4)
TEST SYSTEM
%FLAG POINTERS
%FORMAT(10I8)
       4       2       2       1       1       0       0       1       0       0
       9       2       1       0       0       2       1       1       2       0
       0       0       0       0       0       0       0       0       2       0
       0       0
%FLAG ATOM_NAME
%FORMAT(20a4)
C1  H1  H2  O1
%COMMENT charges are in AMBER units
%FLAG CHARGE
%FORMAT(5E16.8)
  1.82223000E+01 -1.82223000E+01  0.00000000E+00  3.64446000E+00
%FLAG ATOMIC_NUMBER
%FORMAT(10I8)
       6       1       1       8
%FLAG MASS
%FORMAT(5E16.8)
  1.20100000E+01  1.00800000E+00  1.00800000E+00  1.60000000E+01
%FLAG ATOM_TYPE_INDEX
%FORMAT(10I8)
       1       2       2       1
%FLAG NUMBER_EXCLUDED_ATOMS
%FORMAT(10I8)
       3       1       1       1
%FLAG NONBONDED_PARM_INDEX
%FORMAT(10I8)
       1       2       2       3
%FLAG RESIDUE_LABEL
%FORMAT(20a4)
MET WAT
%FLAG RESIDUE_POINTER
%FORMAT(10I8)
       1       4
%FLAG BOND_FORCE_CONSTANT
%FORMAT(5E16.8)
  3.40000000E+02  5.53000000E+02
%FLAG BOND_EQUIL_VALUE
%FORMAT(5E16.8)
  1.09000000E+00  9.60000000E-01
%FLAG ANGLE_FORCE_CONSTANT
%FORMAT(5E16.8)
  3.50000000E+01
%FLAG ANGLE_EQUIL_VALUE
%FORMAT(5E16.8)
  1.91113635E+00
%FLAG DIHEDRAL_FORCE_CONSTANT
%FORMAT(5E16.8)
  1.50000000E-01
%FLAG DIHEDRAL_PERIODICITY
%FORMAT(5E16.8)
  3.00000000E+00
%FLAG DIHEDRAL_PHASE
%FORMAT(5E16.8)
  3.14159400E+00
%FLAG LENNARD_JONES_ACOEF
%FORMAT(5E16.8)
  1.04308023E+06  2.01584983E+04  0.00000000E+00
%FLAG LENNARD_JONES_BCOEF
%FORMAT(5E16.8)
  6.75612247E+02  0.00000000E+00  0.00000000E+00
%FLAG BONDS_INC_HYDROGEN
%FORMAT(10I8)
       0       3       1       0       6       1
%FLAG BONDS_WITHOUT_HYDROGEN
%FORMAT(10I8)
       0       9       2
%FLAG ANGLES_INC_HYDROGEN
%FORMAT(10I8)
       3       0       6       1
%FLAG DIHEDRALS_WITHOUT_HYDROGEN
%FORMAT(10I8)
       3       0      -9       6       1
%FLAG AMBER_ATOM_TYPE
%FORMAT(20a4)
CT  HC  HC  OW
%FLAG SOLTY
%FORMAT(5E16.8)
  0.00000000E+00
";

    pub(crate) fn sample() -> Molecule {
        Parm7.read(&mut Cursor::new(SAMPLE)).unwrap()
    }

    #[test]
    fn pointers_set_summary_counts() {
        let mol = sample();
        assert_eq!(mol.amber.pointers.len(), 32);
        assert_eq!(mol.amber.pointer("NTYPES"), 2);
        assert_eq!(mol.amber.pointer("NCOPY"), 0);
        assert_eq!(mol.no_atoms, 4);
        assert_eq!(mol.no_bonds, 3);
        assert_eq!(mol.no_angles, 1);
        assert_eq!(mol.no_diheds, 1);
        assert_eq!(mol.no_residues, 2);
        assert_eq!(mol.no_atom_types, 2);
        assert_eq!(
            mol.amber.version.as_deref(),
            Some("VERSION_STAMP = V0001.000  DATE = 01/01/24  00:00:00")
        );
        assert_eq!(mol.title.as_deref(), Some("TEST SYSTEM"));
    }

    #[test]
    fn per_atom_sections_are_decoded() {
        let mol = sample();
        assert_eq!(mol.atom_name, vec!["C1", "H1", "H2", "O1"]);
        assert!(approx_eq(mol.atom_q[0], 1.0, 1e-9));
        assert!(approx_eq(mol.atom_q[1], -1.0, 1e-9));
        assert!(approx_eq(mol.atom_q[3], 0.2, 1e-9));
        assert_eq!(mol.atom_atomic_no, vec![6, 1, 1, 8]);
        assert_eq!(mol.pair_ff_index, vec![0, 1, 1, 0]);
        assert_eq!(mol.atom_no_excluded, vec![3, 1, 1, 1]);
        assert_eq!(mol.atom_type, vec!["CT", "HC", "HC", "OW"]);
        assert_eq!(mol.residue_name, vec!["MET", "WAT"]);
        assert_eq!(mol.residue_start, vec![0, 3]);
    }

    #[test]
    fn topology_sections_decode_coordinate_offsets() {
        let mol = sample();
        assert_eq!(mol.bond_from, vec![0, 0, 0]);
        assert_eq!(mol.bond_to, vec![1, 2, 3]);
        assert_eq!(mol.bond_ff_index, vec![0, 0, 1]);
        assert_eq!(
            (mol.angle_a[0], mol.angle_b[0], mol.angle_c[0]),
            (1, 0, 2)
        );
        assert_eq!(
            (mol.dihed_a[0], mol.dihed_b[0], mol.dihed_c[0], mol.dihed_d[0]),
            (1, 0, 3, 2)
        );
        assert_eq!(mol.dihed_ff_index, vec![0]);
    }

    #[test]
    fn bond_triplet_decodes_to_zero_based_indices() {
        let text = "%FLAG POINTERS\n%FORMAT(10I8)\n       5\n%FLAG BONDS_INC_HYDROGEN\n%FORMAT(10I8)\n       9      12       2\n";
        let mol = Parm7.read(&mut Cursor::new(text)).unwrap();
        assert_eq!(mol.bond_from, vec![3]);
        assert_eq!(mol.bond_to, vec![4]);
        assert_eq!(mol.bond_ff_index, vec![1]);
    }

    #[test]
    fn per_atom_count_mismatch_aborts() {
        let text = "%FLAG POINTERS\n%FORMAT(10I8)\n       3\n%FLAG MASS\n%FORMAT(5E16.8)\n  1.00000000E+00  2.00000000E+00\n";
        let err = Parm7.read(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            Error::CountMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn ragged_tuple_section_aborts() {
        let text = "%FLAG BONDS_INC_HYDROGEN\n%FORMAT(10I8)\n       0       3\n";
        let err = Parm7.read(&mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn atom_names_fall_back_to_fixed_width() {
        let text = "%FLAG POINTERS\n%FORMAT(10I8)\n       3\n%FLAG ATOM_NAME\n%FORMAT(20a4)\nC1  H1 1H2  \n";
        let mol = Parm7.read(&mut Cursor::new(text)).unwrap();
        assert_eq!(mol.atom_name, vec!["C1", "H1", "1H2"]);

        let text = "%FLAG POINTERS\n%FORMAT(10I8)\n       3\n%FLAG ATOM_NAME\n%FORMAT(20a4)\nC1  H1ABH2  \n";
        let mol = Parm7.read(&mut Cursor::new(text)).unwrap();
        assert_eq!(mol.atom_name, vec!["C1", "H1AB", "H2"]);
    }

    #[test]
    fn lj_from_ab_handles_zero_coefficients() {
        let (e, s) = lj_from_ab(0.0, 5.0);
        assert_eq!((e, s), (0.0, 0.0));
        let (e, s) = lj_from_ab(4.0, 0.0);
        assert_eq!((e, s), (0.0, 0.0));
        let (e, s) = lj_from_ab(0.0, 0.0);
        assert_eq!((e, s), (0.0, 0.0));

        let (e, s) = lj_from_ab(1.04308023e6, 6.75612247e2);
        assert!(approx_eq(e, 0.1094, 1e-4));
        assert!(approx_eq(s, 3.3997, 1e-3));
    }

    #[test]
    fn build_derives_per_type_lennard_jones() {
        let mut mol = sample();
        let report = Parm7.build(&mut mol).unwrap();

        assert_eq!(mol.amber.lj_epsilon.len(), 2);
        assert!(approx_eq(mol.amber.lj_epsilon[0], 0.1094, 1e-4));
        assert_eq!(mol.amber.lj_epsilon[1], 0.0);
        assert_eq!(mol.amber.lj_sigma[1], 0.0);

        assert_eq!(mol.unique_atom_types, vec!["CT", "HC", "OW"]);
        assert_eq!(mol.no_atom_types, 3);
        assert_eq!(mol.atom_type_index, vec![0, 1, 1, 2]);
        assert_eq!(mol.ff_lj_epsilon.len(), 3);
        assert_eq!(mol.ff_lj_epsilon[1], 0.0);
        assert_eq!(mol.ff_lj_epsilon[0], mol.ff_lj_epsilon[2]);
        assert_eq!(mol.unique_atom_mass, vec![12.01, 1.008, 16.0]);
        assert_eq!(mol.atom_resid, vec![0, 0, 0, 1]);
        assert_eq!(mol.atom_resname, vec!["MET", "MET", "MET", "WAT"]);
        assert_eq!(
            (mol.no_bond_types, mol.no_angle_types, mol.no_dihed_types),
            (2, 1, 1)
        );
        assert!(report.is_empty());
    }

    #[test]
    fn build_is_idempotent() {
        let mut mol = sample();
        Parm7.build(&mut mol).unwrap();
        let once = mol.clone();
        Parm7.build(&mut mol).unwrap();
        assert_eq!(mol, once);
    }

    #[test]
    fn missing_lj_index_is_a_warning() {
        let mut mol = sample();
        mol.amber.lj_index.clear();
        let report = Parm7.build(&mut mol).unwrap();
        assert!(report.warnings.contains(&BuildWarning::MissingLjIndex));
        assert!(mol.amber.lj_epsilon.is_empty());
    }

    #[test]
    fn read_then_coordinates_pass_the_checker() {
        let mut mol = sample();
        let rst = "TEST\n    4  1.5\n   0.0 0.0 0.0   1.0 0.0 0.0   0.0 1.0 0.0   0.0 0.0 1.0\n";
        rst7::read_into(&mut Cursor::new(rst), &mut mol).unwrap();
        Parm7.build(&mut mol).unwrap();
        assert!(check::check(&mol));
        assert!(check::indices_ok(&mol));
    }
}
