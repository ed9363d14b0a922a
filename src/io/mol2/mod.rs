//! TRIPOS MOL2 files: MOLECULE, ATOM, BOND and SUBSTRUCTURE sections.

use std::io::{BufRead, Write};

use super::section::SectionReader;
use super::{Format, MolFormat, error::Error};
use crate::config::Mol2Config;
use crate::model::build::{self, BuildReport, BuildWarning};
use crate::model::molecule::Molecule;

pub mod reader;
pub mod writer;

use reader::Mol2Grammar;

/// Residue name given to atoms of a file without any substructure data.
const DEFAULT_RESIDUE: &str = "MOL";

#[derive(Debug, Clone, Default)]
pub struct Mol2 {
    config: Mol2Config,
}

impl Mol2 {
    pub fn new(config: Mol2Config) -> Self {
        Self { config }
    }
}

fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

impl MolFormat for Mol2 {
    fn format(&self) -> Format {
        Format::Mol2
    }

    fn read(&self, reader: &mut dyn BufRead) -> Result<Molecule, Error> {
        let mut mol = Molecule::new();
        mol.source_format = Some("TRIPOS MOL2".to_string());
        let mut grammar = Mol2Grammar::default();
        SectionReader::new(&mut grammar).read_into(reader, &mut mol)?;
        Ok(mol)
    }

    fn build(&self, mol: &mut Molecule) -> Result<BuildReport, Error> {
        let mut report = BuildReport::new();

        if is_unset(&mol.mol_type) {
            mol.mol_type = Some(self.config.mol_type.clone());
        }
        if is_unset(&mol.charge_type) {
            mol.charge_type = Some(self.config.charge_type.clone());
        }

        build::expand_residues(mol);
        if mol.atom_resid.is_empty() && mol.atom_count() > 0 {
            let n = mol.atom_count();
            mol.atom_resid = vec![0; n];
            if mol.atom_resname.len() != n {
                mol.atom_resname = vec![DEFAULT_RESIDUE.to_string(); n];
            }
        }
        build::renumber_residues(mol, Format::Mol2)?;

        if mol.bond_type.is_empty() && mol.bond_count() > 0 {
            mol.bond_type = vec!["1".to_string(); mol.bond_count()];
            report.push(BuildWarning::DefaultBondTypes(mol.bond_count()));
        }

        build::synthesize_residues(mol, &mut report);
        build::fill_residue_types(mol, &self.config.residue_type);
        build::index_atom_types(mol);
        mol.update_summary(true);

        Ok(report)
    }

    fn write(&self, writer: &mut dyn Write, mol: &Molecule) -> Result<(), Error> {
        writer::write(writer, mol, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::check;
    use std::io::Cursor;

    const WATERS: &str = "\
# water dimer, hand written
@<TRIPOS>MOLECULE
two waters
    6     4     2
SMALL
USER_CHARGES
****
water dimer

@<TRIPOS>ATOM
      1 OW    0.0000  0.0000  0.0000 O.3   1 WAT  -0.834000
      2 HW1   0.9572  0.0000  0.0000 H     1 WAT   0.417000
      3 HW2  -0.2400  0.9266  0.0000 H     1 WAT   0.41700049
      4 OW    3.0000  0.0000  0.0000 O.3   2 WAT  -0.834
      5 HW1   3.9572  0.0000  0.0000 H     2 WAT   0.417
      6 HW2   2.7600  0.9266  0.0000 H     2 WAT   0.417
@<TRIPOS>BOND
     1     1     2    1
     2     1     3    1
     3     4     5    1
     4     4     6    1
@<TRIPOS>SUBSTRUCTURE
     1 WAT     1 RESIDUE  1 A  WAT  1  ROOT  first water
     2 WAT     4 RESIDUE
";

    fn read(text: &str) -> Result<Molecule, Error> {
        Mol2::default().read(&mut Cursor::new(text))
    }

    fn built(text: &str) -> Molecule {
        let mut mol = read(text).unwrap();
        Mol2::default().build(&mut mol).unwrap();
        mol
    }

    fn written(mol: &Molecule) -> String {
        let mut out = Vec::new();
        Mol2::default().write(&mut out, mol).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn molecule_section_is_read_by_line_offset() {
        let mol = read(WATERS).unwrap();
        assert_eq!(mol.title.as_deref(), Some("two waters"));
        assert_eq!((mol.no_atoms, mol.no_bonds, mol.no_residues), (6, 4, 2));
        assert_eq!(mol.mol_type.as_deref(), Some("SMALL"));
        assert_eq!(mol.charge_type.as_deref(), Some("USER_CHARGES"));
        assert_eq!(mol.mol2_status_bits.as_deref(), Some("****"));
        assert_eq!(mol.mol2_comment.as_deref(), Some("water dimer"));
        assert_eq!(mol.description, "# water dimer, hand written\n");
    }

    #[test]
    fn atoms_bonds_and_substructures_are_zero_based() {
        let mol = read(WATERS).unwrap();
        assert_eq!(mol.atom_name[2], "HW2");
        assert_eq!(mol.atom_resid, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(mol.atom_q[2], 0.417);
        assert_eq!(mol.bond_from, vec![0, 0, 3, 3]);
        assert_eq!(mol.bond_to, vec![1, 2, 4, 5]);
        assert_eq!(mol.residue_start, vec![0, 3]);
        assert_eq!(mol.residue_type, vec!["RESIDUE", "RESIDUE"]);
        assert_eq!(mol.residue_chain, vec!["A"]);
        assert_eq!(mol.residue_status_bits, vec!["ROOT"]);
        assert_eq!(mol.residue_comment, vec!["first water"]);
    }

    #[test]
    fn atom_count_must_match_the_header() {
        let text = "@<TRIPOS>MOLECULE\nm\n3 0 0\n@<TRIPOS>ATOM\n1 C 0 0 0 C.3\n2 C 1 0 0 C.3\n";
        assert!(matches!(
            read(text),
            Err(Error::CountMismatch {
                expected: 3,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn short_atom_record_is_a_parse_error() {
        let text = "@<TRIPOS>MOLECULE\nm\n1 0 0\n@<TRIPOS>ATOM\n1 C 0 0 0\n";
        assert!(matches!(read(text), Err(Error::Parse { line: 5, .. })));
    }

    #[test]
    fn optional_atom_columns_stay_aligned_when_only_some_rows_have_them() {
        let text = "\
@<TRIPOS>MOLECULE
backbone
    3     2     1
@<TRIPOS>ATOM
      1 N     0.0000  0.0000  0.0000 N.am  1 ALA   -0.4157
      2 CA    1.4500  0.0000  0.0000 C.3   1 ALA    0.0337 BACKBONE
      3 CB    2.0000  1.4000  0.0000 C.3   1 ALA   -0.1825
@<TRIPOS>BOND
     1     1     2    1
     2     2     3    1 BACKBONE
";
        let mol = read(text).unwrap();
        assert_eq!(mol.atom_status_bit, vec!["", "BACKBONE", ""]);
        assert_eq!(mol.atom_q, vec![-0.4157, 0.0337, -0.1825]);
        assert_eq!(mol.bond_status_bit, vec!["", "BACKBONE"]);

        let out = written(&built(text));
        assert!(out.contains("  0.0337 BACKBONE\n"), "{out}");
        assert!(out.contains(" -0.4157\n"), "{out}");
    }

    #[test]
    fn residues_are_backfilled_from_the_substructure_table() {
        let text = "\
@<TRIPOS>MOLECULE
peptide
5 0 2
PROTEIN
NO_CHARGES
@<TRIPOS>ATOM
1 N  0 0 0 N.am
2 CA 1 0 0 C.3
3 C  2 0 0 C.2
4 N  3 0 0 N.am
5 CA 4 0 0 C.3
@<TRIPOS>SUBSTRUCTURE
1 ALA 1
2 GLY 4
";
        let mol = built(text);
        assert_eq!(mol.atom_resid, vec![0, 0, 0, 1, 1]);
        assert_eq!(mol.atom_resname, vec!["ALA", "ALA", "ALA", "GLY", "GLY"]);
        assert_eq!(mol.residue_type, vec!["RESIDUE", "RESIDUE"]);
        assert_eq!(mol.mol_type.as_deref(), Some("PROTEIN"));
        assert_eq!(mol.unique_atom_types, vec!["N.am", "C.3", "C.2"]);
        assert_eq!(mol.atom_type_index, vec![0, 1, 2, 0, 1]);
        assert!(check::check(&mol));
    }

    #[test]
    fn decreasing_residue_ids_are_rejected() {
        let text = "@<TRIPOS>ATOM\n1 C 0 0 0 C.3 2 B\n2 C 1 0 0 C.3 2 B\n3 C 2 0 0 C.3 1 A\n";
        let mut mol = read(text).unwrap();
        let err = Mol2::default().build(&mut mol).unwrap_err();
        assert!(matches!(
            err,
            Error::ResidueOrder {
                atom: 2,
                previous: 1,
                current: 0,
                ..
            }
        ));
    }

    #[test]
    fn sparse_residue_ids_are_renumbered() {
        let text = "@<TRIPOS>ATOM\n1 C 0 0 0 C.3 5 A\n2 C 1 0 0 C.3 9 B\n3 C 2 0 0 C.3 9 B\n";
        let mol = built(text);
        assert_eq!(mol.atom_resid, vec![0, 1, 1]);
        assert_eq!(mol.residue_name, vec!["A", "B"]);
        assert_eq!(mol.residue_start, vec![0, 1]);
        assert_eq!(mol.no_residues, 2);
    }

    #[test]
    fn defaults_fill_missing_types_and_bond_labels() {
        let mut mol = Molecule::new();
        mol.atom_name = vec!["C1".into(), "O1".into()];
        mol.atom_x = vec![0.0, 1.2];
        mol.atom_y = vec![0.0, 0.0];
        mol.atom_z = vec![0.0, 0.0];
        mol.atom_type = vec!["C.2".into(), "O.2".into()];
        mol.bond_from = vec![0, 1];
        mol.bond_to = vec![1, 0];

        let report = Mol2::default().build(&mut mol).unwrap();
        assert_eq!(report.warnings, vec![BuildWarning::DefaultBondTypes(2)]);
        assert_eq!(mol.mol_type.as_deref(), Some("SMALL"));
        assert_eq!(mol.charge_type.as_deref(), Some("USER_CHARGES"));
        assert_eq!(mol.bond_type, vec!["1", "1"]);
        assert_eq!(mol.residue_name, vec![DEFAULT_RESIDUE]);
        assert_eq!(mol.no_bonds, 2);
    }

    #[test]
    fn double_bond_entries_are_written_once() {
        let mut mol = Molecule::new();
        mol.atom_name = vec!["C1".into(), "O1".into()];
        mol.atom_x = vec![0.0, 1.2];
        mol.atom_y = vec![0.0, 0.0];
        mol.atom_z = vec![0.0, 0.0];
        mol.atom_type = vec!["C.2".into(), "O.2".into()];
        mol.bond_from = vec![0, 1];
        mol.bond_to = vec![1, 0];
        Mol2::default().build(&mut mol).unwrap();

        let text = written(&mol);
        assert!(text.contains("    2     1     1 0 0\n"), "{text}");
        assert!(
            text.contains("@<TRIPOS>BOND\n      1        1        2     2 \n@<TRIPOS>SUBSTRUCTURE"),
            "{text}"
        );
    }

    #[test]
    fn round_trip_preserves_the_record() {
        let mol = built(WATERS);
        let text = written(&mol);
        let mut back = built(&text);
        back.description = mol.description.clone();
        assert_eq!(back, mol);
    }

    #[test]
    fn build_is_idempotent() {
        let mut mol = built(WATERS);
        let once = mol.clone();
        let report = Mol2::default().build(&mut mol).unwrap();
        assert!(report.is_empty());
        assert_eq!(mol, once);
    }

    #[test]
    fn writer_refuses_atoms_outside_the_residue_table() {
        let mut mol = built(WATERS);
        mol.residue_name.pop();
        mol.residue_start.pop();
        let mut out = Vec::new();
        let err = Mol2::default().write(&mut out, &mol).unwrap_err();
        assert!(matches!(
            err,
            Error::IncompleteRecord {
                field: "residue_name",
                expected: 2,
                found: 1,
                ..
            }
        ));
    }
}
