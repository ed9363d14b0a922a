//! Protein Data Bank files (read only).
//!
//! Besides the standard records the reader understands `REMARK CONECT`
//! lines, which carry bond order and tacticity next to each partner atom:
//! `REMARK CONECT 3 2:1.5:1 4:2`. Atoms in these lines are 1-based positions
//! in the file, while standard `CONECT` records name atom serial numbers.
//! A partner repeated on a standard `CONECT` record is a higher bond order.

use std::io::BufRead;

use super::section::SectionReader;
use super::{Format, MolFormat, error::Error};
use crate::model::build::{self, BuildReport, BuildWarning};
use crate::model::molecule::Molecule;

pub mod reader;

use reader::PdbGrammar;

#[derive(Debug, Clone, Copy, Default)]
pub struct Pdb;

impl MolFormat for Pdb {
    fn format(&self) -> Format {
        Format::Pdb
    }

    fn read(&self, reader: &mut dyn BufRead) -> Result<Molecule, Error> {
        let mut mol = Molecule::new();
        mol.source_format = Some("PDB".to_string());
        let mut grammar = PdbGrammar::default();
        SectionReader::new(&mut grammar).read_into(reader, &mut mol)?;
        Ok(mol)
    }

    fn build(&self, mol: &mut Molecule) -> Result<BuildReport, Error> {
        let mut report = BuildReport::new();

        build::rebase_residue_resets(mol, Format::Pdb)?;
        build::fill_elements(mol, &mut report);
        for (atom, &z) in mol.atom_atomic_no.iter().enumerate() {
            if z == 0 {
                report.push(BuildWarning::UnknownElement {
                    atom,
                    name: mol.atom_name[atom].clone(),
                });
            }
        }
        build::synthesize_residues(mol, &mut report);
        build::index_atom_types(mol);
        mol.update_summary(true);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::check;
    use std::io::Cursor;

    const SAMPLE: &str = "\
REMARK   1 generated for testing
REMARK   2 two chains
TITLE     SMALL PEPTIDE
TITLE    2 WITH A ZINC ION
CRYST1   30.000   40.000   50.000  90.00  90.00 120.00 P 1           1
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00      PROA N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00 10.50      PROA C
ATOM      3  C  BALA A   1      13.140   5.928  -5.188  0.50  0.00      PROA C
ATOM      4  N   GLY A   2A     13.650   5.808  -3.970  1.00  0.00      PROA N
TER
ATOM      5  N   ALA B   1       1.000   2.000   3.000  1.00  0.00      PROB N
HETATM    6 ZN    ZN B   2       4.000   5.000   6.000  1.00  0.00          ZN2+
REMARK   3 connectivity
REMARK CONECT 1 2
REMARK CONECT 2 1 3:1.5
REMARK CONECT 3 2:1.5:1 4:2
CONECT    4    3
CONECT    5    6
END
";

    fn read(text: &str) -> Result<Molecule, Error> {
        Pdb.read(&mut Cursor::new(text))
    }

    fn built(text: &str) -> (Molecule, BuildReport) {
        let mut mol = read(text).unwrap();
        let report = Pdb.build(&mut mol).unwrap();
        (mol, report)
    }

    #[test]
    fn header_records_fill_title_description_and_cell() {
        let mol = read(SAMPLE).unwrap();
        assert_eq!(mol.title.as_deref(), Some("SMALL PEPTIDE WITH A ZINC ION"));
        assert_eq!(mol.description, "1 generated for testing 2 two chains");
        assert_eq!((mol.box_x, mol.box_y, mol.box_z), (30.0, 40.0, 50.0));
        assert_eq!(mol.box_gamma, 120.0);
    }

    #[test]
    fn atom_columns_are_read_by_position() {
        let mol = read(SAMPLE).unwrap();
        assert_eq!(mol.atom_count(), 6);
        assert_eq!(mol.atom_name, vec!["N", "CA", "C", "N", "N", "ZN"]);
        assert_eq!(mol.atom_altloc[2], "B");
        assert_eq!(mol.atom_icode[3], "A");
        assert_eq!(mol.atom_chain, vec!["A", "A", "A", "A", "B", "B"]);
        assert_eq!(mol.atom_resid, vec![0, 0, 0, 1, 0, 1]);
        assert_eq!(mol.atom_resname[5], "ZN");
        assert_eq!(mol.atom_x[1], 11.639);
        assert_eq!(mol.atom_z[0], -6.504);
        assert_eq!(mol.atom_occupancy[2], 0.5);
        assert_eq!(mol.atom_temp_factor[1], 10.5);
        assert_eq!(mol.atom_segment[4], "PROB");
        assert_eq!(mol.atom_segment[5], "");
        assert_eq!(mol.atom_type, vec!["N", "C", "C", "N", "N", "ZN"]);
        assert_eq!(mol.atom_atomic_no, vec![7, 6, 6, 7, 7, 30]);
        assert_eq!(mol.atom_q[5], 2.0);
        assert_eq!(mol.atom_q[0], 0.0);
    }

    #[test]
    fn tagged_and_standard_conect_records_become_bonds() {
        let mol = read(SAMPLE).unwrap();
        assert_eq!(mol.bond_from, vec![0, 1, 2, 4]);
        assert_eq!(mol.bond_to, vec![1, 2, 3, 5]);
        assert_eq!(mol.bond_type, vec!["1", "ar", "2", "1"]);
        assert_eq!(mol.bond_tacticity, vec![0, 0, 0, 0]);
    }

    #[test]
    fn missing_element_columns_are_guessed_from_names() {
        let text = "\
ATOM      1  CA  GLY A   1       0.000   0.000   0.000
ATOM      2 1HB  GLY A   1       1.000   0.000   0.000
ATOM      3  O   GLY A   1       2.000   0.000   0.000  1.00  0.00           O1-
";
        let mol = read(text).unwrap();
        assert_eq!(mol.atom_type, vec!["C", "H", "O"]);
        assert_eq!(mol.atom_atomic_no, vec![6, 1, 8]);
        assert_eq!(mol.atom_occupancy, vec![0.0, 0.0, 1.0]);
        assert_eq!(mol.atom_q, vec![0.0, 0.0, -1.0]);
    }

    #[test]
    fn numeric_element_column_is_rejected() {
        let text = "ATOM      1  CA  GLY A   1       0.000   0.000   0.000  1.00  0.00          12\n";
        assert!(matches!(read(text), Err(Error::Parse { line: 1, .. })));
    }

    #[test]
    fn unreadable_coordinate_is_a_parse_error() {
        let text = "ATOM      1  CA  GLY A   1       0.000   abcde   0.000\n";
        assert!(matches!(read(text), Err(Error::Parse { line: 1, .. })));
    }

    #[test]
    fn bonds_to_unknown_serials_are_dropped() {
        let text = "\
ATOM      1  CA  GLY A   1       0.000   0.000   0.000
ATOM      2  C   GLY A   1       1.000   0.000   0.000
CONECT    1    2   99
CONECT    2    1
";
        let mol = read(text).unwrap();
        assert_eq!(mol.bond_from, vec![0]);
        assert_eq!(mol.bond_to, vec![1]);
    }

    #[test]
    fn repeated_conect_partners_keep_the_bond_order() {
        let text = "\
ATOM      1  C1  ETH A   1       0.000   0.000   0.000                       C
ATOM      2  C2  ETH A   1       1.340   0.000   0.000                       C
CONECT    1    2    2
CONECT    2    1    1
";
        let (mut mol, _) = built(text);
        assert_eq!(mol.bond_from, vec![0, 0]);
        assert_eq!(mol.bond_to, vec![1, 1]);

        let mol2 = crate::io::mol2::Mol2::default();
        mol2.build(&mut mol).unwrap();
        let mut out = Vec::new();
        mol2.write(&mut out, &mol).unwrap();
        let out = String::from_utf8(out).unwrap();
        let bonds: Vec<Vec<&str>> = out
            .lines()
            .skip_while(|l| *l != "@<TRIPOS>BOND")
            .skip(1)
            .take_while(|l| !l.starts_with("@<TRIPOS>"))
            .map(|l| l.split_whitespace().collect())
            .collect();
        assert_eq!(bonds, vec![vec!["1", "1", "2", "2"]]);
    }

    #[test]
    fn tagged_conect_ids_are_atom_positions() {
        let text = "\
ATOM    101  C1  ETH A   1       0.000   0.000   0.000                       C
ATOM    102  C2  ETH A   1       1.340   0.000   0.000                       C
ATOM    103  O   ETH A   1       2.000   1.000   0.000                       O
REMARK   1 connectivity
REMARK CONECT 1 2:2
REMARK CONECT 2 1:2 3
CONECT  103  102
";
        let mol = read(text).unwrap();
        assert_eq!(mol.bond_from, vec![0, 1]);
        assert_eq!(mol.bond_to, vec![1, 2]);
        assert_eq!(mol.bond_type, vec!["2", "1"]);
    }

    #[test]
    fn build_rebases_chain_resets_and_fills_residues() {
        let (mol, report) = built(SAMPLE);
        assert!(report.is_empty(), "{:?}", report.warnings);
        assert_eq!(mol.atom_resid, vec![0, 0, 0, 1, 2, 3]);
        assert_eq!(mol.residue_name, vec!["ALA", "GLY", "ALA", "ZN"]);
        assert_eq!(mol.residue_start, vec![0, 3, 4, 5]);
        assert_eq!(mol.unique_atom_types, vec!["N", "C", "ZN"]);
        assert_eq!(mol.atom_type_index, vec![0, 1, 1, 0, 0, 2]);
        assert!((mol.atom_mass[5] - 65.38).abs() < 0.1);
        assert_eq!(
            (mol.no_atoms, mol.no_bonds, mol.no_residues, mol.no_atom_types),
            (6, 4, 4, 3)
        );
        assert!(check::check(&mol));
    }

    #[test]
    fn build_reports_unknown_elements() {
        let text = "ATOM      1  XX  UNK A   1       0.000   0.000   0.000\n";
        let (mol, report) = built(text);
        assert_eq!(mol.atom_atomic_no, vec![0]);
        assert_eq!(mol.atom_type, vec!["XX"]);
        assert_eq!(
            report.warnings,
            vec![BuildWarning::UnknownElement {
                atom: 0,
                name: "XX".to_string()
            }]
        );
    }

    #[test]
    fn residue_ids_may_only_drop_back_to_the_first() {
        let text = "\
ATOM      1  CA  GLY A   5       0.000   0.000   0.000
ATOM      2  CA  GLY A   3       1.000   0.000   0.000
";
        let mut mol = read(text).unwrap();
        assert!(matches!(
            Pdb.build(&mut mol),
            Err(Error::ResidueOrder {
                atom: 1,
                previous: 4,
                current: 2,
                ..
            })
        ));
    }
}
