//! CHARMM protein structure files (read only, atoms and title).
//!
//! A PSF carries no coordinates, so a record read from one has atom names,
//! types, charges and masses but empty position arrays.

use std::io::BufRead;

use super::section::SectionReader;
use super::{Format, MolFormat, error::Error};
use crate::model::build::{self, BuildReport};
use crate::model::molecule::Molecule;

pub mod reader;

use reader::PsfGrammar;

#[derive(Debug, Clone, Copy, Default)]
pub struct Psf;

impl MolFormat for Psf {
    fn format(&self) -> Format {
        Format::Psf
    }

    fn read(&self, reader: &mut dyn BufRead) -> Result<Molecule, Error> {
        let mut mol = Molecule::new();
        mol.source_format = Some("PSF".to_string());
        let mut grammar = PsfGrammar;
        SectionReader::new(&mut grammar).read_into(reader, &mut mol)?;
        Ok(mol)
    }

    fn build(&self, mol: &mut Molecule) -> Result<BuildReport, Error> {
        let mut report = BuildReport::new();
        build::synthesize_residues(mol, &mut report);
        build::index_atom_types(mol);
        build::type_masses(mol, &mut report);
        mol.update_summary(true);
        mol.no_atoms = mol.atom_name.len();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
PSF EXT

       2 !NTITLE
* small test system
REMARKS generated by hand

       5 !NATOM
       1 PROA     1        ALA      N        NH3     -0.300000       14.0070           0
       2 PROA     1        ALA      HT1      HC       0.330000        1.0080           0
       3 PROA     1        ALA      CA       CT1      0.210000       12.0110           0
       4 WAT      5        TIP3     OH2      OT      -0.834000       15.9994           0
       5 WAT      5        TIP3     H1       HT       0.417000        1.0080           0

       4 !NBOND: bonds
       1       2       1       3       4       5
";

    fn read(text: &str) -> Result<Molecule, Error> {
        Psf.read(&mut Cursor::new(text))
    }

    #[test]
    fn title_and_atoms_are_read() {
        let mol = read(SAMPLE).unwrap();
        assert_eq!(mol.title.as_deref(), Some("small test system"));
        assert_eq!(mol.description, "small test system\ngenerated by hand\n");
        assert_eq!(mol.atom_name, vec!["N", "HT1", "CA", "OH2", "H1"]);
        assert_eq!(mol.atom_type, vec!["NH3", "HC", "CT1", "OT", "HT"]);
        assert_eq!(mol.atom_resid, vec![0, 0, 0, 4, 4]);
        assert_eq!(mol.atom_resname[3], "TIP3");
        assert_eq!(mol.atom_segment[4], "WAT");
        assert_eq!(mol.atom_q[3], -0.834);
        assert_eq!(mol.atom_mass[2], 12.011);
        assert!(mol.atom_x.is_empty());
        assert!(mol.bond_from.is_empty());
    }

    #[test]
    fn build_fills_residues_types_and_counts() {
        let mut mol = read(SAMPLE).unwrap();
        let report = Psf.build(&mut mol).unwrap();
        assert!(report.is_empty());
        assert_eq!(mol.residue_name, vec!["ALA", "TIP3"]);
        assert_eq!(mol.residue_start, vec![0, 3]);
        assert_eq!(mol.unique_atom_types.len(), 5);
        assert_eq!(mol.unique_atom_mass[3], 15.9994);
        assert_eq!(
            (mol.no_atoms, mol.no_residues, mol.no_atom_types),
            (5, 2, 5)
        );
    }

    #[test]
    fn atom_count_must_match_the_header() {
        let text = "3 !NATOM\n1 S 1 ALA N NH1 -0.3 14.007 0\n";
        assert!(matches!(
            read(text),
            Err(Error::CountMismatch {
                expected: 3,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn short_atom_row_is_a_parse_error() {
        let text = "1 !NATOM\n1 S 1 ALA N NH1 -0.3\n";
        assert!(matches!(read(text), Err(Error::Parse { line: 2, .. })));
    }

    #[test]
    fn remark_lines_are_ignored() {
        let text = "REMARK written by a tool\n1 !NATOM\n1 S 1 ALA N NH1 -0.3 14.007 0\n";
        let mol = read(text).unwrap();
        assert_eq!(mol.atom_name, vec!["N"]);
        assert!(mol.description.is_empty());
    }
}
