//! LAMMPS data files in the `full` atom style.

use std::io::{BufRead, Write};

use super::section::SectionReader;
use super::{Format, MolFormat, error::Error};
use crate::config::LammpsConfig;
use crate::model::build::{self, BuildReport};
use crate::model::molecule::Molecule;

pub mod reader;
pub mod writer;

use reader::LammpsGrammar;

#[derive(Debug, Clone, Default)]
pub struct Lammps {
    config: LammpsConfig,
}

impl Lammps {
    pub fn new(config: LammpsConfig) -> Self {
        Self { config }
    }
}

impl MolFormat for Lammps {
    fn format(&self) -> Format {
        Format::Lammps
    }

    fn read(&self, reader: &mut dyn BufRead) -> Result<Molecule, Error> {
        let mut mol = Molecule::new();
        mol.source_format = Some("LAMMPS full".to_string());
        let mut grammar = LammpsGrammar::default();
        SectionReader::new(&mut grammar).read_into(reader, &mut mol)?;
        Ok(mol)
    }

    fn build(&self, mol: &mut Molecule) -> Result<BuildReport, Error> {
        let mut report = BuildReport::new();

        build::expand_residues(mol);
        build::synthesize_residues(mol, &mut report);
        build::index_atom_types(mol);
        if mol.unique_atom_mass.len() != mol.unique_atom_types.len() && mol.atom_mass.is_empty() {
            build::fill_elements(mol, &mut report);
        }
        build::type_masses(mol, &mut report);
        build::pair_coefficients(mol, &mut report);

        mol.update_summary(false);
        report.check_len("atom_x", mol.no_atoms, mol.atom_count());
        report.check_len("bond_from", mol.no_bonds, mol.bond_count());
        if mol.no_bond_types == 0 {
            mol.no_bond_types = mol.ff_bond_k.len();
        }
        if mol.no_angle_types == 0 {
            mol.no_angle_types = mol.ff_angle_k.len();
        }
        if mol.no_dihed_types == 0 {
            mol.no_dihed_types = mol.ff_dihed_k.len();
        }

        Ok(report)
    }

    fn write(&self, writer: &mut dyn Write, mol: &Molecule) -> Result<(), Error> {
        writer::write(writer, mol, &self.config)
    }
}
