use std::fmt;
use std::io::{BufRead, Write};

use crate::config::ConvertConfig;
use crate::model::build::BuildReport;
use crate::model::molecule::Molecule;

pub mod error;
pub mod json;
pub mod lammps;
pub mod mol2;
pub mod parm7;
pub mod pdb;
pub mod psf;
pub mod section;

pub use parm7::rst7;

use error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Parm7,
    Rst7,
    Lammps,
    Mol2,
    Pdb,
    Psf,
    Json,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Parm7 => write!(f, "PARM7"),
            Format::Rst7 => write!(f, "RST7"),
            Format::Lammps => write!(f, "LAMMPS"),
            Format::Mol2 => write!(f, "MOL2"),
            Format::Pdb => write!(f, "PDB"),
            Format::Psf => write!(f, "PSF"),
            Format::Json => write!(f, "JSON"),
        }
    }
}

/// A file format adapter: reader, build stage and (optionally) writer.
pub trait MolFormat {
    fn format(&self) -> Format;

    /// Parses a complete file into a fresh record.
    fn read(&self, reader: &mut dyn BufRead) -> Result<Molecule, Error>;

    /// Fills the derived fields this format depends on.
    fn build(&self, mol: &mut Molecule) -> Result<BuildReport, Error>;

    fn write(&self, _writer: &mut dyn Write, _mol: &Molecule) -> Result<(), Error> {
        Err(Error::UnsupportedWriteFormat(self.format()))
    }
}

/// Returns the adapter for `format`.
///
/// RST7 has no adapter of its own: it only supplies coordinates to a PARM7
/// record, see [`MolReader::read_with_coordinates`].
pub fn adapter(format: Format, config: &ConvertConfig) -> Result<Box<dyn MolFormat>, Error> {
    Ok(match format {
        Format::Parm7 => Box::new(parm7::Parm7),
        Format::Lammps => Box::new(lammps::Lammps::new(config.lammps.clone())),
        Format::Mol2 => Box::new(mol2::Mol2::new(config.mol2.clone())),
        Format::Pdb => Box::new(pdb::Pdb),
        Format::Psf => Box::new(psf::Psf),
        Format::Json => Box::new(json::Json::default()),
        Format::Rst7 => return Err(Error::UnsupportedReadFormat(format)),
    })
}

/// Runs the build stage of `format` on `mol`.
pub fn build_for(
    format: Format,
    config: &ConvertConfig,
    mol: &mut Molecule,
) -> Result<BuildReport, Error> {
    adapter(format, config)?.build(mol)
}

pub struct MolReader<R: BufRead> {
    input: R,
    format: Format,
    config: ConvertConfig,
}

impl<R: BufRead> MolReader<R> {
    pub fn new(input: R, format: Format) -> Self {
        Self {
            input,
            format,
            config: ConvertConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    pub fn read(mut self) -> Result<Molecule, Error> {
        let mol = adapter(self.format, &self.config)?.read(&mut self.input)?;
        log::info!(
            "read {} atoms and {} bonds from {} input",
            mol.atom_count(),
            mol.bond_count(),
            self.format
        );
        Ok(mol)
    }

    /// Reads a PARM7 topology and takes coordinates, velocities and box from
    /// an RST7 restart file.
    pub fn read_with_coordinates<C: BufRead>(self, mut coordinates: C) -> Result<Molecule, Error> {
        if self.format != Format::Parm7 {
            return Err(Error::UnsupportedReadFormat(Format::Rst7));
        }
        let mut mol = self.read()?;
        parm7::rst7::read_into(&mut coordinates, &mut mol)?;
        Ok(mol)
    }
}

pub struct MolWriter<W: Write> {
    output: W,
    format: Format,
    config: ConvertConfig,
}

impl<W: Write> MolWriter<W> {
    pub fn new(output: W, format: Format) -> Self {
        Self {
            output,
            format,
            config: ConvertConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConvertConfig) -> Self {
        self.config = config;
        self
    }

    pub fn write(mut self, mol: &Molecule) -> Result<(), Error> {
        adapter(self.format, &self.config)?.write(&mut self.output, mol)?;
        self.output.flush()?;
        log::info!("wrote {} atoms as {}", mol.atom_count(), self.format);
        Ok(())
    }
}
