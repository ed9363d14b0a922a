//! The canonical persisted form of a [`Molecule`].
//!
//! Field names are the record's own. Unknown keys are ignored on load and
//! missing keys take their zero value, so files written by older or newer
//! versions stay readable.

use super::{Format, MolFormat, error::Error};
use crate::model::build::BuildReport;
use crate::model::molecule::Molecule;
use std::io::{BufRead, Write};

pub fn read<R: BufRead>(reader: R) -> Result<Molecule, Error> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn write<W: Write>(mut writer: W, mol: &Molecule, compact: bool) -> Result<(), Error> {
    if compact {
        serde_json::to_writer(&mut writer, mol)?;
    } else {
        serde_json::to_writer_pretty(&mut writer, mol)?;
    }
    writeln!(writer)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Json {
    pub compact: bool,
}

impl MolFormat for Json {
    fn format(&self) -> Format {
        Format::Json
    }

    fn read(&self, reader: &mut dyn BufRead) -> Result<Molecule, Error> {
        read(reader)
    }

    fn build(&self, mol: &mut Molecule) -> Result<BuildReport, Error> {
        mol.update_summary(false);
        Ok(BuildReport::new())
    }

    fn write(&self, writer: &mut dyn Write, mol: &Molecule) -> Result<(), Error> {
        write(writer, mol, self.compact)
    }
}
