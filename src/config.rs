//! Conversion options loadable from TOML.
//!
//! Every field has a default, so an empty document (or a document naming
//! only a few keys) yields a complete configuration:
//!
//! ```toml
//! [lammps]
//! box_padding = 5.0
//!
//! [mol2]
//! mol_type = "PROTEIN"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML document is malformed or has values of the wrong type.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    #[serde(default)]
    pub lammps: LammpsConfig,
    #[serde(default)]
    pub mol2: Mol2Config,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LammpsConfig {
    /// Margin added around the atom extent on axes without a box length.
    #[serde(default = "default_box_padding")]
    pub box_padding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mol2Config {
    #[serde(default = "default_mol_type")]
    pub mol_type: String,
    #[serde(default = "default_charge_type")]
    pub charge_type: String,
    #[serde(default = "default_residue_type")]
    pub residue_type: String,
}

fn default_box_padding() -> f64 {
    3.0
}
fn default_mol_type() -> String {
    "SMALL".to_string()
}
fn default_charge_type() -> String {
    "USER_CHARGES".to_string()
}
pub(crate) fn default_residue_type() -> String {
    "RESIDUE".to_string()
}

impl Default for LammpsConfig {
    fn default() -> Self {
        Self {
            box_padding: default_box_padding(),
        }
    }
}

impl Default for Mol2Config {
    fn default() -> Self {
        Self {
            mol_type: default_mol_type(),
            charge_type: default_charge_type(),
            residue_type: default_residue_type(),
        }
    }
}

impl ConvertConfig {
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
