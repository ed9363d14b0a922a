//! A canonical molecular topology record and the file formats that convert
//! to and from it.
//!
//! Every reader fills the same [`Molecule`]: index-aligned arrays of atoms,
//! bonds, angles, dihedrals and residues, the force-field tables a topology
//! carries, a periodic box and summary counts. A per-format build stage then
//! derives what the target format needs (residue tables, unique atom types,
//! per-type masses and Lennard-Jones parameters) so the record can be written
//! in another format or persisted as JSON.
//!
//! # Features
//!
//! - **AMBER**: PARM7 topologies, with coordinates and velocities from RST7
//!   restart files
//! - **LAMMPS**: `atom_style full` data files, read and written
//! - **MOL2**: TRIPOS MOL2, read and written, with bond orders and
//!   substructure records
//! - **PDB and PSF**: read only
//! - **JSON**: lossless persisted form of the record
//! - **Checks**: structural consistency checks that report every problem
//!
//! # Quick Start
//!
//! ```
//! use openmol::io::{Format, MolReader, MolWriter, build_for};
//! use openmol::ConvertConfig;
//!
//! let mol2 = "\
//! @<TRIPOS>MOLECULE
//! water
//!     3     2     1
//! SMALL
//! USER_CHARGES
//! @<TRIPOS>ATOM
//!       1 OW    0.0000  0.0000  0.0000 O.3   1 WAT  -0.834
//!       2 HW1   0.9572  0.0000  0.0000 H     1 WAT   0.417
//!       3 HW2  -0.2400  0.9266  0.0000 H     1 WAT   0.417
//! @<TRIPOS>BOND
//!      1     1     2    1
//!      2     1     3    1
//! @<TRIPOS>SUBSTRUCTURE
//!      1 WAT     1 RESIDUE
//! ";
//!
//! let config = ConvertConfig::default();
//! let mut mol = MolReader::new(mol2.as_bytes(), Format::Mol2).read()?;
//! build_for(Format::Mol2, &config, &mut mol)?;
//!
//! assert_eq!(mol.no_atoms, 3);
//! assert_eq!(mol.unique_atom_types, vec!["O.3", "H"]);
//! assert!(openmol::model::check::check(&mol));
//!
//! let mut out = Vec::new();
//! MolWriter::new(&mut out, Format::Json).write(&mol)?;
//! let back = openmol::io::json::read(out.as_slice())?;
//! assert_eq!(back, mol);
//! # Ok::<(), openmol::io::error::Error>(())
//! ```
//!
//! # Module Organization
//!
//! - [`model`]: The record, element data, build steps and checks
//! - [`io`]: Format adapters, the shared section parser and JSON
//! - [`config`]: Conversion options loaded from TOML

pub mod config;
pub mod io;
pub mod model;

pub use config::{ConvertConfig, LammpsConfig, Mol2Config};
pub use io::error::Error;
pub use io::{Format, MolFormat, MolReader, MolWriter};
pub use model::build::{BuildReport, BuildWarning};
pub use model::molecule::{AmberTables, AtomFilter, Molecule};
