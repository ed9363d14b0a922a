//! The canonical molecule record and the algorithms that operate on it.
//!
//! - [`molecule`] – The record itself: index-aligned per-atom, per-bond and
//!   per-residue arrays, force-field tables, box and summary counts, plus
//!   record editing (translate, insert, select).
//! - [`element`] – Element symbols and standard masses by atomic number.
//! - [`check`] – Structural consistency checks that log every failure.
//! - [`build`] – Normalization steps shared by the per-format build stages,
//!   reporting advisory problems through [`build::BuildReport`].
//!
//! Readers populate whatever a file provides; a build stage then fills the
//! derived fields its format depends on, and writers consume the result
//! without modifying it.

pub mod build;
pub mod check;
pub mod element;
pub mod molecule;
