use std::path::Path;

use openmol::Format;

fn extension(path: &Path) -> Option<String> {
    Some(path.extension()?.to_str()?.to_lowercase())
}

/// Format of a topology or structure file, from its extension.
pub fn format(path: &Path) -> Option<Format> {
    match extension(path)?.as_str() {
        "prmtop" | "parm7" | "top" => Some(Format::Parm7),
        "data" | "lmp" => Some(Format::Lammps),
        "mol2" => Some(Format::Mol2),
        "pdb" | "ent" => Some(Format::Pdb),
        "psf" => Some(Format::Psf),
        "json" => Some(Format::Json),
        _ => None,
    }
}

/// Whether `path` looks like an AMBER restart (coordinate) file.
pub fn is_coordinates(path: &Path) -> bool {
    matches!(
        extension(path).as_deref(),
        Some("rst7" | "inpcrd" | "restrt" | "crd")
    )
}
