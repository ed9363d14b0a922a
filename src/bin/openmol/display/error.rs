use std::io::{self, Write};

use anyhow::Error;

use openmol::Format;

use crate::util::text::wrap;

#[rustfmt::skip]
pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();

    let _ = writeln!(stderr);
    let _ = writeln!(stderr, "   ╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(stderr, "   ║  ✗ Error                                                     ║");
    let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");

    for line in wrap(&err.to_string(), 59) {
        let _ = writeln!(stderr, "   ║  {:<59} ║", line);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Caused by:                                                  ║");
        for line in wrap(&cause.to_string(), 59) {
            let _ = writeln!(stderr, "   ║    {:<57} ║", line);
        }
        source = cause.source();
    }

    let hints = hints(err);
    if !hints.is_empty() {
        let _ = writeln!(stderr, "   ╟──────────────────────────────────────────────────────────────╢");
        let _ = writeln!(stderr, "   ║  Hints:                                                      ║");
        for hint in hints {
            let wrapped = wrap(&hint, 55);
            if let Some((first, rest)) = wrapped.split_first() {
                let _ = writeln!(stderr, "   ║    • {:<55} ║", first);
                for line in rest {
                    let _ = writeln!(stderr, "   ║      {:<55} ║", line);
                }
            }
        }
    }

    let _ = writeln!(stderr, "   ╚══════════════════════════════════════════════════════════════╝");
    let _ = writeln!(stderr);
}

/// Suggestions for the first library error found in the cause chain.
fn hints(err: &Error) -> Vec<String> {
    if let Some(e) = err.chain().find_map(|c| c.downcast_ref::<openmol::Error>()) {
        return io_hints(e);
    }
    if let Some(e) = err.chain().find_map(|c| c.downcast_ref::<openmol::config::Error>()) {
        return match e {
            openmol::config::Error::Io(_) => vec!["Check the --config path".to_string()],
            openmol::config::Error::Parse(_) => vec![
                "The configuration is TOML with [lammps] and [mol2] tables".to_string(),
                "Every key is optional; remove unknown value types".to_string(),
            ],
        };
    }
    if let Some(e) = err.chain().find_map(|c| c.downcast_ref::<std::io::Error>()) {
        return std_io_hints(e);
    }
    Vec::new()
}

fn io_hints(err: &openmol::Error) -> Vec<String> {
    use openmol::Error as IoError;

    let mut hints = Vec::new();
    match err {
        IoError::Io { source } => hints.extend(std_io_hints(source)),

        IoError::Parse { format, line, .. } => {
            hints.push(format!(
                "Parser encountered an issue near line {line} in {format} format"
            ));
            hints.push("Inspect the file around that line for malformed entries".to_string());
            hints.push("Try specifying --from to ensure correct format detection".to_string());
            hints.extend(format_hints(*format).iter().map(|h| h.to_string()));
        }

        IoError::CountMismatch { section, .. } => {
            hints.push(format!(
                "The {section} section is shorter or longer than its header says"
            ));
            hints.push("The file may be truncated or hand edited".to_string());
        }

        IoError::ResidueOrder { atom, .. } => {
            hints.push(format!("Residue numbering goes backwards at atom {}", atom + 1));
            hints.push("Atoms must be grouped by residue in file order".to_string());
        }

        IoError::IncompleteRecord { field, .. } => {
            hints.push(format!("The record has no complete '{field}' data"));
            hints.push(
                "Convert from a format that carries it, or use --to json to keep what is there"
                    .to_string(),
            );
        }

        IoError::UnsupportedReadFormat(format) => {
            hints.push(format!("The '{format}' format cannot be used for this input"));
            hints.push("RST7 coordinates are read with -c next to a PARM7 topology".to_string());
        }

        IoError::UnsupportedWriteFormat(format) => {
            hints.push(format!("The '{format}' format cannot be used for output"));
            hints.push("Supported output formats: lammps, mol2, json".to_string());
        }

        IoError::Json { .. } => {
            hints.push("The JSON file is not a record written by openmol".to_string());
        }
    }
    hints
}

fn format_hints(format: Format) -> &'static [&'static str] {
    match format {
        Format::Parm7 => &[
            "PARM7: every %FLAG needs a %FORMAT line before its data",
            "PARM7: check that POINTERS matches the section lengths",
        ],
        Format::Rst7 => &["RST7: the atom count must match the topology"],
        Format::Lammps => &["LAMMPS: only atom_style full data files are read"],
        Format::Mol2 => &[
            "MOL2: verify @<TRIPOS>ATOM and @<TRIPOS>BOND sections",
            "MOL2: ATOM records need at least six columns",
        ],
        Format::Pdb => &["PDB: check ATOM/HETATM column alignment (columns 1-80)"],
        Format::Psf => &["PSF: NATOM records need eight columns"],
        Format::Json => &[],
    }
}

fn std_io_hints(source: &std::io::Error) -> Vec<String> {
    use std::io::ErrorKind;

    let hints: &[&str] = match source.kind() {
        ErrorKind::NotFound => &[
            "File or directory not found",
            "Check the path spelling and ensure the file exists",
        ],
        ErrorKind::PermissionDenied => &[
            "Permission denied accessing the file",
            "Ensure you have read/write access as needed",
        ],
        ErrorKind::InvalidData => &["File contains invalid or non UTF-8 data"],
        ErrorKind::BrokenPipe => &["Output consumer terminated early"],
        _ => &["Check file path, permissions, and disk space"],
    };
    hints.iter().map(|h| h.to_string()).collect()
}
