mod check;
mod convert;
mod info;

use anyhow::{Context, Result, bail};

use openmol::io::{MolReader, build_for};
use openmol::model::check as checks;
use openmol::{BuildReport, ConvertConfig, Format, Molecule};

use crate::cli::{Command, InputArgs};
use crate::display::Context as DisplayContext;
use crate::io::{infer_format, is_coordinates, open_input};

pub fn dispatch(command: Command, ctx: DisplayContext) -> Result<bool> {
    match command {
        Command::Convert(args) => convert::run(args, ctx),
        Command::Check(args) => check::run(args, ctx),
        Command::Info(args) => info::run(args, ctx),
    }
}

fn resolve_input_format(args: &InputArgs) -> Result<Format> {
    if let Some(fmt) = args.from {
        return Ok(fmt.into());
    }
    if is_coordinates(&args.input) {
        bail!(
            "'{}' is a coordinate file. Pass the PARM7 topology with -i and the coordinates with -c.",
            args.input.display()
        );
    }
    match infer_format(&args.input) {
        Some(fmt) => Ok(fmt),
        None => bail!(
            "Cannot infer format from '{}'. Use --from to specify.",
            args.input.display()
        ),
    }
}

/// Reads the input record, with coordinates when `-c` is given.
fn read_record(args: &InputArgs, config: &ConvertConfig) -> Result<(Molecule, Format)> {
    let format = resolve_input_format(args)?;
    let input = open_input(&args.input)?;
    let reader = MolReader::new(input, format).with_config(config.clone());

    let mol = match &args.coordinates {
        Some(path) => reader
            .read_with_coordinates(open_input(path)?)
            .with_context(|| format!("Failed to read coordinates from {}", path.display()))?,
        None => reader
            .read()
            .with_context(|| format!("Failed to read {}", args.input.display()))?,
    };
    Ok((mol, format))
}

/// Runs the build stage of each format in turn, merging their reports.
fn build(mol: &mut Molecule, formats: &[Format], config: &ConvertConfig) -> Result<BuildReport> {
    let mut report = BuildReport::new();
    for (i, &format) in formats.iter().enumerate() {
        if formats[..i].contains(&format) {
            continue;
        }
        let stage = build_for(format, config, mol)
            .with_context(|| format!("Failed to build the record for {format}"))?;
        report.warnings.extend(stage.warnings);
    }
    Ok(report)
}

fn run_checks(mol: &Molecule) -> Vec<(&'static str, bool)> {
    vec![
        ("Atoms", checks::atoms_ok(mol)),
        ("Bonds", checks::bonds_ok(mol)),
        ("Residues", checks::residues_ok(mol)),
        ("Indices", checks::indices_ok(mol)),
    ]
}

fn all_passed(results: &[(&str, bool)]) -> bool {
    results.iter().all(|&(_, ok)| ok)
}
