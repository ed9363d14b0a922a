use std::io::Write;

use anyhow::{Context, Result, bail};
use log::warn;

use openmol::io::json;
use openmol::{ConvertConfig, Format, Molecule, MolWriter};

use super::{all_passed, build, read_record, run_checks};
use crate::cli::{ConvertArgs, OverrideOptions};
use crate::display::{Context as DisplayContext, Progress, print_build_report, print_check_results};
use crate::io::{create_output, infer_format};

const TOTAL_STEPS: u8 = 4;

pub fn run(args: ConvertArgs, ctx: DisplayContext) -> Result<bool> {
    let output_format = resolve_output_format(&args)?;
    let config = load_config(&args)?;

    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Reading input");
    let (mut mol, input_format) = read_record(&args.input, &config)?;
    progress.complete_step(
        "Reading input",
        &[format!(
            "{input_format}: {} atoms, {} bonds",
            mol.atom_count(),
            mol.bond_count()
        )],
    );

    progress.step("Building record");
    let report = build(&mut mol, &[input_format, output_format], &config)?;
    progress.complete_step(
        "Building record",
        &[format!("{} warnings", report.len())],
    );
    if ctx.interactive {
        print_build_report(&mut std::io::stderr().lock(), &report);
    }

    progress.step("Checking consistency");
    let results = run_checks(&mol);
    let passed = all_passed(&results);
    progress.complete_step("Checking consistency", &[]);
    if !passed {
        print_check_results(&mut std::io::stderr().lock(), &results);
        if args.strict {
            bail!("The record failed its consistency checks (--strict)");
        }
        warn!("record failed consistency checks, writing anyway");
    }

    progress.step("Writing output");
    write_output(&args, &mol, output_format, &config)?;
    let target = args
        .output
        .as_ref()
        .and_then(|p| p.file_name())
        .map_or_else(|| "stdout".to_string(), |n| n.to_string_lossy().into_owned());
    progress.complete_step("Writing output", &[format!("{output_format} → {target}")]);

    progress.finish("Conversion complete");
    Ok(true)
}

fn resolve_output_format(args: &ConvertArgs) -> Result<Format> {
    if let Some(fmt) = args.to {
        return Ok(fmt.into());
    }
    match &args.output {
        Some(path) => infer_format(path).with_context(|| {
            format!(
                "Cannot infer format from '{}'. Use --to to specify.",
                path.display()
            )
        }),
        None => bail!("Writing to stdout requires --to"),
    }
}

fn load_config(args: &ConvertArgs) -> Result<ConvertConfig> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => ConvertConfig::default(),
    };
    apply_overrides(&mut config, &args.overrides);
    Ok(config)
}

fn apply_overrides(config: &mut ConvertConfig, overrides: &OverrideOptions) {
    if let Some(padding) = overrides.box_padding {
        config.lammps.box_padding = padding;
    }
    if let Some(mol_type) = &overrides.mol_type {
        config.mol2.mol_type = mol_type.clone();
    }
    if let Some(charge_type) = &overrides.charge_type {
        config.mol2.charge_type = charge_type.clone();
    }
}

fn write_output(
    args: &ConvertArgs,
    mol: &Molecule,
    format: Format,
    config: &ConvertConfig,
) -> Result<()> {
    let mut output = create_output(args.output.as_deref())?;
    if format == Format::Json {
        json::write(&mut output, mol, args.compact).context("Failed to write JSON")?;
        output.flush().context("Failed to write JSON")?;
        return Ok(());
    }
    MolWriter::new(output, format)
        .with_config(config.clone())
        .write(mol)
        .with_context(|| format!("Failed to write {format} output"))
}
