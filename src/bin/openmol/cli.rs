use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use openmol::Format;

#[derive(Parser)]
#[command(
    name = "openmol",
    about = "Convert molecular topologies between AMBER, LAMMPS, MOL2, PDB, PSF and JSON",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Log more detail (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read, build for the target format, check and write
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Read and build a record, then run every consistency check
    Check(InputArgs),

    /// Print summary counts of a record
    Info(InputArgs),
}

impl Command {
    pub fn quiet(&self) -> bool {
        match self {
            Command::Convert(args) => args.input.quiet,
            Command::Check(args) | Command::Info(args) => args.quiet,
        }
    }
}

/// Input options shared by all commands.
#[derive(Args)]
pub struct InputArgs {
    /// Input file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Coordinate file (RST7) for a PARM7 topology
    #[arg(short, long, value_name = "FILE")]
    pub coordinates: Option<PathBuf>,

    /// Input format (inferred from extension if not specified)
    #[arg(long, value_name = "FORMAT")]
    pub from: Option<FormatArg>,

    /// Suppress progress output and logging
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output file (stdout if omitted, requires --to)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (inferred from extension if not specified)
    #[arg(long, value_name = "FORMAT")]
    pub to: Option<FormatArg>,

    /// Conversion options (TOML file)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write JSON on a single line
    #[arg(long)]
    pub compact: bool,

    /// Abort when the consistency checks fail
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub overrides: OverrideOptions,
}

/// Command-line values that take precedence over the configuration file.
#[derive(Args)]
#[command(next_help_heading = "Overrides")]
pub struct OverrideOptions {
    /// LAMMPS box margin around the atoms on axes without a box length (Å)
    #[arg(long, value_name = "Å")]
    pub box_padding: Option<f64>,

    /// MOL2 molecule type written when the record has none
    #[arg(long, value_name = "TYPE")]
    pub mol_type: Option<String>,

    /// MOL2 charge type written when the record has none
    #[arg(long, value_name = "TYPE")]
    pub charge_type: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// AMBER topology
    #[value(alias = "prmtop")]
    Parm7,
    /// LAMMPS data file (atom_style full)
    #[value(alias = "data")]
    Lammps,
    /// TRIPOS MOL2
    Mol2,
    /// Protein Data Bank
    Pdb,
    /// CHARMM protein structure file
    Psf,
    /// Canonical JSON record
    Json,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Parm7 => Format::Parm7,
            FormatArg::Lammps => Format::Lammps,
            FormatArg::Mol2 => Format::Mol2,
            FormatArg::Pdb => Format::Pdb,
            FormatArg::Psf => Format::Psf,
            FormatArg::Json => Format::Json,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_flags_parse() {
        let cli = Cli::try_parse_from([
            "openmol", "convert", "-i", "a.prmtop", "-c", "a.rst7", "-o", "a.data", "--strict",
            "--box-padding", "4.5", "-q",
        ])
        .unwrap();
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input.input, PathBuf::from("a.prmtop"));
        assert_eq!(args.input.coordinates, Some(PathBuf::from("a.rst7")));
        assert!(args.strict && args.input.quiet);
        assert_eq!(args.overrides.box_padding, Some(4.5));
    }

    #[test]
    fn format_names_and_aliases() {
        let cli = Cli::try_parse_from(["openmol", "info", "-i", "x", "--from", "prmtop"]).unwrap();
        let Command::Info(args) = cli.command else {
            panic!("expected info");
        };
        assert_eq!(args.from, Some(FormatArg::Parm7));
        assert_eq!(Format::from(FormatArg::Lammps), Format::Lammps);
    }
}
