use std::io::{self, Write};

use anyhow::Result;

use openmol::ConvertConfig;

use super::{all_passed, build, read_record, run_checks};
use crate::cli::InputArgs;
use crate::display::{Context as DisplayContext, print_build_report, print_check_results};

/// Returns whether every check passed; the exit status follows it.
pub fn run(args: InputArgs, _ctx: DisplayContext) -> Result<bool> {
    let config = ConvertConfig::default();
    let (mut mol, format) = read_record(&args, &config)?;
    let report = build(&mut mol, &[format], &config)?;

    let results = run_checks(&mol);
    let passed = all_passed(&results);
    if !args.quiet {
        let mut out = io::stdout().lock();
        print_build_report(&mut out, &report);
        print_check_results(&mut out, &results);
        writeln!(out, "{}", if passed { "OK" } else { "FAILED" })?;
    }
    Ok(passed)
}
