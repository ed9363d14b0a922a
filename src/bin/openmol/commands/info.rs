use std::io;

use anyhow::Result;

use openmol::ConvertConfig;

use super::{build, read_record};
use crate::cli::InputArgs;
use crate::display::{Context as DisplayContext, print_record_summary, print_type_table};

pub fn run(args: InputArgs, _ctx: DisplayContext) -> Result<bool> {
    let config = ConvertConfig::default();
    let (mut mol, format) = read_record(&args, &config)?;
    build(&mut mol, &[format], &config)?;

    let mut out = io::stdout().lock();
    print_record_summary(&mut out, &mol);
    print_type_table(&mut out, &mol);
    Ok(true)
}
