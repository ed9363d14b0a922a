use std::process::ExitCode;

use log::LevelFilter;

mod cli;
mod commands;
mod display;
mod io;
mod util;

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Off,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("OPENMOL_LOG")
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = cli::parse();
    let quiet = cli.command.quiet();
    init_logging(cli.verbose, quiet);
    let ctx = display::Context::detect().with_quiet(quiet);

    match commands::dispatch(cli.command, ctx) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            display::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
