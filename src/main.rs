//! docpipe - AsciiDoc toolchain driver

use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use docpipe::{Cli, Config};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Dry runs always show the command trace.
    let level = if cli.verbose >= 2 {
        LevelFilter::Debug
    } else if cli.verbose == 1 || cli.dry_run {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    let config = match Config::new(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    match docpipe::run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
