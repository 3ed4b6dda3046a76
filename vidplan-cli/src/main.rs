// ============================================================================
// vidplan-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: vidplan command-line application
//
// Parses the arguments, installs logging, loads the config file and
// dispatches to the selected command. Any error is printed with a hint
// where one exists, and the process exits with status 1.

use clap::Parser;
use std::process;

use vidplan_cli::config::FileConfig;
use vidplan_cli::error::{CliResult, suggestion};
use vidplan_cli::logging::init_logging;
use vidplan_cli::{Cli, Commands, run_bulk, run_encode, run_presets};
use vidplan_core::terminal;

fn run(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Commands::Encode(args) => {
            let file = FileConfig::load(cli.config.as_deref())?;
            run_encode(args, &file, cli.json)
        }
        Commands::Bulk(args) => {
            let file = FileConfig::load(cli.config.as_deref())?;
            run_bulk(args, &file, cli.json)
        }
        Commands::Presets(args) => run_presets(args, cli.json),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.json, cli.log_file.as_deref()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
    log::debug!("Starting vidplan {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        terminal::print_error("Error", &e.to_string(), suggestion(&e));
        process::exit(1);
    }
}
