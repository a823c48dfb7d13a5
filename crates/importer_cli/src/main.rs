use std::process;

use clap::Parser;
use importer_cli::args::Args;
use importer_cli::commands;
use importer_cli::platform::logging;
use importer_logging::importer_error;

fn main() {
    let args = Args::parse();
    logging::initialize(args.log, args.verbose);

    if let Err(error) = commands::run(args) {
        importer_error!("{error:#}");
        eprintln!("Error: {error:#}");
        process::exit(1);
    }
}
