// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use clap::Parser;

use detection_counter::cli::args::{Cli, Commands};
use detection_counter::cli::count::run_count;
use detection_counter::error;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Count(args) => {
            if let Err(e) = run_count(&args) {
                error!("{e}");
                process::exit(1);
            }
        }
    }
}
