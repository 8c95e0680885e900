mod cli;
mod config;
mod engine;
mod error;
mod logging;
mod model;
mod navigation;
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
mod view;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_silent = args.silent;
    let is_non_tui = !args.wants_tui();

    let verbosity = if is_silent {
        logging::Verbosity::Quiet
    } else {
        logging::Verbosity::from_flags(args.quiet, args.verbose)
    };
    logging::init_logging(verbosity, !is_non_tui);

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success, especially for non-TUI modes
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            if is_silent {
                println!("{}", e);
                std::process::exit(1);
            } else {
                Err(e)
            }
        }
    }
}
