//! The main entry point for the `nforetag` command-line application.

use anyhow::Context;
use nforetag::batch;
use nforetag::cli::{self, Commands};
use nforetag::logging;

fn main() -> anyhow::Result<()> {
    let args = cli::parse_args();
    logging::init(args.verbose);

    match args.command {
        Commands::Run { source, dry_run } => {
            batch::run_jobs(source, dry_run).context("failed to run jobs")
        }
        Commands::Apply { config, dry_run } => batch::run_apply(&config, dry_run)
            .with_context(|| format!("failed to apply config {}", config.display())),
        Commands::Check { source } => batch::run_check(source).context("failed to check jobs"),
    }
}
