use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Bulk tag-content replacement for NFO metadata files.
///
/// Each job names a directory, a tag, an old value and a new value. Every
/// `.nfo` file under the directory has the inner text of that tag rewritten.
/// The old value is used as a regular expression when it is a valid one and
/// as a literal substring otherwise.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Rewrite tag contents across trees of .nfo files",
    long_about = "nforetag - rewrite the contents of a tag in every .nfo file under a directory.

Jobs are written one per line as:
  path|tag_name|old_value|new_value

old_value is a regex when it compiles (new_value may use $1, ${name}),
otherwise it is replaced literally. new_value may be empty.

QUICK EXAMPLES:
  nforetag run -j '/media/movies|actor|jack|杰克'
  nforetag run -f jobs.txt --dry-run
  nforetag apply -c nforetag.yaml
  nforetag check -f jobs.txt"
)]
pub struct Args {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where job lines come from.
#[derive(ClapArgs, Debug, Clone)]
pub struct JobSource {
    /// A single `path|tag_name|old_value|new_value` job. May be repeated.
    #[arg(short, long = "job")]
    pub jobs: Vec<String>,

    /// A file with one job per line.
    #[arg(short = 'f', long = "jobs-file", env = "NFORETAG_JOBS_FILE")]
    pub jobs_file: Option<PathBuf>,
}

/// The set of available commands for the `nforetag` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a batch of jobs and wait for it to finish
    ///
    /// EXAMPLES:
    ///   nforetag run -j '/media/movies|actor|jack|杰克'
    ///   nforetag run -j '/media/tv|genre|Sci-?Fi|科幻' -j '/media/tv|studio|HBO|'
    ///   nforetag run -f jobs.txt --dry-run
    Run {
        #[command(flatten)]
        source: JobSource,

        /// Rewrite in memory only; do not write any file.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the batch from a config file if it is enabled, then disable it
    ///
    /// Config file format (nforetag.yaml):
    ///   enabled: true
    ///   jobs: |
    ///     /media/movies|actor|jack|杰克
    ///     /media/tv|genre|Sci-Fi|科幻
    Apply {
        /// Path to the YAML configuration file.
        #[arg(short, long, default_value = crate::config::DEFAULT_CONFIG_FILE, env = "NFORETAG_CONFIG")]
        config: PathBuf,

        /// Rewrite in memory only; do not write any file.
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate job lines without touching any file
    Check {
        #[command(flatten)]
        source: JobSource,
    },
}

/// Parses command-line arguments and returns the populated `Args` struct.
pub fn parse_args() -> Args {
    Args::parse()
}
