//! `nforetag` rewrites the contents of a named tag across trees of `.nfo` files.
//!
//! It provides the core logic for the `nforetag` command-line tool but can also be
//! used as a library by a host that supplies job lines. The main components are:
//!
//! - `job`: parsing `path|tag_name|old_value|new_value` lines into validated `Job`s.
//! - `rewriter`: the per-file tag rewrite, with regex or literal replacement.
//! - `walker`: recursive discovery of `.nfo` files and in-place rewriting.
//! - `scheduler`: one thread per job, with a busy flag that rejects overlapping batches.
//! - `config`: the YAML config carrying the enable flag and the job list.

pub mod batch;
pub mod cli;
pub mod config;
pub mod errors;
pub mod job;
pub mod logging;
pub mod rewriter;
pub mod scheduler;
pub mod walker;

// Re-export main types for easier access by library users.
pub use errors::{Error, Result};
pub use job::{parse_jobs, Job, ParseReport};
pub use rewriter::{rewrite, Replacement, TagRewriter};
pub use scheduler::{JobRunner, RunState, Scheduler};
pub use walker::{walk_and_rewrite, FileWalker, WalkOptions, WalkStats};
