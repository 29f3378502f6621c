use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Separator between the fields of a job line.
pub const FIELD_SEPARATOR: char = '|';

/// A validated replacement job: one directory, one tag, one old/new pair.
///
/// Jobs are only produced by [`Job::parse_line`] (or [`parse_jobs`]), which
/// guarantees that `tag_name` and `old_value` are non-empty and that
/// `root_path` existed when the line was parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    root_path: PathBuf,
    tag_name: String,
    old_value: String,
    new_value: String,
}

/// Why a job line did not produce a [`Job`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than four `|`-separated fields.
    TooFewFields(usize),
    /// The tag name field was empty after trimming.
    EmptyTagName,
    /// The old value field was empty after trimming.
    EmptyOldValue,
    /// The root path does not exist on disk.
    MissingPath(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::TooFewFields(n) => write!(f, "expected 4 fields, found {n}"),
            SkipReason::EmptyTagName => write!(f, "tag name is empty"),
            SkipReason::EmptyOldValue => write!(f, "old value is empty"),
            SkipReason::MissingPath(p) => write!(f, "path {} does not exist", p.display()),
        }
    }
}

/// A line that was rejected while parsing a batch.
#[derive(Debug, Clone)]
pub struct SkippedLine {
    /// 1-based line number within the blob.
    pub line_number: usize,
    /// The raw line as supplied.
    pub line: String,
    pub reason: SkipReason,
}

/// The outcome of parsing a whole job blob.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub jobs: Vec<Job>,
    pub skipped: Vec<SkippedLine>,
}

impl Job {
    /// Builds a job from already-split fields, applying the same validation as
    /// [`Job::parse_line`].
    pub fn new(
        root_path: impl Into<PathBuf>,
        tag_name: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Result<Self, SkipReason> {
        let root_path = root_path.into();
        let tag_name = tag_name.into();
        let old_value = old_value.into();

        if tag_name.is_empty() {
            return Err(SkipReason::EmptyTagName);
        }
        if old_value.is_empty() {
            return Err(SkipReason::EmptyOldValue);
        }
        if !root_path.exists() {
            return Err(SkipReason::MissingPath(root_path));
        }

        Ok(Self {
            root_path,
            tag_name,
            old_value,
            new_value: new_value.into(),
        })
    }

    /// Parses one `path|tag_name|old_value|new_value` line.
    ///
    /// Every field is trimmed. Fields after the fourth are ignored.
    pub fn parse_line(line: &str) -> Result<Self, SkipReason> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).map(str::trim).collect();
        if fields.len() < 4 {
            return Err(SkipReason::TooFewFields(fields.len()));
        }
        Self::new(fields[0], fields[1], fields[2], fields[3])
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn old_value(&self) -> &str {
        &self.old_value
    }

    pub fn new_value(&self) -> &str {
        &self.new_value
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.root_path.display(),
            self.tag_name,
            self.old_value,
            self.new_value
        )
    }
}

/// Parses a newline-delimited blob of job lines.
///
/// Each line is handled independently. Malformed lines are dropped with a
/// warning naming the line. Blank lines and lines whose path does not exist
/// are dropped quietly (debug level only).
pub fn parse_jobs(blob: &str) -> ParseReport {
    let mut report = ParseReport::default();

    for (idx, line) in blob.lines().enumerate() {
        match Job::parse_line(line) {
            Ok(job) => report.jobs.push(job),
            Err(reason) => {
                if line.trim().is_empty() || matches!(reason, SkipReason::MissingPath(_)) {
                    debug!(line = %line, "skipping job line: {reason}");
                } else {
                    warn!(line = %line, "skipping invalid job line: {reason}");
                }
                report.skipped.push(SkippedLine {
                    line_number: idx + 1,
                    line: line.to_string(),
                    reason,
                });
            }
        }
    }

    report
}
