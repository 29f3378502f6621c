use crate::errors::{Error, Result};
use crate::job::Job;
use crate::rewriter::TagRewriter;
use ignore::WalkBuilder;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// File name suffix of the metadata files that are rewritten.
pub const NFO_SUFFIX: &str = ".nfo";

/// Options for processing files.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// If `true`, files are read and rewritten in memory but never written back.
    pub dry_run: bool,
}

/// The result of processing a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOutcome {
    /// `true` if the rewritten content differs from what was read.
    pub changed: bool,
}

/// Counters for one walk over a job's directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// `.nfo` files found under the root.
    pub files_seen: usize,
    /// Files whose content changed.
    pub rewritten: usize,
    /// Files processed without a content change.
    pub unchanged: usize,
    /// Files (or walk entries) that could not be processed.
    pub failed: usize,
}

/// Running totals across every walk performed by one [`FileWalker`].
#[derive(Debug, Default)]
pub struct WalkTotals {
    files_seen: AtomicUsize,
    rewritten: AtomicUsize,
    unchanged: AtomicUsize,
    failed: AtomicUsize,
}

impl WalkTotals {
    fn add(&self, stats: &WalkStats) {
        self.files_seen.fetch_add(stats.files_seen, Ordering::Relaxed);
        self.rewritten.fetch_add(stats.rewritten, Ordering::Relaxed);
        self.unchanged.fetch_add(stats.unchanged, Ordering::Relaxed);
        self.failed.fetch_add(stats.failed, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WalkStats {
        WalkStats {
            files_seen: self.files_seen.load(Ordering::Relaxed),
            rewritten: self.rewritten.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Walks job directories and rewrites every `.nfo` file found.
///
/// A failure on one file is logged and counted; the walk always continues
/// with the next entry.
#[derive(Debug, Default)]
pub struct FileWalker {
    options: WalkOptions,
    totals: WalkTotals,
}

impl FileWalker {
    pub fn new(options: WalkOptions) -> Self {
        Self {
            options,
            totals: WalkTotals::default(),
        }
    }

    /// Totals accumulated over every job this walker has run.
    pub fn totals(&self) -> WalkStats {
        self.totals.snapshot()
    }

    /// Runs one job: walks its root and rewrites each `.nfo` file.
    pub fn walk(&self, job: &Job) -> WalkStats {
        let root = job.root_path();
        info!(dir = %root.display(), tag = job.tag_name(), "processing all nfo files");

        if !root.is_dir() {
            info!(dir = %root.display(), "root is not a directory, nothing to walk");
            return WalkStats::default();
        }

        let rewriter = match TagRewriter::new(job.tag_name(), job.old_value(), job.new_value()) {
            Ok(rewriter) => rewriter,
            Err(e) => {
                warn!(dir = %root.display(), "cannot build rewriter: {e}");
                let stats = WalkStats {
                    failed: 1,
                    ..WalkStats::default()
                };
                self.totals.add(&stats);
                return stats;
            }
        };
        if rewriter.replacement().is_literal() {
            debug!(old_value = job.old_value(), "old value is not a valid pattern, using literal match");
        }

        let stats = self.walk_with(root, &rewriter);
        self.totals.add(&stats);

        info!(
            dir = %root.display(),
            files = stats.files_seen,
            rewritten = stats.rewritten,
            failed = stats.failed,
            "directory done"
        );
        stats
    }

    fn walk_with(&self, root: &Path, rewriter: &TagRewriter) -> WalkStats {
        let mut stats = WalkStats::default();

        let mut walker = WalkBuilder::new(root);
        walker.standard_filters(false).follow_links(false);

        for entry in walker.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry: {e}");
                    stats.failed += 1;
                    continue;
                }
            };

            // `is_file` follows symlinks, so linked files count; linked
            // directories are still not descended into.
            if !entry.path().is_file() || !is_nfo(entry.path()) {
                continue;
            }

            stats.files_seen += 1;
            match process_file(entry.path(), rewriter, self.options) {
                Ok(outcome) if outcome.changed => stats.rewritten += 1,
                Ok(_) => stats.unchanged += 1,
                Err(e) => {
                    warn!("{e}");
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}

/// `true` if the file name ends with the literal, case-sensitive `.nfo` suffix.
pub fn is_nfo(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(NFO_SUFFIX))
}

/// Rewrites a single file in place.
///
/// The file is written back even when its content did not change, unless
/// `dry_run` is set.
pub fn process_file(path: &Path, rewriter: &TagRewriter, options: WalkOptions) -> Result<FileOutcome> {
    info!(file = %path.display(), "processing");

    let bytes = fs::read(path).map_err(|e| Error::processing(path, e))?;
    let content = String::from_utf8(bytes).map_err(|e| Error::processing(path, e))?;

    let new_content = rewriter.rewrite(&content);
    let changed = new_content != content;

    if !options.dry_run {
        write_file(path, new_content.as_bytes()).map_err(|e| Error::processing(path, e))?;
    }

    info!(file = %path.display(), changed, "done");
    Ok(FileOutcome { changed })
}

/// Replaces `path` with `contents` via a temporary file in the same directory.
///
/// Symlinks are resolved first so the link stays in place and its target is
/// rewritten.
fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let target = fs::canonicalize(path)?;
    let Some(parent) = target.parent() else {
        return Err(Error::NoParent(target));
    };

    let mut temp_file = NamedTempFile::new_in(parent)?;
    temp_file.write_all(contents)?;

    // Preserve file permissions
    let perms = fs::metadata(&target)?.permissions();
    fs::set_permissions(temp_file.path(), perms)?;

    temp_file.persist(&target)?;
    Ok(())
}

/// Convenience wrapper that validates the arguments and runs a single walk.
pub fn walk_and_rewrite(root_path: &Path, tag_name: &str, old_value: &str, new_value: &str) -> WalkStats {
    match Job::new(root_path, tag_name, old_value, new_value) {
        Ok(job) => FileWalker::default().walk(&job),
        Err(reason) => {
            warn!(dir = %root_path.display(), "not walking: {reason}");
            WalkStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn job(root: &Path, tag: &str, old: &str, new: &str) -> Job {
        Job::new(root, tag, old, new).unwrap()
    }

    #[test]
    fn test_is_nfo_is_case_sensitive() {
        assert!(is_nfo(Path::new("/media/movie.nfo")));
        assert!(!is_nfo(Path::new("/media/movie.NFO")));
        assert!(!is_nfo(Path::new("/media/movie.nfo.bak")));
        assert!(!is_nfo(Path::new("/media/movie.txt")));
    }

    #[test]
    fn test_only_nfo_files_are_rewritten() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let nested = root.join("Season 1");
        fs::create_dir_all(&nested).unwrap();

        let tagged = "<episodedetails><actor>jack</actor></episodedetails>";
        fs::write(root.join("movie.nfo"), tagged).unwrap();
        fs::write(nested.join("s01e01.nfo"), tagged).unwrap();
        fs::write(nested.join("notes.txt"), tagged).unwrap();
        fs::write(root.join("upper.NFO"), tagged).unwrap();

        let walker = FileWalker::default();
        let stats = walker.walk(&job(root, "actor", "jack", "杰克"));

        assert_eq!(stats.files_seen, 2);
        assert_eq!(stats.rewritten, 2);
        assert_eq!(stats.failed, 0);

        let expected = "<episodedetails><actor>杰克</actor></episodedetails>";
        assert_eq!(fs::read_to_string(root.join("movie.nfo")).unwrap(), expected);
        assert_eq!(fs::read_to_string(nested.join("s01e01.nfo")).unwrap(), expected);
        assert_eq!(fs::read_to_string(nested.join("notes.txt")).unwrap(), tagged);
        assert_eq!(fs::read_to_string(root.join("upper.NFO")).unwrap(), tagged);
    }

    #[test]
    fn test_hidden_directories_are_walked() {
        let temp_dir = TempDir::new().unwrap();
        let hidden = temp_dir.path().join(".extras");
        fs::create_dir_all(&hidden).unwrap();
        fs::write(hidden.join("a.nfo"), "<title>old</title>").unwrap();

        let stats = FileWalker::default().walk(&job(temp_dir.path(), "title", "old", "new"));

        assert_eq!(stats.rewritten, 1);
        assert_eq!(fs::read_to_string(hidden.join("a.nfo")).unwrap(), "<title>new</title>");
    }

    #[test]
    fn test_invalid_utf8_file_does_not_stop_walk() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("bad.nfo"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
        fs::write(root.join("good.nfo"), "<actor>jack</actor>").unwrap();

        let stats = FileWalker::default().walk(&job(root, "actor", "jack", "rose"));

        assert_eq!(stats.files_seen, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.rewritten, 1);
        assert_eq!(fs::read(root.join("bad.nfo")).unwrap(), vec![0xff, 0xfe, 0x00, 0x41]);
        assert_eq!(fs::read_to_string(root.join("good.nfo")).unwrap(), "<actor>rose</actor>");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_nfo_is_rewritten_through_link() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let store = temp_dir.path().join("store");
        let other = temp_dir.path().join("other");
        let lib = temp_dir.path().join("lib");
        fs::create_dir_all(&store).unwrap();
        fs::create_dir_all(&other).unwrap();
        fs::create_dir_all(&lib).unwrap();

        fs::write(store.join("real.nfo"), "<actor>jack</actor>").unwrap();
        fs::write(other.join("linked_dir.nfo"), "<actor>jack</actor>").unwrap();
        symlink(store.join("real.nfo"), lib.join("movie.nfo")).unwrap();
        symlink(&other, lib.join("extras")).unwrap();

        let stats = FileWalker::default().walk(&job(&lib, "actor", "jack", "杰克"));

        assert_eq!(stats.files_seen, 1);
        assert_eq!(stats.rewritten, 1);
        assert_eq!(fs::read_to_string(store.join("real.nfo")).unwrap(), "<actor>杰克</actor>");
        assert!(fs::symlink_metadata(lib.join("movie.nfo")).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_to_string(other.join("linked_dir.nfo")).unwrap(),
            "<actor>jack</actor>"
        );
    }

    #[test]
    fn test_file_root_is_not_walked() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("movie.nfo");
        fs::write(&file, "<actor>jack</actor>").unwrap();

        let stats = FileWalker::default().walk(&job(&file, "actor", "jack", "rose"));

        assert_eq!(stats, WalkStats::default());
        assert_eq!(fs::read_to_string(&file).unwrap(), "<actor>jack</actor>");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("movie.nfo");
        fs::write(&file, "<actor>jack</actor>").unwrap();

        let walker = FileWalker::new(WalkOptions { dry_run: true });
        let stats = walker.walk(&job(temp_dir.path(), "actor", "jack", "rose"));

        assert_eq!(stats.rewritten, 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "<actor>jack</actor>");
    }

    #[test]
    fn test_totals_accumulate_across_jobs() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.nfo"), "<actor>jack</actor><genre>x</genre>").unwrap();

        let walker = FileWalker::default();
        walker.walk(&job(temp_dir.path(), "actor", "jack", "rose"));
        walker.walk(&job(temp_dir.path(), "genre", "nomatch", "y"));

        let totals = walker.totals();
        assert_eq!(totals.files_seen, 2);
        assert_eq!(totals.rewritten, 1);
        assert_eq!(totals.unchanged, 1);
    }

    #[test]
    fn test_walk_and_rewrite_missing_root() {
        let stats = walk_and_rewrite(Path::new("/nonexistent/path"), "actor", "jack", "x");
        assert_eq!(stats, WalkStats::default());
    }
}
