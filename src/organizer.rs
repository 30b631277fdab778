/// Flattening copy of a directory tree into a single output directory.
///
/// Every regular file whose extension is in the [`ExtensionFilter`] is copied into
/// the output directory and renamed after the folder that contains it, so
/// `book/chapter1/draft.txt` becomes `chapter1.txt`. When that name is already
/// taken, a numeric suffix is appended (`chapter1_1.txt`, `chapter1_2.txt`, ...).
///
/// The source tree is never modified. Failures on individual files or
/// directories are reported through an [`EventSink`] and tallied in the
/// [`RunResult`]; they never abort the walk.
use crate::config::CompiledFilters;
use crate::extension_filter::ExtensionFilter;
use filetime::FileTime;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::WalkDir;

/// Stem used for files that sit directly in a filesystem root, which has no name.
pub const ROOT_FOLDER_NAME: &str = "root";

/// Errors that can occur while organizing.
///
/// None of these abort a run: they are converted into events and counted.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// A directory (or the source root itself) could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A matched file could not be copied.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The copy succeeded but its timestamps could not be carried over.
    #[error("could not preserve timestamps on {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for organize operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeEvent {
    /// A file was copied.
    Copied { from: PathBuf, to: PathBuf },
    /// Dry run: a file would be copied.
    Planned { from: PathBuf, to: PathBuf },
    /// Copying a file failed; the file is not counted.
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
    /// The file was copied but without its original timestamps.
    MetadataNotPreserved { path: PathBuf, reason: String },
    /// A directory could not be read; its contents are skipped.
    TraversalFailed { path: PathBuf, reason: String },
    /// A matching file was left out by the exclusion rules.
    Excluded { path: PathBuf },
    /// The output directory lies inside the source tree and was not walked.
    SkippedOutputDir { path: PathBuf },
}

impl OrganizeEvent {
    /// Whether this event reports a failure.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::CopyFailed { .. } | Self::TraversalFailed { .. }
        )
    }

    /// Whether this event reports a problem that did not stop the copy.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MetadataNotPreserved { .. })
    }
}

impl fmt::Display for OrganizeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied { from, to } => {
                write!(f, "Copied: {} → {}", from.display(), to.display())
            }
            Self::Planned { from, to } => {
                write!(f, "Would copy: {} → {}", from.display(), to.display())
            }
            Self::CopyFailed { from, reason, .. } => {
                write!(f, "Error copying {}: {}", from.display(), reason)
            }
            Self::MetadataNotPreserved { path, reason } => {
                write!(f, "Timestamps not preserved on {}: {}", path.display(), reason)
            }
            Self::TraversalFailed { path, reason } => {
                write!(f, "Skipped unreadable {}: {}", path.display(), reason)
            }
            Self::Excluded { path } => write!(f, "Excluded: {}", path.display()),
            Self::SkippedOutputDir { path } => {
                write!(f, "Not descending into output directory {}", path.display())
            }
        }
    }
}

/// Receives events as a run progresses.
pub trait EventSink {
    fn on_event(&mut self, event: &OrganizeEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&OrganizeEvent),
{
    fn on_event(&mut self, event: &OrganizeEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _event: &OrganizeEvent) {}
}

/// Copies a single file to a destination that does not exist yet.
pub trait FileCopier {
    /// Copy `from` to `to`.
    ///
    /// Return [`OrganizeError::Metadata`] when the contents were copied but
    /// file metadata could not be; any other error means the copy failed.
    fn copy(&self, from: &Path, to: &Path) -> OrganizeResult<()>;
}

/// Copies contents and permissions, then restores access and modification times.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreservingCopier;

impl FileCopier for PreservingCopier {
    fn copy(&self, from: &Path, to: &Path) -> OrganizeResult<()> {
        fs::copy(from, to).map_err(|source| OrganizeError::Copy {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })?;

        let metadata_error = |source: io::Error| OrganizeError::Metadata {
            path: to.to_path_buf(),
            source,
        };
        let metadata = fs::metadata(from).map_err(metadata_error)?;
        filetime::set_file_times(
            to,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )
        .map_err(metadata_error)
    }
}

/// Hands out destination paths in the output directory that are not taken.
///
/// A path is taken if it exists on disk or was already handed out during this
/// run. The second rule lets a dry run plan the same names a real run would use.
#[derive(Debug)]
pub struct CollisionResolver {
    output_dir: PathBuf,
    reserved: HashSet<PathBuf>,
}

impl CollisionResolver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            reserved: HashSet::new(),
        }
    }

    /// Returns the first free path among `stem + extension`,
    /// `stem_1 + extension`, `stem_2 + extension`, ... and reserves it.
    ///
    /// The stem is kept as raw `OsStr` so non-UTF-8 folder names survive.
    pub fn resolve(&mut self, stem: impl AsRef<OsStr>, extension: &str) -> PathBuf {
        let stem = stem.as_ref();
        let mut candidate = self.output_dir.join(file_name(stem, "", extension));
        let mut counter = 1u64;
        while self.is_taken(&candidate) {
            let suffix = format!("_{}", counter);
            candidate = self.output_dir.join(file_name(stem, &suffix, extension));
            counter += 1;
        }
        self.reserved.insert(candidate.clone());
        candidate
    }

    /// Gives back a reserved path, e.g. after the copy into it failed.
    pub fn release(&mut self, path: &Path) {
        self.reserved.remove(path);
    }

    fn is_taken(&self, path: &Path) -> bool {
        // symlink_metadata so a dangling symlink still counts as taken
        self.reserved.contains(path) || fs::symlink_metadata(path).is_ok()
    }
}

/// One file copied (or planned) during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyRecord {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    /// Files copied successfully (or planned, for a dry run).
    pub processed: usize,
    /// Matched files whose copy failed.
    pub failed: usize,
    /// Copies made without their original timestamps.
    pub metadata_warnings: usize,
    /// Directories that could not be read.
    pub unreadable: usize,
    /// Matched files left out by exclusion rules.
    pub excluded: usize,
    /// Wall-clock time from start to completion.
    pub duration: Duration,
    /// Copies in the order they were made.
    pub copies: Vec<CopyRecord>,
    pub dry_run: bool,
}

impl RunResult {
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    /// True when nothing matched; not an error.
    pub fn is_empty(&self) -> bool {
        self.processed == 0
    }

    /// Total per-item failures of any kind.
    pub fn failures(&self) -> usize {
        self.failed + self.unreadable
    }

    fn record(&mut self, from: &Path, to: PathBuf) {
        self.processed += 1;
        self.copies.push(CopyRecord {
            from: from.to_path_buf(),
            to,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Copy,
    Plan,
}

/// Walks a source tree and copies matching files into a flat output directory.
///
/// # Examples
///
/// ```no_run
/// use dirflat::extension_filter::ExtensionFilter;
/// use dirflat::organizer::{DirectoryOrganizer, NullSink};
/// use std::path::Path;
///
/// let organizer = DirectoryOrganizer::new(ExtensionFilter::parse(".txt:.pdf"));
/// let result = organizer.organize(Path::new("books"), Path::new("flat"), &mut NullSink);
/// println!("{} files in {:.2}s", result.processed, result.duration_secs());
/// ```
pub struct DirectoryOrganizer {
    filter: ExtensionFilter,
    exclusions: CompiledFilters,
    copier: Box<dyn FileCopier>,
}

impl DirectoryOrganizer {
    pub fn new(filter: ExtensionFilter) -> Self {
        Self {
            filter,
            exclusions: CompiledFilters::default(),
            copier: Box::new(PreservingCopier),
        }
    }

    /// Applies exclusion rules to matching files.
    pub fn with_exclusions(mut self, exclusions: CompiledFilters) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Replaces the copy primitive.
    pub fn with_copier(mut self, copier: impl FileCopier + 'static) -> Self {
        self.copier = Box::new(copier);
        self
    }

    pub fn filter(&self) -> &ExtensionFilter {
        &self.filter
    }

    /// Copies every matching file under `source_dir` into `output_dir`.
    ///
    /// `output_dir` is expected to exist. If `source_dir` cannot be read at
    /// all, a `TraversalFailed` event is emitted and the result is empty.
    pub fn organize(
        &self,
        source_dir: &Path,
        output_dir: &Path,
        sink: &mut dyn EventSink,
    ) -> RunResult {
        self.run(source_dir, output_dir, Mode::Copy, sink)
    }

    /// Resolves destinations exactly as [`organize`](Self::organize) would,
    /// without copying anything.
    pub fn plan(&self, source_dir: &Path, output_dir: &Path, sink: &mut dyn EventSink) -> RunResult {
        self.run(source_dir, output_dir, Mode::Plan, sink)
    }

    fn run(
        &self,
        source_dir: &Path,
        output_dir: &Path,
        mode: Mode,
        sink: &mut dyn EventSink,
    ) -> RunResult {
        let started = Instant::now();
        let mut result = RunResult {
            dry_run: mode == Mode::Plan,
            ..Default::default()
        };

        let root = match source_dir.canonicalize() {
            Ok(root) => root,
            Err(source) => {
                let error = OrganizeError::Traversal {
                    path: source_dir.to_path_buf(),
                    source,
                };
                sink.on_event(&OrganizeEvent::TraversalFailed {
                    path: source_dir.to_path_buf(),
                    reason: error.to_string(),
                });
                result.unreadable += 1;
                result.duration = started.elapsed();
                return result;
            }
        };
        let output_canonical = output_dir.canonicalize().ok();
        let mut resolver = CollisionResolver::new(output_dir);

        let mut entries = WalkDir::new(&root)
            .follow_links(false)
            .sort_by(|a, b| {
                // files first, then subdirectories, each by name
                a.file_type()
                    .is_dir()
                    .cmp(&b.file_type().is_dir())
                    .then_with(|| a.file_name().cmp(b.file_name()))
            })
            .into_iter();

        while let Some(next) = entries.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(&root).to_path_buf();
                    let error = OrganizeError::Traversal {
                        path: path.clone(),
                        source: err.into(),
                    };
                    sink.on_event(&OrganizeEvent::TraversalFailed {
                        path,
                        reason: error.to_string(),
                    });
                    result.unreadable += 1;
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() > 0 && output_canonical.as_deref() == Some(entry.path()) {
                    sink.on_event(&OrganizeEvent::SkippedOutputDir {
                        path: entry.path().to_path_buf(),
                    });
                    entries.skip_current_dir();
                }
                continue;
            }

            let file_type = entry.file_type();
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }

            let path = entry.path();
            let Some(extension) = self.filter.match_path(path) else {
                continue;
            };

            // links to files are copied by target; a dangling link fails in the copier
            if file_type.is_symlink() && fs::metadata(path).is_ok_and(|target| !target.is_file()) {
                continue;
            }

            let relative = path.strip_prefix(&root).unwrap_or(path);
            if !self.exclusions.should_include(relative) {
                sink.on_event(&OrganizeEvent::Excluded {
                    path: path.to_path_buf(),
                });
                result.excluded += 1;
                continue;
            }

            let destination = resolver.resolve(&folder_name(path), extension);
            match mode {
                Mode::Plan => {
                    sink.on_event(&OrganizeEvent::Planned {
                        from: path.to_path_buf(),
                        to: destination.clone(),
                    });
                    result.record(path, destination);
                }
                Mode::Copy => self.copy_one(path, destination, &mut resolver, &mut result, sink),
            }
        }

        result.duration = started.elapsed();
        result
    }

    fn copy_one(
        &self,
        path: &Path,
        destination: PathBuf,
        resolver: &mut CollisionResolver,
        result: &mut RunResult,
        sink: &mut dyn EventSink,
    ) {
        match self.copier.copy(path, &destination) {
            Ok(()) => {
                sink.on_event(&OrganizeEvent::Copied {
                    from: path.to_path_buf(),
                    to: destination.clone(),
                });
                result.record(path, destination);
            }
            Err(error @ OrganizeError::Metadata { .. }) => {
                sink.on_event(&OrganizeEvent::Copied {
                    from: path.to_path_buf(),
                    to: destination.clone(),
                });
                sink.on_event(&OrganizeEvent::MetadataNotPreserved {
                    path: destination.clone(),
                    reason: error.to_string(),
                });
                result.metadata_warnings += 1;
                result.record(path, destination);
            }
            Err(error) => {
                // keep the name free only if nothing was left behind
                if fs::symlink_metadata(&destination).is_err() {
                    resolver.release(&destination);
                }
                sink.on_event(&OrganizeEvent::CopyFailed {
                    from: path.to_path_buf(),
                    to: destination,
                    reason: error.to_string(),
                });
                result.failed += 1;
            }
        }
    }
}

/// Name of the directory that directly contains `path`.
fn folder_name(path: &Path) -> OsString {
    path.parent()
        .and_then(Path::file_name)
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| OsString::from(ROOT_FOLDER_NAME))
}

fn file_name(stem: &OsStr, suffix: &str, extension: &str) -> OsString {
    let mut name = stem.to_os_string();
    name.push(suffix);
    name.push(extension);
    name
}

/// Runs one organize pass with default settings and no event reporting.
///
/// # Examples
///
/// ```no_run
/// let result = dirflat::organize("books".as_ref(), "flat".as_ref(), ".txt:.pdf");
/// assert!(result.failures() == 0);
/// ```
pub fn organize(source_dir: &Path, output_dir: &Path, extension_spec: &str) -> RunResult {
    DirectoryOrganizer::new(ExtensionFilter::parse(extension_spec)).organize(
        source_dir,
        output_dir,
        &mut NullSink,
    )
}
