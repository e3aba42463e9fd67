//! Mirror options, outcome models and top-level error types.

use std::io;
use std::path::PathBuf;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Kind of a directory entry, resolved on the side that holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumEntryKind {
    /// Regular file (or any non-directory path copied opaquely).
    File,
    /// Directory.
    Directory,
}

impl EnumEntryKind {
    /// Lower-case label used in log messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

/// Result of one filesystem operation applied to a destination entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumSyncOutcomeKind {
    /// Entry existed only in the source and was copied.
    Copied,
    /// Entry existed only in the destination and was removed.
    Deleted,
    /// Destination file content was replaced with the source content.
    Overwritten,
    /// Re-check found both files identical; nothing written.
    Unchanged,
    /// Operation failed with a permission error and was skipped.
    SkippedPermissionDenied,
    /// Operation failed with any other filesystem error and was skipped.
    SkippedError,
}

/// Classification of a per-entry filesystem failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumSyncErrorKind {
    /// `io::ErrorKind::PermissionDenied`.
    PermissionDenied,
    /// Every other I/O failure (disk full, vanished path, ...).
    Io,
}

impl EnumSyncErrorKind {
    /// Classify an I/O error.
    pub fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Io,
        }
    }

    /// Outcome recorded for an entry that failed with this error kind.
    pub fn as_outcome(self) -> EnumSyncOutcomeKind {
        match self {
            Self::PermissionDenied => EnumSyncOutcomeKind::SkippedPermissionDenied,
            Self::Io => EnumSyncOutcomeKind::SkippedError,
        }
    }
}

/// Pattern matching mode for exclude lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    Regex,
    /// Substring match.
    Literal,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for [`crate::sync::sync_tree`].
#[derive(Debug, Clone)]
pub struct SpecSyncOptions {
    /// Exclude patterns applied to entry basenames on both sides.
    pub patterns_exclude: Option<Vec<String>>,
    /// Pattern interpretation mode.
    pub rule_pattern: EnumPatternMode,
    /// Do not mutate the destination; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecSyncOptions {
    fn default() -> Self {
        Self {
            patterns_exclude: None,
            rule_pattern: EnumPatternMode::Glob,
            if_dry_run: false,
        }
    }
}

/// One applied (or attempted) operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSyncOutcome {
    /// Destination path the operation targeted.
    pub path: PathBuf,
    /// Kind of the entry the operation acted on.
    pub kind: EnumEntryKind,
    /// What happened.
    pub outcome: EnumSyncOutcomeKind,
}

/// One per-entry failure with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSyncError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// Permission vs. other I/O failure.
    pub kind: EnumSyncErrorKind,
    /// User-facing error text.
    pub exception: String,
}

/// Errors that stop a pass (or the whole run) before it completes.
#[derive(Debug, thiserror::Error)]
pub enum SyncTreeError {
    /// Invalid exclude pattern.
    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(String),
    /// Source path is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Destination path is not an existing directory.
    #[error("Destination is not a directory: {}", .0.display())]
    DestinationNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        source_dir.display(),
        destination_dir.display()
    )]
    SourceDestinationOverlap {
        /// Normalized source directory.
        source_dir: PathBuf,
        /// Normalized destination directory.
        destination_dir: PathBuf,
    },
    /// The root directory pair could not be listed for this pass.
    #[error("Failed to read root directory {}: {source}", path.display())]
    RootUnreadable {
        /// Root path that failed to list.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
