use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::RegexSet;

use crate::report::ReportPassBuilder;
use crate::spec::{EnumEntryKind, EnumPatternMode, SyncTreeError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
pub(crate) enum TypeSyncPatternSeq {
    Literal(Vec<String>),
    Glob(GlobSet),
    Regex(RegexSet),
}

/// Compiled exclude rules, shared by the comparator and the subtree copier.
#[derive(Debug, Clone, Default)]
pub struct SpecSyncPatterns {
    patterns_exclude: Option<TypeSyncPatternSeq>,
}

impl SpecSyncPatterns {
    /// Compile raw patterns according to `rule_pattern`.
    pub fn from_raw(
        patterns_exclude: Option<&[String]>,
        rule_pattern: EnumPatternMode,
    ) -> Result<Self, SyncTreeError> {
        let Some(patterns) = patterns_exclude.filter(|v| !v.is_empty()) else {
            return Ok(Self::default());
        };

        let seq = match rule_pattern {
            EnumPatternMode::Literal => TypeSyncPatternSeq::Literal(patterns.to_vec()),
            EnumPatternMode::Glob => {
                let mut builder = GlobSetBuilder::new();
                for pattern in patterns {
                    builder.add(
                        Glob::new(pattern)
                            .map_err(|e| SyncTreeError::InvalidPattern(e.to_string()))?,
                    );
                }
                TypeSyncPatternSeq::Glob(
                    builder
                        .build()
                        .map_err(|e| SyncTreeError::InvalidPattern(e.to_string()))?,
                )
            }
            EnumPatternMode::Regex => TypeSyncPatternSeq::Regex(
                RegexSet::new(patterns).map_err(|e| SyncTreeError::InvalidPattern(e.to_string()))?,
            ),
        };
        Ok(Self {
            patterns_exclude: Some(seq),
        })
    }

    /// `true` when an entry with this basename must be ignored on both sides.
    pub fn is_excluded(&self, name: &OsStr) -> bool {
        let Some(patterns) = &self.patterns_exclude else {
            return false;
        };
        match patterns {
            TypeSyncPatternSeq::Glob(set) => set.is_match(Path::new(name)),
            TypeSyncPatternSeq::Literal(v) => {
                let c_name = name.to_string_lossy();
                v.iter().any(|p| c_name.contains(p.as_str()))
            }
            TypeSyncPatternSeq::Regex(set) => set.is_match(&name.to_string_lossy()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _normalize_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

/// Resolve the kind of a source-side entry, following symlinks.
///
/// Returns `Ok(None)` for special files (FIFO, socket, device). A dangling
/// symlink resolves to [`EnumEntryKind::File`].
pub(crate) fn probe_entry_followed(path: &Path) -> io::Result<Option<EnumEntryKind>> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(Some(EnumEntryKind::Directory)),
        Ok(meta) if meta.is_file() => Ok(Some(EnumEntryKind::File)),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let meta_link = fs::symlink_metadata(path)?;
            if meta_link.file_type().is_symlink() {
                Ok(Some(EnumEntryKind::File))
            } else {
                Err(e)
            }
        }
        Err(e) => Err(e),
    }
}

/// Kind used to remove a destination entry; links and special files are
/// removed as files.
pub(crate) fn probe_entry_unfollowed(path: &Path) -> io::Result<EnumEntryKind> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        Ok(EnumEntryKind::Directory)
    } else {
        Ok(EnumEntryKind::File)
    }
}

/// Resolve the kind of a destination-side entry without following symlinks.
///
/// Returns `Ok(None)` for symlinks and special files, which are only ever
/// replaced, never traversed or written through.
pub(crate) fn probe_entry_plain(path: &Path) -> io::Result<Option<EnumEntryKind>> {
    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_dir() {
        Ok(Some(EnumEntryKind::Directory))
    } else if file_type.is_file() {
        Ok(Some(EnumEntryKind::File))
    } else {
        Ok(None)
    }
}

pub(crate) fn remove_entry(path: &Path, kind: EnumEntryKind) -> io::Result<()> {
    match kind {
        EnumEntryKind::File => fs::remove_file(path),
        EnumEntryKind::Directory => fs::remove_dir_all(path),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyPrimitives

/// Copy file bytes, then permissions, timestamps and xattrs.
///
/// Content errors are returned. Metadata errors only add a warning.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    builder_report: &mut ReportPassBuilder,
) -> io::Result<()> {
    fs::copy(path_file_src, path_file_dst)?;
    if let Err(e) = apply_metadata(path_file_src, path_file_dst) {
        builder_report.add_warning(format!(
            "Failed to preserve metadata on {} ({e})",
            path_file_dst.display()
        ));
    }
    Ok(())
}

fn apply_metadata(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_src)?;
    fs::set_permissions(path_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_src, path_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_src: &Path, path_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_src) else {
        return;
    };
    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_dst, &name, &raw_value);
    }
}

/// Copy a whole source subtree to a destination path that does not exist yet.
///
/// Stops at the first I/O error; a partially written subtree is completed by
/// the next pass, where the directory shows up as a common subdirectory.
pub(crate) fn copy_dir_recursive(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_patterns: &SpecSyncPatterns,
    builder_report: &mut ReportPassBuilder,
) -> io::Result<()> {
    let mut set_visited_dirs = HashSet::new();
    _copy_dir_recursive(
        path_dir_src,
        path_dir_dst,
        spec_patterns,
        builder_report,
        &mut set_visited_dirs,
    )
}

fn _copy_dir_recursive(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_patterns: &SpecSyncPatterns,
    builder_report: &mut ReportPassBuilder,
    set_visited_dirs: &mut HashSet<(u64, u64)>,
) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        let stat_dir = fs::metadata(path_dir_src)?;
        if !set_visited_dirs.insert((stat_dir.dev(), stat_dir.ino())) {
            builder_report.add_warning(format!(
                "Symlink loop detected: {}",
                path_dir_src.display()
            ));
            return Ok(());
        }
    }
    #[cfg(not(unix))]
    let _ = &set_visited_dirs;

    fs::create_dir(path_dir_dst)?;

    let mut l_entries = fs::read_dir(path_dir_src)?
        .map(|res| res.map(|entry| entry.file_name()))
        .collect::<io::Result<Vec<_>>>()?;
    l_entries.sort();

    for name in l_entries {
        if spec_patterns.is_excluded(&name) {
            continue;
        }
        let path_src = path_dir_src.join(&name);
        let path_dst = path_dir_dst.join(&name);
        match probe_entry_followed(&path_src)? {
            Some(EnumEntryKind::Directory) => _copy_dir_recursive(
                &path_src,
                &path_dst,
                spec_patterns,
                builder_report,
                set_visited_dirs,
            )?,
            Some(EnumEntryKind::File) => {
                copy_file_with_metadata(&path_src, &path_dst, builder_report)?
            }
            None => builder_report
                .add_warning(format!("Special file skipped: {}", path_src.display())),
        }
    }

    if let Err(e) = apply_metadata(path_dir_src, path_dir_dst) {
        builder_report.add_warning(format!(
            "Failed to preserve metadata on {} ({e})",
            path_dir_dst.display()
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
