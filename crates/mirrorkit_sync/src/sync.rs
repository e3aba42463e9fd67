//! Recursive diff-and-apply mirror pass.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use crate::compare::{SpecDirectoryDiff, compare_directories, files_differ};
use crate::report::{ReportPass, ReportPassBuilder};
use crate::spec::{
    EnumEntryKind, EnumSyncErrorKind, EnumSyncOutcomeKind, SpecSyncOptions, SyncTreeError,
};
use crate::util::{
    SpecSyncPatterns, copy_dir_recursive, copy_file_with_metadata, is_overlap,
    probe_entry_followed, probe_entry_plain, probe_entry_unfollowed, remove_entry,
};

#[derive(Debug)]
struct SpecSyncContext {
    spec_patterns: SpecSyncPatterns,
    if_dry_run: bool,
    builder_report: ReportPassBuilder,
}

impl SpecSyncContext {
    fn c_prefix(&self) -> &'static str {
        if self.if_dry_run { "[dry-run] " } else { "" }
    }
}

/// Run one full mirror pass from `dir_source` onto `dir_destination`.
///
/// This function performs:
/// 1. Input validation (both roots are directories, no overlap, patterns).
/// 2. A depth-first walk: at each level compare, then copy, delete and
///    overwrite, then recurse into common subdirectories.
/// 3. Report aggregation.
///
/// Per-entry failures never abort the pass; they are logged and stored in
/// [`ReportPass::errors`]. Returns [`SyncTreeError`] for validation failures
/// and when the root pair itself cannot be listed.
pub fn sync_tree<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_sync_options: &SpecSyncOptions,
) -> Result<ReportPass, SyncTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = absolutize(dir_source.as_ref());
    let path_dir_dst = absolutize(dir_destination.as_ref());

    validate_roots(&path_dir_src, &path_dir_dst)?;
    let spec_patterns = SpecSyncPatterns::from_raw(
        spec_sync_options.patterns_exclude.as_deref(),
        spec_sync_options.rule_pattern,
    )?;

    let spec_diff = compare_directories(&path_dir_src, &path_dir_dst, &spec_patterns)
        .map_err(|source| SyncTreeError::RootUnreadable {
            path: path_dir_src.clone(),
            source,
        })?;

    let mut spec_sync_ctx = SpecSyncContext {
        spec_patterns,
        if_dry_run: spec_sync_options.if_dry_run,
        builder_report: ReportPassBuilder::default(),
    };
    apply_directory_diff(&path_dir_src, &path_dir_dst, spec_diff, &mut spec_sync_ctx);
    Ok(spec_sync_ctx.builder_report.build())
}

/// Check that both roots are usable directories and do not contain each other.
pub fn validate_roots(path_dir_src: &Path, path_dir_dst: &Path) -> Result<(), SyncTreeError> {
    if !path_dir_src.is_dir() {
        return Err(SyncTreeError::SourceNotDirectory(path_dir_src.to_path_buf()));
    }
    if !path_dir_dst.is_dir() {
        return Err(SyncTreeError::DestinationNotDirectory(
            path_dir_dst.to_path_buf(),
        ));
    }
    if is_overlap(path_dir_src, path_dir_dst) {
        return Err(SyncTreeError::SourceDestinationOverlap {
            source_dir: path_dir_src.to_path_buf(),
            destination_dir: path_dir_dst.to_path_buf(),
        });
    }
    Ok(())
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn sync_directory(path_dir_src: &Path, path_dir_dst: &Path, spec_sync_ctx: &mut SpecSyncContext) {
    match compare_directories(path_dir_src, path_dir_dst, &spec_sync_ctx.spec_patterns) {
        Ok(spec_diff) => {
            apply_directory_diff(path_dir_src, path_dir_dst, spec_diff, spec_sync_ctx)
        }
        Err(e) => record_failure(
            spec_sync_ctx,
            path_dir_dst,
            EnumEntryKind::Directory,
            &format!("compare '{}' with", path_dir_src.display()),
            e,
        ),
    }
}

fn apply_directory_diff(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_diff: SpecDirectoryDiff,
    spec_sync_ctx: &mut SpecSyncContext,
) {
    for name in &spec_diff.names_special {
        spec_sync_ctx.builder_report.add_warning(format!(
            "Special file skipped: '{}'",
            path_dir_src.join(name).display()
        ));
    }

    for name in &spec_diff.only_in_source {
        handle_only_in_source(path_dir_src, path_dir_dst, name, spec_sync_ctx);
    }
    for name in &spec_diff.only_in_destination {
        handle_only_in_destination(path_dir_dst, name, spec_sync_ctx);
    }
    for name in &spec_diff.common_files_differing {
        handle_common_differing(path_dir_src, path_dir_dst, name, spec_sync_ctx);
    }
    for name in &spec_diff.common_subdirectories {
        sync_directory(
            &path_dir_src.join(name),
            &path_dir_dst.join(name),
            spec_sync_ctx,
        );
    }
}

fn handle_only_in_source(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    name: &OsStr,
    spec_sync_ctx: &mut SpecSyncContext,
) {
    let path_src = path_dir_src.join(name);
    let path_dst = path_dir_dst.join(name);

    let kind_src = match probe_entry_followed(&path_src) {
        Ok(Some(kind)) => kind,
        Ok(None) => {
            spec_sync_ctx
                .builder_report
                .add_warning(format!("Special file skipped: '{}'", path_src.display()));
            return;
        }
        Err(e) => {
            record_failure(spec_sync_ctx, &path_dst, EnumEntryKind::File, "inspect", e);
            return;
        }
    };
    copy_entry(&path_src, &path_dst, kind_src, spec_sync_ctx);
}

fn copy_entry(
    path_src: &Path,
    path_dst: &Path,
    kind_src: EnumEntryKind,
    spec_sync_ctx: &mut SpecSyncContext,
) {
    tracing::info!(
        "{}Copying {} '{}' to destination folder",
        spec_sync_ctx.c_prefix(),
        kind_src.as_str(),
        path_src.display()
    );
    if !spec_sync_ctx.if_dry_run {
        let res_copy = match kind_src {
            EnumEntryKind::File => {
                copy_file_with_metadata(path_src, path_dst, &mut spec_sync_ctx.builder_report)
            }
            EnumEntryKind::Directory => copy_dir_recursive(
                path_src,
                path_dst,
                &spec_sync_ctx.spec_patterns,
                &mut spec_sync_ctx.builder_report,
            ),
        };
        if let Err(e) = res_copy {
            record_failure(spec_sync_ctx, path_dst, kind_src, "copy", e);
            return;
        }
        tracing::info!("Copying success");
    }
    spec_sync_ctx.builder_report.add_outcome(
        path_dst.to_path_buf(),
        kind_src,
        EnumSyncOutcomeKind::Copied,
    );
}

fn handle_only_in_destination(
    path_dir_dst: &Path,
    name: &OsStr,
    spec_sync_ctx: &mut SpecSyncContext,
) {
    let path_dst = path_dir_dst.join(name);
    let kind_dst = match probe_entry_unfollowed(&path_dst) {
        Ok(kind) => kind,
        Err(e) => {
            record_failure(spec_sync_ctx, &path_dst, EnumEntryKind::File, "inspect", e);
            return;
        }
    };
    delete_entry(&path_dst, kind_dst, spec_sync_ctx);
}

fn delete_entry(
    path_dst: &Path,
    kind_dst: EnumEntryKind,
    spec_sync_ctx: &mut SpecSyncContext,
) -> bool {
    tracing::info!(
        "{}Deleting {} '{}' from destination folder",
        spec_sync_ctx.c_prefix(),
        kind_dst.as_str(),
        path_dst.display()
    );
    if !spec_sync_ctx.if_dry_run {
        if let Err(e) = remove_entry(path_dst, kind_dst) {
            record_failure(spec_sync_ctx, path_dst, kind_dst, "delete", e);
            return false;
        }
        tracing::info!("Deletion success");
    }
    spec_sync_ctx.builder_report.add_outcome(
        path_dst.to_path_buf(),
        kind_dst,
        EnumSyncOutcomeKind::Deleted,
    );
    true
}

fn handle_common_differing(
    path_dir_src: &Path,
    path_dir_dst: &Path,
    name: &OsStr,
    spec_sync_ctx: &mut SpecSyncContext,
) {
    let path_src = path_dir_src.join(name);
    let path_dst = path_dir_dst.join(name);

    let probe_kinds = probe_entry_followed(&path_src).and_then(|kind_src| {
        probe_entry_plain(&path_dst).map(|kind_dst_plain| (kind_src, kind_dst_plain))
    });
    let (kind_src, kind_dst_plain) = match probe_kinds {
        Ok((Some(kind_src), kind_dst_plain)) => (kind_src, kind_dst_plain),
        Ok((None, _)) => {
            spec_sync_ctx
                .builder_report
                .add_warning(format!("Special file skipped: '{}'", path_src.display()));
            return;
        }
        Err(e) => {
            record_failure(spec_sync_ctx, &path_dst, EnumEntryKind::File, "inspect", e);
            return;
        }
    };

    // Destination links and special files are never written through.
    if kind_dst_plain != Some(kind_src) {
        replace_entry(&path_src, &path_dst, kind_src, spec_sync_ctx);
        return;
    }
    if kind_src == EnumEntryKind::Directory {
        sync_directory(&path_src, &path_dst, spec_sync_ctx);
        return;
    }

    match files_differ(&path_src, &path_dst) {
        Ok(true) => overwrite_file(&path_src, &path_dst, spec_sync_ctx),
        Ok(false) => {
            tracing::info!(
                "File '{}' and '{}' are same",
                path_src.display(),
                path_dst.display()
            );
            spec_sync_ctx.builder_report.add_outcome(
                path_dst,
                EnumEntryKind::File,
                EnumSyncOutcomeKind::Unchanged,
            );
        }
        Err(e) => record_failure(spec_sync_ctx, &path_dst, EnumEntryKind::File, "compare", e),
    }
}

fn overwrite_file(path_src: &Path, path_dst: &Path, spec_sync_ctx: &mut SpecSyncContext) {
    tracing::info!(
        "{}Updating '{}' from '{}'",
        spec_sync_ctx.c_prefix(),
        path_dst.display(),
        path_src.display()
    );
    if !spec_sync_ctx.if_dry_run {
        if let Err(e) =
            copy_file_with_metadata(path_src, path_dst, &mut spec_sync_ctx.builder_report)
        {
            record_failure(spec_sync_ctx, path_dst, EnumEntryKind::File, "overwrite", e);
            return;
        }
        tracing::info!("Synced '{}' to '{}'", path_src.display(), path_dst.display());
    }
    spec_sync_ctx.builder_report.add_outcome(
        path_dst.to_path_buf(),
        EnumEntryKind::File,
        EnumSyncOutcomeKind::Overwritten,
    );
}

/// Destination entry has the wrong kind, or is a link or special file:
/// delete it, then copy the source entry.
fn replace_entry(
    path_src: &Path,
    path_dst: &Path,
    kind_src: EnumEntryKind,
    spec_sync_ctx: &mut SpecSyncContext,
) {
    let kind_dst = match probe_entry_unfollowed(path_dst) {
        Ok(kind) => kind,
        Err(e) => {
            record_failure(spec_sync_ctx, path_dst, EnumEntryKind::File, "inspect", e);
            return;
        }
    };
    tracing::info!(
        "{}Replacing {} '{}' with {} '{}'",
        spec_sync_ctx.c_prefix(),
        kind_dst.as_str(),
        path_dst.display(),
        kind_src.as_str(),
        path_src.display()
    );
    if delete_entry(path_dst, kind_dst, spec_sync_ctx) {
        copy_entry(path_src, path_dst, kind_src, spec_sync_ctx);
    }
}

fn record_failure(
    spec_sync_ctx: &mut SpecSyncContext,
    path: &Path,
    kind: EnumEntryKind,
    c_action: &str,
    error: io::Error,
) {
    let enum_error_kind = EnumSyncErrorKind::from_io(&error);
    match enum_error_kind {
        EnumSyncErrorKind::PermissionDenied => {
            tracing::error!("Permission denied for '{}'", path.display())
        }
        EnumSyncErrorKind::Io => {
            tracing::error!("Failed to {c_action} '{}' ({error})", path.display())
        }
    }
    spec_sync_ctx.builder_report.add_outcome(
        path.to_path_buf(),
        kind,
        enum_error_kind.as_outcome(),
    );
    spec_sync_ctx
        .builder_report
        .add_error(path.to_path_buf(), enum_error_kind, error.to_string());
}
