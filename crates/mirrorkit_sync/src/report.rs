//! Pass report models, mutable report builder and cross-pass totals.

use std::path::PathBuf;

use crate::spec::{
    EnumEntryKind, EnumSyncErrorKind, EnumSyncOutcomeKind, SpecSyncError, SpecSyncOutcome,
};

/// Aggregate counters and diagnostics for one `sync_tree` pass.
#[derive(Debug, Default, Clone)]
pub struct ReportPass {
    /// Files copied because they existed only in the source.
    pub cnt_files_copied: u64,
    /// Files removed because they existed only in the destination.
    pub cnt_files_deleted: u64,
    /// Destination files overwritten with different source content.
    pub cnt_files_modified: u64,
    /// Directory subtrees copied because they existed only in the source.
    pub cnt_dirs_copied: u64,
    /// Directory subtrees removed because they existed only in the destination.
    pub cnt_dirs_deleted: u64,
    /// Files flagged as different that turned out identical on re-check.
    pub cnt_unchanged: u64,
    /// Every recorded outcome, in application order.
    pub outcomes: Vec<SpecSyncOutcome>,
    /// Non-fatal warnings collected during traversal/copy.
    pub warnings: Vec<String>,
    /// Per-entry failures.
    pub errors: Vec<SpecSyncError>,
}

impl ReportPass {
    /// Number of collected per-entry errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Number of copy, delete and overwrite operations applied.
    pub fn change_count(&self) -> u64 {
        self.cnt_files_copied
            + self.cnt_files_deleted
            + self.cnt_files_modified
            + self.cnt_dirs_copied
            + self.cnt_dirs_deleted
    }

    /// Outcomes recorded for one destination path.
    pub fn outcomes_for(&self, path: &std::path::Path) -> Vec<EnumSyncOutcomeKind> {
        self.outcomes
            .iter()
            .filter(|o| o.path == path)
            .map(|o| o.outcome)
            .collect()
    }

    /// Human-readable summary lines logged at the end of a pass.
    pub fn summary_lines(&self) -> [String; 2] {
        [
            format!(
                "Copied {} files, deleted {} files, modified {} files.",
                self.cnt_files_copied, self.cnt_files_deleted, self.cnt_files_modified
            ),
            format!(
                "Copied {} folders, deleted {} folders.",
                self.cnt_dirs_copied, self.cnt_dirs_deleted
            ),
        ]
    }
}

/// Mutable accumulator for one pass.
#[derive(Debug, Default, Clone)]
pub struct ReportPassBuilder {
    report: ReportPass,
}

impl ReportPassBuilder {
    /// Record one outcome and bump the matching counter.
    ///
    /// Skipped outcomes only land in `outcomes`; their error text goes
    /// through [`Self::add_error`].
    pub fn add_outcome(&mut self, path: PathBuf, kind: EnumEntryKind, outcome: EnumSyncOutcomeKind) {
        let report = &mut self.report;
        match (outcome, kind) {
            (EnumSyncOutcomeKind::Copied, EnumEntryKind::File) => report.cnt_files_copied += 1,
            (EnumSyncOutcomeKind::Copied, EnumEntryKind::Directory) => report.cnt_dirs_copied += 1,
            (EnumSyncOutcomeKind::Deleted, EnumEntryKind::File) => report.cnt_files_deleted += 1,
            (EnumSyncOutcomeKind::Deleted, EnumEntryKind::Directory) => {
                report.cnt_dirs_deleted += 1
            }
            (EnumSyncOutcomeKind::Overwritten, _) => report.cnt_files_modified += 1,
            (EnumSyncOutcomeKind::Unchanged, _) => report.cnt_unchanged += 1,
            (EnumSyncOutcomeKind::SkippedPermissionDenied, _)
            | (EnumSyncOutcomeKind::SkippedError, _) => {}
        }
        report.outcomes.push(SpecSyncOutcome {
            path,
            kind,
            outcome,
        });
    }

    /// Log a warning and keep it in the report.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.report.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, kind: EnumSyncErrorKind, exception: String) {
        self.report.errors.push(SpecSyncError {
            path,
            kind,
            exception,
        });
    }

    /// Finalize builder into the pass report.
    pub fn build(self) -> ReportPass {
        self.report
    }
}

/// Cross-pass totals kept by the scheduler.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportTotals {
    /// Number of passes started.
    pub cnt_passes: u64,
    /// Passes that aborted before finishing (root unreadable).
    pub cnt_passes_failed: u64,
    /// Sum of [`ReportPass::cnt_files_copied`].
    pub cnt_files_copied: u64,
    /// Sum of [`ReportPass::cnt_files_deleted`].
    pub cnt_files_deleted: u64,
    /// Sum of [`ReportPass::cnt_files_modified`].
    pub cnt_files_modified: u64,
    /// Sum of [`ReportPass::cnt_dirs_copied`].
    pub cnt_dirs_copied: u64,
    /// Sum of [`ReportPass::cnt_dirs_deleted`].
    pub cnt_dirs_deleted: u64,
    /// Per-entry errors plus failed passes.
    pub cnt_errors: u64,
}

impl ReportTotals {
    /// Fold a finished pass into the totals.
    pub fn merge_pass(&mut self, report: &ReportPass) {
        self.cnt_passes += 1;
        self.cnt_files_copied += report.cnt_files_copied;
        self.cnt_files_deleted += report.cnt_files_deleted;
        self.cnt_files_modified += report.cnt_files_modified;
        self.cnt_dirs_copied += report.cnt_dirs_copied;
        self.cnt_dirs_deleted += report.cnt_dirs_deleted;
        self.cnt_errors += report.error_count() as u64;
    }

    /// Count a pass that could not run to completion.
    pub fn merge_failed_pass(&mut self) {
        self.cnt_passes += 1;
        self.cnt_passes_failed += 1;
        self.cnt_errors += 1;
    }
}
