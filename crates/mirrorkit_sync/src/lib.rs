//! `mirrorkit_sync` v1:
//! One-way periodic directory mirror engine.
//!
//! - `compare`  : one-level directory classification
//! - `sync`     : recursive diff-and-apply pass
//! - `schedule` : interval loop and cancellation gate
//! - `spec`     : enums/options/errors
//! - `report`   : per-pass report model and cross-pass totals
//! - `util`     : patterns and filesystem primitives

pub mod compare;
pub mod report;
pub mod schedule;
pub mod spec;
pub mod sync;
mod util;

pub use compare::{SpecDirectoryDiff, compare_directories, files_differ};
pub use report::{ReportPass, ReportPassBuilder, ReportTotals};
pub use schedule::{
    EnumGateDecision, N_INTERVAL_SECS_DEFAULT, PassGate, SpecScheduleOptions, StdinPassGate,
    run_schedule,
};
pub use spec::{
    EnumEntryKind, EnumPatternMode, EnumSyncErrorKind, EnumSyncOutcomeKind, SpecSyncError,
    SpecSyncOptions, SpecSyncOutcome, SyncTreeError,
};
pub use sync::{sync_tree, validate_roots};
pub use util::SpecSyncPatterns;
