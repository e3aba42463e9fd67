//! CLI argument parsing using clap derive

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use mirrorkit_log::C_LOG_FILE_DEFAULT;
use mirrorkit_sync::{
    EnumPatternMode, N_INTERVAL_SECS_DEFAULT, SpecScheduleOptions, SpecSyncOptions,
};

/// Mirror a source directory onto a destination directory on an interval
#[derive(Parser, Debug)]
#[command(name = "mirrorkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the source folder
    pub src: PathBuf,

    /// Path to the replica folder
    pub dst: PathBuf,

    /// Time interval in seconds between each sync
    #[arg(short, long, default_value_t = N_INTERVAL_SECS_DEFAULT, env = "MIRRORKIT_INTERVAL")]
    pub interval: u64,

    /// Path to the log file
    #[arg(short, long, default_value = C_LOG_FILE_DEFAULT, env = "MIRRORKIT_LOG_FILE")]
    pub logfile: PathBuf,

    /// Entry names to leave alone on both sides (repeatable)
    #[arg(short, long = "exclude", value_name = "PATTERN")]
    pub excludes: Vec<String>,

    /// How exclude patterns are interpreted
    #[arg(long, value_enum, default_value_t = PatternModeArg::Glob)]
    pub pattern_mode: PatternModeArg,

    /// Log what would change without touching the replica
    #[arg(long)]
    pub dry_run: bool,

    /// Run a single pass and exit
    #[arg(long)]
    pub once: bool,
}

/// Exclude pattern syntax
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternModeArg {
    Glob,
    Regex,
    Literal,
}

impl From<PatternModeArg> for EnumPatternMode {
    fn from(value: PatternModeArg) -> Self {
        match value {
            PatternModeArg::Glob => EnumPatternMode::Glob,
            PatternModeArg::Regex => EnumPatternMode::Regex,
            PatternModeArg::Literal => EnumPatternMode::Literal,
        }
    }
}

impl Cli {
    /// Engine options derived from the arguments.
    pub fn sync_options(&self) -> SpecSyncOptions {
        SpecSyncOptions {
            patterns_exclude: (!self.excludes.is_empty()).then(|| self.excludes.clone()),
            rule_pattern: self.pattern_mode.into(),
            if_dry_run: self.dry_run,
        }
    }

    /// Loop options derived from the arguments.
    pub fn schedule_options(&self) -> SpecScheduleOptions {
        SpecScheduleOptions {
            interval: Duration::from_secs(self.interval),
            max_passes: self.once.then_some(1),
            ..SpecScheduleOptions::default()
        }
    }
}
