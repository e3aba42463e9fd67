//! Interval-driven pass loop with cooperative cancellation between passes.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use mirrorkit_log::{EnumLogLevel, log_event};

use crate::report::{ReportPass, ReportTotals};
use crate::spec::{SpecSyncOptions, SyncTreeError};
use crate::sync::{sync_tree, validate_roots};
use crate::util::SpecSyncPatterns;

/// Default wait between passes.
pub const N_INTERVAL_SECS_DEFAULT: u64 = 60;

/// Operator answer collected between two passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumGateDecision {
    /// Stop the loop and exit successfully.
    Quit,
    /// Start the next pass now.
    Continue,
    /// No answer within the interval; start the next pass.
    TimedOut,
}

/// Cancellation point consulted between passes.
pub trait PassGate {
    /// Block for at most `timeout` waiting for an operator decision.
    fn wait(&mut self, timeout: Duration) -> EnumGateDecision;
}

/// Loop options for [`run_schedule`].
#[derive(Debug, Clone)]
pub struct SpecScheduleOptions {
    /// Maximum wait between two passes.
    pub interval: Duration,
    /// Stop after this many passes without prompting after the last one.
    pub max_passes: Option<u64>,
    /// Key that quits the loop (compared case-insensitively).
    pub char_quit: char,
}

impl Default for SpecScheduleOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(N_INTERVAL_SECS_DEFAULT),
            max_passes: None,
            char_quit: 'q',
        }
    }
}

/// [`PassGate`] fed by stdin lines, read on a background thread.
///
/// The first character of each line is the answer. Keys typed while a pass
/// is running are queued and answer the next prompt.
#[derive(Debug)]
pub struct StdinPassGate {
    rx_keys: Receiver<char>,
    char_quit: char,
    if_input_closed: bool,
}

impl StdinPassGate {
    /// Start the stdin reader thread.
    pub fn spawn(char_quit: char) -> Self {
        let (tx_keys, rx_keys) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                let c_key = line.trim().chars().next().unwrap_or('\n');
                if tx_keys.send(c_key).is_err() {
                    break;
                }
            }
        });
        Self::from_receiver(rx_keys, char_quit)
    }

    /// Build a gate over an existing key channel.
    pub fn from_receiver(rx_keys: Receiver<char>, char_quit: char) -> Self {
        Self {
            rx_keys,
            char_quit,
            if_input_closed: false,
        }
    }
}

impl PassGate for StdinPassGate {
    fn wait(&mut self, timeout: Duration) -> EnumGateDecision {
        if !self.if_input_closed {
            println!("Next sync in {} seconds", timeout.as_secs());
            print!("(Press {} to exit or c to continue) ", self.char_quit);
            // Prompt only; a failed flush just delays its display.
            io::stdout().flush().ok();
        }
        match self.rx_keys.recv_timeout(timeout) {
            Ok(c_key) if c_key.eq_ignore_ascii_case(&self.char_quit) => EnumGateDecision::Quit,
            Ok(_) => EnumGateDecision::Continue,
            Err(RecvTimeoutError::Timeout) => EnumGateDecision::TimedOut,
            Err(RecvTimeoutError::Disconnected) => {
                if !self.if_input_closed {
                    self.if_input_closed = true;
                    log_event(
                        EnumLogLevel::Warning,
                        "Input closed; passes continue on the interval only",
                    );
                }
                thread::sleep(timeout);
                EnumGateDecision::TimedOut
            }
        }
    }
}

/// Run mirror passes until the gate answers [`EnumGateDecision::Quit`] or
/// `max_passes` is reached.
///
/// Roots and patterns are validated once up front; those errors are returned
/// before any pass. A pass that fails later (root unreadable) is logged as
/// critical, counted in the totals, and retried after the interval.
pub fn run_schedule<G>(
    dir_source: &Path,
    dir_destination: &Path,
    spec_sync_options: &SpecSyncOptions,
    spec_schedule_options: &SpecScheduleOptions,
    gate: &mut G,
) -> Result<ReportTotals, SyncTreeError>
where
    G: PassGate + ?Sized,
{
    validate_roots(dir_source, dir_destination)?;
    SpecSyncPatterns::from_raw(
        spec_sync_options.patterns_exclude.as_deref(),
        spec_sync_options.rule_pattern,
    )?;

    let mut report_totals = ReportTotals::default();
    log_event(EnumLogLevel::Info, "Sync starts..");
    loop {
        match sync_tree(dir_source, dir_destination, spec_sync_options) {
            Ok(report_pass) => {
                report_totals.merge_pass(&report_pass);
                log_pass_summary(&report_pass, &report_totals);
            }
            Err(e) => {
                report_totals.merge_failed_pass();
                log_event(EnumLogLevel::Critical, &format!("Sync pass failed: {e}"));
            }
        }

        if spec_schedule_options
            .max_passes
            .is_some_and(|n| report_totals.cnt_passes >= n)
        {
            return Ok(report_totals);
        }

        match gate.wait(spec_schedule_options.interval) {
            EnumGateDecision::Quit => {
                log_event(EnumLogLevel::Info, "Quitting program..");
                return Ok(report_totals);
            }
            EnumGateDecision::Continue => {}
            EnumGateDecision::TimedOut => log_event(EnumLogLevel::Info, "Sync starts.."),
        }
    }
}

fn log_pass_summary(report_pass: &ReportPass, report_totals: &ReportTotals) {
    for line in report_pass.summary_lines() {
        log_event(EnumLogLevel::Info, &line);
    }
    let level = if report_pass.error_count() > 0 {
        EnumLogLevel::Warning
    } else {
        EnumLogLevel::Info
    };
    log_event(
        level,
        &format!(
            "Total errors: {} (cumulative {})",
            report_pass.error_count(),
            report_totals.cnt_errors
        ),
    );
    if report_pass.warning_count() > 0 {
        log_event(
            EnumLogLevel::Warning,
            &format!("Total warnings: {}", report_pass.warning_count()),
        );
    }
    log_event(EnumLogLevel::Info, "Sync complete!");
}
