//! mirrorkit CLI
//!
//! Periodically mirrors a source folder onto a replica folder.

mod cli;
mod error;

use clap::Parser;
use mirrorkit_log::{EnumLogLevel, EventLogGuard, init_console_log, init_event_log, log_event};
use mirrorkit_sync::{StdinPassGate, run_schedule};

use cli::Cli;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let _guard = init_logging(&cli)?;
    println!(
        "Logging to the file {} with sync interval of {} seconds",
        cli.logfile.display(),
        cli.interval
    );

    let spec_schedule_options = cli.schedule_options();
    let mut gate = StdinPassGate::spawn(spec_schedule_options.char_quit);
    let report_totals = run_schedule(
        &cli.src,
        &cli.dst,
        &cli.sync_options(),
        &spec_schedule_options,
        &mut gate,
    )?;
    tracing::debug!(?report_totals, "Run finished");
    Ok(())
}

/// File + console logging, degrading to console only if the file is unusable.
fn init_logging(cli: &Cli) -> Result<Option<EventLogGuard>> {
    match init_event_log(&cli.logfile) {
        Ok(guard) => Ok(Some(guard)),
        Err(e @ mirrorkit_log::LoggingError::SetGlobal(_)) => Err(e.into()),
        Err(e) => {
            init_console_log()?;
            log_event(
                EnumLogLevel::Warning,
                &format!("Log file unavailable, logging to console only: {e}"),
            );
            Ok(None)
        }
    }
}
