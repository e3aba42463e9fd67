//! Event line formatting for the log file and the console.

use std::fmt;

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Field name that upgrades an error event to `CRITICAL`.
pub const C_FIELD_CRITICAL: &str = "critical";

const DISPLAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Line layout of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumLineStyle {
    /// `<YYYY-MM-DD HH:MM:SS> <LEVEL>: <message>`.
    Timestamped,
    /// The raw message only.
    MessageOnly,
}

/// [`FormatEvent`] producing mirrorkit log lines.
#[derive(Debug, Clone, Copy)]
pub struct FormatEventLine {
    style: EnumLineStyle,
}

impl FormatEventLine {
    /// Format for the durable log file.
    pub fn timestamped() -> Self {
        Self {
            style: EnumLineStyle::Timestamped,
        }
    }

    /// Format for the console echo.
    pub fn message_only() -> Self {
        Self {
            style: EnumLineStyle::MessageOnly,
        }
    }
}

#[derive(Default)]
struct VisitorEventFields {
    message: String,
    if_critical: bool,
}

impl Visit for VisitorEventFields {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == C_FIELD_CRITICAL {
            self.if_critical = value;
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

/// Python-logging style label for a tracing level.
pub fn label_level(level: &Level, if_critical: bool) -> &'static str {
    if if_critical {
        return "CRITICAL";
    }
    match *level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        Level::DEBUG => "DEBUG",
        Level::TRACE => "TRACE",
    }
}

/// Render the timestamp prefix used in the log file.
pub fn format_timestamp(now: OffsetDateTime) -> Result<String, time::error::Format> {
    now.format(DISPLAY_FORMAT)
}

pub(crate) fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

impl<S, N> FormatEvent<S, N> for FormatEventLine
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = VisitorEventFields::default();
        event.record(&mut visitor);

        if self.style == EnumLineStyle::Timestamped {
            let c_timestamp = format_timestamp(now_local_or_utc()).map_err(|_| fmt::Error)?;
            let c_level = label_level(event.metadata().level(), visitor.if_critical);
            write!(writer, "{c_timestamp} {c_level}: ")?;
        }
        writeln!(writer, "{}", visitor.message)
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;
    use time::OffsetDateTime;
    use tracing::Level;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    use super::{FormatEventLine, format_timestamp, label_level};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("buffer lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().expect("buffer lock").clone()).expect("utf8")
        }
    }

    fn capture(format: FormatEventLine, emit: impl FnOnce()) -> String {
        let buf = SharedBuf::default();
        let buf_writer = buf.clone();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .event_format(format)
                .with_ansi(false)
                .with_writer(move || buf_writer.clone()),
        );
        tracing::subscriber::with_default(subscriber, emit);
        buf.text()
    }

    #[test]
    fn timestamp_has_fixed_layout() {
        let fixed = OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("timestamp");
        assert_eq!(
            format_timestamp(fixed).expect("format"),
            "2023-11-14 22:13:20"
        );
    }

    #[test]
    fn levels_use_python_style_labels() {
        assert_eq!(label_level(&Level::WARN, false), "WARNING");
        assert_eq!(label_level(&Level::ERROR, false), "ERROR");
        assert_eq!(label_level(&Level::ERROR, true), "CRITICAL");
    }

    #[test]
    fn file_line_is_timestamp_level_message() {
        let txt = capture(FormatEventLine::timestamped(), || {
            tracing::warn!("Deleting '{}' from destination folder", "/dst/a.txt");
        });

        let line = txt.lines().next().expect("one line");
        let (c_timestamp, c_rest) = line.split_at(19);
        assert_eq!(c_timestamp.len(), "2023-11-14 22:13:20".len());
        assert_eq!(&c_timestamp[4..5], "-");
        assert_eq!(
            c_rest,
            " WARNING: Deleting '/dst/a.txt' from destination folder"
        );
    }

    #[test]
    fn critical_field_upgrades_label() {
        let txt = capture(FormatEventLine::timestamped(), || {
            tracing::error!(critical = true, "Sync pass failed");
        });
        assert!(txt.trim_end().ends_with(" CRITICAL: Sync pass failed"));
    }

    #[test]
    fn console_line_is_raw_message() {
        let txt = capture(FormatEventLine::message_only(), || {
            tracing::info!("Copying success");
        });
        assert_eq!(txt, "Copying success\n");
    }
}
