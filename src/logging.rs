//! Log output: one `[<timestamp>] <message>` line per event.

use chrono::Local;
use std::fmt;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local wall-clock time in square brackets.
#[derive(Clone, Copy, Debug, Default)]
pub struct BracketedLocalTime;

impl FormatTime for BracketedLocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "[{}]", Local::now().format(TIMESTAMP_FORMAT))
    }
}

/// Subscriber writing plain log lines to `make_writer`, filtered by `filter`.
pub fn subscriber<W>(make_writer: W, filter: EnvFilter) -> impl Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_timer(BracketedLocalTime)
        .with_level(false)
        .with_target(false)
        .with_ansi(false)
        .with_env_filter(filter)
        .with_writer(make_writer)
        .finish()
}

/// Install the stdout subscriber globally; `RUST_LOG` overrides the `info` default.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed by an embedding application
    let _ = tracing::subscriber::set_global_default(subscriber(std::io::stdout, filter));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn lines_are_bracketed_and_bare() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = subscriber(move || writer.clone(), EnvFilter::new("info"));
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Project loaded successfully.");
            tracing::debug!("hidden");
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        let line = lines[0];
        assert!(line.starts_with('['));
        // "[YYYY-MM-DD HH:MM:SS] " is 22 characters
        assert_eq!(&line[20..22], "] ");
        assert_eq!(&line[22..], "Project loaded successfully.");
    }
}
