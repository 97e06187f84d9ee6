//! Injectable diagnostic sinks built on the [`log`] facade.
//!
//! Functions that emit diagnostics take a `&dyn log::Log` rather than writing
//! to the process-wide logger directly, so callers can capture or silence
//! them. Pass [`global`] to forward to whatever logger the application has
//! installed.

use log::{ Level, Log, Metadata, Record };

/// The process-wide logger installed with [`log::set_logger`].
pub fn global() -> &'static dyn Log { log::logger() }

/// A sink that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct Silent;

impl Log for Silent {
    fn enabled(&self, _metadata: &Metadata) -> bool { false }

    fn log(&self, _record: &Record) { }

    fn flush(&self) { }
}

pub(crate) fn emit(
    logger: &dyn Log,
    level: Level,
    target: &str,
    args: std::fmt::Arguments<'_>,
) {
    let record
        = Record::builder()
        .level(level)
        .target(target)
        .args(args)
        .build();
    if logger.enabled(record.metadata()) {
        logger.log(&record);
    }
}

/// Emit a debug-level message to an explicit sink.
macro_rules! debug_to {
    ( $logger:expr, $($arg:tt)+ ) => {
        $crate::diagnostics::emit(
            $logger,
            ::log::Level::Debug,
            module_path!(),
            format_args!($($arg)+),
        )
    }
}
pub(crate) use debug_to;

/// Emit a trace-level message to an explicit sink.
macro_rules! trace_to {
    ( $logger:expr, $($arg:tt)+ ) => {
        $crate::diagnostics::emit(
            $logger,
            ::log::Level::Trace,
            module_path!(),
            format_args!($($arg)+),
        )
    }
}
pub(crate) use trace_to;

#[cfg(test)]
pub(crate) mod test {
    use std::sync::Mutex;
    use log::{ Level, Log, Metadata, Record };

    /// Records every message it receives.
    #[derive(Debug, Default)]
    pub(crate) struct Capture(pub Mutex<Vec<(Level, String)>>);

    impl Capture {
        pub(crate) fn messages(&self) -> Vec<(Level, String)> {
            self.0.lock().map(|m| m.clone()).unwrap_or_default()
        }
    }

    impl Log for Capture {
        fn enabled(&self, _metadata: &Metadata) -> bool { true }

        fn log(&self, record: &Record) {
            if let Ok(mut messages) = self.0.lock() {
                messages.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) { }
    }

    #[test]
    fn captures_and_silences() {
        let capture = Capture::default();
        debug_to!(&capture, "found {} of {}", 1, 2);
        trace_to!(&capture, "sweep {}", 3);
        assert_eq!(
            capture.messages(),
            vec![
                (Level::Debug, "found 1 of 2".to_string()),
                (Level::Trace, "sweep 3".to_string()),
            ],
        );
        debug_to!(&super::Silent, "dropped");
    }
}
