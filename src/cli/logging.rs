//! Message-only logging to stderr for the duration of one run.
//!
//! The subscriber is installed as the thread's default through a guard, so a
//! run that returns (or unwinds) takes its handler with it and repeated
//! in-process runs never stack up writers.
use std::fmt;
use std::io::Write;

use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber, field::Visit};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Environment variable holding the log filter, e.g. `CRIMP_LOG=debug`.
pub const LOG_ENV: &str = "CRIMP_LOG";

/// Keeps the run's subscriber installed until dropped.
pub struct LogGuard {
    _default: DefaultGuard,
}

/// Install message-only logging at the `CRIMP_LOG` level (default `warn`).
pub fn install<W>(writer: W) -> LogGuard
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(MessageLayer { writer });
    LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
    }
}

struct MessageLayer<W> {
    writer: W,
}

struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl<S, W> Layer<S> for MessageLayer<W>
where
    S: Subscriber,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor {
            message: String::new(),
        };
        event.record(&mut visitor);

        let mut out = self.writer.make_writer();
        // nowhere left to report a failing stderr
        let _ = writeln!(out, "{}", visitor.message);
        let _ = out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().expect("capture lock").clone()).expect("utf-8")
        }
    }

    #[test]
    fn writes_bare_messages_while_installed() {
        let capture = Capture::default();
        let writer = capture.clone();
        {
            let _guard = install(move || writer.clone());
            tracing::error!("read error: {}", "bad byte");
            tracing::debug!("filtered out at the default level");
        }
        tracing::error!("not captured once the guard is gone");
        assert_eq!(capture.text(), "read error: bad byte\n");
    }
}
