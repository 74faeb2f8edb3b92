use std::ffi::OsString;
use std::io::Write;

use tracing::{debug, error};
use tracing_subscriber::fmt::MakeWriter;

use crimp::{Error, Interrupt, StdStreams};

use super::args::{Invocation, parse_args};
use super::errors::AppError;
use super::logging;
use super::version;

/// Run one invocation and return the process exit code.
///
/// Every failure is reported as a single stderr line (usage errors also print
/// the usage text); an interrupted run exits quietly with 130.
pub fn run<W>(
    argv: Vec<OsString>,
    stdio: &mut StdStreams<'_>,
    stderr: W,
    interrupt: &Interrupt,
) -> i32
where
    W: for<'w> MakeWriter<'w> + Clone + Send + Sync + 'static,
{
    let _log = logging::install(stderr.clone());

    let invocation = match parse_args(&argv) {
        Ok(invocation) => invocation,
        Err(err) => return report_usage(&err, stdio, &stderr),
    };

    match invocation {
        Invocation::Version => match version::write_report(stdio.stdout) {
            Ok(()) => 0,
            Err(err) => fail(Error::from(err)),
        },
        Invocation::Run(options) => {
            debug!("options: {}", serde_json::to_string(&options).unwrap_or_default());
            match crimp::minify(&options, stdio, interrupt) {
                Ok(()) => 0,
                Err(Error::Interrupted) => crimp::EXIT_INTERRUPTED,
                Err(err) => fail(err),
            }
        }
    }
}

fn fail(err: Error) -> i32 {
    error!("{}", err);
    err.exit_code()
}

fn report_usage<W>(err: &AppError, stdio: &mut StdStreams<'_>, stderr: &W) -> i32
where
    W: for<'w> MakeWriter<'w>,
{
    let text = err.render();
    // a closed stream leaves nothing to report to
    let _ = if err.use_stderr() {
        stderr.make_writer().write_all(text.as_bytes())
    } else {
        stdio.stdout.write_all(text.as_bytes()).and_then(|()| stdio.stdout.flush())
    };
    err.exit_code()
}
