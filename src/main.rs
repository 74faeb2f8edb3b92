//! crimp CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: hook up SIGINT and the
//! standard streams, run one invocation, and exit with its status.
//! For programmatic use, prefer the library API (`crimp::api`).

use crimp::{Codec, Interrupt, StdStreams};

mod cli;

fn main() {
    let interrupt = Interrupt::install().unwrap_or_else(|err| {
        eprintln!("warning: SIGINT handler not installed: {err}");
        Interrupt::new()
    });

    let code = {
        let mut stdin = std::io::stdin().lock();
        let mut stdout = std::io::stdout().lock();
        // standard streams follow the locale; --encoding covers files
        let mut stdio =
            StdStreams::new(&mut stdin, &mut stdout).with_encoding(Codec::preferred());
        cli::run(std::env::args_os().collect(), &mut stdio, std::io::stderr, &interrupt)
    };
    std::process::exit(code);
}
