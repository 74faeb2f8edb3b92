//! Command Line Interface (CLI) layer for crimp.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! per-run logging (`logging`), the version report (`version`) and the
//! orchestration logic (`runner`) that turns one invocation into an exit code.
//!
//! If you are embedding crimp into another application, prefer the
//! high-level `crimp::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod logging;
pub mod runner;
pub mod version;

pub use runner::run;
