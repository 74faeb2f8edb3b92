//! Cooperative SIGINT handling.
//!
//! A delivered SIGINT sets a flag that the pipeline checks between stages. While
//! the process is blocked reading standard input there is no stage boundary to
//! reach, so the signal terminates the process right away with exit code 130.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use signal_hook::consts::signal::SIGINT;
use signal_hook::flag;
use tracing::debug;

use crate::error::{EXIT_INTERRUPTED, Error, Result};

#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    pending: Arc<AtomicBool>,
    blocking: Arc<AtomicBool>,
}

impl Interrupt {
    /// An interrupt flag not wired to any signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route SIGINT into this flag for the rest of the process lifetime.
    pub fn install() -> std::io::Result<Self> {
        let interrupt = Self::new();
        // registered first so it sees the signal before the flag handler
        flag::register_conditional_shutdown(SIGINT, EXIT_INTERRUPTED, Arc::clone(&interrupt.blocking))?;
        flag::register(SIGINT, Arc::clone(&interrupt.pending))?;
        debug!("SIGINT handler installed");
        Ok(interrupt)
    }

    /// Mark the run as interrupted, as a delivered SIGINT would.
    pub fn request(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// `Err(Error::Interrupted)` once SIGINT has arrived.
    pub fn check(&self) -> Result<()> {
        if self.is_pending() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Run `f`, letting SIGINT end the process immediately while it runs.
    pub fn blocking<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        self.check()?;
        self.blocking.store(true, Ordering::SeqCst);
        let value = f();
        self.blocking.store(false, Ordering::SeqCst);
        self.check()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_until_requested() {
        let interrupt = Interrupt::new();
        assert!(interrupt.check().is_ok());
        interrupt.request();
        assert!(matches!(interrupt.check(), Err(Error::Interrupted)));
    }

    #[test]
    fn blocking_refuses_to_start_after_interrupt() {
        let interrupt = Interrupt::new();
        assert_eq!(interrupt.blocking(|| 7).ok(), Some(7));
        interrupt.request();
        let mut ran = false;
        assert!(interrupt.blocking(|| ran = true).is_err());
        assert!(!ran);
    }

    #[test]
    fn clones_share_the_flag() {
        let interrupt = Interrupt::new();
        let other = interrupt.clone();
        other.request();
        assert!(interrupt.is_pending());
    }
}
