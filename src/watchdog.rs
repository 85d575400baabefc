//! This module contains the type definitions necessary to support the
//! monitoring functionality for long-running analyses.
//!
//! # Best-Effort Monitoring
//!
//! Note that the monitoring provided by the watchdog is a best-effort
//! approach. The search loop polls it between iterations, so a stop
//! request takes effect at the next poll, not instantaneously.

use std::{
    fmt::Debug,
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use crate::constant::DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS;

/// A dynamically dispatched [`Watchdog`] instance.
pub type DynWatchdog = Rc<dyn Watchdog>;

/// The interface to an object that can be polled to see if a long-running
/// analysis needs to abort.
///
/// The interface is simple, but it can encapsulate arbitrary logic as far
/// as the library is concerned, allowing the client to implement complex
/// stop conditions.
pub trait Watchdog
where
    Self: Debug,
{
    /// Checks if the analysis should halt and return an error.
    #[must_use]
    fn should_stop(&self) -> bool;

    /// Gets the number of loop iterations to wait between polls of the
    /// watchdog.
    #[must_use]
    fn poll_every(&self) -> usize;
}

/// An implementation of the [`Watchdog`] trait that never requests a stop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LazyWatchdog;

impl LazyWatchdog {
    /// Wraps `self` into an [`Rc`].
    #[must_use]
    pub fn in_rc(self) -> Rc<dyn Watchdog> {
        Rc::new(self)
    }
}

impl Watchdog for LazyWatchdog {
    fn should_stop(&self) -> bool {
        false
    }

    fn poll_every(&self) -> usize {
        // Something ridiculously huge so it basically never gets checked.
        1_000_000_000_000
    }
}

/// A watchdog that requests a stop based on a flag in the form of an
/// atomic boolean.
///
/// By default, it requests that the analysis poll for watchdog status
/// every [`DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS`]. This is configurable
/// by calling [`Self::polling_every`].
#[derive(Clone, Debug)]
pub struct FlagWatchdog {
    /// The flag that should be mutated externally to stop the analysis.
    flag: Arc<AtomicBool>,

    /// The number of loop iterations to wait between polls.
    poll_loop_iterations: usize,
}

impl FlagWatchdog {
    /// Constructs a new `FlagWatchdog` wrapping the provided `flag`.
    #[must_use]
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        let poll_loop_iterations = DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS;
        Self {
            flag,
            poll_loop_iterations,
        }
    }

    /// Specifies the number of loop iterations to wait between polls of
    /// the watchdog.
    #[must_use]
    pub fn polling_every(mut self, iterations: usize) -> Self {
        self.poll_loop_iterations = iterations;
        self
    }

    /// Wraps the watchdog into an [`Rc`].
    #[must_use]
    pub fn in_rc(self) -> Rc<dyn Watchdog> {
        Rc::new(self)
    }
}

impl Watchdog for FlagWatchdog {
    fn should_stop(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn poll_every(&self) -> usize {
        self.poll_loop_iterations
    }
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use crate::watchdog::{FlagWatchdog, LazyWatchdog, Watchdog};

    #[test]
    fn the_lazy_watchdog_never_stops() {
        assert!(!LazyWatchdog.should_stop());
    }

    #[test]
    fn the_flag_watchdog_follows_its_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let watchdog = FlagWatchdog::new(Arc::clone(&flag)).polling_every(10);

        assert!(!watchdog.should_stop());
        flag.store(true, Ordering::Relaxed);
        assert!(watchdog.should_stop());
        assert_eq!(watchdog.poll_every(), 10);
    }
}
