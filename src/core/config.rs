//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the application runtime.
//!
//! ## Sentinel values
//! - `ack_timeout = 0s` → wait forever for pause/terminate acknowledgments
//! - `bus_capacity`, `fault_capacity` are clamped to a minimum of 1

use std::time::Duration;

use crate::logging::LogGate;

/// Global configuration for the application runtime.
///
/// ## Field semantics
/// - `verbose`: lifecycle tracing (loop start, pause, terminate, exit)
/// - `debug`: deeper diagnostics (fault details, registry snapshots)
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `fault_capacity`: fault stream buffer (min 1); producers wait when full
/// - `ack_timeout`: per-loop deadline for pause/terminate acknowledgments (`0s` = none)
///
/// `verbose` and `debug` only change what is logged, never behavior.
#[derive(Clone, Debug)]
pub struct Config {
    /// Enables lifecycle tracing.
    pub verbose: bool,

    /// Enables diagnostic tracing.
    pub debug: bool,

    /// Capacity of the lifecycle event bus.
    ///
    /// Receivers lagging more than `bus_capacity` events observe `Lagged`.
    pub bus_capacity: usize,

    /// Capacity of the fault stream.
    ///
    /// With the default of 1 a second fault waits until the first one has
    /// been drained. Only the faulting loop's reporting task waits.
    pub fault_capacity: usize,

    /// Deadline for each pause/terminate acknowledgment.
    ///
    /// - `Duration::ZERO` = no deadline: a loop that never acknowledges blocks
    ///   shutdown indefinitely
    /// - `> 0` = a silent loop is skipped (pause) or dropped from the registry
    ///   (terminate) after this long, and `AckTimedOut` is published
    pub ack_timeout: Duration,
}

impl Config {
    /// Returns the acknowledgment deadline as an `Option`.
    #[inline]
    pub fn ack_timeout(&self) -> Option<Duration> {
        if self.ack_timeout == Duration::ZERO {
            None
        } else {
            Some(self.ack_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a fault stream capacity clamped to a minimum of 1.
    #[inline]
    pub fn fault_capacity_clamped(&self) -> usize {
        self.fault_capacity.max(1)
    }

    /// Builds the logging gate for these flags.
    #[inline]
    pub fn log_gate(&self) -> LogGate {
        LogGate::new(self.verbose, self.debug)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `verbose = false`, `debug = false`
    /// - `bus_capacity = 1024`
    /// - `fault_capacity = 1`
    /// - `ack_timeout = 0s` (wait forever)
    fn default() -> Self {
        Self {
            verbose: false,
            debug: false,
            bus_capacity: 1024,
            fault_capacity: 1,
            ack_timeout: Duration::ZERO,
        }
    }
}
