//! # Verbosity-gated logging.
//!
//! [`LogGate`] decides whether lifecycle and diagnostic lines are emitted at
//! all; emission itself goes through `tracing` under the `loopvisor` target.
//! Installing a `tracing` subscriber is left to the binary.
//!
//! | call                | emitted when    | level   |
//! |---------------------|-----------------|---------|
//! | [`LogGate::log`]    | `verbose`       | `INFO`  |
//! | [`LogGate::debug`]  | `debug`         | `DEBUG` |
//! | [`print`]           | always          | `INFO`  |
//! | [`fatal`]           | always, exits 1 | `ERROR` |

use std::fmt;

/// Logging gate built from [`Config`](crate::Config) flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogGate {
    verbose: bool,
    debug: bool,
}

impl LogGate {
    pub const fn new(verbose: bool, debug: bool) -> Self {
        Self { verbose, debug }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Lifecycle line, only in verbose mode.
    pub fn log(&self, args: fmt::Arguments<'_>) {
        if self.verbose {
            tracing::info!(target: "loopvisor", "{}", args);
        }
    }

    /// Diagnostic line, only in debug mode.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        if self.debug {
            tracing::debug!(target: "loopvisor", "{}", args);
        }
    }
}

/// Unconditional line.
pub fn print(args: fmt::Arguments<'_>) {
    tracing::info!(target: "loopvisor", "{}", args);
}

/// Logs the message and terminates the process with status 1.
pub fn fatal(args: fmt::Arguments<'_>) -> ! {
    tracing::error!(target: "loopvisor", "{}", args);
    std::process::exit(1)
}
