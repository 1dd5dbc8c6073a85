//! # SignalFanout: deliver every OS signal to every installed handler.
//!
//! ## Architecture
//! ```text
//! OS ──► listener task ──► dispatch(sig)
//!                             │ lock, copy handler set, unlock
//!                             ├──► handler1.handle_signal(sig)
//!                             ├──► handler2.handle_signal(sig)
//!                             └──► handlerN.handle_signal(sig)
//! ```
//!
//! ## Rules
//! - Handlers are keyed by `Arc` identity; installing twice or uninstalling a
//!   stranger are no-ops.
//! - Each dispatch works on a snapshot, so handlers (un)installed meanwhile
//!   only see later signals.
//! - Handlers run one after another on the listener task, in unspecified
//!   order; a slow handler delays the rest. A panicking handler is logged and
//!   skipped.

use std::collections::HashMap;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;

use crate::error::FaultPayload;
use crate::signals::os::{self, Signal};

/// Observer of process signals.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use loopvisor::{Application, Signal, SignalHandler};
///
/// struct ExitOnShutdown(Arc<Application>);
///
/// impl SignalHandler for ExitOnShutdown {
///     fn handle_signal(&self, signal: Signal) {
///         if signal.is_shutdown() {
///             self.0.exit();
///         }
///     }
/// }
/// ```
pub trait SignalHandler: Send + Sync + 'static {
    /// Called once per received signal, on the listener task.
    fn handle_signal(&self, signal: Signal);
}

/// Shared handle to a signal handler.
pub type SignalHandlerRef = Arc<dyn SignalHandler>;

/// Identity-keyed set of signal handlers.
#[derive(Default)]
pub struct SignalFanout {
    handlers: Mutex<HashMap<usize, SignalHandlerRef>>,
}

fn identity(handler: &SignalHandlerRef) -> usize {
    Arc::as_ptr(handler) as *const () as usize
}

impl SignalFanout {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, SignalHandlerRef>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `handler`. Returns `false` if it was already installed.
    pub fn install(&self, handler: SignalHandlerRef) -> bool {
        self.lock().insert(identity(&handler), handler).is_none()
    }

    /// Removes `handler`. Returns `false` if it was not installed.
    pub fn uninstall(&self, handler: &SignalHandlerRef) -> bool {
        self.lock().remove(&identity(handler)).is_some()
    }

    /// True if `handler` is installed.
    pub fn contains(&self, handler: &SignalHandlerRef) -> bool {
        self.lock().contains_key(&identity(handler))
    }

    /// Number of installed handlers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no handler is installed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Delivers `signal` to a snapshot of the installed handlers.
    ///
    /// Returns how many handlers were called.
    pub fn dispatch(&self, signal: Signal) -> usize {
        let snapshot: Vec<SignalHandlerRef> = self.lock().values().cloned().collect();

        for handler in &snapshot {
            let res = panic::catch_unwind(AssertUnwindSafe(|| handler.handle_signal(signal)));
            if let Err(payload) = res {
                tracing::warn!(
                    target: "loopvisor",
                    "signal handler panicked on {signal}: {}",
                    FaultPayload::from_panic(payload).message()
                );
            }
        }
        snapshot.len()
    }

    /// Starts the background listener feeding every OS signal to [`dispatch`](Self::dispatch).
    ///
    /// Call once per fan-out. Must run inside a tokio runtime.
    pub fn spawn_listener(self: &Arc<Self>) -> io::Result<JoinHandle<()>> {
        let me = Arc::clone(self);
        os::listen(move |signal| {
            me.dispatch(signal);
        })
    }
}
