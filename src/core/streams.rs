//! Observation handles: fault stream and exit-completion signal.

use tokio::sync::{mpsc, watch};

use crate::error::Fault;

/// Receiving half of the fault stream.
///
/// Obtained once via [`Application::take_faults`](crate::Application::take_faults).
/// Keep draining it: with the default capacity of 1, a loop that panics while a
/// previous fault is still queued waits in its reporting task until the queue
/// has room.
#[derive(Debug)]
pub struct FaultStream {
    rx: mpsc::Receiver<Fault>,
}

impl FaultStream {
    pub(crate) fn new(rx: mpsc::Receiver<Fault>) -> Self {
        Self { rx }
    }

    /// Waits for the next fault. `None` once the application is dropped.
    pub async fn recv(&mut self) -> Option<Fault> {
        self.rx.recv().await
    }

    /// Returns a queued fault without waiting.
    pub fn try_recv(&mut self) -> Option<Fault> {
        self.rx.try_recv().ok()
    }
}

/// Fires once per completed shutdown.
///
/// Obtained via [`Application::exit_signal`](crate::Application::exit_signal);
/// completions that happened before the handle was created are not reported.
#[derive(Debug, Clone)]
pub struct ExitSignal {
    rx: watch::Receiver<u64>,
}

impl ExitSignal {
    pub(crate) fn new(rx: watch::Receiver<u64>) -> Self {
        Self { rx }
    }

    /// Waits for the next completed shutdown and returns the total number of
    /// completed shutdowns. `None` once the application is dropped.
    pub async fn wait(&mut self) -> Option<u64> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Number of shutdowns completed so far.
    pub fn completed(&self) -> u64 {
        *self.rx.borrow()
    }
}
