//! # Request/acknowledge signaling point.
//!
//! A [`Rendezvous`] is the pause or terminate control point of a loop. The
//! orchestrator calls [`Rendezvous::request`] and is suspended until the loop
//! has taken the request with [`Rendezvous::recv`] and answered with
//! [`Ack::ack`].
//!
//! ```text
//! orchestrator                         loop
//!   request() ──► [slot: 1] ──► recv() -> Ack
//!      │                                 │ (reach a quiescent point)
//!      ◄──────────── oneshot ◄──────── ack()
//! ```
//!
//! ## Rules
//! - The requester never proceeds before the acknowledgment (or before the
//!   loop dropped the [`Ack`]); this is what makes the pause barrier hold.
//! - There is no deadline here. Callers that need one wrap `request()` in
//!   `tokio::time::timeout`.

use std::fmt;

use tokio::sync::{Mutex, mpsc, oneshot};

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The loop acknowledged.
    Acked,
    /// The loop took the request and dropped the [`Ack`] without answering.
    Dropped,
}

/// Pending acknowledgment handed to the loop by [`Rendezvous::recv`].
#[must_use = "the requester stays blocked until the request is acknowledged"]
pub struct Ack(oneshot::Sender<()>);

impl Ack {
    /// Releases the requester.
    pub fn ack(self) {
        let _ = self.0.send(());
    }
}

impl fmt::Debug for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ack")
    }
}

/// Synchronous hand-off between a requester and a loop.
pub struct Rendezvous {
    tx: mpsc::Sender<oneshot::Sender<()>>,
    rx: Mutex<mpsc::Receiver<oneshot::Sender<()>>>,
}

impl Rendezvous {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Sends a request and waits until the loop answers.
    ///
    /// Cancel-safe: dropping the future before completion leaves at most a
    /// stale request behind, whose acknowledgment goes nowhere.
    pub async fn request(&self) -> Outcome {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(ack_tx).await.is_err() {
            return Outcome::Dropped;
        }
        match ack_rx.await {
            Ok(()) => Outcome::Acked,
            Err(_) => Outcome::Dropped,
        }
    }

    /// Waits for the next request.
    ///
    /// Cancel-safe, so it can be used as a `tokio::select!` branch. Returns
    /// `None` only if the sending half is gone, which cannot happen while the
    /// `Rendezvous` itself is alive.
    pub async fn recv(&self) -> Option<Ack> {
        self.rx.lock().await.recv().await.map(Ack)
    }
}

impl Default for Rendezvous {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Rendezvous {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rendezvous").finish_non_exhaustive()
    }
}
