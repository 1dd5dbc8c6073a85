//! # Reusable control plumbing (`BaseLoop`)
//!
//! [`BaseLoop`] owns the pause and terminate [`Rendezvous`] points. Concrete
//! loops keep one as a field, forward [`Loop::pause_signal`] and
//! [`Loop::terminate_signal`] to it, and write only their own `run`.
//!
//! [`BaseLoop::control`] merges both points into a single awaitable, for loops
//! that do not need to tell the two apart inside their `select!`.

use async_trait::async_trait;

use crate::loops::looper::Loop;
use crate::loops::rendezvous::{Ack, Rendezvous};

/// A control request received by a loop.
#[derive(Debug)]
pub enum Control {
    /// Pause requested; acknowledge once quiescent.
    Pause(Ack),
    /// Termination requested; acknowledge and return from `run`.
    Terminate(Ack),
}

/// Default pause/terminate signaling points.
#[derive(Debug, Default)]
pub struct BaseLoop {
    pause: Rendezvous,
    terminate: Rendezvous,
}

impl BaseLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause control point.
    pub fn pause_signal(&self) -> &Rendezvous {
        &self.pause
    }

    /// Terminate control point.
    pub fn terminate_signal(&self) -> &Rendezvous {
        &self.terminate
    }

    /// Waits for the next pause or terminate request.
    ///
    /// Cancel-safe.
    pub async fn control(&self) -> Control {
        loop {
            tokio::select! {
                Some(ack) = self.pause.recv() => return Control::Pause(ack),
                Some(ack) = self.terminate.recv() => return Control::Terminate(ack),
                else => std::future::pending::<()>().await,
            }
        }
    }
}

/// A bare `BaseLoop` is a placeholder: its `run` returns immediately.
#[async_trait]
impl Loop for BaseLoop {
    async fn run(&self) {}

    fn pause_signal(&self) -> &Rendezvous {
        &self.pause
    }

    fn terminate_signal(&self) -> &Rendezvous {
        &self.terminate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loops::rendezvous::Outcome;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_control_reports_pause_then_terminate() {
        let base = Arc::new(BaseLoop::new());

        let b = base.clone();
        let loop_side = tokio::spawn(async move {
            let mut seen = Vec::new();
            loop {
                match b.control().await {
                    Control::Pause(ack) => {
                        seen.push("pause");
                        ack.ack();
                    }
                    Control::Terminate(ack) => {
                        seen.push("terminate");
                        ack.ack();
                        return seen;
                    }
                }
            }
        });

        assert_eq!(base.pause_signal().request().await, Outcome::Acked);
        assert_eq!(base.terminate_signal().request().await, Outcome::Acked);
        assert_eq!(loop_side.await.unwrap(), vec!["pause", "terminate"]);
    }

    #[tokio::test]
    async fn test_base_run_is_noop() {
        let base = BaseLoop::new();
        base.run().await;
    }
}
