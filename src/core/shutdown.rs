//! # Two-phase shutdown.
//!
//! Dependencies between loops are unknown and may form any graph, so no loop
//! is torn down while another one may still be working:
//!
//! ```text
//! Termination::trigger()   (first exit() only)
//!        │
//!        ▼
//! pause_all:      for each registered loop (unspecified order)
//!                   PauseRequested → pause_signal().request() → LoopPaused
//!        │        ── barrier: every loop acknowledged pause ──
//!        ▼
//! terminate_all:  for each registered loop (unspecified order)
//!                   TerminateRequested → terminate_signal().request()
//!                   → registry.remove(name) → LoopTerminated
//! ```
//!
//! ## Rules
//! - Each phase works on a registry snapshot taken when the phase starts; the
//!   registry lock is not held while waiting, so loops may still use it.
//! - Loops are handled sequentially, one acknowledgment at a time.
//! - Without `ack_timeout` a loop that never answers blocks shutdown forever.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    core::registry::Registry,
    events::{Bus, Event, EventKind},
    logging::LogGate,
    loops::{Outcome, Rendezvous},
};

/// One-shot termination signal, re-armed after every completed shutdown.
///
/// The `closing` flag and the token live under one lock, so checking and
/// closing happen atomically: exactly one caller cancels a given token.
pub(crate) struct Termination {
    state: Mutex<TerminationState>,
}

struct TerminationState {
    token: CancellationToken,
    closing: bool,
}

impl TerminationState {
    fn armed() -> Self {
        Self {
            token: CancellationToken::new(),
            closing: false,
        }
    }
}

impl Termination {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TerminationState::armed()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TerminationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Token cancelled by the next [`trigger`](Self::trigger).
    pub fn token(&self) -> CancellationToken {
        self.lock().token.clone()
    }

    /// Closes the signal. Returns `true` only for the call that closed it.
    pub fn trigger(&self) -> bool {
        let mut state = self.lock();
        if state.closing {
            return false;
        }
        state.closing = true;
        state.token.cancel();
        true
    }

    /// Installs a fresh, open signal.
    pub fn rearm(&self) {
        *self.lock() = TerminationState::armed();
    }

    pub fn is_closing(&self) -> bool {
        self.lock().closing
    }
}

/// Which control point a handshake targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Pause,
    Terminate,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Pause => "pause",
            Stage::Terminate => "terminate",
        }
    }
}

/// Shared inputs of both phases.
pub(crate) struct Phases<'a> {
    pub registry: &'a Registry,
    pub bus: &'a Bus,
    pub gate: LogGate,
    pub ack_timeout: Option<Duration>,
}

impl Phases<'_> {
    /// Requests a pause from every registered loop and waits for each acknowledgment.
    pub async fn pause_all(&self) {
        for (name, lp) in self.registry.snapshot().await {
            self.gate.log(format_args!("waiting for {name} to pause"));
            self.bus
                .publish(Event::new(EventKind::PauseRequested).with_name(name.clone()));

            if self.handshake(&name, lp.pause_signal(), Stage::Pause).await {
                self.gate.log(format_args!("{name} paused"));
                self.bus
                    .publish(Event::new(EventKind::LoopPaused).with_name(name));
            }
        }
    }

    /// Requests termination from every registered loop, removing each one afterwards.
    pub async fn terminate_all(&self) {
        for (name, lp) in self.registry.snapshot().await {
            self.gate.log(format_args!("waiting for {name} to terminate"));
            self.bus
                .publish(Event::new(EventKind::TerminateRequested).with_name(name.clone()));

            let acked = self
                .handshake(&name, lp.terminate_signal(), Stage::Terminate)
                .await;
            self.registry.remove(&name).await;

            if acked {
                self.gate.log(format_args!("{name} terminated"));
                self.bus
                    .publish(Event::new(EventKind::LoopTerminated).with_name(name));
            }
        }
    }

    /// Runs one request/acknowledge exchange. Returns `true` if the loop acknowledged.
    async fn handshake(&self, name: &str, point: &Rendezvous, stage: Stage) -> bool {
        let outcome = match self.ack_timeout {
            None => point.request().await,
            Some(limit) => match tokio::time::timeout(limit, point.request()).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => {
                    self.gate.log(format_args!(
                        "{name} did not acknowledge {} within {limit:?}",
                        stage.as_str()
                    ));
                    self.bus.publish(
                        Event::new(EventKind::AckTimedOut)
                            .with_name(name)
                            .with_reason(stage.as_str()),
                    );
                    return false;
                }
            },
        };

        match outcome {
            Outcome::Acked => true,
            Outcome::Dropped => {
                self.gate.debug(format_args!(
                    "{name} dropped its {} acknowledgment",
                    stage.as_str()
                ));
                self.bus.publish(
                    Event::new(EventKind::AckAbandoned)
                        .with_name(name)
                        .with_reason(stage.as_str()),
                );
                false
            }
        }
    }
}
