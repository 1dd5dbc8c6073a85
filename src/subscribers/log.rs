//! # LogWriter: lifecycle events through `tracing`
//!
//! A minimal subscriber that renders every [`Event`] as one `tracing` line
//! under the `loopvisor::events` target. Use it for demos or when a separate
//! event log is wanted next to the gated lifecycle log.
//!
//! ## Example output
//! ```text
//! [registered] loop="ticker"
//! [starting] loop="ticker"
//! [panicked] loop="ticker" reason="bad duration"
//! [exit-requested]
//! [pause-requested] loop="ticker"
//! [paused] loop="ticker"
//! [terminate-requested] loop="ticker"
//! [terminated] loop="ticker"
//! [exited]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let name = e.name.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::LoopRegistered => {
                tracing::info!(target: "loopvisor::events", "[registered] loop={name:?}");
            }
            EventKind::LoopStarting => {
                tracing::info!(target: "loopvisor::events", "[starting] loop={name:?}");
            }
            EventKind::LoopPanicked => {
                tracing::warn!(target: "loopvisor::events", "[panicked] loop={name:?} reason={reason:?}");
            }
            EventKind::RerunRejected => {
                tracing::warn!(target: "loopvisor::events", "[rerun-rejected]");
            }
            EventKind::ExitRequested => {
                tracing::info!(target: "loopvisor::events", "[exit-requested]");
            }
            EventKind::PauseRequested => {
                tracing::info!(target: "loopvisor::events", "[pause-requested] loop={name:?}");
            }
            EventKind::LoopPaused => {
                tracing::info!(target: "loopvisor::events", "[paused] loop={name:?}");
            }
            EventKind::TerminateRequested => {
                tracing::info!(target: "loopvisor::events", "[terminate-requested] loop={name:?}");
            }
            EventKind::LoopTerminated => {
                tracing::info!(target: "loopvisor::events", "[terminated] loop={name:?}");
            }
            EventKind::AckAbandoned => {
                tracing::warn!(target: "loopvisor::events", "[ack-abandoned] loop={name:?} phase={reason}");
            }
            EventKind::AckTimedOut => {
                tracing::warn!(target: "loopvisor::events", "[ack-timeout] loop={name:?} phase={reason}");
            }
            EventKind::ApplicationExited => {
                tracing::info!(target: "loopvisor::events", "[exited]");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "loopvisor::events", "[subscriber-overflow] subscriber={name} reason={reason}");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "loopvisor::events", "[subscriber-panicked] subscriber={name} info={reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
