//! # Lifecycle events emitted by the application runtime.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Registry events**: loops entering the registry
//! - **Run events**: loops starting, panicking, misuse of `run`
//! - **Shutdown events**: exit request, the pause and terminate phases, completion
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Within one shutdown, every `LoopPaused` has a smaller `seq`
//! than the first `TerminateRequested`.
//!
//! ## Example
//! ```rust
//! use loopvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::LoopPanicked)
//!     .with_name("ticker")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::LoopPanicked);
//! assert_eq!(ev.name.as_deref(), Some("ticker"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Registry ===
    /// Loop registered.
    ///
    /// Sets: `name`
    LoopRegistered,

    // === Run ===
    /// Loop body launched by `start`.
    ///
    /// Sets: `name`
    LoopStarting,

    /// Loop body panicked; a runtime fault was produced.
    ///
    /// Sets: `name`, `reason` (panic message)
    LoopPanicked,

    /// `run` was called while already running; a rerun fault was produced.
    RerunRejected,

    // === Shutdown ===
    /// `exit` armed the shutdown (first call only).
    ExitRequested,

    /// Pause requested from a loop.
    ///
    /// Sets: `name`
    PauseRequested,

    /// Loop acknowledged pause.
    ///
    /// Sets: `name`
    LoopPaused,

    /// Termination requested from a loop.
    ///
    /// Sets: `name`
    TerminateRequested,

    /// Loop acknowledged termination and was removed from the registry.
    ///
    /// Sets: `name`
    LoopTerminated,

    /// Loop dropped the acknowledgment handle without answering.
    ///
    /// Sets: `name`, `reason` (`"pause"` / `"terminate"`)
    AckAbandoned,

    /// Loop did not acknowledge within `Config::ack_timeout`.
    ///
    /// Sets: `name`, `reason` (`"pause"` / `"terminate"`)
    AckTimedOut,

    /// Shutdown completed; registry is empty.
    ApplicationExited,

    // === Subscribers ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `name` (subscriber), `reason` (panic info)
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `name` (subscriber), `reason`
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the loop (or subscriber), if applicable.
    pub name: Option<Arc<str>>,
    /// Human-readable reason (panic message, phase, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            name: None,
            reason: None,
        }
    }

    /// Attaches a loop (or subscriber) name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber machinery itself.
    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
