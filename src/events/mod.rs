//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the application runtime.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Application` (run/exit/shutdown phases), `Registry`
//!   (registrations), per-loop tasks (panics), `SubscriberSet` workers.
//! - **Consumers**: the subscriber listener (fans out to `SubscriberSet`) and
//!   any receiver handed out by `Application::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
