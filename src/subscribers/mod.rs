//! # Event subscribers for the loopvisor runtime.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out used to deliver lifecycle events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Application ── publish(Event) ──► Bus ──► subscriber_listener
//!                                              │
//!                                              └──► SubscriberSet::emit(&Event)
//!                                                     ├──► [queue] ─► LogWriter
//!                                                     └──► [queue] ─► Custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
