//! # Loop abstractions.
//!
//! This module provides the loop-related types:
//! - [`Loop`] - trait every application loop implements
//! - [`LoopRef`] - shared reference to a loop (`Arc<dyn Loop>`)
//! - [`BaseLoop`] - reusable pause/terminate plumbing
//! - [`Rendezvous`] - request/acknowledge control point

mod base;
mod looper;
mod rendezvous;

pub use base::{BaseLoop, Control};
pub use looper::{Loop, LoopRef};
pub use rendezvous::{Ack, Outcome, Rendezvous};
