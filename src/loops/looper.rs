//! # Loop abstraction.
//!
//! A [`Loop`] is a long-running unit of the application. Its [`run`](Loop::run)
//! body usually spins in a `tokio::select!` over its own events and its two
//! control points, [`pause_signal`](Loop::pause_signal) and
//! [`terminate_signal`](Loop::terminate_signal).
//!
//! The common handle type is [`LoopRef`], an `Arc<dyn Loop>` shared between the
//! registry and the task driving `run`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::loops::rendezvous::Rendezvous;

/// # Independently running, pausable, terminable unit.
///
/// ## Contract
/// - `run` loops until a terminate request arrives, acknowledges it and returns.
/// - A pause request is acknowledged once the loop is quiescent (tickers
///   stopped, no in-flight work towards other loops).
/// - `run` may be invoked again later through
///   [`Application::start`](crate::Application::start); it must reinitialize
///   whatever per-run state it needs.
/// - A panic inside `run` is caught by the runtime and reported as a
///   [`Fault::Runtime`](crate::Fault::Runtime); the loop stays registered.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use loopvisor::{BaseLoop, Loop, Rendezvous};
///
/// #[derive(Default)]
/// struct Idle {
///     base: BaseLoop,
/// }
///
/// #[async_trait]
/// impl Loop for Idle {
///     async fn run(&self) {
///         loop {
///             tokio::select! {
///                 Some(ack) = self.base.pause_signal().recv() => ack.ack(),
///                 Some(ack) = self.base.terminate_signal().recv() => {
///                     ack.ack();
///                     return;
///                 }
///             }
///         }
///     }
///
///     fn pause_signal(&self) -> &Rendezvous { self.base.pause_signal() }
///     fn terminate_signal(&self) -> &Rendezvous { self.base.terminate_signal() }
/// }
/// ```
#[async_trait]
pub trait Loop: Send + Sync + 'static {
    /// Runs the loop body until terminated.
    async fn run(&self);

    /// Control point used to request a pause.
    fn pause_signal(&self) -> &Rendezvous;

    /// Control point used to request termination.
    fn terminate_signal(&self) -> &Rendezvous;
}

/// Shared handle to a loop.
pub type LoopRef = Arc<dyn Loop>;
