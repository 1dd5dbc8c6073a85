//! # loopvisor
//!
//! **Loopvisor** orchestrates a fixed set of long-running, named loops inside
//! one process.
//!
//! Loops are registered by name, started together, isolated from each other's
//! panics, and shut down in two phases: every loop is first asked to pause,
//! and only once all of them have acknowledged is every loop asked to
//! terminate. Each loop acknowledges through a synchronous
//! [`Rendezvous`], so a request only returns once the loop has confirmed it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │     Loop     │   │     Loop     │   │     Loop     │
//!     │  (user #1)   │   │  (user #2)   │   │  (user #3)   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Application (runtime orchestrator)                               │
//! │  - Registry (loops by name)                                       │
//! │  - Termination (one-shot exit trigger, re-armed per cycle)        │
//! │  - FaultStream (panics and misuse, with stack traces)             │
//! │  - ExitSignal (fires after each completed shutdown)               │
//! │  - Bus + SubscriberSet (lifecycle events)                         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ run task │       │ run task │       │ run task │  panic ─► Fault::Runtime
//!   └──────────┘       └──────────┘       └──────────┘
//!
//! OS ──► signal listener ──► SignalFanout ──► SignalHandler ... (independent)
//! ```
//!
//! ### Shutdown
//! ```text
//! exit() ─► token cancelled ─► run():
//!   ├─► for each loop: pause_signal().request()      (blocks until ack)
//!   ├─► for each loop: terminate_signal().request()  (blocks until ack)
//!   │                  remove from registry
//!   └─► ApplicationExited, ExitSignal fires, back to Idle
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                           |
//! |-------------------|-----------------------------------------------------------|----------------------------------------------|
//! | **Loops**         | Define loops and their pause/terminate control points.   | [`Loop`], [`BaseLoop`], [`Rendezvous`]       |
//! | **Orchestration** | Register, start, run and shut down loops.                 | [`Application`], [`Phase`]                   |
//! | **Faults**        | Panics and misuse reported with stack traces.             | [`Fault`], [`FaultStream`], [`ExitSignal`]   |
//! | **Errors**        | Typed registry errors.                                    | [`LoopError`]                                |
//! | **Subscriber API**| Hook into lifecycle events.                               | [`Subscribe`], [`Event`]                     |
//! | **Signals**       | Fan out OS signals to any number of handlers.             | [`SignalHandler`], [`SignalFanout`]          |
//! | **Configuration** | Verbosity, channel capacities, ack timeout.               | [`Config`]                                   |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use loopvisor::{Application, BaseLoop, Config, Control, Loop, Rendezvous};
//!
//! struct Hello {
//!     base: BaseLoop,
//! }
//!
//! #[async_trait]
//! impl Loop for Hello {
//!     async fn run(&self) {
//!         println!("hello from loop");
//!         loop {
//!             match self.base.control().await {
//!                 Control::Pause(ack) => ack.ack(),
//!                 Control::Terminate(ack) => {
//!                     ack.ack();
//!                     return;
//!                 }
//!             }
//!         }
//!     }
//!
//!     fn pause_signal(&self) -> &Rendezvous {
//!         self.base.pause_signal()
//!     }
//!
//!     fn terminate_signal(&self) -> &Rendezvous {
//!         self.base.terminate_signal()
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = Application::new(Config::default());
//!     app.register("hello", Arc::new(Hello { base: BaseLoop::new() })).await?;
//!
//!     let runner = {
//!         let app = Arc::clone(&app);
//!         tokio::spawn(async move { app.run().await })
//!     };
//!     tokio::task::yield_now().await;
//!     app.exit();
//!     runner.await?;
//!
//!     assert_eq!(app.running_count(), 0);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod logging;
mod loops;
mod signals;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Application, ApplicationBuilder, Config, ExitSignal, FaultStream, Phase};
pub use error::{Fault, FaultEnvelope, FaultPayload, LoopError};
pub use events::{Bus, Event, EventKind};
pub use logging::{LogGate, fatal, print};
pub use loops::{Ack, BaseLoop, Control, Loop, LoopRef, Outcome, Rendezvous};
pub use signals::{
    Signal, SignalFanout, SignalHandler, SignalHandlerRef, install_signal_handler,
    uninstall_signal_handler,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
