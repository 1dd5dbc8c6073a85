//! # Launch one loop body under fault isolation.
//!
//! [`spawn_loop`] drives `Loop::run` on its own tokio task inside the
//! [`isolate`](crate::core::boundary::isolate) boundary.
//!
//! ## Event flow
//! ```text
//! Return:
//!   lp.run() → () → (nothing; the loop acknowledged terminate or exited by itself)
//!
//! Panic:
//!   lp.run() → panic → publish LoopPanicked
//!                    → faults.send(Fault::Runtime{ name, payload, stack }).await
//! ```
//!
//! ## Rules
//! - A panic ends only this task; the orchestrator and other loops keep going.
//! - The fault is sent from this task, so an undrained fault stream holds back
//!   this task alone.
//! - The loop stays registered and can be started again.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{
    core::boundary::isolate,
    error::{Fault, FaultEnvelope},
    events::{Bus, Event, EventKind},
    logging::LogGate,
    loops::LoopRef,
};

/// Spawns `lp.run()` and reports a panic on `faults`.
pub(crate) fn spawn_loop(
    name: Arc<str>,
    lp: LoopRef,
    faults: mpsc::Sender<Fault>,
    bus: Bus,
    gate: LogGate,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let caught = match isolate(lp.run()).await {
            Ok(()) => {
                gate.debug(format_args!("{name} returned from run"));
                return;
            }
            Err(caught) => caught,
        };

        let message = caught.payload.message();
        gate.log(format_args!("{name} panicked: {message}"));
        gate.debug(format_args!("{name} stack:\n{}", caught.stack));
        bus.publish(
            Event::new(EventKind::LoopPanicked)
                .with_name(name.clone())
                .with_reason(message),
        );

        let fault = Fault::Runtime(FaultEnvelope::new(Some(name), caught.payload, caught.stack));
        let _ = faults.send(fault).await;
    })
}
