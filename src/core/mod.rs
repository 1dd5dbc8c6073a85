//! Runtime core: orchestration and lifecycle.
//!
//! The public API from this module is [`Application`], which registers loops,
//! runs them under fault isolation and drives the two-phase shutdown.
//!
//! Internal modules:
//! - [`application`]: run/start/exit and lifecycle flags;
//! - [`builder`]: wires bus, subscribers and application together;
//! - [`registry`]: name-keyed loop registry;
//! - [`runner`]: launches one loop body on its own task;
//! - [`boundary`]: panic isolation with stack capture;
//! - [`shutdown`]: termination signal and the pause/terminate phases;
//! - [`streams`]: fault stream and exit signal handles.

mod application;
mod boundary;
mod builder;
mod config;
mod registry;
mod runner;
mod shutdown;
mod streams;

pub use application::{Application, Phase};
pub use builder::ApplicationBuilder;
pub use config::Config;
pub use streams::{ExitSignal, FaultStream};
