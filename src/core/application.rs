//! # Application: registry, run/start/exit and the two-phase shutdown.
//!
//! The [`Application`] owns the loop registry, the lifecycle flags, the
//! termination signal and the two observation channels (faults, exit).
//!
//! ## Lifecycle
//! ```text
//!            run()                 exit()          all paused       all terminated
//!   Idle ──────────► Running ─────────────► Pausing ─────────► Terminating ───────► Idle
//!    ▲   start(every loop)   wait on token                                       │
//!    └───────────────────────────── ApplicationExited, ExitSignal fires ◄────────┘
//!
//! run() while not Idle → Fault::Rerun on the fault stream, call returns at once
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use loopvisor::{Application, BaseLoop, Config, LoopError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), LoopError> {
//!     let app = Application::new(Config::default());
//!     app.register("placeholder", Arc::new(BaseLoop::new())).await?;
//!     assert_eq!(app.running_count(), 1);
//!
//!     let dup = app.register("placeholder", Arc::new(BaseLoop::new())).await;
//!     assert!(matches!(dup, Err(LoopError::DuplicateName { .. })));
//!     assert!(app.lookup("missing").await.is_err());
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        boundary,
        config::Config,
        registry::Registry,
        runner::spawn_loop,
        shutdown::{Phases, Termination},
        streams::{ExitSignal, FaultStream},
    },
    error::{Fault, FaultEnvelope, FaultPayload, LoopError},
    events::{Bus, Event, EventKind},
    logging::LogGate,
    loops::LoopRef,
    subscribers::SubscriberSet,
};

/// Orchestration state of an [`Application`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Not running; `run` may be called.
    Idle = 0,
    /// Loops started, waiting for `exit`.
    Running = 1,
    /// Pause phase in progress.
    Pausing = 2,
    /// Terminate phase in progress.
    Terminating = 3,
}

impl Phase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Phase::Running,
            2 => Phase::Pausing,
            3 => Phase::Terminating,
            _ => Phase::Idle,
        }
    }
}

/// Coordinates the lifecycle of a set of loops.
pub struct Application {
    cfg: Config,
    gate: LogGate,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    registry: Registry,
    phase: AtomicU8,
    termination: Termination,
    faults_tx: mpsc::Sender<Fault>,
    faults_rx: Mutex<Option<mpsc::Receiver<Fault>>>,
    exit_tx: watch::Sender<u64>,
    listener_stop: CancellationToken,
}

impl Application {
    /// Creates an application without subscribers.
    ///
    /// Does not need a tokio runtime; `start`/`run` do.
    pub fn new(cfg: Config) -> Arc<Self> {
        Self::builder(cfg).build()
    }

    /// Creates a builder for an application with subscribers.
    pub fn builder(cfg: Config) -> crate::core::builder::ApplicationBuilder {
        crate::core::builder::ApplicationBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        listener_stop: CancellationToken,
    ) -> Self {
        boundary::install_hook();

        let (faults_tx, faults_rx) = mpsc::channel(cfg.fault_capacity_clamped());
        let (exit_tx, _) = watch::channel(0);
        Self {
            gate: cfg.log_gate(),
            registry: Registry::new(bus.clone()),
            cfg,
            bus,
            subs,
            phase: AtomicU8::new(Phase::Idle as u8),
            termination: Termination::new(),
            faults_tx,
            faults_rx: Mutex::new(Some(faults_rx)),
            exit_tx,
            listener_stop,
        }
    }

    /// Registers `lp` under `name`.
    ///
    /// Fails with [`LoopError::DuplicateName`] if the name is taken; the
    /// registry is left unchanged.
    pub async fn register(&self, name: &str, lp: LoopRef) -> Result<(), LoopError> {
        self.registry.register(name, lp).await?;
        self.gate.debug(format_args!(
            "registered {name}; loops={}",
            self.registry.len()
        ));
        Ok(())
    }

    /// Returns the loop registered under `name`.
    pub async fn lookup(&self, name: &str) -> Result<LoopRef, LoopError> {
        self.registry.lookup(name).await
    }

    /// (Re)starts the named loop on its own task and returns at once.
    ///
    /// A panic inside the loop's `run` is reported on the fault stream. Must be
    /// called inside a tokio runtime.
    pub async fn start(&self, name: &str) -> Result<(), LoopError> {
        let (name, lp) = self.registry.entry(name).await?;
        self.gate.log(format_args!("start {name}"));
        self.bus
            .publish(Event::new(EventKind::LoopStarting).with_name(name.clone()));
        spawn_loop(name, lp, self.faults_tx.clone(), self.bus.clone(), self.gate);
        Ok(())
    }

    /// Starts every registered loop, waits for [`exit`](Self::exit), then
    /// pauses all loops and terminates all loops.
    ///
    /// Returns once every loop has been terminated and removed. Called while
    /// already running, it pushes a [`Fault::Rerun`] and returns immediately.
    pub async fn run(&self) {
        if self
            .phase
            .compare_exchange(
                Phase::Idle as u8,
                Phase::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            self.reject_rerun();
            return;
        }

        let token = self.termination.token();
        for (name, _) in self.registry.snapshot().await {
            if let Err(e) = self.start(&name).await {
                self.gate.debug(format_args!("start skipped: {e}"));
            }
        }

        token.cancelled().await;

        let phases = Phases {
            registry: &self.registry,
            bus: &self.bus,
            gate: self.gate,
            ack_timeout: self.cfg.ack_timeout(),
        };
        self.set_phase(Phase::Pausing);
        phases.pause_all().await;
        self.set_phase(Phase::Terminating);
        phases.terminate_all().await;
        if !self.registry.is_empty() {
            self.gate.debug(format_args!(
                "registered during shutdown, kept for the next run: {:?}",
                self.registry.names().await
            ));
        }

        self.termination.rearm();
        self.set_phase(Phase::Idle);

        self.gate.log(format_args!("exiting application"));
        self.bus.publish(Event::new(EventKind::ApplicationExited));
        self.exit_tx.send_modify(|n| *n += 1);
    }

    /// Initiates shutdown. Only the first call per cycle has an effect; later
    /// calls are no-ops until the cycle completes.
    ///
    /// A cycle ends when `run` returns, which re-arms the trigger. A call made
    /// while idle (before the first `run`, or after a completed shutdown)
    /// therefore arms the next cycle: `is_closing` turns true,
    /// [`EventKind::ExitRequested`] is published, and the next `run` starts
    /// its loops and shuts them down right away.
    pub fn exit(&self) {
        if self.termination.trigger() {
            self.gate.log(format_args!("exit requested"));
            self.bus.publish(Event::new(EventKind::ExitRequested));
        }
    }

    /// Number of registered loops.
    pub fn running_count(&self) -> usize {
        self.registry.len()
    }

    /// Sorted names of the registered loops.
    pub async fn names(&self) -> Vec<String> {
        self.registry.names().await
    }

    /// Current orchestration phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// True while a `run` call is orchestrating.
    pub fn is_running(&self) -> bool {
        self.phase() != Phase::Idle
    }

    /// True once `exit` has been called for the current cycle.
    pub fn is_closing(&self) -> bool {
        self.termination.is_closing()
    }

    /// Takes the fault stream. Returns `None` after the first call.
    pub fn take_faults(&self) -> Option<FaultStream> {
        self.faults_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(FaultStream::new)
    }

    /// Returns a handle that fires after each completed shutdown.
    pub fn exit_signal(&self) -> ExitSignal {
        ExitSignal::new(self.exit_tx.subscribe())
    }

    /// Subscribes to raw lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Number of event subscribers attached at build time.
    pub fn subscriber_count(&self) -> usize {
        self.subs.len()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Reports a misuse of `run` without touching any state.
    fn reject_rerun(&self) {
        self.gate.log(format_args!("run called while already running"));
        self.bus.publish(Event::new(EventKind::RerunRejected));

        let envelope = FaultEnvelope::new(
            None,
            FaultPayload::Message("run cannot be called more than once".to_string()),
            boundary::capture_stack(),
        );
        let faults = self.faults_tx.clone();
        tokio::spawn(async move {
            let _ = faults.send(Fault::Rerun(envelope)).await;
        });
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        self.listener_stop.cancel();
    }
}
