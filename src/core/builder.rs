use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::{application::Application, config::Config};
use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing an [`Application`] with optional subscribers.
pub struct ApplicationBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ApplicationBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets lifecycle event subscribers.
    ///
    /// Subscribers receive events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the application.
    ///
    /// With at least one subscriber this spawns the subscriber workers and the
    /// bus listener, so it must run inside a tokio runtime; without
    /// subscribers nothing is spawned.
    ///
    /// The listener and the workers stop once the application is dropped.
    pub fn build(self) -> Arc<Application> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let listener_stop = CancellationToken::new();
        if !subs.is_empty() {
            subscriber_listener(&bus, Arc::clone(&subs), listener_stop.clone());
        }
        Arc::new(Application::new_internal(self.cfg, bus, subs, listener_stop))
    }
}

/// Forwards bus events to the subscriber set until `stop` is cancelled.
///
/// The set holds a bus sender for its own events, so the bus never closes
/// while the listener owns the set.
fn subscriber_listener(bus: &Bus, set: Arc<SubscriberSet>, stop: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            }
        }
    });
}
