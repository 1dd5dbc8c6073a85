//! # Loop registry - name-keyed set of application loops.
//!
//! ## Rules
//! - A name is registered at most once while present; a duplicate is rejected
//!   without touching the map.
//! - Mutations take the write lock; lookups and snapshots the read lock.
//! - The running count always equals the map size (updated under the write lock).
//! - Entries leave the registry only during the terminate phase.
//! - Iteration order of [`Registry::snapshot`] is unspecified.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;

use crate::error::LoopError;
use crate::events::{Bus, Event, EventKind};
use crate::loops::LoopRef;

/// Name-keyed collection of registered loops.
pub struct Registry {
    loops: RwLock<HashMap<Arc<str>, LoopRef>>,
    count: AtomicUsize,
    bus: Bus,
}

impl Registry {
    /// Creates an empty registry publishing to `bus`.
    pub fn new(bus: Bus) -> Self {
        Self {
            loops: RwLock::new(HashMap::new()),
            count: AtomicUsize::new(0),
            bus,
        }
    }

    /// Adds a loop under `name`.
    ///
    /// Fails with [`LoopError::DuplicateName`] if the name is taken.
    pub async fn register(&self, name: &str, lp: LoopRef) -> Result<(), LoopError> {
        let mut loops = self.loops.write().await;
        if loops.contains_key(name) {
            return Err(LoopError::DuplicateName {
                name: name.to_string(),
            });
        }
        let name: Arc<str> = Arc::from(name);
        loops.insert(name.clone(), lp);
        self.count.store(loops.len(), Ordering::Release);
        drop(loops);

        self.bus
            .publish(Event::new(EventKind::LoopRegistered).with_name(name));
        Ok(())
    }

    /// Returns the loop registered under `name` together with its shared name.
    pub async fn entry(&self, name: &str) -> Result<(Arc<str>, LoopRef), LoopError> {
        let loops = self.loops.read().await;
        loops
            .get_key_value(name)
            .map(|(k, v)| (k.clone(), v.clone()))
            .ok_or_else(|| LoopError::NotFound {
                name: name.to_string(),
            })
    }

    /// Returns the loop registered under `name`.
    pub async fn lookup(&self, name: &str) -> Result<LoopRef, LoopError> {
        self.entry(name).await.map(|(_, lp)| lp)
    }

    /// Removes `name`; missing names are ignored.
    pub async fn remove(&self, name: &str) -> Option<LoopRef> {
        let mut loops = self.loops.write().await;
        let removed = loops.remove(name);
        self.count.store(loops.len(), Ordering::Release);
        removed
    }

    /// Point-in-time copy of all entries, in unspecified order.
    pub async fn snapshot(&self) -> Vec<(Arc<str>, LoopRef)> {
        let loops = self.loops.read().await;
        loops.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Returns sorted list of registered names.
    pub async fn names(&self) -> Vec<String> {
        let loops = self.loops.read().await;
        let mut names: Vec<String> = loops.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered loops.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// True if no loop is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
