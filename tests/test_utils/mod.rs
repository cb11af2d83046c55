#![allow(dead_code)]

use anyhow::{bail, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use safeher_core::contacts::Contact;
use safeher_core::journey::{ContactNotifier, ShareUpdate};
use safeher_core::positioning::{
    Fix, PositionError, PositionOptions, PositionProvider, WatchCallback, WatchId,
};
use safeher_core::uploader::LocationUploader;

pub fn fix(latitude: f64, longitude: f64, timestamp_ms: i64) -> Fix {
    Fix {
        latitude,
        longitude,
        timestamp_ms,
    }
}

struct SimulatedState {
    supported: bool,
    current_position: Result<Fix, PositionError>,
    watches: HashMap<WatchId, WatchCallback>,
    next_watch_id: WatchId,
    cleared: Vec<WatchId>,
}

/// Scripted device positioning capability. Tests keep a clone and push
/// updates through `emit`, the same way a platform layer would deliver
/// watch callbacks.
#[derive(Clone)]
pub struct SimulatedPositionProvider {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedPositionProvider {
    pub fn new(current_position: Result<Fix, PositionError>) -> Self {
        SimulatedPositionProvider {
            state: Arc::new(Mutex::new(SimulatedState {
                supported: true,
                current_position,
                watches: HashMap::new(),
                next_watch_id: 0,
                cleared: Vec::new(),
            })),
        }
    }

    pub fn unsupported() -> Self {
        let provider = Self::new(Err(PositionError::PositionUnavailable));
        provider.state.lock().unwrap().supported = false;
        provider
    }

    pub fn set_current_position(&self, current_position: Result<Fix, PositionError>) {
        self.state.lock().unwrap().current_position = current_position;
    }

    /// Delivers an update to every live watch.
    pub fn emit(&self, update: Result<Fix, PositionError>) {
        let mut state = self.state.lock().unwrap();
        for callback in state.watches.values_mut() {
            callback(update);
        }
    }

    pub fn active_watch_count(&self) -> usize {
        self.state.lock().unwrap().watches.len()
    }

    pub fn cleared_watches(&self) -> Vec<WatchId> {
        self.state.lock().unwrap().cleared.clone()
    }
}

impl PositionProvider for SimulatedPositionProvider {
    fn supported(&self) -> bool {
        self.state.lock().unwrap().supported
    }

    fn current_position(&mut self, _options: &PositionOptions) -> Result<Fix, PositionError> {
        self.state.lock().unwrap().current_position
    }

    fn watch_position(&mut self, _options: &PositionOptions, callback: WatchCallback) -> WatchId {
        let mut state = self.state.lock().unwrap();
        let watch_id = state.next_watch_id;
        state.next_watch_id += 1;
        state.watches.insert(watch_id, callback);
        watch_id
    }

    fn clear_watch(&mut self, watch_id: WatchId) {
        let mut state = self.state.lock().unwrap();
        state.watches.remove(&watch_id);
        state.cleared.push(watch_id);
    }
}

/// Records every upload; can be flipped into a failing mode.
#[derive(Clone)]
pub struct CountingUploader {
    uploads: Arc<Mutex<Vec<Fix>>>,
    failing: Arc<Mutex<bool>>,
}

impl CountingUploader {
    pub fn new() -> Self {
        CountingUploader {
            uploads: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn uploads(&self) -> Vec<Fix> {
        self.uploads.lock().unwrap().clone()
    }
}

impl LocationUploader for CountingUploader {
    fn upload(&self, fix: &Fix) -> Result<()> {
        self.uploads.lock().unwrap().push(*fix);
        if *self.failing.lock().unwrap() {
            bail!("simulated ingestion outage");
        }
        Ok(())
    }
}

/// Records notified contact names in delivery order; selected contacts can
/// be made to fail.
pub struct RecordingNotifier {
    notified: Mutex<Vec<String>>,
    updates: Mutex<Vec<ShareUpdate>>,
    fail_for: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        RecordingNotifier {
            notified: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            fail_for: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_for(&self, name: &str) {
        self.fail_for.lock().unwrap().insert(name.to_string());
    }

    pub fn notified(&self) -> Vec<String> {
        self.notified.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<ShareUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl ContactNotifier for RecordingNotifier {
    fn notify(&self, contact: &Contact, update: &ShareUpdate) -> Result<()> {
        if self.fail_for.lock().unwrap().contains(&contact.name) {
            bail!("unreachable contact: {}", contact.name);
        }
        self.notified.lock().unwrap().push(contact.name.clone());
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}
