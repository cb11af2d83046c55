use std::sync::{Arc, OnceLock};

use anyhow::Result;

use crate::contacts::Contact;
use crate::journey::{ContactNotifier, Journey, JourneyManager, LogNotifier};
use crate::location_tracker::{LocationTracker, TrackerSnapshot};
use crate::logs;
use crate::positioning::{Platform, PositionProvider};
use crate::storage::Storage;
use crate::uploader::HttpUploader;

struct MainState {
    storage: Storage,
    tracker: LocationTracker,
    journeys: JourneyManager,
    notifier: Box<dyn ContactNotifier>,
    cache_dir: String,
}

static MAIN_STATE: OnceLock<MainState> = OnceLock::new();

/// One-time process init: logging, storage, the tracking session. The
/// platform shell registers its positioning capability afterwards via
/// `set_position_provider`. `ingest_endpoint` is where accepted fixes get
/// POSTed; without one, uploads are disabled.
pub fn init(support_dir: String, cache_dir: String, ingest_endpoint: Option<String>) {
    let mut already_initialized = true;
    MAIN_STATE.get_or_init(|| {
        already_initialized = false;

        if let Err(err) = logs::init(&cache_dir) {
            eprintln!("failed to initialize logging: {err}");
        }

        let storage = Storage::init(&support_dir);
        let tracker = LocationTracker::new(Platform::Desktop);
        match ingest_endpoint {
            None => info!("no ingest endpoint configured, location uploads disabled"),
            Some(endpoint) => match HttpUploader::new(&endpoint) {
                Ok(uploader) => tracker.set_uploader(Arc::new(uploader)),
                Err(err) => error!("failed to set up location uploader: {:#}", err),
            },
        }
        info!("initialized");

        MainState {
            storage,
            tracker,
            journeys: JourneyManager::new(),
            notifier: Box::new(LogNotifier),
            cache_dir,
        }
    });
    if already_initialized {
        warn!("`init` is called multiple times");
    }
}

fn get() -> &'static MainState {
    MAIN_STATE.get().expect("main state is not initialized")
}

pub fn set_position_provider(provider: Box<dyn PositionProvider + Send>) {
    get().tracker.set_provider(provider);
}

pub fn set_platform(platform: Platform) {
    get().tracker.set_platform(platform);
}

pub fn start_tracking() {
    get().tracker.start();
}

pub fn stop_tracking() {
    get().tracker.stop();
}

pub fn tracker_snapshot() -> TrackerSnapshot {
    get().tracker.snapshot()
}

pub fn add_contact(name: String, phone: Option<String>, email: Option<String>) -> Option<Contact> {
    get().storage.add_contact(&name, phone, email)
}

pub fn remove_contact(id: String) {
    get().storage.remove_contact(&id);
}

pub fn verify_contact(id: String) {
    get().storage.verify_contact(&id);
}

pub fn list_contacts() -> Vec<Contact> {
    get().storage.list_contacts()
}

/// Resolves the selected contacts and starts the journey, then immediately
/// shares the current position with them. Degraded sharing (no fix yet, or
/// recipients that could not be reached) never blocks the journey.
pub fn start_journey(destination: String, contact_ids: Vec<String>) -> Option<Journey> {
    let state = get();
    let shared_with: Vec<Contact> = contact_ids
        .iter()
        .filter_map(|id| state.storage.get_contact(id))
        .collect();
    let journey = state.journeys.start_journey(&destination, shared_with)?;

    if let Err(err) = state.journeys.share(
        &journey.id,
        state.tracker.current_fix(),
        state.notifier.as_ref(),
    ) {
        error!("sharing on journey start degraded: {:#}", err);
    }
    Some(journey)
}

pub fn share_journey(id: String) {
    let state = get();
    if let Err(err) = state
        .journeys
        .share(&id, state.tracker.current_fix(), state.notifier.as_ref())
    {
        error!("sharing journey {} degraded: {:#}", id, err);
    }
}

pub fn end_journey(id: String) -> bool {
    get().journeys.end_journey(&id)
}

pub fn list_journeys() -> Vec<Journey> {
    get().journeys.list()
}

pub fn export_logs(target_file_path: String) -> Result<()> {
    logs::export(&get().cache_dir, &target_file_path)
}
