use std::sync::{Arc, Mutex};

use crate::positioning::{
    Fix, Platform, PositionError, PositionOptions, PositionProvider, WatchId,
};
use crate::uploader::{DisabledUploader, LocationUploader};
use crate::utils;

/// Only the most recent fixes are kept, oldest evicted first.
pub const HISTORY_CAP: usize = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackingPhase {
    Idle,
    RequestingPermission,
    Tracking,
    Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackerError {
    /// No positioning capability at all (no provider registered, or the
    /// registered one reports unsupported).
    Unsupported,
    Position(PositionError),
    /// The ingestion POST failed. Tracking keeps running.
    UploadFailed,
}

impl TrackerError {
    pub fn user_message(&self, platform: Platform) -> &'static str {
        match self {
            TrackerError::Unsupported => "Geolocation is not supported on this device",
            TrackerError::Position(PositionError::Timeout) => {
                "Location request timed out. Please check your internet connection and GPS settings."
            }
            TrackerError::Position(PositionError::PermissionDenied) => {
                "Location permission denied. Please enable location services in your device settings."
            }
            TrackerError::Position(PositionError::PositionUnavailable) => match platform {
                Platform::Mobile => {
                    "GPS signal not found. Please ensure GPS is enabled in your device settings and you are outdoors or near a window."
                }
                Platform::Desktop => {
                    "Location information unavailable. Please ensure location services are enabled in your system settings."
                }
            },
            TrackerError::UploadFailed => "Failed to update location",
        }
    }

    /// Whether the UI should offer a jump to the device location settings.
    pub fn offers_settings_hint(&self) -> bool {
        matches!(
            self,
            TrackerError::Position(PositionError::Timeout)
                | TrackerError::Position(PositionError::PermissionDenied)
        )
    }
}

#[derive(Clone, Debug)]
pub struct TrackerSnapshot {
    pub phase: TrackingPhase,
    pub current: Option<Fix>,
    pub last_update_ms: Option<i64>,
    pub history: Vec<Fix>,
    pub loading: bool,
    pub error: Option<TrackerError>,
    pub platform: Platform,
}

impl TrackerSnapshot {
    pub fn error_message(&self) -> Option<&'static str> {
        self.error.map(|e| e.user_message(self.platform))
    }

    pub fn offers_settings_hint(&self) -> bool {
        self.error.is_some_and(|e| e.offers_settings_hint())
    }
}

struct TrackerShared {
    phase: TrackingPhase,
    watch_id: Option<WatchId>,
    current: Option<Fix>,
    last_update_ms: Option<i64>,
    history: Vec<Fix>,
    loading: bool,
    error: Option<TrackerError>,
    platform: Platform,
    uploader: Arc<dyn LocationUploader>,
}

/// The tracking session. Owns the position watch for its whole lifetime;
/// dropping the tracker (or `stop`) releases the subscription.
///
/// Lock order is provider then shared. Watch callbacks only ever take the
/// shared lock, so a provider delivering from its own thread cannot
/// deadlock against `start`/`stop`.
pub struct LocationTracker {
    provider: Mutex<Option<Box<dyn PositionProvider + Send>>>,
    shared: Arc<Mutex<TrackerShared>>,
}

impl LocationTracker {
    pub fn new(platform: Platform) -> Self {
        LocationTracker {
            provider: Mutex::new(None),
            shared: Arc::new(Mutex::new(TrackerShared {
                phase: TrackingPhase::Idle,
                watch_id: None,
                current: None,
                last_update_ms: None,
                history: Vec::new(),
                loading: false,
                error: None,
                platform,
                uploader: Arc::new(DisabledUploader),
            })),
        }
    }

    /// Registers the device positioning capability. Replacing the provider
    /// mid-session releases the old watch and resets to `Idle`.
    pub fn set_provider(&self, provider: Box<dyn PositionProvider + Send>) {
        let mut provider_guard = self.provider.lock().unwrap();
        let stale_watch = {
            let mut shared = self.shared.lock().unwrap();
            let stale = shared.watch_id.take();
            if stale.is_some() {
                shared.phase = TrackingPhase::Idle;
                shared.current = None;
                shared.last_update_ms = None;
                shared.loading = false;
            }
            stale
        };
        if let (Some(old), Some(watch_id)) = (provider_guard.as_mut(), stale_watch) {
            old.clear_watch(watch_id);
        }
        *provider_guard = Some(provider);
    }

    pub fn set_uploader(&self, uploader: Arc<dyn LocationUploader>) {
        self.shared.lock().unwrap().uploader = uploader;
    }

    pub fn set_platform(&self, platform: Platform) {
        self.shared.lock().unwrap().platform = platform;
    }

    /// Requests a one-shot fix and, once it arrives, keeps a continuous
    /// watch running. A no-op while a watch is already live. All failures
    /// leave the tracker in a state the user can retry from.
    pub fn start(&self) {
        let mut provider_guard = self.provider.lock().unwrap();
        let provider = match provider_guard.as_mut() {
            Some(provider) if provider.supported() => provider,
            _ => {
                warn!("[tracker] start requested but positioning is unsupported");
                let mut shared = self.shared.lock().unwrap();
                shared.phase = TrackingPhase::Error;
                shared.error = Some(TrackerError::Unsupported);
                shared.loading = false;
                return;
            }
        };

        let options = PositionOptions::default();
        let stale_watch = {
            let mut shared = self.shared.lock().unwrap();
            if shared.phase == TrackingPhase::Tracking {
                return;
            }
            shared.phase = TrackingPhase::RequestingPermission;
            shared.loading = true;
            shared.error = None;
            shared.watch_id.take()
        };
        if let Some(watch_id) = stale_watch {
            provider.clear_watch(watch_id);
        }

        match provider.current_position(&options) {
            Ok(fix) => {
                let shared = Arc::clone(&self.shared);
                let watch_id = provider.watch_position(
                    &options,
                    Box::new(move |update| handle_update(&shared, update)),
                );
                {
                    let mut shared = self.shared.lock().unwrap();
                    shared.watch_id = Some(watch_id);
                    shared.phase = TrackingPhase::Tracking;
                }
                info!("[tracker] tracking started, watch_id={}", watch_id);
                handle_update(&self.shared, Ok(fix));
            }
            Err(error) => {
                warn!("[tracker] initial position request failed: {:?}", error);
                let mut shared = self.shared.lock().unwrap();
                shared.phase = TrackingPhase::Error;
                shared.error = Some(TrackerError::Position(error));
                shared.loading = false;
            }
        }
    }

    /// Releases the watch and clears the current position. History (and any
    /// surfaced error) stay around for the UI.
    pub fn stop(&self) {
        let mut provider_guard = self.provider.lock().unwrap();
        let watch_id = {
            let mut shared = self.shared.lock().unwrap();
            shared.phase = TrackingPhase::Idle;
            shared.current = None;
            shared.last_update_ms = None;
            shared.loading = false;
            shared.watch_id.take()
        };
        if let (Some(provider), Some(watch_id)) = (provider_guard.as_mut(), watch_id) {
            provider.clear_watch(watch_id);
            info!("[tracker] tracking stopped, watch_id={}", watch_id);
        }
    }

    pub fn current_fix(&self) -> Option<Fix> {
        self.shared.lock().unwrap().current
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let shared = self.shared.lock().unwrap();
        TrackerSnapshot {
            phase: shared.phase,
            current: shared.current,
            last_update_ms: shared.last_update_ms,
            history: shared.history.clone(),
            loading: shared.loading,
            error: shared.error,
            platform: shared.platform,
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_update(shared: &Arc<Mutex<TrackerShared>>, update: Result<Fix, PositionError>) {
    match update {
        Ok(fix) => {
            let uploader = {
                let mut shared = shared.lock().unwrap();
                shared.loading = false;
                shared.current = Some(fix);
                shared.last_update_ms = Some(utils::now_ms());
                shared.history.push(fix);
                let overflow = shared.history.len().saturating_sub(HISTORY_CAP);
                if overflow > 0 {
                    shared.history.drain(..overflow);
                }
                shared.error = None;
                Arc::clone(&shared.uploader)
            };
            // upload outside the lock, it does real I/O
            if let Err(error) = uploader.upload(&fix) {
                error!("[tracker] failed to upload location: {:#}", error);
                shared.lock().unwrap().error = Some(TrackerError::UploadFailed);
            }
        }
        Err(error) => {
            warn!("[tracker] watch failed: {:?}", error);
            let mut shared = shared.lock().unwrap();
            shared.phase = TrackingPhase::Error;
            shared.error = Some(TrackerError::Position(error));
            shared.loading = false;
        }
    }
}
