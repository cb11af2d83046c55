pub mod test_utils;

use assert_float_eq::*;
use std::sync::Arc;

use safeher_core::location_tracker::{LocationTracker, TrackerError, TrackingPhase, HISTORY_CAP};
use safeher_core::positioning::{Platform, PositionError};
use test_utils::{fix, CountingUploader, SimulatedPositionProvider};

fn tracker_with(provider: &SimulatedPositionProvider) -> (LocationTracker, CountingUploader) {
    let tracker = LocationTracker::new(Platform::Desktop);
    tracker.set_provider(Box::new(provider.clone()));
    let uploader = CountingUploader::new();
    tracker.set_uploader(Arc::new(uploader.clone()));
    (tracker, uploader)
}

#[test]
fn start_without_any_provider() {
    let tracker = LocationTracker::new(Platform::Desktop);
    tracker.start();

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, TrackingPhase::Error);
    assert_eq!(snapshot.error, Some(TrackerError::Unsupported));
    assert!(!snapshot.loading);
}

#[test]
fn start_with_unsupported_provider_issues_no_subscription() {
    let provider = SimulatedPositionProvider::unsupported();
    let (tracker, uploader) = tracker_with(&provider);
    tracker.start();

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.error, Some(TrackerError::Unsupported));
    assert_eq!(provider.active_watch_count(), 0);
    assert!(uploader.uploads().is_empty());
}

#[test]
fn permission_denied_on_initial_request() {
    let provider = SimulatedPositionProvider::new(Err(PositionError::PermissionDenied));
    let (tracker, uploader) = tracker_with(&provider);
    tracker.start();

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, TrackingPhase::Error);
    assert_eq!(
        snapshot.error,
        Some(TrackerError::Position(PositionError::PermissionDenied))
    );
    assert!(snapshot.offers_settings_hint());
    // no watch was ever established
    assert_eq!(provider.active_watch_count(), 0);
    assert!(uploader.uploads().is_empty());
}

#[test]
fn first_fix_establishes_watch_and_uploads() {
    let provider = SimulatedPositionProvider::new(Ok(fix(12.9716, 77.5946, 1000)));
    let (tracker, uploader) = tracker_with(&provider);
    tracker.start();

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, TrackingPhase::Tracking);
    assert_eq!(provider.active_watch_count(), 1);
    let current = snapshot.current.unwrap();
    assert_f64_near!(current.latitude, 12.9716);
    assert_f64_near!(current.longitude, 77.5946);
    assert!(snapshot.last_update_ms.is_some());
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(uploader.uploads().len(), 1);
    assert!(snapshot.error.is_none());
}

#[test]
fn start_while_tracking_does_not_stack_watches() {
    let provider = SimulatedPositionProvider::new(Ok(fix(1.0, 2.0, 1000)));
    let (tracker, _uploader) = tracker_with(&provider);
    tracker.start();
    tracker.start();

    assert_eq!(provider.active_watch_count(), 1);
}

#[test]
fn history_keeps_the_ten_most_recent_fixes_in_order() {
    let provider = SimulatedPositionProvider::new(Ok(fix(0.0, 0.0, 0)));
    let (tracker, uploader) = tracker_with(&provider);
    tracker.start();

    for i in 1..=14 {
        provider.emit(Ok(fix(i as f64, -(i as f64), i * 100)));
    }

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.history.len(), HISTORY_CAP);
    let timestamps: Vec<i64> = snapshot.history.iter().map(|f| f.timestamp_ms).collect();
    assert_eq!(
        timestamps,
        vec![500, 600, 700, 800, 900, 1000, 1100, 1200, 1300, 1400]
    );
    // the current fix is the newest one, and every fix went out
    assert_eq!(snapshot.current.unwrap().timestamp_ms, 1400);
    assert_eq!(uploader.uploads().len(), 15);
}

#[test]
fn upload_failure_surfaces_error_but_keeps_tracking() {
    let provider = SimulatedPositionProvider::new(Ok(fix(1.0, 1.0, 1000)));
    let (tracker, uploader) = tracker_with(&provider);
    tracker.start();

    uploader.set_failing(true);
    provider.emit(Ok(fix(2.0, 2.0, 2000)));

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, TrackingPhase::Tracking);
    assert_eq!(snapshot.error, Some(TrackerError::UploadFailed));
    // the fix itself was accepted
    assert_eq!(snapshot.current.unwrap().timestamp_ms, 2000);
    assert_eq!(snapshot.history.len(), 2);

    // the next good fix clears the error
    uploader.set_failing(false);
    provider.emit(Ok(fix(3.0, 3.0, 3000)));
    assert!(tracker.snapshot().error.is_none());
}

#[test]
fn watch_failure_ends_tracking_and_retry_recovers() {
    let provider = SimulatedPositionProvider::new(Ok(fix(1.0, 1.0, 1000)));
    let (tracker, _uploader) = tracker_with(&provider);
    tracker.start();

    provider.emit(Err(PositionError::Timeout));
    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, TrackingPhase::Error);
    assert_eq!(
        snapshot.error,
        Some(TrackerError::Position(PositionError::Timeout))
    );
    assert!(snapshot.offers_settings_hint());

    // user retry: the stale watch is released, a fresh one is established
    tracker.start();
    assert_eq!(tracker.snapshot().phase, TrackingPhase::Tracking);
    assert_eq!(provider.active_watch_count(), 1);
    assert_eq!(provider.cleared_watches(), vec![0]);
}

#[test]
fn stop_clears_position_but_keeps_history() {
    let provider = SimulatedPositionProvider::new(Ok(fix(1.0, 1.0, 1000)));
    let (tracker, _uploader) = tracker_with(&provider);
    tracker.start();
    provider.emit(Ok(fix(2.0, 2.0, 2000)));

    tracker.stop();

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.phase, TrackingPhase::Idle);
    assert!(snapshot.current.is_none());
    assert!(snapshot.last_update_ms.is_none());
    assert!(!snapshot.loading);
    assert_eq!(snapshot.history.len(), 2);
    assert_eq!(provider.active_watch_count(), 0);
}

#[test]
fn dropping_the_tracker_releases_the_watch() {
    let provider = SimulatedPositionProvider::new(Ok(fix(1.0, 1.0, 1000)));
    {
        let (tracker, _uploader) = tracker_with(&provider);
        tracker.start();
        assert_eq!(provider.active_watch_count(), 1);
    }
    assert_eq!(provider.active_watch_count(), 0);
}

#[test]
fn unavailable_message_differs_by_platform() {
    let error = TrackerError::Position(PositionError::PositionUnavailable);
    assert_ne!(
        error.user_message(Platform::Mobile),
        error.user_message(Platform::Desktop)
    );
    assert!(!error.offers_settings_hint());

    let denied = TrackerError::Position(PositionError::PermissionDenied);
    assert_eq!(
        denied.user_message(Platform::Mobile),
        denied.user_message(Platform::Desktop)
    );
}
