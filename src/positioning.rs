use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single position fix as delivered by the device positioning capability.
/// Immutable once created.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

/// Classified positioning failure, matching what platform geolocation APIs
/// report. `Unsupported` is not here on purpose: a device without any
/// positioning capability never produces these.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PositionError {
    Timeout,
    PermissionDenied,
    PositionUnavailable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// How stale a cached fix may be. Zero means a fresh fix is required.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        PositionOptions {
            high_accuracy: true,
            timeout: Duration::from_secs(30),
            maximum_age: Duration::ZERO,
        }
    }
}

pub type WatchId = u64;
pub type WatchCallback = Box<dyn FnMut(Result<Fix, PositionError>) + Send>;

/// Seam to the device positioning capability. The platform shell registers
/// an implementation; tests drive a simulated one.
pub trait PositionProvider {
    fn supported(&self) -> bool {
        true
    }

    /// One-shot fix request.
    fn current_position(&mut self, options: &PositionOptions) -> Result<Fix, PositionError>;

    /// Continuous subscription. The callback may be invoked from any thread
    /// and keeps delivering until `clear_watch` is called with the returned
    /// id.
    fn watch_position(&mut self, options: &PositionOptions, callback: WatchCallback) -> WatchId;

    fn clear_watch(&mut self, watch_id: WatchId);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Platform {
    Mobile,
    Desktop,
}

const MOBILE_UA_MARKERS: &[&str] = &[
    "Android", "webOS", "iPhone", "iPad", "iPod", "BlackBerry", "IEMobile", "Opera Mini",
];

impl Platform {
    pub fn from_user_agent(user_agent: &str) -> Platform {
        if MOBILE_UA_MARKERS.iter().any(|m| user_agent.contains(m)) {
            Platform::Mobile
        } else {
            Platform::Desktop
        }
    }
}
