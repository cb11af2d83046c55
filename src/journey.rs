use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Mutex;
use uuid::Uuid;

use crate::contacts::Contact;
use crate::positioning::Fix;
use crate::utils;

/// A tracked trip shared with a fixed set of contacts. Journeys live only
/// for the session, they are never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Journey {
    pub id: String,
    pub destination: String,
    pub start_time_ms: i64,
    pub end_time_ms: Option<i64>,
    pub is_active: bool,
    /// Fixed at creation time, recipients cannot be added or removed later.
    pub shared_with: Vec<Contact>,
}

/// What a recipient gets when a journey shares its position.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareUpdate {
    pub latitude: f64,
    pub longitude: f64,
    pub destination: String,
    /// RFC3339 wall-clock time of the share, not of the fix.
    pub timestamp: String,
}

/// Delivery seam for journey sharing. The default delivery is a logging
/// stub; an SMS/email provider would implement this.
pub trait ContactNotifier: Send + Sync {
    fn notify(&self, contact: &Contact, update: &ShareUpdate) -> Result<()>;
}

pub struct LogNotifier;

impl ContactNotifier for LogNotifier {
    fn notify(&self, contact: &Contact, update: &ShareUpdate) -> Result<()> {
        info!(
            "sharing location with {} ({}): lat={}, lng={}, destination={}, timestamp={}",
            contact.name,
            contact.reachable_at().unwrap_or("unreachable"),
            update.latitude,
            update.longitude,
            update.destination,
            update.timestamp
        );
        Ok(())
    }
}

/// Sequential fan-out to every recipient of the journey. Without a current
/// fix there is nothing to share and the call is a no-op. One failing
/// recipient must not starve the rest: failures are logged per contact and
/// the loop keeps going; if anything failed the caller gets a single
/// generic error after everyone was attempted.
pub fn share_location_with_contacts(
    journey: &Journey,
    current: Option<Fix>,
    notifier: &dyn ContactNotifier,
) -> Result<()> {
    let fix = match current {
        None => {
            debug!(
                "no current location, skipping share for journey {}",
                journey.id
            );
            return Ok(());
        }
        Some(fix) => fix,
    };

    let update = ShareUpdate {
        latitude: fix.latitude,
        longitude: fix.longitude,
        destination: journey.destination.clone(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    };

    let mut failed = 0;
    for contact in &journey.shared_with {
        if let Err(error) = notifier.notify(contact, &update) {
            error!(
                "failed to share location with {}: {:#}",
                contact.name, error
            );
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("failed to send location to {} contact(s)", failed);
    }
    Ok(())
}

pub struct JourneyManager {
    journeys: Mutex<Vec<Journey>>,
}

impl JourneyManager {
    pub fn new() -> Self {
        JourneyManager {
            journeys: Mutex::new(Vec::new()),
        }
    }

    /// Blank destination or an empty recipient list creates nothing.
    pub fn start_journey(&self, destination: &str, shared_with: Vec<Contact>) -> Option<Journey> {
        if destination.trim().is_empty() || shared_with.is_empty() {
            return None;
        }
        let journey = Journey {
            id: Uuid::new_v4().as_hyphenated().to_string(),
            destination: destination.to_string(),
            start_time_ms: utils::now_ms(),
            end_time_ms: None,
            is_active: true,
            shared_with,
        };
        info!(
            "journey started: id={}, destination={}, recipients={}",
            journey.id,
            journey.destination,
            journey.shared_with.len()
        );
        let mut journeys = self.journeys.lock().unwrap();
        journeys.push(journey.clone());
        Some(journey)
    }

    /// Stamps the end time and deactivates. Unknown ids leave the list
    /// unchanged and return false.
    pub fn end_journey(&self, id: &str) -> bool {
        let mut journeys = self.journeys.lock().unwrap();
        match journeys.iter_mut().find(|j| j.id == id) {
            None => false,
            Some(journey) => {
                if journey.is_active {
                    journey.is_active = false;
                    journey.end_time_ms = Some(utils::now_ms());
                    info!("journey ended: id={}", id);
                }
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Journey> {
        self.journeys.lock().unwrap().iter().find(|j| j.id == id).cloned()
    }

    pub fn list(&self) -> Vec<Journey> {
        self.journeys.lock().unwrap().clone()
    }

    /// Fan-out for a journey by id. Unknown ids are a no-op.
    pub fn share(
        &self,
        id: &str,
        current: Option<Fix>,
        notifier: &dyn ContactNotifier,
    ) -> Result<()> {
        match self.get(id) {
            None => Ok(()),
            Some(journey) => share_location_with_contacts(&journey, current, notifier),
        }
    }
}
