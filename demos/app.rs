use rand::Rng;
use safeher_core::api::api;
use safeher_core::positioning::{
    Fix, Platform, PositionError, PositionOptions, PositionProvider, WatchCallback, WatchId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const START_LAT: f64 = 12.9716;
const START_LNG: f64 = 77.5946;
const STEP: f64 = 0.00252;

/// Scripted positioning capability: a random walk starting in Bengaluru.
#[derive(Clone)]
struct SimulatedProvider {
    state: Arc<Mutex<SimulatedState>>,
}

struct SimulatedState {
    position: Fix,
    watches: HashMap<WatchId, WatchCallback>,
    next_watch_id: WatchId,
}

impl SimulatedProvider {
    fn new() -> Self {
        SimulatedProvider {
            state: Arc::new(Mutex::new(SimulatedState {
                position: Fix {
                    latitude: START_LAT,
                    longitude: START_LNG,
                    timestamp_ms: chrono::Utc::now().timestamp_millis(),
                },
                watches: HashMap::new(),
                next_watch_id: 0,
            })),
        }
    }

    fn advance(&self) {
        let mut rng = rand::rng();
        let mut state = self.state.lock().unwrap();
        state.position = Fix {
            latitude: state.position.latitude + rng.random_range(-STEP..=STEP),
            longitude: state.position.longitude + STEP,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        };
        let fix = state.position;
        for callback in state.watches.values_mut() {
            callback(Ok(fix));
        }
    }
}

impl PositionProvider for SimulatedProvider {
    fn current_position(&mut self, _options: &PositionOptions) -> Result<Fix, PositionError> {
        Ok(self.state.lock().unwrap().position)
    }

    fn watch_position(&mut self, _options: &PositionOptions, callback: WatchCallback) -> WatchId {
        let mut state = self.state.lock().unwrap();
        let watch_id = state.next_watch_id;
        state.next_watch_id += 1;
        state.watches.insert(watch_id, callback);
        watch_id
    }

    fn clear_watch(&mut self, watch_id: WatchId) {
        self.state.lock().unwrap().watches.remove(&watch_id);
    }
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    let base_dir = std::env::temp_dir().join("safeher_demo");
    std::fs::create_dir_all(&base_dir).unwrap();
    let base_dir = base_dir.to_str().unwrap().to_string();
    api::init(base_dir.clone(), base_dir, None);
    api::set_platform(Platform::from_user_agent(
        "Mozilla/5.0 (Linux; Android 14; Pixel 8)",
    ));

    let provider = SimulatedProvider::new();
    api::set_position_provider(Box::new(provider.clone()));
    api::start_tracking();

    let mom = api::add_contact("Mom".to_string(), Some("5551234".to_string()), None)
        .expect("valid contact");
    let dad = api::add_contact("Dad".to_string(), None, Some("dad@example.com".to_string()))
        .expect("valid contact");
    api::verify_contact(mom.id.clone());

    let journey = api::start_journey("Work".to_string(), vec![mom.id, dad.id])
        .expect("journey should start");
    println!("journey {} to {} started", journey.id, journey.destination);

    for i in 0..12 {
        provider.advance();
        if i % 4 == 3 {
            api::share_journey(journey.id.clone());
        }
        std::thread::sleep(Duration::from_millis(200));
    }

    let snapshot = api::tracker_snapshot();
    println!(
        "history keeps {} fixes, current = {:?}",
        snapshot.history.len(),
        snapshot.current
    );

    api::end_journey(journey.id.clone());
    for journey in api::list_journeys() {
        println!(
            "journey {}: active={}, ended_at={:?}",
            journey.destination, journey.is_active, journey.end_time_ms
        );
    }

    api::stop_tracking();
}
