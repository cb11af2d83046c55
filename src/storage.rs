use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::contacts::Contact;
use crate::main_db::MainDb;
use crate::utils;

/// How long a cached contact list stays fresh. The web shell re-polled its
/// storage every second to pick up writes from other tabs; reads here go
/// back to the database on the same cadence.
const CONTACTS_MAX_CACHE_AGE: Duration = Duration::from_secs(1);

struct ContactsCache {
    list: Vec<Contact>,
    loaded_at: Option<Instant>,
}

pub struct Storage {
    pub main_db: Mutex<MainDb>,
    contacts: Mutex<ContactsCache>,
}

impl Storage {
    pub fn init(support_dir: &str) -> Self {
        let main_db = MainDb::open(support_dir);
        Storage {
            main_db: Mutex::new(main_db),
            contacts: Mutex::new(ContactsCache {
                list: Vec::new(),
                loaded_at: None,
            }),
        }
    }

    fn reload_contacts(&self, cache: &mut ContactsCache) {
        let mut main_db = self.main_db.lock().unwrap();
        match main_db.load_contacts() {
            Ok(list) => {
                cache.list = list;
                cache.loaded_at = Some(Instant::now());
            }
            Err(error) => {
                // keep serving the cached list, next read retries
                error!("[storage] failed to load contacts: {:#}", error);
            }
        }
    }

    fn reload_contacts_if_stale(&self, cache: &mut ContactsCache) {
        let stale = match cache.loaded_at {
            None => true,
            Some(loaded_at) => loaded_at.elapsed() >= CONTACTS_MAX_CACHE_AGE,
        };
        if stale {
            self.reload_contacts(cache);
        }
    }

    pub fn list_contacts(&self) -> Vec<Contact> {
        let mut cache = self.contacts.lock().unwrap();
        self.reload_contacts_if_stale(&mut cache);
        cache.list.clone()
    }

    pub fn get_contact(&self, id: &str) -> Option<Contact> {
        self.list_contacts().into_iter().find(|c| c.id == id)
    }

    /// Invalid input (blank name, no phone and no email) is a silent no-op
    /// and returns `None`.
    pub fn add_contact(
        &self,
        name: &str,
        phone: Option<String>,
        email: Option<String>,
    ) -> Option<Contact> {
        let mut contact = Contact::new(name, phone, email)?;

        let mut cache = self.contacts.lock().unwrap();
        // pick up out-of-band writes before appending
        self.reload_contacts(&mut cache);

        // ids are creation-time ms; same-millisecond adds must still be unique
        let mut id_ms: i64 = contact.id.parse().unwrap_or_else(|_| utils::now_ms());
        while cache.list.iter().any(|c| c.id == id_ms.to_string()) {
            id_ms += 1;
        }
        contact.id = id_ms.to_string();

        cache.list.push(contact.clone());
        self.persist(&mut cache);
        Some(contact)
    }

    pub fn remove_contact(&self, id: &str) {
        let mut cache = self.contacts.lock().unwrap();
        self.reload_contacts(&mut cache);
        cache.list.retain(|c| c.id != id);
        self.persist(&mut cache);
    }

    /// Idempotent. Unknown ids leave the list unchanged (the write still
    /// happens, carrying the freshly reloaded list).
    pub fn verify_contact(&self, id: &str) {
        let mut cache = self.contacts.lock().unwrap();
        self.reload_contacts(&mut cache);
        for contact in cache.list.iter_mut() {
            if contact.id == id {
                contact.is_verified = true;
            }
        }
        self.persist(&mut cache);
    }

    fn persist(&self, cache: &mut ContactsCache) {
        let mut main_db = self.main_db.lock().unwrap();
        if let Err(error) = main_db.save_contacts(&cache.list) {
            error!("[storage] failed to persist contacts: {:#}", error);
        }
        cache.loaded_at = Some(Instant::now());
    }
}
