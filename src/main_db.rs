use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::cmp::Ordering;
use std::path::Path;

use crate::contacts::Contact;
use crate::utils;

/* The main database. The app only persists one thing: the trusted contact
list, stored wholesale as a JSON blob in the `kv` table under a fixed key.
Journeys and location history are session state and are never written here.

The blob is read and written as a whole, so two writers racing (e.g. two app
instances on the same profile) resolve to last-writer-wins.
*/

#[allow(clippy::type_complexity)]
fn open_db_and_run_migration(
    support_dir: &str,
    file_name: &str,
    migrations: &[&dyn Fn(&Transaction) -> Result<()>],
) -> Result<Connection> {
    debug!("open and run migration for {}", file_name);
    let mut conn = rusqlite::Connection::open(Path::new(support_dir).join(file_name))?;
    let tx = conn.transaction()?;

    let version = utils::db::init_metadata_and_get_version(&tx)? as usize;
    let target_version = migrations.len();
    debug!(
        "current version = {}, target_version = {}",
        version, target_version
    );
    match version.cmp(&target_version) {
        Ordering::Equal => (),
        Ordering::Less => {
            for i in (version)..target_version {
                info!("running migration for version: {}", i + 1);
                let f = migrations.get(i).unwrap();
                f(&tx)?;
            }
            utils::db::set_version_in_metadata(&tx, target_version as i32)?;
        }
        Ordering::Greater => {
            bail!(
                "version too high: current version = {}, target_version = {}",
                version,
                target_version
            );
        }
    }
    tx.commit()?;
    Ok(conn)
}

#[derive(Debug, Clone, Copy)]
pub enum Key {
    TrustedContacts,
}

impl Key {
    fn to_db_key(self) -> &'static str {
        match self {
            Self::TrustedContacts => "TRUSTED_CONTACTS",
        }
    }
}

pub struct MainDb {
    conn: Connection,
}

impl MainDb {
    pub fn open(support_dir: &str) -> MainDb {
        // TODO: better error handling
        let conn = open_db_and_run_migration(
            support_dir,
            "main.db",
            &[&|tx| {
                tx.execute(
                    "CREATE TABLE kv (
                        key   TEXT PRIMARY KEY
                                   NOT NULL
                                   UNIQUE,
                        value TEXT
                    );",
                    (),
                )?;
                Ok(())
            }],
        )
        .expect("failed to open main db");
        MainDb { conn }
    }

    pub fn get_kv(&mut self, key: Key) -> Result<Option<String>> {
        let tx = self.conn.transaction()?;
        let mut query = tx.prepare("SELECT value FROM kv WHERE key = ?1;")?;
        let result = query
            .query_row([key.to_db_key()], |row| row.get(0))
            .optional()?;
        Ok(result)
    }

    pub fn set_kv(&mut self, key: Key, value: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        let sql = "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2);";
        tx.execute(sql, (key.to_db_key(), value))?;
        tx.commit()?;
        Ok(())
    }

    /// Missing or unparsable blob reads as an empty list. An unparsable blob
    /// is logged rather than surfaced, the same way the shell treated a
    /// corrupt storage entry.
    pub fn load_contacts(&mut self) -> Result<Vec<Contact>> {
        match self.get_kv(Key::TrustedContacts)? {
            None => Ok(Vec::new()),
            Some(blob) => match serde_json::from_str(&blob) {
                Ok(contacts) => Ok(contacts),
                Err(error) => {
                    warn!("[main_db] dropping unparsable contact blob: {}", error);
                    Ok(Vec::new())
                }
            },
        }
    }

    pub fn save_contacts(&mut self, contacts: &[Contact]) -> Result<()> {
        let blob = serde_json::to_string(contacts)?;
        self.set_kv(Key::TrustedContacts, &blob)
    }
}
