use chrono::Utc;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

pub mod db {
    use anyhow::Result;
    use rusqlite::{OptionalExtension, Transaction};

    pub fn init_metadata_and_get_version(tx: &Transaction) -> Result<i32> {
        tx.execute(
            "CREATE TABLE IF NOT EXISTS metadata (
                key   TEXT PRIMARY KEY NOT NULL UNIQUE,
                value TEXT
            );",
            (),
        )?;
        let version: Option<String> = tx
            .query_row("SELECT value FROM metadata WHERE key = 'version';", (), |row| {
                row.get(0)
            })
            .optional()?;
        match version {
            None => Ok(0),
            Some(value) => Ok(value.parse()?),
        }
    }

    pub fn set_version_in_metadata(tx: &Transaction, version: i32) -> Result<()> {
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('version', ?1);",
            (version.to_string(),),
        )?;
        Ok(())
    }
}
