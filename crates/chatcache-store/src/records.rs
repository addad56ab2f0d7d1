//! CRUD operations for keyed records.

use chrono::Utc;
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};

impl Database {
    /// Insert or replace the value stored under `key`.
    pub fn put_record(&self, key: &str, value: &[u8]) -> Result<()> {
        self.conn().execute(
            "INSERT INTO records (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Fetch the value stored under `key`.
    pub fn get_record(&self, key: &str) -> Result<Vec<u8>> {
        self.conn()
            .query_row(
                "SELECT value FROM records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Delete the value stored under `key`.  Returns `true` if a row was deleted.
    pub fn delete_record(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM records WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}
