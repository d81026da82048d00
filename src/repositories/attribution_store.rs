// src/repositories/attribution_store.rs

use std::sync::Arc;
use chrono::Utc;
use rusqlite::params;

use crate::db::ConnectionPool;
use crate::error::AppResult;

const KEY_CHECKED_PREVIOUSLY: &str = "referrer_checked_previously";
const KEY_CAMPAIGN_SUFFIX: &str = "campaign_suffix";

/// Durable memory of whether this device's attribution was already looked up.
#[cfg_attr(test, mockall::automock)]
pub trait AttributionStore: Send + Sync {
    fn has_checked_previously(&self) -> AppResult<bool>;
    fn cached_value(&self) -> AppResult<Option<String>>;
    fn set_checked_previously(&self, checked: bool) -> AppResult<()>;
    fn set_cached_value(&self, value: &str) -> AppResult<()>;
}

pub struct SqliteAttributionStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteAttributionStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT value FROM attribution_state WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;

        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    fn put(&self, key: &str, value: &str) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR REPLACE INTO attribution_state (key, value, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        log::debug!("[STORE] {} updated", key);
        Ok(())
    }
}

impl AttributionStore for SqliteAttributionStore {
    fn has_checked_previously(&self) -> AppResult<bool> {
        Ok(self.get(KEY_CHECKED_PREVIOUSLY)?.as_deref() == Some("true"))
    }

    fn cached_value(&self) -> AppResult<Option<String>> {
        self.get(KEY_CAMPAIGN_SUFFIX)
    }

    fn set_checked_previously(&self, checked: bool) -> AppResult<()> {
        self.put(KEY_CHECKED_PREVIOUSLY, if checked { "true" } else { "false" })
    }

    fn set_cached_value(&self, value: &str) -> AppResult<()> {
        self.put(KEY_CAMPAIGN_SUFFIX, value)
    }
}
