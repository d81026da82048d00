// src/repositories/memory_attribution_store.rs
//
// Process-local store for ephemeral runs. Nothing survives a restart.

use std::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::repositories::AttributionStore;

#[derive(Debug, Default, Clone)]
struct Entries {
    checked_previously: bool,
    cached_value: Option<String>,
    writes: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryAttributionStore {
    entries: Mutex<Entries>,
}

impl InMemoryAttributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store as a previous run would have left it
    pub fn with_previous_run(cached_value: Option<&str>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                checked_previously: true,
                cached_value: cached_value.map(str::to_string),
                writes: 0,
            }),
        }
    }

    /// Number of setter calls since construction
    pub fn write_count(&self) -> usize {
        self.entries.lock().map(|e| e.writes).unwrap_or(0)
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut Entries) -> T) -> AppResult<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Other("attribution store lock poisoned".to_string()))?;
        Ok(f(&mut entries))
    }
}

impl AttributionStore for InMemoryAttributionStore {
    fn has_checked_previously(&self) -> AppResult<bool> {
        self.with_entries(|e| e.checked_previously)
    }

    fn cached_value(&self) -> AppResult<Option<String>> {
        self.with_entries(|e| e.cached_value.clone())
    }

    fn set_checked_previously(&self, checked: bool) -> AppResult<()> {
        self.with_entries(|e| {
            e.checked_previously = checked;
            e.writes += 1;
        })
    }

    fn set_cached_value(&self, value: &str) -> AppResult<()> {
        self.with_entries(|e| {
            e.cached_value = Some(value.to_string());
            e.writes += 1;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_run_seed() {
        let store = InMemoryAttributionStore::with_previous_run(Some("ABC123"));
        assert!(store.has_checked_previously().unwrap());
        assert_eq!(store.cached_value().unwrap().as_deref(), Some("ABC123"));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_writes_are_counted() {
        let store = InMemoryAttributionStore::new();
        store.set_cached_value("xyz").unwrap();
        store.set_checked_previously(true).unwrap();

        assert_eq!(store.write_count(), 2);
        assert!(store.has_checked_previously().unwrap());
    }
}
