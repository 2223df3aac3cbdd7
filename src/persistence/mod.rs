//! Best-score persistence
//!
//! A single scalar survives between sessions. Writes are best-effort: callers
//! log failures and keep playing.

use crate::error::Result;
#[cfg(target_arch = "wasm32")]
use crate::error::Error;

/// Where the best score is kept between sessions
pub trait BestScoreStore {
    fn load_best(&self) -> Result<u64>;
    fn save_best(&mut self, best: u64) -> Result<()>;
}

/// In-memory store for tests and the native demo
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    best: u64,
    /// Number of successful saves
    pub saves: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u64) -> Self {
        Self { best, saves: 0 }
    }

    pub fn best(&self) -> u64 {
        self.best
    }
}

impl BestScoreStore for MemoryStore {
    fn load_best(&self) -> Result<u64> {
        Ok(self.best)
    }

    fn save_best(&mut self, best: u64) -> Result<()> {
        self.best = best;
        self.saves += 1;
        Ok(())
    }
}

impl<S: BestScoreStore + ?Sized> BestScoreStore for Box<S> {
    fn load_best(&self) -> Result<u64> {
        (**self).load_best()
    }

    fn save_best(&mut self, best: u64) -> Result<()> {
        (**self).save_best(best)
    }
}

/// Browser LocalStorage store (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "melon_merge_best";

    fn storage() -> Result<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(Error::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl BestScoreStore for LocalStorageStore {
    fn load_best(&self) -> Result<u64> {
        let storage = Self::storage()?;
        let value = storage
            .get_item(Self::STORAGE_KEY)
            .map_err(|e| Error::Storage(format!("{e:?}")))?;
        let best = match value {
            Some(text) => text.trim().parse::<u64>().unwrap_or(0),
            None => 0,
        };
        log::info!("Loaded best score {best}");
        Ok(best)
    }

    fn save_best(&mut self, best: u64) -> Result<()> {
        let storage = Self::storage()?;
        storage
            .set_item(Self::STORAGE_KEY, &best.to_string())
            .map_err(|e| Error::Storage(format!("{e:?}")))?;
        log::info!("Best score saved ({best})");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load_best().unwrap(), 0);
        store.save_best(42).unwrap();
        assert_eq!(store.load_best().unwrap(), 42);
        assert_eq!(store.saves, 1);
    }

    #[test]
    fn test_boxed_store_delegates() {
        let mut store: Box<dyn BestScoreStore> = Box::new(MemoryStore::with_best(7));
        assert_eq!(store.load_best().unwrap(), 7);
        store.save_best(9).unwrap();
        assert_eq!(store.load_best().unwrap(), 9);
    }
}
