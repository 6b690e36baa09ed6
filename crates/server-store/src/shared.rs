use crate::{ServerStore, StoreConfig, StoreResult};
use std::sync::{Arc, Mutex, MutexGuard};

/// Process-wide handle to one [`ServerStore`], opened on first use.
///
/// Owned by the composition root and passed to whoever needs the store. Concurrent
/// first calls to [`SharedStore::get`] open the store once; a failed open is not
/// cached, so the next call tries again.
pub struct SharedStore {
    config: StoreConfig,
    slot: Mutex<Option<Arc<ServerStore>>>,
}

impl SharedStore {
    pub fn new(config: StoreConfig) -> Self {
        SharedStore { config, slot: Mutex::new(None) }
    }

    pub fn get(&self) -> StoreResult<Arc<ServerStore>> {
        let mut slot = self.lock();
        if let Some(store) = slot.as_ref() {
            return Ok(Arc::clone(store));
        }
        let store = Arc::new(ServerStore::open(self.config.clone())?);
        *slot = Some(Arc::clone(&store));
        Ok(store)
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<ServerStore>>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("shared store lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
