// # Memory Site Store
//
// In-memory implementation of SiteStore.
//
// ## When to Use
//
// - Tests
// - Embedding webwatch in a program that keeps its own site list

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::config::SiteRecord;
use crate::traits::SiteStore;

/// In-memory site store
///
/// Clones share the same list, so a test can keep one handle and give
/// another to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemorySiteStore {
    records: Arc<RwLock<Vec<SiteRecord>>>,
    save_count: Arc<AtomicUsize>,
}

impl MemorySiteStore {
    /// Create a store holding `records`
    pub fn new(records: Vec<SiteRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
            save_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Current contents
    pub async fn records(&self) -> Vec<SiteRecord> {
        self.records.read().await.clone()
    }

    /// Number of times `save()` was called
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteStore for MemorySiteStore {
    async fn load(&self) -> Result<Vec<SiteRecord>, Error> {
        Ok(self.records.read().await.clone())
    }

    async fn save(&self, records: &[SiteRecord]) -> Result<(), Error> {
        *self.records.write().await = records.to_vec();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
