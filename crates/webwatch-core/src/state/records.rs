// # Record Store
//
// The single shared-mutable object of a cycle.
//
// ## Discipline
//
// One mutex guards the whole list. Every read and every write takes it, so
// no caller can observe a record with the size from one write and the hash
// from another. Callers only ever get copies out; there is no way to borrow
// a record from inside the lock.
//
// ## Indices
//
// Records are addressed by position. Nothing is inserted or removed during a
// cycle, so indices taken from `snapshot()` stay valid for the store's
// lifetime.

use tokio::sync::Mutex;

use crate::Error;
use crate::config::SiteRecord;

/// Lock-protected, position-addressed site list
///
/// # Example
///
/// ```rust
/// use webwatch_core::config::SiteRecord;
/// use webwatch_core::state::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = RecordStore::new(vec![SiteRecord::new("docs", "https://example.com")]);
///
///     let mut site = store.snapshot().await[0].clone();
///     site.last_size = 42;
///     store.replace_at(0, site).await?;
///
///     assert_eq!(store.snapshot().await[0].last_size, 42);
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Mutex<Vec<SiteRecord>>,
}

impl RecordStore {
    /// Create a store holding `records`
    pub fn new(records: Vec<SiteRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Copy of the full list as of this call
    pub async fn snapshot(&self) -> Vec<SiteRecord> {
        self.records.lock().await.clone()
    }

    /// Copy of the record at `index`
    pub async fn get(&self, index: usize) -> Option<SiteRecord> {
        self.records.lock().await.get(index).cloned()
    }

    /// Overwrite the record at `index`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Record replaced
    /// - `Err(Error::InvalidInput)`: `index` is out of bounds
    pub async fn replace_at(&self, index: usize, record: SiteRecord) -> Result<(), Error> {
        let mut guard = self.records.lock().await;
        let len = guard.len();
        let slot = guard.get_mut(index).ok_or_else(|| {
            Error::invalid_input(format!(
                "Record index {} out of bounds (store holds {})",
                index, len
            ))
        })?;
        *slot = record;
        Ok(())
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Take the records out of the store
    pub fn into_records(self) -> Vec<SiteRecord> {
        self.records.into_inner()
    }
}
