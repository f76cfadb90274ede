//! Per-site change check
//!
//! A [`SiteChecker`] runs one site through
//! `Fetching → Hashing → Comparing → {Unchanged | Changed} → Done`:
//!
//! 1. Copy the record at `pos` out of the [`RecordStore`]
//! 2. GET the URL, with Basic auth when both credentials are set
//! 3. Fingerprint the body
//! 4. Compare with the stored fingerprint
//! 5. On a difference, notify and write the updated record back
//!
//! A fetch failure ends the check early: the error is reported through the
//! notifier and the record is left exactly as it was. Status codes are not
//! errors; an error page is fingerprinted like any other body.

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{CheckConfig, SiteRecord};
use crate::error::{Error, Result};
use crate::fingerprint::{Fingerprint, HashAlgorithm, fingerprint};
use crate::state::RecordStore;
use crate::traits::{FetchRequest, Fetcher, Notifier, WatchEvent};

/// Step of a check that was running when it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    /// Waiting for the response body
    Fetching,
    /// Computing the fingerprint
    Hashing,
    /// Comparing and writing back
    Comparing,
}

impl fmt::Display for CheckPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckPhase::Fetching => f.write_str("fetching"),
            CheckPhase::Hashing => f.write_str("hashing"),
            CheckPhase::Comparing => f.write_str("comparing"),
        }
    }
}

/// Terminal state of one site check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Body matches the stored fingerprint; record untouched
    Unchanged {
        pos: usize,
        description: String,
        fingerprint: Fingerprint,
    },

    /// Body differs; record updated with `current`
    Changed {
        pos: usize,
        description: String,
        previous: Fingerprint,
        current: Fingerprint,
    },

    /// Check stopped early; record untouched
    Failed {
        pos: usize,
        description: String,
        phase: CheckPhase,
        message: String,
    },
}

impl CheckOutcome {
    /// Index of the site this outcome is for
    pub fn pos(&self) -> usize {
        match self {
            CheckOutcome::Unchanged { pos, .. }
            | CheckOutcome::Changed { pos, .. }
            | CheckOutcome::Failed { pos, .. } => *pos,
        }
    }

    /// Description of the site this outcome is for
    pub fn description(&self) -> &str {
        match self {
            CheckOutcome::Unchanged { description, .. }
            | CheckOutcome::Changed { description, .. }
            | CheckOutcome::Failed { description, .. } => description,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, CheckOutcome::Changed { .. })
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, CheckOutcome::Unchanged { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CheckOutcome::Failed { .. })
    }
}

/// Checks one site at a time against a shared store
///
/// Cheap to share: the engine wraps one checker in an `Arc` and hands it to
/// every concurrent task.
pub struct SiteChecker {
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    algorithm: HashAlgorithm,
    timeout: Option<Duration>,
}

impl SiteChecker {
    /// Create a checker
    ///
    /// # Parameters
    ///
    /// - `fetcher`: Retrieves page bodies
    /// - `notifier`: Receives change and error events
    /// - `config`: Hash algorithm and per-check timeout
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        config: &CheckConfig,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            algorithm: config.hash_algorithm,
            timeout: config.check_timeout(),
        }
    }

    /// Check the site at `pos`
    ///
    /// Never returns an error: every failure becomes a
    /// [`CheckOutcome::Failed`] and leaves the record untouched.
    ///
    /// `pos` must come from a snapshot of the same store. An invalid index
    /// is logged as a bug and reported as failed without notifying.
    pub async fn check(&self, store: &RecordStore, pos: usize) -> CheckOutcome {
        let Some(site) = store.get(pos).await else {
            error!("Site index {} out of bounds, skipping check", pos);
            return CheckOutcome::Failed {
                pos,
                description: String::new(),
                phase: CheckPhase::Fetching,
                message: format!("site index {} out of bounds", pos),
            };
        };

        debug!("{} | {}", site.description, CheckPhase::Fetching);
        if site.has_partial_credentials() {
            warn!(
                "{} | only one of username/password is set, fetching without authentication",
                site.description
            );
        }

        let body = match self.fetch(&site).await {
            Ok(body) => body,
            Err(e) => return self.fail(pos, &site, CheckPhase::Fetching, e).await,
        };

        debug!("{} | {} {} bytes", site.description, CheckPhase::Hashing, body.len());
        let current = fingerprint(&body, self.algorithm);
        let previous = site.fingerprint();

        debug!("{} | {}", site.description, CheckPhase::Comparing);
        if current == previous {
            info!(
                "{} | {} -> {} | {} -> {} | no change detected",
                site.description, previous.size, current.size, previous.hash, current.hash
            );
            return CheckOutcome::Unchanged {
                pos,
                description: site.description,
                fingerprint: current,
            };
        }

        info!(
            "{} | {} -> {} | {} -> {} | change detected",
            site.description, previous.size, current.size, previous.hash, current.hash
        );

        self.deliver(WatchEvent::ChangeDetected {
            description: site.description.clone(),
            url: site.url.clone(),
        })
        .await;

        let updated = site.with_fingerprint(&current, Utc::now());
        if let Err(e) = store.replace_at(pos, updated).await {
            return self.fail(pos, &site, CheckPhase::Comparing, e).await;
        }

        CheckOutcome::Changed {
            pos,
            description: site.description,
            previous,
            current,
        }
    }

    /// Fetch the body, bounded by the per-check timeout if one is set
    async fn fetch(&self, site: &SiteRecord) -> Result<Vec<u8>> {
        let request = FetchRequest::for_site(site);
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch(&request))
                .await
                .map_err(|_| {
                    Error::timeout(format!("fetching {} took longer than {:?}", site.url, limit))
                })?,
            None => self.fetcher.fetch(&request).await,
        }
    }

    /// Report a failed check and build its outcome
    async fn fail(
        &self,
        pos: usize,
        site: &SiteRecord,
        phase: CheckPhase,
        error: Error,
    ) -> CheckOutcome {
        let message = error.to_string();
        warn!(
            "{} | {} -> ? | {} -> ? | error while {}: {}",
            site.description, site.last_size, site.last_hash, phase, message
        );

        self.deliver(WatchEvent::CheckError {
            description: site.description.clone(),
            message: message.clone(),
        })
        .await;

        CheckOutcome::Failed {
            pos,
            description: site.description.clone(),
            phase,
            message,
        }
    }

    /// Hand an event to the notifier, logging (not propagating) failures
    pub(crate) async fn deliver(&self, event: WatchEvent) {
        if let Err(e) = self.notifier.notify(&event).await {
            warn!(
                "Notifier {} failed for {}: {}",
                self.notifier.name(),
                event.description(),
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StaticFetcher(std::result::Result<Vec<u8>, String>);

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _request: &FetchRequest) -> Result<Vec<u8>> {
            self.0.clone().map_err(Error::fetch)
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<WatchEvent>>);

    #[async_trait]
    impl Notifier for Recording {
        async fn notify(&self, event: &WatchEvent) -> Result<()> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    fn checker(
        body: std::result::Result<&[u8], &str>,
        notifier: Arc<Recording>,
    ) -> SiteChecker {
        let fetcher = StaticFetcher(body.map(|b| b.to_vec()).map_err(|e| e.to_string()));
        SiteChecker::new(Arc::new(fetcher), notifier, &CheckConfig::default())
    }

    #[tokio::test]
    async fn test_first_check_records_change() {
        let notifier = Arc::new(Recording::default());
        let store = RecordStore::new(vec![SiteRecord::new("Docs", "https://example.com")]);

        let outcome = checker(Ok(b"hello"), Arc::clone(&notifier))
            .check(&store, 0)
            .await;

        assert!(outcome.is_changed());
        let record = store.get(0).await.unwrap();
        assert_eq!(record.last_size, 5);
        assert_eq!(record.last_hash, fingerprint(b"hello", HashAlgorithm::Sha1).hash);
        assert_eq!(notifier.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_matching_fingerprint_is_unchanged() {
        let notifier = Arc::new(Recording::default());
        let site = SiteRecord::new("Docs", "https://example.com")
            .with_last_fingerprint(&fingerprint(b"hello", HashAlgorithm::Sha1));
        let store = RecordStore::new(vec![site.clone()]);

        let outcome = checker(Ok(b"hello"), Arc::clone(&notifier))
            .check(&store, 0)
            .await;

        assert!(outcome.is_unchanged());
        assert_eq!(store.get(0).await.unwrap(), site);
        assert!(notifier.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_record() {
        let notifier = Arc::new(Recording::default());
        let site = SiteRecord::new("Docs", "https://example.com");
        let store = RecordStore::new(vec![site.clone()]);

        let outcome = checker(Err("connection refused"), Arc::clone(&notifier))
            .check(&store, 0)
            .await;

        assert!(matches!(
            outcome,
            CheckOutcome::Failed {
                phase: CheckPhase::Fetching,
                ..
            }
        ));
        assert_eq!(store.get(0).await.unwrap(), site);
        let events = notifier.0.lock().unwrap();
        assert!(matches!(events[0], WatchEvent::CheckError { .. }));
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = CheckOutcome::Failed {
            pos: 3,
            description: "Docs".to_string(),
            phase: CheckPhase::Fetching,
            message: "refused".to_string(),
        };
        assert_eq!(outcome.pos(), 3);
        assert_eq!(outcome.description(), "Docs");
        assert!(outcome.is_failed());
        assert!(!outcome.is_changed());
    }
}
