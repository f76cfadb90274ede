//! Check cycle engine
//!
//! The WatchEngine is responsible for:
//! - Fanning out one site check per record, all running concurrently
//! - Waiting until every check has finished (or was cancelled)
//! - Handing the final site list back for persistence
//!
//! ## Architecture
//!
//! ```text
//!   SiteStore::load()
//!          │
//!          ▼
//!   ┌──────────────┐     one task per index      ┌──────────────┐
//!   │ RecordStore  │◄────────────────────────────│ SiteChecker  │──► Fetcher
//!   │ (one mutex)  │   snapshot / replace_at     │   (shared)   │──► Notifier
//!   └──────────────┘                             └──────────────┘
//!          │
//!          ▼  after every task is terminal
//!   SiteStore::save()
//! ```
//!
//! ## Completion
//!
//! `run_cycle` returns only after every spawned check reached a terminal
//! state. With a cycle deadline, checks still running when it expires are
//! aborted and then awaited, so no task outlives the cycle and no write can
//! land after the final snapshot is taken.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{Id, JoinSet};
use tracing::{debug, error, info, warn};

use crate::checker::{CheckOutcome, CheckPhase, SiteChecker};
use crate::config::{CheckConfig, SiteRecord};
use crate::error::Result;
use crate::state::RecordStore;
use crate::traits::{Fetcher, Notifier, SiteStore, WatchEvent};

/// Result of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Final snapshot of the site list, ready to be saved
    pub records: Vec<SiteRecord>,

    /// One outcome per site, in site order
    pub outcomes: Vec<CheckOutcome>,
}

impl CycleReport {
    /// Number of sites whose content changed
    pub fn changed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_changed()).count()
    }

    /// Number of sites with unchanged content
    pub fn unchanged(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_unchanged()).count()
    }

    /// Number of sites that could not be checked
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }
}

/// Runs check cycles
///
/// ## Lifecycle
///
/// 1. Create with [`WatchEngine::new()`]
/// 2. Run one cycle with [`WatchEngine::run_once()`] (load, check, save)
///    or [`WatchEngine::run_cycle()`] on a store you manage yourself
/// 3. Drop
pub struct WatchEngine {
    checker: Arc<SiteChecker>,
    config: CheckConfig,
}

impl WatchEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `fetcher`: Fetcher implementation shared by every check
    /// - `notifier`: Notifier implementation shared by every check
    /// - `config`: Cycle settings
    ///
    /// # Returns
    ///
    /// - `Ok(WatchEngine)`
    /// - `Err(Error::Config)`: `config` failed validation
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        config: CheckConfig,
    ) -> Result<Self> {
        config.validate()?;

        let checker = Arc::new(SiteChecker::new(fetcher, notifier, &config));
        Ok(Self { checker, config })
    }

    /// Load, check every site, save
    ///
    /// Load and save failures are returned as-is; they are fatal to the run.
    /// Per-site failures never are.
    pub async fn run_once(&self, site_store: &dyn SiteStore) -> Result<CycleReport> {
        let records = site_store.load().await?;
        info!("Loaded {} site(s)", records.len());

        let store = Arc::new(RecordStore::new(records));
        let report = self.run_cycle(store).await?;

        site_store.save(&report.records).await?;
        info!("Site list saved");

        Ok(report)
    }

    /// Check every site in `store` concurrently
    ///
    /// # Returns
    ///
    /// The final snapshot of `store` and one outcome per site.
    pub async fn run_cycle(&self, store: Arc<RecordStore>) -> Result<CycleReport> {
        let sites = store.snapshot().await;
        let started = Instant::now();
        info!("Checking {} site(s)", sites.len());

        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(sites.len());
        for pos in 0..sites.len() {
            let checker = Arc::clone(&self.checker);
            let store = Arc::clone(&store);
            let handle = tasks.spawn(async move { checker.check(&store, pos).await });
            positions.insert(handle.id(), pos);
        }

        let mut slots = vec![Slot::Pending; sites.len()];

        match self.config.cycle_deadline() {
            Some(deadline) => {
                let finished = tokio::time::timeout(
                    deadline,
                    collect(&mut tasks, &positions, &mut slots),
                )
                .await;
                if finished.is_err() {
                    warn!(
                        "Cycle deadline of {:?} exceeded, cancelling {} unfinished check(s)",
                        deadline,
                        tasks.len()
                    );
                    tasks.abort_all();
                    collect(&mut tasks, &positions, &mut slots).await;
                }
            }
            None => collect(&mut tasks, &positions, &mut slots).await,
        }

        let mut results = Vec::with_capacity(sites.len());
        for (pos, slot) in slots.into_iter().enumerate() {
            let message = match slot {
                Slot::Done(outcome) => {
                    results.push(outcome);
                    continue;
                }
                Slot::Panicked => "check panicked".to_string(),
                Slot::Pending | Slot::Cancelled => {
                    "check cancelled at the cycle deadline".to_string()
                }
            };

            let site = &sites[pos];
            warn!(
                "{} | {} -> ? | {} -> ? | {}",
                site.description, site.last_size, site.last_hash, message
            );
            self.checker
                .deliver(WatchEvent::CheckError {
                    description: site.description.clone(),
                    message: message.clone(),
                })
                .await;
            results.push(CheckOutcome::Failed {
                pos,
                description: site.description.clone(),
                phase: CheckPhase::Fetching,
                message,
            });
        }

        let report = CycleReport {
            records: store.snapshot().await,
            outcomes: results,
        };

        info!(
            "Cycle finished in {:?}: {} changed, {} unchanged, {} failed",
            started.elapsed(),
            report.changed(),
            report.unchanged(),
            report.failed()
        );

        Ok(report)
    }
}

/// Where a site's check ended up
#[derive(Debug, Clone)]
enum Slot {
    /// No result yet
    Pending,
    /// Check finished with an outcome
    Done(CheckOutcome),
    /// Task aborted at the deadline
    Cancelled,
    /// Task panicked
    Panicked,
}

/// Drain `tasks`, filing each result under its site index
async fn collect(
    tasks: &mut JoinSet<CheckOutcome>,
    positions: &HashMap<Id, usize>,
    slots: &mut [Slot],
) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => {
                let pos = outcome.pos();
                if let Some(slot) = slots.get_mut(pos) {
                    *slot = Slot::Done(outcome);
                }
            }
            Err(e) => {
                let slot = positions.get(&e.id()).and_then(|&pos| slots.get_mut(pos));
                if e.is_cancelled() {
                    debug!("Check cancelled");
                    if let Some(slot) = slot {
                        *slot = Slot::Cancelled;
                    }
                } else {
                    error!("Check task failed: {}", e);
                    if let Some(slot) = slot {
                        *slot = Slot::Panicked;
                    }
                }
            }
        }
    }
}
