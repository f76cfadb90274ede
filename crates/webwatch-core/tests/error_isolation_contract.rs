//! Contract Test: Error Isolation
//!
//! Constraints verified:
//! - A transport failure leaves the record bit-for-bit identical
//! - A transport failure emits CheckError instead of ChangeDetected
//! - One site's failure does not affect other sites in the same cycle
//! - A failing notifier neither blocks the record update nor the cycle
//! - A per-check timeout is reported like any other transport failure

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use webwatch_core::fingerprint::Fingerprint;
use webwatch_core::state::{MemorySiteStore, RecordStore};
use webwatch_core::traits::{SiteStore, WatchEvent};
use webwatch_core::{CheckConfig, CheckOutcome, CheckPhase, Error, SiteChecker, WatchEngine};

#[tokio::test]
async fn transport_error_leaves_record_untouched() {
    let original = site(0).with_last_fingerprint(&Fingerprint::new(10, "abc"));
    let store = RecordStore::new(vec![original.clone()]);

    let fetcher = Arc::new(
        ScriptedFetcher::new().with(&url(0), Reply::Fail("connection refused".to_string())),
    );
    let notifier = RecordingNotifier::new();
    let checker = SiteChecker::new(fetcher, Arc::new(notifier.clone()), &test_config());

    let outcome = checker.check(&store, 0).await;

    assert!(matches!(
        outcome,
        CheckOutcome::Failed {
            phase: CheckPhase::Fetching,
            ..
        }
    ));
    assert_eq!(store.get(0).await.unwrap(), original);

    let events = notifier.events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        WatchEvent::CheckError {
            description,
            message,
        } => {
            assert_eq!(description, &original.description);
            assert!(message.contains("connection refused"), "{}", message);
        }
        other => panic!("expected CheckError, got {:?}", other),
    }
}

#[tokio::test]
async fn failing_site_does_not_affect_others() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with(&url(0), Reply::Body(b"zero".to_vec()))
            .with(&url(1), Reply::Fail("dns failure".to_string()))
            .with(&url(2), Reply::Body(b"two".to_vec())),
    );
    let notifier = RecordingNotifier::new();
    let engine = WatchEngine::new(fetcher, Arc::new(notifier.clone()), test_config()).unwrap();

    let original = vec![site(0), site(1), site(2)];
    let site_store = MemorySiteStore::new(original.clone());

    let report = engine.run_once(&site_store).await.unwrap();

    assert_eq!(report.changed(), 2);
    assert_eq!(report.failed(), 1);
    assert!(report.outcomes[1].is_failed());

    let saved = site_store.load().await.unwrap();
    assert_eq!(saved[1], original[1]);
    assert_eq!(saved[0].last_size, 4);
    assert_eq!(saved[2].last_size, 3);
    assert_eq!(site_store.save_count(), 1);

    assert_eq!(notifier.changes().len(), 2);
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn failing_notifier_does_not_block_update() {
    let fetcher = Arc::new(ScriptedFetcher::new().with(&url(0), Reply::Body(b"new".to_vec())));
    let notifier = FailingNotifier::new();
    let engine = WatchEngine::new(fetcher, Arc::new(notifier.clone()), test_config()).unwrap();

    let store = Arc::new(RecordStore::new(vec![site(0), site(1)]));
    let report = engine.run_cycle(Arc::clone(&store)).await.unwrap();

    // site 0 changed, site 1 has no route and failed
    assert_eq!(report.changed(), 1);
    assert_eq!(report.failed(), 1);
    assert_eq!(store.get(0).await.unwrap().last_size, 3);
    assert_eq!(notifier.attempts(), 2);
}

#[tokio::test]
async fn check_timeout_is_a_transport_error() {
    let fetcher = Arc::new(ScriptedFetcher::new().with(
        &url(0),
        Reply::Slow(Duration::from_secs(30), b"late".to_vec()),
    ));
    let notifier = RecordingNotifier::new();
    let config = CheckConfig {
        check_timeout_secs: Some(1),
        ..CheckConfig::default()
    };
    let checker = SiteChecker::new(fetcher, Arc::new(notifier.clone()), &config);

    let original = site(0);
    let store = RecordStore::new(vec![original.clone()]);

    let outcome = tokio::time::timeout(Duration::from_secs(10), checker.check(&store, 0))
        .await
        .expect("per-check timeout should fire first");

    match outcome {
        CheckOutcome::Failed { message, .. } => {
            assert!(message.starts_with("Timed out"), "{}", message)
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(store.get(0).await.unwrap(), original);
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn load_failure_is_fatal() {
    struct BrokenStore;

    #[async_trait::async_trait]
    impl SiteStore for BrokenStore {
        async fn load(&self) -> webwatch_core::Result<Vec<webwatch_core::SiteRecord>> {
            Err(Error::store("disk on fire"))
        }

        async fn save(&self, _records: &[webwatch_core::SiteRecord]) -> webwatch_core::Result<()> {
            panic!("save must not run after a failed load");
        }
    }

    let fetcher = Arc::new(ScriptedFetcher::new());
    let engine = WatchEngine::new(
        Arc::clone(&fetcher) as Arc<dyn webwatch_core::Fetcher>,
        Arc::new(RecordingNotifier::new()),
        test_config(),
    )
    .unwrap();

    let result = engine.run_once(&BrokenStore).await;
    assert!(matches!(result, Err(Error::Store(_))));
    assert_eq!(fetcher.fetch_count(), 0, "no check may run without a loaded list");
}
