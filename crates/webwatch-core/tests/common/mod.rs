//! Test doubles and common utilities for cycle contract tests
//!
//! These doubles replace the network and the user-facing notifier so the
//! contract tests can drive every outcome deterministically.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use webwatch_core::config::{CheckConfig, SiteRecord};
use webwatch_core::error::{Error, Result};
use webwatch_core::traits::{FetchRequest, Fetcher, Notifier, WatchEvent};

/// Canned response for one URL
#[derive(Debug, Clone)]
pub enum Reply {
    /// Return this body
    Body(Vec<u8>),
    /// Fail with a transport error
    Fail(String),
    /// Wait, then return this body
    Slow(Duration, Vec<u8>),
}

/// A Fetcher that answers from a URL → reply table
pub struct ScriptedFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    requests: Arc<Mutex<Vec<FetchRequest>>>,
    fetch_count: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Builder form of [`ScriptedFetcher::set`]
    pub fn with(self, url: &str, reply: Reply) -> Self {
        self.set(url, reply);
        self
    }

    /// Set (or replace) the reply for `url`
    pub fn set(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    /// Number of fetches performed
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<u8>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let reply = self.replies.lock().unwrap().get(&request.url).cloned();
        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Fail(message)) => Err(Error::fetch(message)),
            Some(Reply::Slow(delay, body)) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            None => Err(Error::fetch(format!("no route to {}", request.url))),
        }
    }
}

/// A Notifier that records every event
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<WatchEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WatchEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn changes(&self) -> Vec<WatchEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, WatchEvent::ChangeDetected { .. }))
            .collect()
    }

    pub fn errors(&self) -> Vec<WatchEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, WatchEvent::CheckError { .. }))
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &WatchEvent) -> Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// A Notifier that always fails, counting attempts
#[derive(Clone, Default)]
pub struct FailingNotifier {
    attempts: Arc<AtomicUsize>,
}

impl FailingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _event: &WatchEvent) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::notifier("display unavailable"))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// A site at `http://site-<i>.test/`
pub fn site(i: usize) -> SiteRecord {
    SiteRecord::new(format!("Site {}", i), url(i))
}

/// URL of [`site`] `i`
pub fn url(i: usize) -> String {
    format!("http://site-{}.test/", i)
}

/// Helper to create a CheckConfig for testing
pub fn test_config() -> CheckConfig {
    CheckConfig::default()
}
