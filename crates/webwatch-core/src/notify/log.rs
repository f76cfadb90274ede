//! Notifier that writes events to the log

use async_trait::async_trait;
use tracing::{info, warn};

use crate::Error;
use crate::traits::{Notifier, WatchEvent};

/// Writes every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &WatchEvent) -> Result<(), Error> {
        match event {
            WatchEvent::ChangeDetected { .. } => info!("{}", event),
            WatchEvent::CheckError { .. } => warn!("{}", event),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
