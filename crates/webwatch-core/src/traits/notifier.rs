// # Notifier Trait
//
// Defines how the check cycle tells the user about changes and errors.
//
// ## Implementations
//
// - `LogNotifier`: writes events to the log
// - `CommandNotifier`: runs an external program (desktop alert, browser)
// - `NotifierChain`: fans an event out to several notifiers
//
// ## Failure Policy
//
// A notifier failure is logged by the caller and otherwise ignored. It never
// stops the record update or the checks of other sites.

use async_trait::async_trait;
use std::fmt;

/// Events delivered to a notifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A site's content changed since the last recorded change
    ChangeDetected {
        description: String,
        url: String,
    },

    /// A site could not be checked this cycle
    CheckError {
        description: String,
        message: String,
    },
}

impl WatchEvent {
    /// Description of the site the event is about
    pub fn description(&self) -> &str {
        match self {
            WatchEvent::ChangeDetected { description, .. } => description,
            WatchEvent::CheckError { description, .. } => description,
        }
    }
}

impl fmt::Display for WatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchEvent::ChangeDetected { description, url } => {
                write!(f, "Change detected for {} ({})", description, url)
            }
            WatchEvent::CheckError {
                description,
                message,
            } => write!(f, "Check failed for {}: {}", description, message),
        }
    }
}

/// Trait for notifier implementations
///
/// # Thread Safety
///
/// Called concurrently from every site check in a cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an event
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Event delivered
    /// - `Err(Error)`: Delivery failed (logged by the caller, not fatal)
    async fn notify(&self, event: &WatchEvent) -> Result<(), crate::Error>;

    /// Short name used in log messages
    fn name(&self) -> &'static str;
}
