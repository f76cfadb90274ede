// # Notifiers
//
// Built-in implementations of the Notifier trait.
//
// The desktop alert and "open in browser" actions are not built in. They
// are reproduced with `CommandNotifier` and a platform command, for example
// `xdg-open {url}`, `open {url}` or `notify-send webwatch {description}`.

pub mod command;
pub mod log;

pub use command::{CommandNotifier, CommandTemplate};
pub use log::LogNotifier;

use async_trait::async_trait;

use crate::Error;
use crate::traits::{Notifier, WatchEvent};

/// Forwards each event to several notifiers
///
/// Every notifier is attempted even when an earlier one fails; the first
/// failure is returned after all of them ran.
#[derive(Default)]
pub struct NotifierChain {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notifier
    pub fn with(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Number of notifiers in the chain
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for NotifierChain {
    async fn notify(&self, event: &WatchEvent) -> Result<(), Error> {
        let mut first_error = None;
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(event).await {
                tracing::debug!("Notifier {} failed: {}", notifier.name(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
