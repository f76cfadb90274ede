// # Command Notifier
//
// Runs an external program for each event.
//
// ## Templates
//
// A template is split on whitespace into a program and its arguments. In
// each piece the placeholders `{description}`, `{url}` and `{message}` are
// replaced with the event's values. No shell is involved, so values with
// spaces or quotes stay a single argument.
//
// ```text
// xdg-open {url}
// notify-send webwatch {description}
// ```

use async_trait::async_trait;
use tokio::process::Command;

use crate::Error;
use crate::traits::{Notifier, WatchEvent};

/// Program and argument template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Parse a whitespace-separated template
    pub fn parse(template: &str) -> Result<Self, Error> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::config("Notifier command template cannot be empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Program and arguments with placeholders filled in from `event`
    pub fn render(&self, event: &WatchEvent) -> (String, Vec<String>) {
        let (url, message) = match event {
            WatchEvent::ChangeDetected { url, .. } => (url.as_str(), ""),
            WatchEvent::CheckError { message, .. } => ("", message.as_str()),
        };
        let fill = |part: &str| {
            part.replace("{description}", event.description())
                .replace("{url}", url)
                .replace("{message}", message)
        };
        (fill(&self.program), self.args.iter().map(|a| fill(a)).collect())
    }
}

/// Runs a command per event kind
///
/// Event kinds without a template are ignored.
#[derive(Debug, Clone, Default)]
pub struct CommandNotifier {
    on_change: Option<CommandTemplate>,
    on_error: Option<CommandTemplate>,
}

impl CommandNotifier {
    /// Create a notifier with no commands
    pub fn new() -> Self {
        Self::default()
    }

    /// Command run for `ChangeDetected`
    pub fn on_change(mut self, template: CommandTemplate) -> Self {
        self.on_change = Some(template);
        self
    }

    /// Command run for `CheckError`
    pub fn on_error(mut self, template: CommandTemplate) -> Self {
        self.on_error = Some(template);
        self
    }

    fn template_for(&self, event: &WatchEvent) -> Option<&CommandTemplate> {
        match event {
            WatchEvent::ChangeDetected { .. } => self.on_change.as_ref(),
            WatchEvent::CheckError { .. } => self.on_error.as_ref(),
        }
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, event: &WatchEvent) -> Result<(), Error> {
        let Some(template) = self.template_for(event) else {
            return Ok(());
        };

        let (program, args) = template.render(event);
        tracing::debug!("Running notifier command: {} {:?}", program, args);

        let status = Command::new(&program)
            .args(&args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| Error::notifier(format!("Failed to run {}: {}", program, e)))?;

        if !status.success() {
            return Err(Error::notifier(format!("{} exited with {}", program, status)));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
