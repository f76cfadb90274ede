// # webwatch - Web Page Change Watcher
//
// Thin integration layer around webwatch-core. All checking, comparison and
// persistence logic lives in the library; this binary only:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Wires the HTTP fetcher, notifiers and file store together
// 4. Runs exactly one check cycle and exits
//
// ## Configuration
//
// - `WEBWATCH_CONFIG_PATH`: Site list file (default `~/.simplewebwatcher/config`)
// - `WEBWATCH_LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `WEBWATCH_CHECK_TIMEOUT_SECS`: Per-site fetch timeout (1-3600)
// - `WEBWATCH_CYCLE_DEADLINE_SECS`: Whole-cycle deadline (1-3600)
// - `WEBWATCH_HASH_ALGORITHM`: sha1 (default) or sha256
// - `WEBWATCH_ON_CHANGE`: Command run per changed site, e.g. `xdg-open {url}`
// - `WEBWATCH_ON_ERROR`: Command run per failed site, e.g.
//   `notify-send {description} {message}`
//
// ## First Run
//
// When the site list does not exist yet, a placeholder list is written and
// the process exits without checking anything. Edit the file and run again.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

use webwatch_core::traits::{Notifier, SiteStore};
use webwatch_core::{
    CheckConfig, CommandNotifier, CommandTemplate, FileSiteStore, HashAlgorithm, LogNotifier,
    NotifierChain, WatchEngine, default_sites,
};
use webwatch_http::HttpFetcher;

/// Exit codes for different termination scenarios
///
/// - 0: Cycle completed (per-site failures included) or first run
/// - 1: Configuration or startup error
/// - 2: Runtime error (site list could not be loaded or saved)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchExitCode {
    /// Normal exit
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<WatchExitCode> for ExitCode {
    fn from(code: WatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    config_path: PathBuf,
    log_level: String,
    check_timeout_secs: Option<u64>,
    cycle_deadline_secs: Option<u64>,
    hash_algorithm: HashAlgorithm,
    on_change: Option<String>,
    on_error: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key → value source
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let config_path = match var("WEBWATCH_CONFIG_PATH").filter(|p| !p.is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_config_path(&var)?,
        };

        let hash_algorithm = match var("WEBWATCH_HASH_ALGORITHM") {
            Some(name) => name
                .parse::<HashAlgorithm>()
                .context("WEBWATCH_HASH_ALGORITHM is not valid (expected sha1 or sha256)")?,
            None => HashAlgorithm::default(),
        };

        Ok(Self {
            config_path,
            log_level: var("WEBWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            check_timeout_secs: parse_secs(&var, "WEBWATCH_CHECK_TIMEOUT_SECS")?,
            cycle_deadline_secs: parse_secs(&var, "WEBWATCH_CYCLE_DEADLINE_SECS")?,
            hash_algorithm,
            on_change: var("WEBWATCH_ON_CHANGE").filter(|s| !s.trim().is_empty()),
            on_error: var("WEBWATCH_ON_ERROR").filter(|s| !s.trim().is_empty()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if let Some(secs) = self.check_timeout_secs
            && !(1..=3600).contains(&secs)
        {
            anyhow::bail!(
                "WEBWATCH_CHECK_TIMEOUT_SECS must be between 1 and 3600 seconds. Got: {}",
                secs
            );
        }

        if let Some(secs) = self.cycle_deadline_secs
            && !(1..=3600).contains(&secs)
        {
            anyhow::bail!(
                "WEBWATCH_CYCLE_DEADLINE_SECS must be between 1 and 3600 seconds. Got: {}",
                secs
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "WEBWATCH_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.notifier()?;
        self.check_config().validate()?;

        Ok(())
    }

    fn check_config(&self) -> CheckConfig {
        CheckConfig {
            check_timeout_secs: self.check_timeout_secs,
            cycle_deadline_secs: self.cycle_deadline_secs,
            hash_algorithm: self.hash_algorithm,
        }
    }

    /// Log notifier, followed by the command notifier when one is configured
    fn notifier(&self) -> Result<NotifierChain> {
        let mut chain = NotifierChain::new().with(Box::new(LogNotifier));

        if self.on_change.is_none() && self.on_error.is_none() {
            return Ok(chain);
        }

        let mut command = CommandNotifier::new();
        if let Some(template) = &self.on_change {
            command = command
                .on_change(CommandTemplate::parse(template).context("WEBWATCH_ON_CHANGE")?);
        }
        if let Some(template) = &self.on_error {
            command =
                command.on_error(CommandTemplate::parse(template).context("WEBWATCH_ON_ERROR")?);
        }
        chain = chain.with(Box::new(command));

        Ok(chain)
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Parse an optional whole number of seconds
fn parse_secs(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match var(key) {
        Some(value) => {
            let secs = value.trim().parse::<u64>().with_context(|| {
                format!("{} must be a whole number of seconds. Got: {}", key, value)
            })?;
            Ok(Some(secs))
        }
        None => Ok(None),
    }
}

/// `<home>/.simplewebwatcher/config`
fn default_config_path(var: &impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    let home = if cfg!(windows) {
        match (var("HOMEDRIVE"), var("HOMEPATH")) {
            (Some(drive), Some(path)) if !drive.is_empty() && !path.is_empty() => {
                Some(format!("{}{}", drive, path))
            }
            _ => var("USERPROFILE"),
        }
    } else {
        var("HOME")
    };

    let home = home.filter(|h| !h.is_empty()).context(
        "Cannot determine the home directory. Set WEBWATCH_CONFIG_PATH to the site list file",
    )?;

    Ok(PathBuf::from(home).join(".simplewebwatcher").join("config"))
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return WatchExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return WatchExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WatchExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WatchExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Run one check cycle (or the first-run setup)
async fn run(config: Config) -> WatchExitCode {
    let store = FileSiteStore::new(&config.config_path);

    if !store.exists() {
        return match first_run(&store).await {
            Ok(()) => WatchExitCode::CleanShutdown,
            Err(e) => {
                error!("{:#}", e);
                WatchExitCode::RuntimeError
            }
        };
    }

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return WatchExitCode::ConfigError;
        }
    };

    info!("Checking sites from {}", store.path().display());
    match engine.run_once(&store).await {
        Ok(report) => {
            info!(
                "{} changed, {} unchanged, {} failed",
                report.changed(),
                report.unchanged(),
                report.failed()
            );
            WatchExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Check cycle aborted: {}", e);
            WatchExitCode::RuntimeError
        }
    }
}

/// Write the placeholder site list
async fn first_run(store: &FileSiteStore) -> Result<()> {
    store
        .save(&default_sites())
        .await
        .with_context(|| format!("Failed to create {}", store.path().display()))?;

    info!(
        "Created {} with example sites; edit it and run webwatch again",
        store.path().display()
    );
    Ok(())
}

fn build_engine(config: &Config) -> Result<WatchEngine> {
    let fetcher = match config.check_timeout_secs {
        Some(secs) => HttpFetcher::with_timeout(Duration::from_secs(secs))?,
        None => HttpFetcher::new(),
    };
    let notifier: Arc<dyn Notifier> = Arc::new(config.notifier()?);

    Ok(WatchEngine::new(
        Arc::new(fetcher),
        notifier,
        config.check_config(),
    )?)
}
