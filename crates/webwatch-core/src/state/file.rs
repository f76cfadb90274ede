// # File Site Store
//
// File-based implementation of SiteStore with crash recovery.
//
// ## File Formats
//
// Chosen from the path extension. `.json` files hold JSON, everything else
// (including the extension-less `config` file of earlier versions) holds TOML:
//
// ```toml
// [[Site]]
// Description = "Docs"
// URL = "https://example.com/docs"
// Username = ""
// Password = ""
// LastCheck = "2025-01-09T12:00:00Z"
// LastBytes = 5120
// LastHash = "a9993e364706816aba3e25717850c26c9cd0d89d"
// ```
//
// TOML-native datetimes (`LastCheck = 2017-05-04T10:00:00+02:00`, as written
// by earlier versions) are accepted on load and rewritten as strings.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Automatic backup: Keeps .backup of the previous file
// - Recovery: Falls back to backup if the file does not parse
// - No silent reset: if the backup does not parse either, loading fails.
//   Continuing with an empty list would erase every site on the next save.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::config::SiteRecord;
use crate::traits::SiteStore;

/// On-disk encoding of the site list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Array of `[[Site]]` tables
    Toml,
    /// `{ "Site": [ ... ] }`
    Json,
}

impl FileFormat {
    /// Pick the format for `path` from its extension
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        }
    }
}

/// Serializable site list file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SiteListFile {
    #[serde(rename = "Site", default)]
    sites: Vec<SiteRecord>,
}

/// File-based site store
///
/// # Example
///
/// ```rust,no_run
/// use webwatch_core::state::FileSiteStore;
/// use webwatch_core::traits::SiteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileSiteStore::new("/home/me/.simplewebwatcher/config");
///
///     let sites = store.load().await?;
///     store.save(&sites).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileSiteStore {
    path: PathBuf,
    format: FileFormat,
}

impl FileSiteStore {
    /// Create a store for `path`, with the format taken from its extension
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = FileFormat::for_path(&path);
        Self { path, format }
    }

    /// Path of the site list file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encoding used for the file
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Whether the site list file exists yet
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the site list with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load the main file
    /// 2. If it does not parse, try the backup and restore the main file from it
    /// 3. If the backup is missing or also broken, fail
    async fn load_with_recovery(&self) -> Result<Vec<SiteRecord>, Error> {
        let err = match self.load_file(&self.path).await {
            Ok(records) => {
                tracing::debug!(
                    "Loaded {} site(s) from {}",
                    records.len(),
                    self.path.display()
                );
                return Ok(records);
            }
            Err(e) if is_corruption(&e) => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "Site list {} appears corrupted: {}. Attempting recovery from backup.",
            self.path.display(),
            err
        );

        let backup_path = Self::backup_path(&self.path);
        if !backup_path.exists() {
            return Err(Error::store(format!(
                "Failed to parse {} and no backup exists: {}",
                self.path.display(),
                err
            )));
        }

        let records = self.load_file(&backup_path).await.map_err(|backup_err| {
            Error::store(format!(
                "Failed to parse {} ({}) and its backup ({})",
                self.path.display(),
                err,
                backup_err
            ))
        })?;

        tracing::info!("Recovered {} site(s) from backup", records.len());

        if let Err(restore_err) = Self::restore_from_backup(&self.path, &backup_path).await {
            tracing::error!("Failed to restore site list from backup: {}", restore_err);
        }

        Ok(records)
    }

    /// Read and decode one file
    async fn load_file(&self, path: &Path) -> Result<Vec<SiteRecord>, Error> {
        if !path.exists() {
            return Err(Error::not_found(format!(
                "Site list {} does not exist",
                path.display()
            )));
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!("Failed to read {}: {}", path.display(), e))
        })?;

        decode(&content, self.format)
    }

    /// Write the site list atomically
    async fn write_records(&self, records: &[SiteRecord]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = encode(records, self.format)?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(content.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(
            "Wrote {} site(s) to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Restore the site list file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored site list from backup");
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        with_suffix(&self.path, ".tmp")
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        with_suffix(path, ".backup")
    }
}

#[async_trait]
impl SiteStore for FileSiteStore {
    async fn load(&self) -> Result<Vec<SiteRecord>, Error> {
        self.load_with_recovery().await
    }

    async fn save(&self, records: &[SiteRecord]) -> Result<(), Error> {
        self.write_records(records).await
    }
}

/// `path` with `suffix` appended to its file name (`config` → `config.backup`)
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn is_corruption(err: &Error) -> bool {
    matches!(err, Error::TomlParse(_) | Error::Json(_))
}

fn decode(content: &str, format: FileFormat) -> Result<Vec<SiteRecord>, Error> {
    let file: SiteListFile = match format {
        FileFormat::Json => serde_json::from_str(content)?,
        FileFormat::Toml => {
            let mut table: toml::Table = content.parse()?;
            stringify_datetimes(&mut table);
            toml::Value::Table(table).try_into()?
        }
    };
    Ok(file.sites)
}

fn encode(records: &[SiteRecord], format: FileFormat) -> Result<String, Error> {
    let file = SiteListFile {
        sites: records.to_vec(),
    };
    match format {
        FileFormat::Json => Ok(serde_json::to_string_pretty(&file)?),
        FileFormat::Toml => Ok(toml::to_string_pretty(&file)?),
    }
}

/// Turn TOML datetime values of `LastCheck` into RFC 3339 strings
fn stringify_datetimes(table: &mut toml::Table) {
    let Some(toml::Value::Array(sites)) = table.get_mut("Site") else {
        return;
    };

    for site in sites.iter_mut() {
        let toml::Value::Table(site) = site else {
            continue;
        };
        if let Some(value) = site.get_mut("LastCheck") {
            let text = match value {
                toml::Value::Datetime(dt) => Some(as_utc_datetime(*dt).to_string()),
                _ => None,
            };
            if let Some(text) = text {
                *value = toml::Value::String(text);
            }
        }
    }
}

/// Complete a local date or datetime to a UTC offset datetime
///
/// Local datetimes are read as UTC and a bare date as midnight UTC. A bare
/// time is left alone and fails to parse as a timestamp.
fn as_utc_datetime(mut dt: toml::value::Datetime) -> toml::value::Datetime {
    if dt.date.is_none() {
        return dt;
    }
    if dt.time.is_none() {
        dt.time = Some(toml::value::Time {
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
        });
    }
    if dt.offset.is_none() {
        dt.offset = Some(toml::value::Offset::Z);
    }
    dt
}
