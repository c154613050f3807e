//! Append-only, size-bounded audit log for error-class events.
//!
//! Every append rewrites the whole container. That cost is proportional to
//! the current record count, which stays small because only error-class
//! events are logged; this layout is not suitable for high-frequency
//! telemetry.

use crate::clock::{rfc3339_utc, DeviceClock};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Event recorded when the boot counter reaches the failure threshold.
pub const BOOT_LOOP_DETECTED: &str = "BOOT_LOOP_DETECTED";
/// Event recorded when a rollback is about to switch the boot target.
pub const ROLLBACK_TRIGGERED: &str = "ROLLBACK_TRIGGERED";
/// Event recorded after the boot target was switched successfully.
pub const ROLLBACK_SUCCESS: &str = "ROLLBACK_SUCCESS";
/// Event recorded when the partition switch failed.
pub const ROLLBACK_FAILED: &str = "ROLLBACK_FAILED";
/// Event recorded when a pending image is promoted to trusted.
pub const FIRMWARE_COMMITTED: &str = "FIRMWARE_COMMITTED";
/// Event recorded when trust promotion fails.
pub const FIRMWARE_COMMIT_FAIL: &str = "FIRMWARE_COMMIT_FAIL";

const EVENT_LEVEL: &str = "ERROR";
const EMPTY_CONTAINER: &[u8] = b"[]";

/// One persisted diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// RFC 3339 UTC stamp assigned at append time.
    pub ts: String,
    /// Fixed severity; only error-class events are kept.
    pub lvl: String,
    /// Short event name, e.g. `ROLLBACK_FAILED`.
    pub msg: String,
    /// Optional free-form context, e.g. `count=3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctx: Option<String>,
}

/// Size bound and eviction floor for the audit container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum serialized container size in bytes.
    pub max_bytes: usize,
    /// Compaction never keeps fewer records than this.
    pub min_retained: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 50 * 1024,
            min_retained: 5,
        }
    }
}

/// Failures surfaced by audit-log operations. All of them are non-fatal to
/// the boot sequence; callers continue in a degraded mode.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit store unavailable: {0}")]
    Unavailable(String),
    #[error("audit container corrupt; log was reset")]
    Corrupt,
    #[error("audit serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Byte-level container access implemented by audit backends.
pub trait LogStore {
    /// Whether a container has been created.
    fn exists(&self) -> Result<bool, AuditError>;

    /// Reads the whole container.
    fn read(&mut self) -> Result<Vec<u8>, AuditError>;

    /// Replaces the whole container.
    fn write(&mut self, bytes: &[u8]) -> Result<(), AuditError>;
}

/// Volatile container for host runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryLogStore {
    /// Creates a store with no container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with raw container bytes, valid JSON or not.
    pub fn with_raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }
}

impl LogStore for MemoryLogStore {
    fn exists(&self) -> Result<bool, AuditError> {
        Ok(self.bytes.is_some())
    }

    fn read(&mut self) -> Result<Vec<u8>, AuditError> {
        self.bytes
            .clone()
            .ok_or_else(|| AuditError::Unavailable("no container".to_string()))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), AuditError> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }
}

/// File-backed container at a fixed logical path.
#[derive(Debug, Clone)]
pub struct FileLogStore {
    path: PathBuf,
}

impl FileLogStore {
    /// Creates a store rooted at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogStore for FileLogStore {
    fn exists(&self) -> Result<bool, AuditError> {
        Ok(self.path.exists())
    }

    fn read(&mut self) -> Result<Vec<u8>, AuditError> {
        fs::read(&self.path)
            .map_err(|err| AuditError::Unavailable(format!("{}: {err}", self.path.display())))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), AuditError> {
        fs::write(&self.path, bytes)
            .map_err(|err| AuditError::Unavailable(format!("{}: {err}", self.path.display())))
    }
}

/// Narrow recording seam handed to the boot components.
///
/// A lost audit write must never fail the boot path, so the seam reports
/// success as a plain boolean instead of propagating errors.
pub trait AuditSink {
    /// Records one error-class event; returns false when the write was lost.
    fn record(&mut self, msg: &str, ctx: Option<&str>) -> bool;
}

/// Append-only event log over a byte container.
#[derive(Debug, Clone)]
pub struct EventLog<B: LogStore, C: DeviceClock> {
    store: B,
    clock: C,
    policy: RetentionPolicy,
}

impl<B: LogStore, C: DeviceClock> EventLog<B, C> {
    /// Creates a log with the default 50 KB / 5-record retention policy.
    pub fn new(store: B, clock: C) -> Self {
        Self::with_policy(store, clock, RetentionPolicy::default())
    }

    /// Creates a log with an explicit retention policy.
    pub fn with_policy(store: B, clock: C, policy: RetentionPolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Active retention policy.
    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Ensures the container exists, compacting proactively when a
    /// pre-existing container already exceeds the size bound.
    pub fn init(&mut self) -> Result<(), AuditError> {
        if !self.store.exists()? {
            return self.store.write(EMPTY_CONTAINER);
        }
        if self.store.read()?.len() > self.policy.max_bytes {
            self.compact()?;
        }
        Ok(())
    }

    /// Appends one record stamped with the current time, then compacts if
    /// the rewrite pushed the container over the size bound.
    ///
    /// A container that fails to parse is reset to empty and the call
    /// reports [`AuditError::Corrupt`]; both the old content and the new
    /// record are lost.
    pub fn append(&mut self, message: &str, context: Option<&str>) -> Result<(), AuditError> {
        let mut records = self.load_records()?;
        records.push(EventRecord {
            ts: rfc3339_utc(self.clock.now_ms()),
            lvl: EVENT_LEVEL.to_string(),
            msg: message.to_string(),
            ctx: context.map(str::to_string),
        });
        let bytes = serde_json::to_vec(&records)?;
        self.store.write(&bytes)?;
        if bytes.len() > self.policy.max_bytes {
            self.compact()?;
        }
        Ok(())
    }

    /// Evicts the oldest records down to `max(count / 2, min_retained)`.
    ///
    /// When the container is already within the size bound this is a strict
    /// no-op: the stored bytes are left untouched.
    pub fn compact(&mut self) -> Result<(), AuditError> {
        if !self.store.exists()? {
            return Ok(());
        }
        let bytes = self.store.read()?;
        if bytes.len() <= self.policy.max_bytes {
            return Ok(());
        }
        let records: Vec<EventRecord> = match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(err) => {
                log::warn!("audit container corrupt ({err}); resetting");
                self.store.write(EMPTY_CONTAINER)?;
                return Err(AuditError::Corrupt);
            }
        };
        let target = (records.len() / 2)
            .max(self.policy.min_retained)
            .min(records.len());
        let kept = &records[records.len() - target..];
        let rewritten = serde_json::to_vec(&kept)?;
        self.store.write(&rewritten)?;
        log::info!(
            "audit log compacted: {} -> {} records",
            records.len(),
            kept.len()
        );
        Ok(())
    }

    /// Full serialized container. Bounded by the size cap, so it is safe to
    /// hold entirely in memory for upload.
    pub fn read_all(&mut self) -> Result<String, AuditError> {
        if !self.store.exists()? {
            return Ok("[]".to_string());
        }
        let bytes = self.store.read()?;
        if bytes.is_empty() {
            return Ok("[]".to_string());
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Replaces the container with an empty collection. Destructive and
    /// irreversible; intended for use after a confirmed upload.
    pub fn clear(&mut self) -> Result<(), AuditError> {
        self.store.write(EMPTY_CONTAINER)
    }

    /// Record cardinality; 0 on any read or parse failure.
    pub fn count(&mut self) -> usize {
        if !matches!(self.store.exists(), Ok(true)) {
            return 0;
        }
        let bytes = match self.store.read() {
            Ok(bytes) => bytes,
            Err(_) => return 0,
        };
        if bytes.is_empty() {
            return 0;
        }
        serde_json::from_slice::<Vec<EventRecord>>(&bytes)
            .map(|records| records.len())
            .unwrap_or(0)
    }

    fn load_records(&mut self) -> Result<Vec<EventRecord>, AuditError> {
        if !self.store.exists()? {
            return Ok(Vec::new());
        }
        let bytes = self.store.read()?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(records),
            Err(err) => {
                log::warn!("audit container corrupt ({err}); resetting");
                self.store.write(EMPTY_CONTAINER)?;
                Err(AuditError::Corrupt)
            }
        }
    }
}

impl<B: LogStore, C: DeviceClock> AuditSink for EventLog<B, C> {
    fn record(&mut self, msg: &str, ctx: Option<&str>) -> bool {
        match self.append(msg, ctx) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("audit append failed: {err}");
                false
            }
        }
    }
}
