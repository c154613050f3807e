//! Durable boot-record storage.
//!
//! The counter and validation markers are written as a single versioned blob
//! with a SHA-256 checksum, so a partial write is detectable on the next boot
//! instead of silently yielding a half-updated record.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current envelope version for the persisted boot record.
pub const BOOT_RECORD_VERSION: u32 = 1;

/// Durable counters tracked across reboots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootRecord {
    /// Consecutive boots without a rollback or commit.
    pub boot_count: u32,
    /// Last reported validation checkpoint; -1 while the sequencer is
    /// disabled.
    #[serde(rename = "val_stage")]
    pub validation_stage: i32,
    /// Wall-clock milliseconds at which validation tracking started.
    #[serde(rename = "val_start")]
    pub validation_start_ms: u64,
}

impl Default for BootRecord {
    fn default() -> Self {
        Self {
            boot_count: 0,
            validation_stage: -1,
            validation_start_ms: 0,
        }
    }
}

impl BootRecord {
    /// True while the validation sequencer is tracking checkpoints.
    pub fn validation_active(&self) -> bool {
        self.validation_stage >= 0
    }
}

/// Failures surfaced by counter-store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
    #[error("boot record corrupt: {0}")]
    Corrupt(String),
    #[error("boot record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Contract implemented by durable key/value backends.
///
/// Persistence is treated as synchronous and durable upon return; the store
/// is not designed for concurrent access.
pub trait CounterStore {
    /// Loads the record, or `None` when nothing has been written yet.
    fn load(&mut self) -> Result<Option<BootRecord>, StoreError>;

    /// Rewrites the whole record.
    fn save(&mut self, record: &BootRecord) -> Result<(), StoreError>;
}

/// Loads the record, substituting defaults when it is absent or fails its
/// checksum. Corruption is recoverable here: the guard restarts the count
/// rather than refusing to boot.
pub fn load_or_default<S: CounterStore + ?Sized>(store: &mut S) -> Result<BootRecord, StoreError> {
    match store.load() {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Ok(BootRecord::default()),
        Err(StoreError::Corrupt(reason)) => {
            log::warn!("boot record corrupt ({reason}); starting from defaults");
            Ok(BootRecord::default())
        }
        Err(err) => Err(err),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    checksum: String,
    record: BootRecord,
}

fn seal(record: &BootRecord) -> Result<Vec<u8>, StoreError> {
    let payload = serde_json::to_vec(record)?;
    let envelope = Envelope {
        version: BOOT_RECORD_VERSION,
        checksum: checksum_hex(&payload),
        record: *record,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

fn unseal(bytes: &[u8]) -> Result<BootRecord, StoreError> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|err| StoreError::Corrupt(err.to_string()))?;
    if envelope.version != BOOT_RECORD_VERSION {
        return Err(StoreError::Corrupt(format!(
            "unsupported envelope version {}",
            envelope.version
        )));
    }
    let payload = serde_json::to_vec(&envelope.record)?;
    if checksum_hex(&payload) != envelope.checksum {
        return Err(StoreError::Corrupt("checksum mismatch".to_string()));
    }
    Ok(envelope.record)
}

fn checksum_hex(payload: &[u8]) -> String {
    let digest = Sha256::digest(payload);
    let mut encoded = String::with_capacity(digest.len() * 2);
    for byte in digest {
        encoded.push_str(&format!("{byte:02x}"));
    }
    encoded
}

/// Volatile store for host runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCounterStore {
    bytes: Option<Vec<u8>>,
}

impl MemoryCounterStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with raw bytes, bypassing the envelope. Used to model
    /// torn or tampered writes.
    pub fn with_raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }

    /// Raw persisted bytes, if any.
    pub fn raw(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl CounterStore for MemoryCounterStore {
    fn load(&mut self) -> Result<Option<BootRecord>, StoreError> {
        match &self.bytes {
            None => Ok(None),
            Some(bytes) => unseal(bytes).map(Some),
        }
    }

    fn save(&mut self, record: &BootRecord) -> Result<(), StoreError> {
        self.bytes = Some(seal(record)?);
        Ok(())
    }
}

/// File-backed store holding the envelope as a single JSON blob.
///
/// The parent directory must already exist; backends on real devices map this
/// onto their NVS namespace instead.
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    /// Creates a store rooted at the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for FileCounterStore {
    fn load(&mut self) -> Result<Option<BootRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)
            .map_err(|err| StoreError::Unavailable(format!("{}: {err}", self.path.display())))?;
        unseal(&bytes).map(Some)
    }

    fn save(&mut self, record: &BootRecord) -> Result<(), StoreError> {
        let bytes = seal(record)?;
        fs::write(&self.path, bytes)
            .map_err(|err| StoreError::Unavailable(format!("{}: {err}", self.path.display())))
    }
}
