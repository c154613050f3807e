//! Host-side configuration for the recovery subsystem.

use crate::audit::RetentionPolicy;
use crate::guard::{BOOT_FAILURE_THRESHOLD, ROLLBACK_SETTLE_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Tunables for the boot guard and audit log on a given deployment.
/// Every field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Location of the boot record blob.
    pub counter_store_path: PathBuf,
    /// Location of the audit container.
    pub audit_log_path: PathBuf,
    /// Audit container size bound in bytes.
    pub audit_max_bytes: usize,
    /// Compaction floor for the audit container.
    pub audit_min_retained: usize,
    /// Consecutive failed boots that trigger a rollback.
    pub boot_failure_threshold: u32,
    /// Grace interval before the post-rollback restart, in milliseconds.
    pub settle_delay_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        let retention = RetentionPolicy::default();
        Self {
            counter_store_path: PathBuf::from("boot_record.json"),
            audit_log_path: PathBuf::from("event_log.json"),
            audit_max_bytes: retention.max_bytes,
            audit_min_retained: retention.min_retained,
            boot_failure_threshold: BOOT_FAILURE_THRESHOLD,
            settle_delay_ms: ROLLBACK_SETTLE_MS,
        }
    }
}

impl RecoveryConfig {
    /// Loads the configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Retention policy derived from the audit knobs.
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_bytes: self.audit_max_bytes,
            min_retained: self.audit_min_retained,
        }
    }
}
