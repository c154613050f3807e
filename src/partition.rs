//! Capability seam over the vendor partition table.
//!
//! The boot guard and commit gate never touch vendor APIs directly; they see
//! the table only through [`PartitionManager`]. Firmware integrations supply
//! a hardware-backed implementation, hosts and tests use
//! [`MemoryPartitionManager`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of one firmware slot on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionRef {
    label: String,
}

impl PartitionRef {
    /// Creates a slot reference from its label (e.g. `app0`).
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Slot label assigned by the partition table.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for PartitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Trust state reported for a firmware slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustState {
    /// Previously verified image.
    Trusted,
    /// Newly installed image that has not yet proven itself.
    PendingVerification,
    /// Fresh slot that has never been booted.
    Fresh,
    /// Image that failed verification.
    Rejected,
    /// Incomplete update left behind by an interrupted install.
    Aborted,
    /// State could not be determined.
    Unknown,
}

impl TrustState {
    /// Canonical uppercase representation used in log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            TrustState::Trusted => "TRUSTED",
            TrustState::PendingVerification => "PENDING_VERIFICATION",
            TrustState::Fresh => "FRESH",
            TrustState::Rejected => "REJECTED",
            TrustState::Aborted => "ABORTED",
            TrustState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TrustState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced by partition-table operations, carrying the vendor
/// reason verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("failed to switch boot target to {target}: {reason}")]
    SwitchFailed { target: String, reason: String },
    #[error("failed to mark running image trusted: {reason}")]
    MarkTrustedFailed { reason: String },
}

/// Contract over the device's partition table.
pub trait PartitionManager {
    /// Slot holding the image currently executing.
    fn running(&self) -> PartitionRef;

    /// Slot the device would roll back to.
    fn rollback_candidate(&self) -> PartitionRef;

    /// Trust state recorded for the given slot.
    fn trust_state(&self, slot: &PartitionRef) -> TrustState;

    /// Points the boot target at the given slot. Takes effect on the next
    /// restart.
    fn set_boot_target(&mut self, slot: &PartitionRef) -> Result<(), PartitionError>;

    /// Promotes the running image to trusted and cancels any scheduled
    /// rollback.
    fn mark_trusted_cancel_rollback(&mut self) -> Result<(), PartitionError>;
}

/// In-memory two-slot partition table for host builds and tests.
///
/// Failure injection is sticky: an injected reason keeps failing the
/// corresponding operation until cleared.
#[derive(Debug, Clone)]
pub struct MemoryPartitionManager {
    running: PartitionRef,
    candidate: PartitionRef,
    boot_target: PartitionRef,
    trust: TrustState,
    switch_failure: Option<String>,
    mark_failure: Option<String>,
}

impl MemoryPartitionManager {
    /// Creates a table with the given running and rollback-candidate slots.
    /// The running image starts out trusted.
    pub fn new(running: impl Into<String>, candidate: impl Into<String>) -> Self {
        let running = PartitionRef::new(running);
        Self {
            boot_target: running.clone(),
            running,
            candidate: PartitionRef::new(candidate),
            trust: TrustState::Trusted,
            switch_failure: None,
            mark_failure: None,
        }
    }

    /// Overrides the trust state reported for the running image.
    pub fn set_trust(&mut self, trust: TrustState) {
        self.trust = trust;
    }

    /// Slot the table would boot from on the next restart.
    pub fn boot_target(&self) -> &PartitionRef {
        &self.boot_target
    }

    /// Makes every subsequent boot-target switch fail with the given reason.
    pub fn fail_boot_target_switch(&mut self, reason: impl Into<String>) {
        self.switch_failure = Some(reason.into());
    }

    /// Makes every subsequent trust promotion fail with the given reason.
    pub fn fail_mark_trusted(&mut self, reason: impl Into<String>) {
        self.mark_failure = Some(reason.into());
    }

    /// Clears any injected failures.
    pub fn clear_injected_failures(&mut self) {
        self.switch_failure = None;
        self.mark_failure = None;
    }
}

impl PartitionManager for MemoryPartitionManager {
    fn running(&self) -> PartitionRef {
        self.running.clone()
    }

    fn rollback_candidate(&self) -> PartitionRef {
        self.candidate.clone()
    }

    fn trust_state(&self, slot: &PartitionRef) -> TrustState {
        if slot == &self.running {
            self.trust
        } else {
            TrustState::Unknown
        }
    }

    fn set_boot_target(&mut self, slot: &PartitionRef) -> Result<(), PartitionError> {
        if let Some(reason) = &self.switch_failure {
            return Err(PartitionError::SwitchFailed {
                target: slot.label().to_string(),
                reason: reason.clone(),
            });
        }
        self.boot_target = slot.clone();
        Ok(())
    }

    fn mark_trusted_cancel_rollback(&mut self) -> Result<(), PartitionError> {
        if let Some(reason) = &self.mark_failure {
            return Err(PartitionError::MarkTrustedFailed {
                reason: reason.clone(),
            });
        }
        self.trust = TrustState::Trusted;
        Ok(())
    }
}
