//! Boot-loop detection and automatic rollback.
//!
//! The guard runs before any other startup work. It persists the incremented
//! boot counter first, so a power loss anywhere later in the boot still
//! counts as a failed attempt.

use crate::audit::{
    AuditSink, BOOT_LOOP_DETECTED, ROLLBACK_FAILED, ROLLBACK_SUCCESS, ROLLBACK_TRIGGERED,
};
use crate::partition::{PartitionError, PartitionManager, PartitionRef};
use crate::store::{load_or_default, CounterStore, StoreError};

/// Consecutive failed boots that trigger a rollback.
pub const BOOT_FAILURE_THRESHOLD: u32 = 3;
/// Grace interval between a successful partition switch and the restart,
/// letting pending writes settle.
pub const ROLLBACK_SETTLE_MS: u64 = 2_000;

/// Device-level actions the guard may take after a rollback decision.
pub trait DeviceControl {
    /// Blocks the control thread for the given interval.
    fn sleep_ms(&mut self, ms: u64);

    /// Requests an unconditional full restart. Real backends do not return
    /// from this call; test doubles record the request instead.
    fn restart(&mut self);
}

/// Outcome of one boot-loop evaluation.
#[derive(Debug)]
pub enum GuardVerdict {
    /// Below the failure threshold; boot continues normally.
    UnderThreshold { boot_count: u32 },
    /// Boot target switched to the candidate; a restart has been requested.
    RollbackInitiated { from: PartitionRef, to: PartitionRef },
    /// Partition switch failed; the device keeps running the current image,
    /// which may still be defective.
    RollbackFailed {
        boot_count: u32,
        error: PartitionError,
    },
}

/// Boot-loop guard evaluated once per boot, before everything else.
#[derive(Debug, Clone, Copy)]
pub struct BootLoopGuard {
    threshold: u32,
    settle_ms: u64,
}

impl Default for BootLoopGuard {
    fn default() -> Self {
        Self {
            threshold: BOOT_FAILURE_THRESHOLD,
            settle_ms: ROLLBACK_SETTLE_MS,
        }
    }
}

impl BootLoopGuard {
    /// Creates a guard with explicit threshold and settle interval.
    pub fn new(threshold: u32, settle_ms: u64) -> Self {
        Self {
            threshold,
            settle_ms,
        }
    }

    /// Increments the boot counter and drives a rollback once the failure
    /// threshold is reached.
    ///
    /// The counter is only reset by a successful rollback here, or by an
    /// explicit commit or pre-rollback reset; a boot that merely reaches the
    /// main loop does not reset it.
    pub fn check_boot_loop<S, P, D, A>(
        &self,
        store: &mut S,
        partitions: &mut P,
        control: &mut D,
        audit: &mut A,
    ) -> Result<GuardVerdict, StoreError>
    where
        S: CounterStore + ?Sized,
        P: PartitionManager + ?Sized,
        D: DeviceControl + ?Sized,
        A: AuditSink + ?Sized,
    {
        let mut record = load_or_default(store)?;
        record.boot_count = record.boot_count.saturating_add(1);
        // Persisted before anything else can fail this boot.
        store.save(&record)?;
        log::info!("boot count: {}", record.boot_count);

        if record.boot_count < self.threshold {
            return Ok(GuardVerdict::UnderThreshold {
                boot_count: record.boot_count,
            });
        }

        audit.record(
            BOOT_LOOP_DETECTED,
            Some(&format!("count={}", record.boot_count)),
        );
        let from = partitions.running();
        let to = partitions.rollback_candidate();
        log::warn!("boot loop detected; rolling back from {from} to {to}");
        audit.record(ROLLBACK_TRIGGERED, Some(&format!("from={from},to={to}")));

        match partitions.set_boot_target(&to) {
            Ok(()) => {
                record.boot_count = 0;
                store.save(&record)?;
                audit.record(ROLLBACK_SUCCESS, Some(&format!("partition={to}")));
                log::warn!("restarting into {to}");
                control.sleep_ms(self.settle_ms);
                control.restart();
                Ok(GuardVerdict::RollbackInitiated { from, to })
            }
            Err(error) => {
                audit.record(ROLLBACK_FAILED, Some(&error.to_string()));
                log::error!("rollback failed: {error}; continuing on current image");
                Ok(GuardVerdict::RollbackFailed {
                    boot_count: record.boot_count,
                    error,
                })
            }
        }
    }
}

/// Prepares the counters for a freshly written image, giving it a clean
/// validation cycle on its first boot. Invoked by the update-installation
/// flow immediately before switching execution to the new image.
pub fn reset_for_new_firmware<S: CounterStore + ?Sized>(store: &mut S) -> Result<(), StoreError> {
    let mut record = load_or_default(store)?;
    record.boot_count = 0;
    record.validation_stage = -1;
    store.save(&record)?;
    log::info!("boot counter reset for new firmware validation");
    Ok(())
}
