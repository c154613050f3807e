//! Staged startup checkpoints for images awaiting trust confirmation.

use crate::clock::DeviceClock;
use crate::partition::{PartitionManager, TrustState};
use crate::store::{load_or_default, CounterStore, StoreError};

/// Ordered startup checkpoints reported while an image proves itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    BootStarted = 0,
    NetworkUp = 1,
    ConfigLoaded = 2,
    ApiReady = 3,
}

impl ValidationStage {
    /// Stored integer form of the stage.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Human-readable checkpoint name for log lines.
    pub fn name(self) -> &'static str {
        match self {
            ValidationStage::BootStarted => "boot started",
            ValidationStage::NetworkUp => "network up",
            ValidationStage::ConfigLoaded => "config loaded",
            ValidationStage::ApiReady => "api ready",
        }
    }
}

/// Outcome of reporting a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// Stage stored; the image is still proving itself.
    Recorded(ValidationStage),
    /// Sequencer disabled; the report was ignored.
    Inactive,
}

/// Tracks checkpoints only while the partition manager reports
/// `PendingVerification` for the running image.
///
/// A validation start time is recorded when tracking begins, but nothing in
/// this subsystem consults it to force a rollback if validation stalls; see
/// DESIGN.md for the open question around a watchdog deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationSequencer;

impl ValidationSequencer {
    /// Inspects the running image and arms checkpoint tracking when it is
    /// unconfirmed. Returns the observed trust state either way.
    pub fn begin_if_pending<S, P, C>(
        &self,
        store: &mut S,
        partitions: &mut P,
        clock: &mut C,
    ) -> Result<TrustState, StoreError>
    where
        S: CounterStore + ?Sized,
        P: PartitionManager + ?Sized,
        C: DeviceClock + ?Sized,
    {
        let running = partitions.running();
        let state = partitions.trust_state(&running);
        log::info!("partition {running}: trust state {state}");
        if state == TrustState::PendingVerification {
            let mut record = load_or_default(store)?;
            record.validation_stage = ValidationStage::BootStarted.as_i32();
            record.validation_start_ms = clock.now_ms();
            store.save(&record)?;
            log::info!("new firmware detected; validation started");
        }
        Ok(state)
    }

    /// Stores the reported stage. Last write wins: the sequencer does not
    /// enforce monotonic ordering, callers are expected to report stages in
    /// increasing order.
    pub fn mark_checkpoint<S>(
        &self,
        store: &mut S,
        stage: ValidationStage,
    ) -> Result<CheckpointOutcome, StoreError>
    where
        S: CounterStore + ?Sized,
    {
        let mut record = load_or_default(store)?;
        if !record.validation_active() {
            return Ok(CheckpointOutcome::Inactive);
        }
        record.validation_stage = stage.as_i32();
        store.save(&record)?;
        log::info!("validation checkpoint {}: {}", stage.as_i32(), stage.name());
        Ok(CheckpointOutcome::Recorded(stage))
    }
}
