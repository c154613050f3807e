//! Trust promotion for images that survived their first full operation.

use crate::audit::{AuditSink, FIRMWARE_COMMITTED, FIRMWARE_COMMIT_FAIL};
use crate::partition::{PartitionError, PartitionManager, TrustState};
use crate::store::{load_or_default, CounterStore, StoreError};

/// Outcome of a speculative commit attempt.
#[derive(Debug)]
pub enum CommitOutcome {
    /// Running image promoted to trusted; counters reset.
    Committed,
    /// Image was not awaiting verification; nothing changed.
    NotPending,
    /// Vendor promotion call failed; the image stays unconfirmed and the
    /// gate can be retried on the next evaluation.
    Failed(PartitionError),
}

impl CommitOutcome {
    /// True only when the image was actually promoted.
    pub fn committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed)
    }
}

/// Commit gate evaluated after the first successful externally driven
/// operation, e.g. a cloud upload.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitGate;

impl CommitGate {
    /// Promotes the running image when it is awaiting verification.
    ///
    /// Idempotent and safe to call speculatively: any trust state other than
    /// `PendingVerification` is a pure no-op reported as
    /// [`CommitOutcome::NotPending`].
    pub fn commit_if_pending<S, P, A>(
        &self,
        store: &mut S,
        partitions: &mut P,
        audit: &mut A,
    ) -> Result<CommitOutcome, StoreError>
    where
        S: CounterStore + ?Sized,
        P: PartitionManager + ?Sized,
        A: AuditSink + ?Sized,
    {
        let running = partitions.running();
        if partitions.trust_state(&running) != TrustState::PendingVerification {
            return Ok(CommitOutcome::NotPending);
        }
        match partitions.mark_trusted_cancel_rollback() {
            Ok(()) => {
                audit.record(FIRMWARE_COMMITTED, Some(&format!("partition={running}")));
                let mut record = load_or_default(store)?;
                record.boot_count = 0;
                record.validation_stage = -1;
                store.save(&record)?;
                log::info!("firmware committed; boot counter reset");
                Ok(CommitOutcome::Committed)
            }
            Err(error) => {
                audit.record(FIRMWARE_COMMIT_FAIL, Some(&error.to_string()));
                log::warn!("firmware commit failed: {error}");
                Ok(CommitOutcome::Failed(error))
            }
        }
    }
}
