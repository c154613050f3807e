//! Boot-validation and rollback core for remotely updated firmware nodes.
//!
//! A newly installed image must prove itself through a staged startup
//! sequence before it is trusted; repeated boot failures revert the device
//! to the last known-good image. A durable, size-bounded audit log records
//! error-class events so failures can be diagnosed across the resets the
//! rollback mechanism itself triggers.

pub mod app;
pub mod audit;
pub mod clock;
pub mod commit;
pub mod config;
pub mod guard;
pub mod partition;
pub mod store;
pub mod upload;
pub mod validation;

pub use audit::{
    AuditError, AuditSink, EventLog, EventRecord, FileLogStore, LogStore, MemoryLogStore,
    RetentionPolicy, BOOT_LOOP_DETECTED, FIRMWARE_COMMITTED, FIRMWARE_COMMIT_FAIL,
    ROLLBACK_FAILED, ROLLBACK_SUCCESS, ROLLBACK_TRIGGERED,
};
pub use clock::{rfc3339_utc, DeviceClock, SystemDeviceClock};
pub use commit::{CommitGate, CommitOutcome};
pub use config::{ConfigError, RecoveryConfig};
pub use guard::{
    reset_for_new_firmware, BootLoopGuard, DeviceControl, GuardVerdict, BOOT_FAILURE_THRESHOLD,
    ROLLBACK_SETTLE_MS,
};
pub use partition::{
    MemoryPartitionManager, PartitionError, PartitionManager, PartitionRef, TrustState,
};
pub use store::{
    load_or_default, BootRecord, CounterStore, FileCounterStore, MemoryCounterStore, StoreError,
    BOOT_RECORD_VERSION,
};
pub use upload::{flush_events, EventTransport, FlushError, TransportError};
pub use validation::{CheckpointOutcome, ValidationSequencer, ValidationStage};
