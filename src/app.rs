//! Host orchestration of the startup sequence.
//!
//! Runs the boot guard first, then arms the validation sequencer, mirroring
//! the order a device firmware would use. The partition backend here is the
//! in-memory double; real integrations supply their own
//! [`PartitionManager`](crate::partition::PartitionManager) and call into
//! the same components.

use crate::audit::{EventLog, FileLogStore};
use crate::clock::SystemDeviceClock;
use crate::config::RecoveryConfig;
use crate::guard::{BootLoopGuard, DeviceControl};
use crate::partition::{MemoryPartitionManager, TrustState};
use crate::store::FileCounterStore;
use crate::validation::ValidationSequencer;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "bootguard.json";

/// Application entrypoint: load configuration, initialize subsystems, and
/// run the boot-validation sequence once.
pub fn run() -> Result<()> {
    let _ = env_logger::try_init();

    let config_path = std::env::var_os("BOOTGUARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = if config_path.exists() {
        RecoveryConfig::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))?
    } else {
        RecoveryConfig::default()
    };

    let mut store = FileCounterStore::new(&config.counter_store_path);
    let mut partitions = MemoryPartitionManager::new("app0", "app1");
    let mut clock = SystemDeviceClock::new();
    let mut control = HostControl;
    let mut audit = EventLog::with_policy(
        FileLogStore::new(&config.audit_log_path),
        SystemDeviceClock::new(),
        config.retention_policy(),
    );

    if let Err(err) = audit.init() {
        // Non-critical: the boot sequence continues without forensic records.
        log::warn!("event log unavailable ({err}); continuing without audit records");
    }

    let guard = BootLoopGuard::new(config.boot_failure_threshold, config.settle_delay_ms);
    let verdict = guard.check_boot_loop(&mut store, &mut partitions, &mut control, &mut audit)?;
    log::info!("boot guard verdict: {verdict:?}");

    let sequencer = ValidationSequencer::default();
    let state = sequencer.begin_if_pending(&mut store, &mut partitions, &mut clock)?;
    if state == TrustState::PendingVerification {
        log::info!("firmware will be committed after the first successful upload");
    }
    Ok(())
}

/// Host control backend: the restart request ends the process so a
/// supervisor can relaunch it.
struct HostControl;

impl DeviceControl for HostControl {
    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }

    fn restart(&mut self) {
        log::warn!("restart requested; exiting for relaunch");
        std::process::exit(0);
    }
}
