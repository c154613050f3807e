//! Hand-off of the audit container to an external upload collaborator.
//!
//! The transfer mechanism itself (HTTP, MQTT, serial) lives outside this
//! crate; only the read-then-clear contract is fixed here.

use crate::audit::{AuditError, EventLog, LogStore};
use crate::clock::DeviceClock;
use thiserror::Error;

/// Failure reported by the external transfer mechanism.
#[derive(Debug, Error)]
#[error("event upload failed: {0}")]
pub struct TransportError(pub String);

/// Contract implemented by the upload collaborator.
pub trait EventTransport {
    /// Transfers the serialized container; returning `Ok` confirms receipt.
    fn send(&mut self, payload: &str) -> Result<(), TransportError>;
}

/// Errors surfaced while flushing events upstream.
#[derive(Debug, Error)]
pub enum FlushError {
    #[error(transparent)]
    Audit(#[from] AuditError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Sends the full container upstream and clears it only after the transfer
/// is confirmed. Returns the number of records handed off.
pub fn flush_events<B, C, T>(
    log: &mut EventLog<B, C>,
    transport: &mut T,
) -> Result<usize, FlushError>
where
    B: LogStore,
    C: DeviceClock,
    T: EventTransport + ?Sized,
{
    let drained = log.count();
    let payload = log.read_all()?;
    transport.send(&payload)?;
    log.clear()?;
    Ok(drained)
}
