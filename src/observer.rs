//! Session events.
//!
//! Conditions that do not abort a read cycle are reported here instead of
//! being logged and forgotten. A session is built with one [`Observer`];
//! [`TracingObserver`] is the default, and an `mpsc::Sender<MeterEvent>`
//! can be used to forward events to another task.

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::types::ResponseVariant;

/// Events emitted by a meter session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeterEvent {
    /// Trailer did not match the computed CRC; decoding continued
    ChecksumMismatch {
        variant: ResponseVariant,
        expected: u16,
        computed: u16,
    },
    /// Trailer matched
    ChecksumVerified { variant: ResponseVariant },
    /// Meter clock could not be read; the decode-time clock was used
    TimestampFallback {
        variant: ResponseVariant,
        /// Raw clock text as received
        raw: String,
    },
    /// A stale snapshot triggered a read cycle
    Refresh,
    /// Both responses were decoded and the snapshot committed
    CycleCompleted { fields: usize },
    /// A read cycle failed; the previous snapshot is kept
    CycleFailed {
        error: String,
        /// Whether the next lookup can expect a different outcome
        retryable: bool,
    },
}

/// Receiver of session events.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &MeterEvent);
}

/// Logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: &MeterEvent) {
        match event {
            MeterEvent::ChecksumMismatch {
                variant,
                expected,
                computed,
            } => warn!(%variant, expected, computed, "Checksum mismatch"),
            MeterEvent::ChecksumVerified { variant } => debug!(%variant, "Checksum verified"),
            MeterEvent::TimestampFallback { variant, raw } => {
                warn!(%variant, raw = %raw.escape_debug(), "Unreadable meter clock, using local time")
            }
            MeterEvent::Refresh => debug!("Snapshot stale, refreshing"),
            MeterEvent::CycleCompleted { fields } => debug!(fields, "Read cycle completed"),
            MeterEvent::CycleFailed { error, retryable } => {
                error!(%error, retryable, "Read cycle failed")
            }
        }
    }
}

/// Forwards events to a channel without waiting.
///
/// Events are dropped when the channel is full or closed.
impl Observer for mpsc::Sender<MeterEvent> {
    fn on_event(&self, event: &MeterEvent) {
        if self.try_send(event.clone()).is_err() {
            debug!(?event, "Event channel unavailable, event dropped");
        }
    }
}
