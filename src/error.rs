//! Bridge error types.

use crate::hal::StoreError;

/// Errors surfaced by the bridge driver.
///
/// None of these are fatal to the protocol loop: overflow and queue errors
/// describe state that has already been reset or traffic that has already
/// been dropped, and store errors abort a channel change while leaving the
/// runtime channel untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Serial ingestion needed more packet slots than the outbound buffer
    /// has; the buffer was fully reset and the peer/operator signalled.
    #[error("serial ingest overflowed the outbound packet buffer")]
    SerialOverflow,

    /// The radio receive queue was full; the frame was dropped.
    #[error("radio receive queue is full")]
    QueueFull,

    /// A received radio frame was longer than a radio packet can be.
    #[error("received radio frame exceeds the packet size limit")]
    FrameTooLong,

    /// The operation is only valid for the Device role.
    #[error("operation requires the Device role")]
    NotDevice,

    /// Persisting the channel failed; the change was aborted.
    #[error(transparent)]
    Store(#[from] StoreError),
}
