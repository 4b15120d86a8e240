//! Platform capability traits the bridge consumes.
//!
//! The protocol core never touches hardware directly. Each peer wires in:
//!
//! - a [`Radio`]: the raw "send up to 32 bytes to the peer" primitive
//!   (Gazell-style links address a Host from numbered Devices and reply
//!   per-device in the other direction)
//! - a [`Clock`]: monotonic millisecond/microsecond counters for every
//!   timeout in the protocol
//! - a [`ChannelStore`]: non-volatile storage for the one configuration
//!   value both peers must agree on, the radio channel
//!
//! The local byte-stream transport is not declared here; it is expressed
//! directly as `embedded-io` `Read + Write + ReadReady` bounds on the
//! driver.

use crate::driver::DeviceId;

/// Raw radio transmit capability.
///
/// Implementations wrap the vendor send primitives. Sends are
/// fire-and-forget from the protocol's point of view: a lost packet is
/// recovered by the checksum/sequence machinery, so the driver ignores
/// transmit errors on the hot path.
pub trait Radio {
    /// Transport-specific send error.
    type Error;

    /// Sends `data` (at most 32 bytes) to the addressed Device. Only
    /// meaningful for the Host role.
    fn send_to_device(&mut self, device: DeviceId, data: &[u8]) -> Result<(), Self::Error>;

    /// Sends `data` (at most 32 bytes) to the Host. Only meaningful for the
    /// Device role. A zero-length send is the Device's keepalive poll.
    fn send_to_host(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Retunes the radio to `channel`. Takes effect for all subsequent
    /// sends and receives.
    fn set_channel(&mut self, channel: u8);
}

/// Monotonic time source.
///
/// Both counters wrap at `u32::MAX`; the driver only ever compares
/// differences with wrapping arithmetic, so wrap-around is harmless as long
/// as no single interval approaches the full range.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch.
    fn millis(&self) -> u32;

    /// Microseconds since an arbitrary epoch.
    fn micros(&self) -> u32;
}

/// Failure modes of a channel-store write.
///
/// These mirror what page-granular flash on radio SoCs actually reports:
/// the page may be reserved by the radio stack, or occupied by application
/// code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The storage region is reserved and cannot be written.
    #[error("flash page is reserved")]
    ReservedRegion,
    /// The storage region is in use by the application image.
    #[error("flash page is in use by the application")]
    RegionInUse,
}

/// Non-volatile storage for the radio channel.
pub trait ChannelStore {
    /// Returns the persisted channel, or `None` if none was ever written
    /// (e.g. erased flash).
    fn read_channel(&mut self) -> Option<u8>;

    /// Atomically persists `channel`. On failure nothing is written and the
    /// runtime channel must be left untouched by the caller.
    fn write_channel(&mut self, channel: u8) -> Result<(), StoreError>;
}
