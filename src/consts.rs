//! Constants used across the bridge protocol implementation.
//!
//! This module defines the protocol-wide constants for packet and buffer
//! sizing, timeout windows, the radio control-code space, the Host's
//! PC-facing command codes, and the stream-frame wire bytes.
//!
//! ## Key Concepts
//!
//! - **Packets**: every radio exchange is at most 32 bytes; byte 0 of a
//!   payload-bearing packet is the [`byteid`](crate::byteid) header, leaving
//!   31 data bytes per packet.
//! - **Pages**: one logical message is at most [`MAX_NUMBER_OF_PACKETS`]
//!   packets, bounded by the 4-bit packet number in the header.
//! - **Control codes**: 1-byte radio packets carry link control, never data.
//! - **Stream frames**: telemetry frames ride inside the Device's ordinary
//!   serial traffic as `'A'` + 31 bytes + a `0xFX` tail, and leave the Host
//!   as `0xA0` + 31 bytes + a `0xCX` stop byte.
//!
//! These values must be used wherever framing or buffer logic is
//! implemented to keep both roles' views of the wire consistent.

/// Total size (in bytes) of one radio packet, header byte included.
///
/// This is the hard limit of the underlying radio link; the protocol never
/// hands the radio a longer buffer.
pub const MAX_PACKET_SIZE_BYTES: usize = 32;

/// Number of data bytes one radio packet can carry after the header byte.
pub const MAX_DATA_BYTES_IN_PACKET: usize = MAX_PACKET_SIZE_BYTES - 1;

/// Number of packet slots in one outbound [`Buffer`](crate::buffer::Buffer).
///
/// A page's packet numbers count down from `packets_to_send - 1` to 0 in a
/// 4-bit header field, so 16 slots is the most the wire format can address.
pub const MAX_NUMBER_OF_PACKETS: usize = 16;

/// Capacity (in bytes) of the inbound radio reassembly buffer.
///
/// One full page of maximum-length packets fits exactly; anything beyond
/// this is truncated (see the module docs on
/// [`RadioBuffer`](crate::buffer::RadioBuffer)).
pub const RADIO_BUFFER_LEN: usize = MAX_DATA_BYTES_IN_PACKET * MAX_NUMBER_OF_PACKETS;

/// Depth of the bounded queue between the radio receive interrupt and the
/// main loop. Frames arriving while the queue is full are dropped and
/// reported to the caller of [`on_receive`](crate::driver::BridgeDriver::on_receive).
pub const RADIO_QUEUE_DEPTH: usize = 8;

/// How often (in milliseconds) the Device must contact the Host, even with
/// nothing to send. The radio link only lets the Host transmit in reply to
/// the Device, so a silent Device would also silence the Host.
pub const POLL_TIME_DURATION_MS: u32 = 80;

/// How long (in milliseconds) the local serial port must have been quiet
/// before buffered outbound data is considered complete enough to (re)send.
pub const SERIAL_QUIET_TIME_MS: u32 = 3;

/// How long (in microseconds) after the stream-frame tail byte the Device
/// waits before dispatching, to distinguish a real frame from a coincidental
/// byte pattern followed by more traffic.
pub const STREAM_DISPATCH_DELAY_US: u32 = 100;

/// After this long (in milliseconds) without any Device radio traffic the
/// Host considers the link down. Twice the Device poll interval.
pub const HOST_COMMS_TIMEOUT_MS: u32 = POLL_TIME_DURATION_MS * 2;

/// Lowest valid radio channel.
pub const CHANNEL_LIMIT_LOWER: u8 = 0;

/// Highest valid radio channel.
pub const CHANNEL_LIMIT_UPPER: u8 = 25;

/// Channel used when the store has never been configured and the caller
/// supplies nothing better.
pub const DEFAULT_CHANNEL: u8 = 25;

/// Head byte opening a stream frame on the Device's inbound serial port.
pub const STREAM_PACKET_HEAD: u8 = b'A';

/// High-nibble mask of a stream frame's tail byte (`0xF0`..=`0xFF`); the low
/// nibble is the 4-bit stream sub-type.
pub const STREAM_TAIL_MASK: u8 = 0xF0;

/// Start byte the Host emits before each stream packet's 31 payload bytes.
pub const STREAM_BYTE_START: u8 = 0xA0;

/// High-nibble tag of the stop byte the Host emits after a stream packet;
/// the low nibble is the stream sub-type recovered from the packet header.
pub const STREAM_BYTE_STOP_MASK: u8 = 0xC0;

/// Control code: the last payload packet failed its checksum; resend it.
pub const PACKET_BAD_CHECK_SUM: u8 = 0x00;

/// Control code: a packet went missing mid-page; resend the page from its
/// first packet.
pub const PACKET_MISSED: u8 = 0x01;

/// Control code: the Host asks the Device to prepare for a channel change.
pub const CHANGE_CHANNEL_HOST_REQUEST: u8 = 0x02;

/// Control code: the Device is armed and waiting for the new channel byte.
pub const CHANGE_CHANNEL_DEVICE_READY: u8 = 0x03;

/// Control code: the Device's serial ingestion overflowed its packet buffer
/// and the buffer was discarded.
pub const DEVICE_SERIAL_OVERFLOW: u8 = 0x04;

/// Control code: reply to any 1-byte packet the receiver cannot interpret.
pub const INVALID_CODE_RECEIVED: u8 = 0x05;

/// PC command: report the current radio channel over the Host's serial port.
pub const HOST_CHANNEL_QUERY: u8 = 0x00;

/// PC command: begin a channel change; the target channel follows in the
/// next byte.
pub const HOST_CHANNEL_CHANGE: u8 = 0x01;

/// Serial status byte: the channel-change handshake completed.
pub const HOST_CHANNEL_CHANGE_SUCCESS: u8 = 0x02;

/// Serial status byte: the requested channel was out of range.
pub const HOST_CHANNEL_CHANGE_INVALID: u8 = 0x03;

/// PC command: time-sync marker, acknowledged immediately on the serial
/// port before the packet is forwarded to the Device.
pub const HOST_TIME_SYNC: u8 = b'<';

/// Serial status byte acknowledging [`HOST_TIME_SYNC`].
pub const HOST_TIME_SYNC_ACK: u8 = b',';

/// Single-byte reset request the Device writes to its local microcontroller
/// after a serial overflow.
pub const DEVICE_RESET_COMMAND: u8 = b'v';

/// Operator message the Host writes to its serial port when PC input
/// overflows the outbound packet buffer. `$$$` is the end-of-text marker
/// the controlling software scans for.
pub const HOST_OVERFLOW_MESSAGE: &[u8] = b"Input too large!$$$";

/// Operator message: the channel store's flash page is reserved.
pub const FLASH_RESERVED_MESSAGE: &[u8] = b"Error: flash page is reserved$$$";

/// Operator message: the channel store's flash page is in use.
pub const FLASH_IN_USE_MESSAGE: &[u8] = b"Error: flash page is in use$$$";

/// Operator message: the channel number was persisted.
pub const CHANNEL_SET_MESSAGE: &[u8] = b"Channel number set$$$";
