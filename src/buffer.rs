//! Fixed-capacity packet storage for both directions of the bridge.
//!
//! Three storage types live here:
//!
//! - [`Packet`]: one 32-byte radio packet with read/write cursors. Byte 0 is
//!   reserved for the [`byteid`](crate::byteid) header, so a freshly cleaned
//!   packet starts writing at offset 1.
//! - [`Buffer`]: an arena of [`MAX_NUMBER_OF_PACKETS`] packets with
//!   send-side bookkeeping. Outbound serial bytes are fragmented into it;
//!   the Host also uses one (in "complete clean" mode) to accumulate whole
//!   stream packets as they arrive off the radio.
//! - [`RadioBuffer`]: the flat inbound reassembly buffer the receive state
//!   machine appends accepted payload bytes into until a page completes.
//!
//! The current-packet cursor is an index into the arena, never a pointer,
//! and running out of slots during ingestion is an error the caller must
//! signal, not a sentinel.

use crate::consts::{MAX_NUMBER_OF_PACKETS, MAX_PACKET_SIZE_BYTES, RADIO_BUFFER_LEN};
use crate::error::Error;

/// One fixed-size radio packet plus its cursors.
///
/// `position_write` is the next free offset; it never exceeds
/// [`MAX_PACKET_SIZE_BYTES`]. After [`clean`](Packet::clean) it is 1 (byte 0
/// held for the header); after [`clean_complete`](Packet::clean_complete) it
/// is 0, for buffers that store already-headered packets verbatim.
#[derive(Debug, Clone, Copy)]
pub struct Packet {
    /// Raw packet bytes, header byte at index 0.
    pub data: [u8; MAX_PACKET_SIZE_BYTES],
    /// Next free write offset.
    pub position_write: usize,
    /// Read offset, reserved for callers draining a packet incrementally.
    pub position_read: usize,
}

impl Packet {
    /// A cleaned packet, write cursor past the header byte.
    pub const fn new() -> Self {
        Self {
            data: [0; MAX_PACKET_SIZE_BYTES],
            position_write: 1,
            position_read: 0,
        }
    }

    /// Resets the cursors for a fresh outbound packet (header reserved).
    pub fn clean(&mut self) {
        self.position_read = 0;
        self.position_write = 1;
    }

    /// Resets the cursors to zero for verbatim packet storage.
    pub fn clean_complete(&mut self) {
        self.position_read = 0;
        self.position_write = 0;
    }

    /// The bytes written so far, header byte included.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.position_write]
    }

    /// The data bytes written so far, header byte excluded.
    pub fn payload(&self) -> &[u8] {
        &self.data[1..self.position_write]
    }

    fn is_full(&self) -> bool {
        self.position_write >= MAX_PACKET_SIZE_BYTES
    }

    fn push(&mut self, byte: u8) {
        if !self.is_full() {
            self.data[self.position_write] = byte;
            self.position_write += 1;
        }
    }
}

/// A fixed arena of packets with send-side counters.
///
/// Invariant: `packets_sent <= packets_to_send <= MAX_NUMBER_OF_PACKETS`.
/// The arena index `current` always points at the packet ingestion is
/// filling; it only moves forward until the next clean.
#[derive(Debug)]
pub struct Buffer {
    pub(crate) packets: [Packet; MAX_NUMBER_OF_PACKETS],
    /// Number of packets logically populated and owed to the peer.
    pub packets_to_send: usize,
    /// Number of those packets already handed to the radio.
    pub packets_sent: usize,
    current: usize,
}

impl Buffer {
    /// An empty buffer with every packet cleaned for outbound use.
    pub const fn new() -> Self {
        Self {
            packets: [Packet::new(); MAX_NUMBER_OF_PACKETS],
            packets_to_send: 0,
            packets_sent: 0,
            current: 0,
        }
    }

    /// Cleans the first `packets` slots for outbound use and zeroes the
    /// counters and cursor.
    ///
    /// Callers pass the number of slots actually dirtied (everything on
    /// init, `packets_sent` after a drained page) to avoid touching slots
    /// that were never written.
    pub fn clean(&mut self, packets: usize) {
        let count = packets.min(MAX_NUMBER_OF_PACKETS);
        for packet in &mut self.packets[..count] {
            packet.clean();
        }
        self.packets_to_send = 0;
        self.packets_sent = 0;
        self.current = 0;
    }

    /// Like [`clean`](Buffer::clean) but leaves write cursors at zero, for
    /// buffers that store received packets verbatim.
    pub fn clean_complete(&mut self, packets: usize) {
        let count = packets.min(MAX_NUMBER_OF_PACKETS);
        for packet in &mut self.packets[..count] {
            packet.clean_complete();
        }
        self.packets_to_send = 0;
        self.packets_sent = 0;
        self.current = 0;
    }

    /// Appends one ingested serial byte, advancing to the next packet slot
    /// when the current one fills.
    ///
    /// On the first byte of an empty buffer, `packets_to_send` becomes 1.
    /// When every slot is full and another would be needed, the buffer
    /// fully resets itself, the byte is dropped, and
    /// [`Error::SerialOverflow`] is returned so the caller can signal the
    /// condition; ingestion may continue into the fresh buffer.
    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        if self.packets_to_send == 0 {
            self.packets_to_send = 1;
        }
        if self.packets[self.current].is_full() {
            if self.packets_to_send >= MAX_NUMBER_OF_PACKETS {
                self.clean(MAX_NUMBER_OF_PACKETS);
                return Err(Error::SerialOverflow);
            }
            self.current += 1;
            self.packets_to_send += 1;
        }
        self.packets[self.current].push(byte);
        Ok(())
    }

    /// Copies one received packet verbatim (header byte included) into the
    /// arena, spilling into following slots as they fill.
    ///
    /// Used by the Host to bank stream packets off the radio without
    /// writing to the serial port from the receive path. Slots are expected
    /// to be in "complete clean" state. Bytes beyond the last slot are
    /// dropped; stream traffic is best-effort.
    pub fn add_raw_packet(&mut self, data: &[u8]) {
        if self.packets_to_send == 0 {
            self.packets_to_send = 1;
        }
        for &byte in data {
            if self.packets[self.current].is_full() {
                if self.packets_to_send >= MAX_NUMBER_OF_PACKETS {
                    return;
                }
                self.current += 1;
                self.packets_to_send += 1;
            }
            self.packets[self.current].push(byte);
        }
    }

    /// True when populated packets remain unsent.
    pub fn has_unsent(&self) -> bool {
        self.packets_sent < self.packets_to_send
    }

    /// True when a non-empty page has been sent in full and is ready to be
    /// cleaned.
    pub fn is_drained(&self) -> bool {
        self.packets_to_send != 0 && self.packets_sent == self.packets_to_send
    }

    /// Borrows the packet at `index`, if populated.
    pub fn packet(&self, index: usize) -> Option<&Packet> {
        self.packets[..self.packets_to_send.min(MAX_NUMBER_OF_PACKETS)].get(index)
    }
}

/// Flat inbound reassembly buffer for non-stream radio payload.
///
/// Accepted payload bytes are appended in arrival order; when the packet
/// numbered 0 lands, `ready_to_flush` flips and the main loop writes the
/// whole run out the local serial port. Bytes past [`RADIO_BUFFER_LEN`] are
/// silently truncated; the receive path is bounded by page size in
/// practice, so this is a soft-fail rather than a signalled overflow.
#[derive(Debug)]
pub struct RadioBuffer {
    data: [u8; RADIO_BUFFER_LEN],
    /// Next free write offset.
    pub position_write: usize,
    /// Read offset, reserved for callers draining incrementally.
    pub position_read: usize,
    /// Set when a page has completed and the buffer should be flushed.
    pub ready_to_flush: bool,
}

impl RadioBuffer {
    /// An empty, zeroed reassembly buffer.
    pub const fn new() -> Self {
        Self {
            data: [0; RADIO_BUFFER_LEN],
            position_write: 0,
            position_read: 0,
            ready_to_flush: false,
        }
    }

    /// Zeroes the storage and resets cursors and the flush flag.
    pub fn clean(&mut self) {
        self.data = [0; RADIO_BUFFER_LEN];
        self.position_write = 0;
        self.position_read = 0;
        self.ready_to_flush = false;
    }

    /// Drops any partial page by rewinding the write cursor, without
    /// touching already-zeroed storage. Used on a detected sequence gap.
    pub fn rewind(&mut self) {
        self.position_write = 0;
    }

    /// Appends payload bytes, truncating at capacity. Returns how many were
    /// stored.
    pub fn extend(&mut self, payload: &[u8]) -> usize {
        let mut stored = 0;
        for &byte in payload {
            if self.position_write >= RADIO_BUFFER_LEN {
                break;
            }
            self.data[self.position_write] = byte;
            self.position_write += 1;
            stored += 1;
        }
        stored
    }

    /// The reassembled bytes accepted so far.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.position_write]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_DATA_BYTES_IN_PACKET;

    #[test]
    fn test_fresh_packet_reserves_header_byte() {
        let packet = Packet::new();
        assert_eq!(packet.position_write, 1);
        assert_eq!(packet.position_read, 0);
        assert!(packet.payload().is_empty());
    }

    #[test]
    fn test_clean_modes_differ_in_write_position() {
        let mut packet = Packet::new();
        packet.push(0xAB);
        packet.clean();
        assert_eq!(packet.position_write, 1);
        packet.clean_complete();
        assert_eq!(packet.position_write, 0);
    }

    #[test]
    fn test_ingestion_fragments_across_packets() {
        let mut buffer = Buffer::new();
        let bytes: Vec<u8> = (0..40u8).collect();
        for &byte in &bytes {
            buffer.push(byte).unwrap();
        }

        // ceil(40 / 31) packets
        assert_eq!(buffer.packets_to_send, 2);
        assert_eq!(buffer.packets[0].payload().len(), MAX_DATA_BYTES_IN_PACKET);

        let mut reassembled = Vec::new();
        reassembled.extend_from_slice(buffer.packets[0].payload());
        reassembled.extend_from_slice(buffer.packets[1].payload());
        assert_eq!(reassembled, bytes);
    }

    #[test]
    fn test_single_byte_populates_one_packet() {
        let mut buffer = Buffer::new();
        buffer.push(0x42).unwrap();
        assert_eq!(buffer.packets_to_send, 1);
        assert_eq!(buffer.packets[0].payload(), &[0x42]);
    }

    #[test]
    fn test_overflow_resets_and_errors_exactly_once() {
        let mut buffer = Buffer::new();
        let capacity = MAX_NUMBER_OF_PACKETS * MAX_DATA_BYTES_IN_PACKET;

        for i in 0..capacity {
            buffer.push(i as u8).unwrap();
        }
        assert_eq!(buffer.packets_to_send, MAX_NUMBER_OF_PACKETS);

        // One byte past capacity trips the overflow and leaves the buffer
        // fully reset.
        assert_eq!(buffer.push(0xFF), Err(Error::SerialOverflow));
        assert_eq!(buffer.packets_to_send, 0);
        assert_eq!(buffer.packets_sent, 0);

        // Ingestion can resume into the fresh buffer.
        buffer.push(0x01).unwrap();
        assert_eq!(buffer.packets_to_send, 1);
    }

    #[test]
    fn test_add_raw_packet_stores_header_verbatim() {
        let mut buffer = Buffer::new();
        buffer.clean_complete(MAX_NUMBER_OF_PACKETS);

        let mut packet = [0u8; MAX_PACKET_SIZE_BYTES];
        for (i, byte) in packet.iter_mut().enumerate() {
            *byte = i as u8;
        }
        buffer.add_raw_packet(&packet);

        assert_eq!(buffer.packets_to_send, 1);
        assert_eq!(buffer.packets[0].bytes(), &packet);
    }

    #[test]
    fn test_radio_buffer_truncates_at_capacity() {
        let mut radio = RadioBuffer::new();
        let chunk = [0xEEu8; MAX_DATA_BYTES_IN_PACKET];
        for _ in 0..MAX_NUMBER_OF_PACKETS {
            assert_eq!(radio.extend(&chunk), MAX_DATA_BYTES_IN_PACKET);
        }
        // Full; further bytes are dropped without error.
        assert_eq!(radio.extend(&[0x01, 0x02]), 0);
        assert_eq!(radio.bytes().len(), RADIO_BUFFER_LEN);

        radio.clean();
        assert_eq!(radio.position_write, 0);
        assert!(!radio.ready_to_flush);
    }
}
