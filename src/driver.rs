//! The bridge driver: one protocol instance for one role.
//!
//! This module provides the [`BridgeDriver`] struct, which owns every piece
//! of protocol state for a running peer (the outbound packet buffer, the
//! inbound reassembly buffer, the stream-frame detector, the channel
//! bookkeeping, and the receive-side state machine) and wires them to the
//! platform capabilities ([`Radio`], [`Clock`], [`ChannelStore`], and an
//! `embedded-io` serial port).
//!
//! ## Receive path
//!
//! The radio notifies the peer of an arriving packet from interrupt-like
//! context. To keep the run-to-completion contract without relying on
//! interrupt exclusion, reception is split in two:
//!
//! 1. [`on_receive`](BridgeDriver::on_receive) validates the length and
//!    pushes the frame into a bounded queue. This is the only method meant
//!    to be called from the receive callback.
//! 2. [`process_radio`](BridgeDriver::process_radio) (called from
//!    [`run_once`](BridgeDriver::run_once)) pops frames in arrival order
//!    and runs the full state machine on each, including any radio reply.
//!
//! ## Send path
//!
//! The Host's radio can only transmit in reply to Device traffic, so every
//! received frame doubles as a send opportunity: after the inbound
//! bookkeeping, the handler checks whether buffered outbound data is old
//! enough to go out and sends at most one packet per received frame.
//! The Device additionally initiates contact from its main loop: first
//! packets, stream launches, and keepalive polls.
//!
//! ## Example
//!
//! ```ignore
//! use rfbridge::driver::{BridgeDriver, Role};
//!
//! let mut bridge = BridgeDriver::new(Role::Host, radio, serial, clock, store);
//! bridge.begin(rfbridge::consts::DEFAULT_CHANNEL)?;
//! loop {
//!     bridge.run_once();
//! }
//! ```
//!
//! ## Design Notes
//!
//! This module does **not** implement the radio primitive, pin bring-up, or
//! flash mechanics; those enter through the [`crate::hal`] traits. See
//! [`crate::stream`] for the telemetry-frame detector internals and
//! [`crate::byteid`] for the header codec.

use crate::buffer::{Buffer, RadioBuffer};
use crate::byteid;
use crate::consts::{
    CHANGE_CHANNEL_DEVICE_READY, CHANGE_CHANNEL_HOST_REQUEST, CHANNEL_LIMIT_LOWER,
    CHANNEL_LIMIT_UPPER, CHANNEL_SET_MESSAGE, DEFAULT_CHANNEL, DEVICE_RESET_COMMAND,
    DEVICE_SERIAL_OVERFLOW, FLASH_IN_USE_MESSAGE, FLASH_RESERVED_MESSAGE,
    HOST_CHANNEL_CHANGE, HOST_CHANNEL_CHANGE_INVALID, HOST_CHANNEL_CHANGE_SUCCESS,
    HOST_CHANNEL_QUERY, HOST_COMMS_TIMEOUT_MS, HOST_OVERFLOW_MESSAGE, HOST_TIME_SYNC,
    HOST_TIME_SYNC_ACK, INVALID_CODE_RECEIVED, MAX_NUMBER_OF_PACKETS, MAX_PACKET_SIZE_BYTES,
    PACKET_BAD_CHECK_SUM, PACKET_MISSED, POLL_TIME_DURATION_MS, RADIO_QUEUE_DEPTH,
    SERIAL_QUIET_TIME_MS, STREAM_BYTE_START,
};
use crate::error::Error;
use crate::hal::{ChannelStore, Clock, Radio, StoreError};
use crate::stream::StreamPacketBuffer;
use embedded_io::{Read, ReadReady, Write};
use heapless::Deque;

/// Identifies one Device on the radio link (Gazell-style links number them
/// 0..8). Ignored by Device-role sends, which always address the Host.
pub type DeviceId = u8;

/// The two fixed protocol roles. Chosen at construction, never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Faces the controlling computer; replies to Device-initiated traffic.
    Host,
    /// Faces the local microcontroller; initiates all radio contact.
    Device,
}

/// One received radio packet as queued between the receive callback and the
/// main loop.
#[derive(Debug, Clone, Copy)]
pub struct RadioFrame {
    /// Which Device sent the frame (or which Device to reply to).
    pub device: DeviceId,
    /// Received signal strength as reported by the radio. Recorded but not
    /// used by the protocol.
    pub rssi: i8,
    len: u8,
    data: [u8; MAX_PACKET_SIZE_BYTES],
}

impl RadioFrame {
    /// Copies `bytes` into a frame, rejecting anything longer than a radio
    /// packet.
    pub fn new(device: DeviceId, rssi: i8, bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() > MAX_PACKET_SIZE_BYTES {
            return Err(Error::FrameTooLong);
        }
        let mut data = [0u8; MAX_PACKET_SIZE_BYTES];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            device,
            rssi,
            len: bytes.len() as u8,
            data,
        })
    }

    /// The frame's bytes, header included for payload packets.
    pub fn bytes(&self) -> &[u8] {
        &self.data[..usize::from(self.len)]
    }
}

/// A Host/Device byte-stream bridge over a fixed-size packet radio.
///
/// `BridgeDriver` owns all protocol state for one peer and is the only
/// place that state is mutated, so a single instance driven from one loop
/// upholds the protocol's no-concurrent-access contract by construction.
///
/// ## Type Parameters
///
/// - `R`: the radio transmit capability ([`Radio`])
/// - `S`: the local serial port (`embedded-io` `Read + Write + ReadReady`)
/// - `C`: the monotonic time source ([`Clock`])
/// - `F`: non-volatile channel storage ([`ChannelStore`])
///
/// ## Notes
///
/// - Call [`begin`](Self::begin) once before anything else.
/// - Feed every radio receive notification to
///   [`on_receive`](Self::on_receive) and call
///   [`run_once`](Self::run_once) from the main loop.
/// - Radio and serial write failures inside the protocol are ignored; the
///   checksum/sequence machinery recovers lost traffic.
#[derive(Debug)]
pub struct BridgeDriver<R, S, C, F>
where
    R: Radio,
    S: Read + Write + ReadReady,
    C: Clock,
    F: ChannelStore,
{
    /// The role this instance was configured with.
    pub role: Role,
    /// Radio transmit capability.
    pub radio: R,
    /// Local byte-stream transport (PC for Host, microcontroller for
    /// Device).
    pub serial: S,
    /// Monotonic time source for all protocol timeouts.
    pub clock: C,
    /// Non-volatile channel storage.
    pub store: F,
    /// Outbound packets fragmented from local serial input.
    pub buffer_serial: Buffer,
    /// Inbound reassembly buffer for non-stream radio payload.
    pub buffer_radio: RadioBuffer,
    /// Host only: stream packets banked off the radio, pending serial
    /// output.
    pub buffer_stream_packets: Buffer,
    /// Device only: the inline stream-frame detector and staging buffer.
    pub stream_packet_buffer: StreamPacketBuffer,
    /// Count of packets handed to the radio.
    pub tx_good: u16,
    /// Count of payload packets accepted off the radio.
    pub rx_good: u16,
    /// Count of payload packets rejected (checksum failure or sequence
    /// gap).
    pub rx_bad: u16,
    rx_queue: Deque<RadioFrame, RADIO_QUEUE_DEPTH>,
    previous_packet_number: u8,
    radio_channel: u8,
    previous_radio_channel: u8,
    waiting_for_new_channel_number: bool,
    waiting_for_new_channel_number_confirmation: bool,
    last_time_host_heard_from_device: u32,
    last_time_new_serial_data: u32,
    time_of_last_poll: u32,
}

impl<R, S, C, F> BridgeDriver<R, S, C, F>
where
    R: Radio,
    S: Read + Write + ReadReady,
    C: Clock,
    F: ChannelStore,
{
    /// Creates a bridge for `role` over the given capabilities.
    ///
    /// The instance is inert until [`begin`](Self::begin) runs.
    pub fn new(role: Role, radio: R, serial: S, clock: C, store: F) -> Self {
        Self {
            role,
            radio,
            serial,
            clock,
            store,
            buffer_serial: Buffer::new(),
            buffer_radio: RadioBuffer::new(),
            buffer_stream_packets: Buffer::new(),
            stream_packet_buffer: StreamPacketBuffer::new(),
            rx_queue: Deque::new(),
            previous_packet_number: 0,
            radio_channel: DEFAULT_CHANNEL,
            previous_radio_channel: DEFAULT_CHANNEL,
            waiting_for_new_channel_number: false,
            waiting_for_new_channel_number_confirmation: false,
            last_time_host_heard_from_device: 0,
            last_time_new_serial_data: 0,
            time_of_last_poll: 0,
            tx_good: 0,
            rx_good: 0,
            rx_bad: 0,
        }
    }

    /// Brings the bridge up: resolves the radio channel, programs the
    /// radio, and cleans every buffer.
    ///
    /// # Behavior
    /// - If the store holds a channel, it wins.
    /// - On a never-configured store, `default_channel` is used; an
    ///   out-of-range default falls back to [`CHANNEL_LIMIT_LOWER`]. The
    ///   resolved value is persisted before use.
    /// - The Device resets its stream detector and starts its poll timer;
    ///   the Host prepares its stream-packet bank.
    ///
    /// # Errors
    /// Returns the store error if first-boot persistence fails; the bridge
    /// is then not configured and `begin` should be retried or the store
    /// repaired.
    pub fn begin(&mut self, default_channel: u8) -> Result<(), Error> {
        let channel = match self.store.read_channel() {
            Some(channel) => channel,
            None => {
                let channel = if default_channel > CHANNEL_LIMIT_UPPER {
                    CHANNEL_LIMIT_LOWER
                } else {
                    default_channel
                };
                self.store.write_channel(channel)?;
                channel
            }
        };
        self.radio_channel = channel;
        self.previous_radio_channel = channel;
        self.radio.set_channel(channel);
        self.buffer_radio.clean();
        self.clean_serial_buffer(MAX_NUMBER_OF_PACKETS);
        match self.role {
            Role::Device => {
                self.stream_packet_buffer.reset();
                self.poll_refresh();
                debug_log!("device radio up on channel {}", channel);
            }
            Role::Host => {
                self.buffer_stream_packets.clean_complete(MAX_NUMBER_OF_PACKETS);
                debug_log!("host radio up on channel {}", channel);
            }
        }
        Ok(())
    }

    /// The current runtime radio channel.
    pub fn channel(&self) -> u8 {
        self.radio_channel
    }

    /// Enqueues one received radio packet for the main loop.
    ///
    /// This is the only bridge method intended to be called from the radio
    /// receive callback; it copies the bytes and returns without touching
    /// protocol state. Everything else happens when
    /// [`process_radio`](Self::process_radio) pops the frame.
    ///
    /// # Errors
    /// - [`Error::FrameTooLong`] if `data` exceeds 32 bytes; the frame is
    ///   ignored.
    /// - [`Error::QueueFull`] if the main loop has fallen behind; the frame
    ///   is dropped. The peer's checksum/sequence tracking recovers as if
    ///   the packet were lost over the air.
    pub fn on_receive(&mut self, device: DeviceId, rssi: i8, data: &[u8]) -> Result<(), Error> {
        let frame = RadioFrame::new(device, rssi, data)?;
        self.rx_queue.push_back(frame).map_err(|_| Error::QueueFull)
    }

    /// Pops and handles every queued radio frame, in arrival order.
    ///
    /// Each frame runs the full receive state machine to completion
    /// (acknowledgement handling, control codes, payload validation and
    /// reassembly, and at most one outbound send) before the next frame is
    /// popped.
    pub fn process_radio(&mut self) {
        while let Some(frame) = self.rx_queue.pop_front() {
            self.handle_frame(&frame);
        }
    }

    /// Runs one main-loop iteration: queued radio frames, serial
    /// ingestion, and the role's periodic duties.
    pub fn run_once(&mut self) {
        self.process_radio();
        match self.role {
            Role::Host => self.run_host(),
            Role::Device => self.run_device(),
        }
    }

    fn run_host(&mut self) {
        if self.serial.read_ready().unwrap_or(false) {
            self.drain_serial();
        }
        if self.buffer_stream_packets.has_unsent() {
            self.flush_stream_packets();
        }
        if self.buffer_radio.ready_to_flush {
            self.flush_radio_buffer();
        }
    }

    fn run_device(&mut self) {
        if self.serial.read_ready().unwrap_or(false) {
            self.drain_serial();
        } else if self.poll_now() {
            self.poll_host();
        }
        let _ = self.launch_stream_packet();
        if self.buffer_serial.packets_to_send > 0
            && self.buffer_serial.packets_sent == 0
            && self.serial_quiet_long_enough()
        {
            // The Device opens every page itself; the rest of the page
            // rides on the Host's acknowledgements. Peer id is unused for
            // Device-role sends.
            self.send_buffered_packet(0);
        }
        if self.buffer_radio.ready_to_flush {
            self.flush_radio_buffer();
        }
    }

    /// Pulls every currently-available byte off the serial port into the
    /// outbound packet buffer.
    ///
    /// On the Device each accepted byte also runs through the stream-frame
    /// detector and refreshes the poll timer. If ingestion outgrows the
    /// buffer, the buffer has already reset itself; the overflow is
    /// signalled (Device: [`DEVICE_SERIAL_OVERFLOW`] to the Host plus a
    /// reset request to the microcontroller; Host: an operator message to
    /// the PC), the overflowing byte is dropped, and draining continues
    /// into the fresh buffer.
    pub fn drain_serial(&mut self) {
        let mut read_any = false;
        let mut byte = [0u8; 1];
        while self.serial.read_ready().unwrap_or(false) {
            let Ok(count) = self.serial.read(&mut byte) else {
                break;
            };
            if count == 0 {
                break;
            }
            read_any = true;
            if self.buffer_serial.push(byte[0]).is_err() {
                self.previous_packet_number = 0;
                self.signal_serial_overflow();
                continue;
            }
            if self.role == Role::Device {
                self.stream_packet_buffer
                    .process_byte(byte[0], self.clock.micros());
                self.poll_refresh();
            }
        }
        if read_any {
            self.last_time_new_serial_data = self.clock.millis();
        }
    }

    fn signal_serial_overflow(&mut self) {
        debug_log!("serial ingest overflow");
        match self.role {
            Role::Device => {
                let _ = self.radio.send_to_host(&[DEVICE_SERIAL_OVERFLOW]);
                // Ask the microcontroller to reset; its half of the
                // conversation is gone.
                let _ = self.serial.write_all(&[DEVICE_RESET_COMMAND]);
            }
            Role::Host => {
                let _ = self.serial.write_all(HOST_OVERFLOW_MESSAGE);
            }
        }
    }

    /// Cleans the first `packets` slots of the outbound buffer and resets
    /// the page-reassembly sequence state that goes with it.
    pub fn clean_serial_buffer(&mut self, packets: usize) {
        self.buffer_serial.clean(packets);
        self.previous_packet_number = 0;
    }

    // ---- receive state machine -------------------------------------------

    fn handle_frame(&mut self, frame: &RadioFrame) {
        if self.role == Role::Host {
            self.last_time_host_heard_from_device = self.clock.millis();
        }
        let data = frame.bytes();
        let mut send_from_buffer = false;
        match data.len() {
            0 => self.handle_ack(&mut send_from_buffer),
            1 => self.handle_control_code(frame.device, data[0], &mut send_from_buffer),
            _ => self.handle_payload_packet(frame.device, data, &mut send_from_buffer),
        }
        if send_from_buffer {
            self.send_buffered_packet(frame.device);
        }
    }

    /// A zero-length packet: pure acknowledgement/keepalive.
    fn handle_ack(&mut self, send_from_buffer: &mut bool) {
        if self.waiting_for_new_channel_number_confirmation {
            // The Device polled us on the new channel; the handshake is
            // done.
            self.waiting_for_new_channel_number_confirmation = false;
            let _ = self.serial.write_all(&[HOST_CHANNEL_CHANGE_SUCCESS]);
            debug_log!("channel change confirmed");
        } else if self.buffer_serial.has_unsent() {
            if self.serial_quiet_long_enough() {
                *send_from_buffer = true;
            }
        } else if self.buffer_serial.is_drained() {
            let sent = self.buffer_serial.packets_sent;
            self.clean_serial_buffer(sent);
        }
    }

    /// A 1-byte packet: link control, never data.
    fn handle_control_code(&mut self, device: DeviceId, code: u8, send_from_buffer: &mut bool) {
        if self.waiting_for_new_channel_number {
            // Armed by CHANGE_CHANNEL_HOST_REQUEST: this byte is the new
            // channel, not a code.
            self.waiting_for_new_channel_number = false;
            self.poll_refresh();
            if self.set_channel_number(code).is_ok() {
                self.radio_channel = code.min(CHANNEL_LIMIT_UPPER);
                self.radio.set_channel(self.radio_channel);
                // Poll the Host, which should have swapped over by now.
                self.poll_host();
                debug_log!("adopted channel {}", self.radio_channel);
            }
            return;
        }
        match code {
            PACKET_BAD_CHECK_SUM => {
                // Resend the last sent packet. Nothing repopulates the
                // buffer mid-page, so the packet's bytes are still in
                // place.
                self.buffer_serial.packets_sent =
                    self.buffer_serial.packets_sent.saturating_sub(1);
                *send_from_buffer = true;
                debug_log!("peer reported bad checksum");
            }
            PACKET_MISSED => {
                // Start the page over from its first packet.
                self.buffer_serial.packets_sent = 0;
                *send_from_buffer = true;
                debug_log!("peer missed a packet");
            }
            CHANGE_CHANNEL_HOST_REQUEST => match self.role {
                // Only a Host originates the request, so a Host receiving
                // one is seeing garbage.
                Role::Host => {
                    let _ = self.radio.send_to_device(device, &[INVALID_CODE_RECEIVED]);
                }
                Role::Device => {
                    self.waiting_for_new_channel_number = true;
                    let _ = self.radio.send_to_host(&[CHANGE_CHANNEL_DEVICE_READY]);
                    self.poll_refresh();
                    debug_log!("armed for new channel number");
                }
            },
            CHANGE_CHANNEL_DEVICE_READY => match self.role {
                Role::Host => {
                    // Hand the Device the target channel, then persist and
                    // retune our own side.
                    let channel = self.radio_channel;
                    let _ = self.radio.send_to_device(device, &[channel]);
                    let _ = self.set_channel_number(channel);
                    self.radio.set_channel(channel);
                    self.waiting_for_new_channel_number_confirmation = true;
                    debug_log!("sent new channel {}", channel);
                }
                Role::Device => {
                    // Host-originated ready codes should not reach us;
                    // forward it back rather than act on it.
                    let _ = self.radio.send_to_host(&[CHANGE_CHANNEL_DEVICE_READY]);
                    self.poll_refresh();
                }
            },
            _ => {
                debug_log!("invalid control code {}", code);
                self.reply(device, INVALID_CODE_RECEIVED);
            }
        }
    }

    /// A payload-bearing packet: validate, sequence-check, reassemble.
    fn handle_payload_packet(&mut self, device: DeviceId, data: &[u8], send_from_buffer: &mut bool) {
        let byte_id = data[0];
        let number = byteid::packet_number(byte_id);
        let mut got_last_packet = false;

        // A packet number of 0 marks an actionable end of transmission;
        // multi-packet pages count down to it by exactly one per packet.
        let rejection = if !byteid::checksums_match(data) {
            Some(PACKET_BAD_CHECK_SUM)
        } else if number == 0 && self.previous_packet_number == 0 {
            // One-packet page.
            got_last_packet = true;
            None
        } else if number > 0 && self.previous_packet_number == 0 {
            // First of several.
            self.previous_packet_number = number;
            None
        } else if self.previous_packet_number.wrapping_sub(number) == 1 {
            self.previous_packet_number = number;
            if number == 0 {
                got_last_packet = true;
            }
            None
        } else {
            // Gap: drop the partial page and ask for it from the top.
            self.buffer_radio.rewind();
            self.previous_packet_number = 0;
            Some(PACKET_MISSED)
        };

        match rejection {
            Some(code) => {
                self.rx_bad = self.rx_bad.wrapping_add(1);
                debug_log!("rejected packet {} with code {}", number, code);
                self.reply(device, code);
            }
            None => {
                self.rx_good = self.rx_good.wrapping_add(1);
                if byteid::is_stream(byte_id) {
                    // Bank it; stream packets are written to the serial
                    // port from the main loop, never from here.
                    self.buffer_stream_packets.add_raw_packet(data);
                } else {
                    let _ = self.buffer_radio.extend(&data[1..]);
                    if got_last_packet {
                        self.buffer_radio.ready_to_flush = true;
                    }
                }
                // The exchange carries both directions: check whether our
                // own outbound page owes the peer anything.
                if self.buffer_serial.has_unsent() {
                    if self.serial_quiet_long_enough() {
                        *send_from_buffer = true;
                    }
                } else if self.buffer_serial.is_drained() {
                    let sent = self.buffer_serial.packets_sent;
                    self.clean_serial_buffer(sent);
                } else if self.role == Role::Device {
                    self.poll_host();
                }
            }
        }
    }

    fn reply(&mut self, device: DeviceId, code: u8) {
        match self.role {
            Role::Host => {
                let _ = self.radio.send_to_device(device, &[code]);
            }
            Role::Device => {
                let _ = self.radio.send_to_host(&[code]);
                self.poll_refresh();
            }
        }
    }

    // ---- send path -------------------------------------------------------

    fn send_buffered_packet(&mut self, device: DeviceId) {
        let index = self.buffer_serial.packets_sent;
        if index >= self.buffer_serial.packets_to_send {
            return;
        }
        let number = (self.buffer_serial.packets_to_send - index - 1) as u8;
        let packet = &mut self.buffer_serial.packets[index];
        let end = packet.position_write;
        packet.data[0] = byteid::make_byte_id(false, number, &packet.data[1..end]);

        match self.role {
            Role::Host => self.send_host_packet(device, index, number),
            Role::Device => {
                let _ = self
                    .radio
                    .send_to_host(&self.buffer_serial.packets[index].data[..end]);
                self.tx_good = self.tx_good.wrapping_add(1);
                self.poll_refresh();
                self.buffer_serial.packets_sent += 1;
                debug_log!("sent packet {} to host", number);
            }
        }
    }

    /// Host send with single-packet PC command interpretation layered in
    /// front of generic forwarding.
    fn send_host_packet(&mut self, device: DeviceId, index: usize, number: u8) {
        let single_packet = self.buffer_serial.packets_to_send == 1 && number == 0;
        let end = self.buffer_serial.packets[index].position_write;

        if single_packet && end == 2 {
            match self.buffer_serial.packets[index].data[1] {
                HOST_TIME_SYNC => {
                    // Ack to the driver software first so it can timestamp
                    // the moment the packet left.
                    let _ = self.serial.write_all(&[HOST_TIME_SYNC_ACK]);
                    self.forward_to_device(device, index);
                }
                HOST_CHANNEL_QUERY => {
                    let channel = self.store.read_channel().unwrap_or(self.radio_channel);
                    let _ = self.serial.write_all(&[channel]);
                    // Answered locally; nothing crosses the radio.
                    self.clean_serial_buffer(1);
                    return;
                }
                _ => self.forward_to_device(device, index),
            }
        } else if single_packet
            && end == 3
            && self.buffer_serial.packets[index].data[1] == HOST_CHANNEL_CHANGE
        {
            let requested = self.buffer_serial.packets[index].data[2];
            if requested > CHANNEL_LIMIT_UPPER {
                let _ = self.serial.write_all(&[HOST_CHANNEL_CHANGE_INVALID]);
            } else {
                self.previous_radio_channel = self.radio_channel;
                self.radio_channel = requested;
                debug_log!("requesting channel change to {}", requested);
                let _ = self
                    .radio
                    .send_to_device(device, &[CHANGE_CHANNEL_HOST_REQUEST]);
            }
        } else {
            self.forward_to_device(device, index);
        }
        self.buffer_serial.packets_sent += 1;
    }

    fn forward_to_device(&mut self, device: DeviceId, index: usize) {
        let packet = &self.buffer_serial.packets[index];
        let _ = self.radio.send_to_device(device, packet.bytes());
        self.tx_good = self.tx_good.wrapping_add(1);
    }

    /// Sends the staged stream frame to the Host, if one is ready and its
    /// quiet window has passed.
    ///
    /// # Behavior
    /// - Stamps the stream byte id (stream flag + 4-bit sub-type +
    ///   checksum) over the staging buffer's header slot and sends all 32
    ///   bytes.
    /// - Drops the outbound serial buffer afterwards: the frame's bytes
    ///   were duplicated into it during ingestion and must not also go out
    ///   as a message page.
    /// - Refreshes the poll timer; the send itself is the Device's contact.
    ///
    /// # Errors
    /// - [`nb::Error::WouldBlock`] until a frame is staged *and*
    ///   [`STREAM_DISPATCH_DELAY_US`](crate::consts::STREAM_DISPATCH_DELAY_US)
    ///   has passed since its tail byte.
    /// - [`Error::NotDevice`] for Host-role bridges.
    pub fn launch_stream_packet(&mut self) -> nb::Result<(), Error> {
        if self.role != Role::Device {
            return Err(nb::Error::Other(Error::NotDevice));
        }
        if !self.stream_packet_buffer.ready_for_launch()
            || !self
                .stream_packet_buffer
                .dispatch_delay_elapsed(self.clock.micros())
        {
            return Err(nb::Error::WouldBlock);
        }
        let packet_type = self.stream_packet_buffer.packet_type();
        self.stream_packet_buffer.data[0] =
            byteid::make_byte_id(true, packet_type, &self.stream_packet_buffer.data[1..]);
        let _ = self.radio.send_to_host(&self.stream_packet_buffer.data);
        self.tx_good = self.tx_good.wrapping_add(1);

        let pending = self.buffer_serial.packets_to_send;
        self.clean_serial_buffer(pending);
        self.stream_packet_buffer.reset();
        self.poll_refresh();
        debug_log!("launched stream packet type {}", packet_type);
        Ok(())
    }

    // ---- serial flush ----------------------------------------------------

    /// Writes the reassembled inbound bytes to the serial port and resets
    /// the reassembly buffer.
    pub fn flush_radio_buffer(&mut self) {
        let _ = self.serial.write_all(self.buffer_radio.bytes());
        self.buffer_radio.clean();
    }

    /// Host only: drains every banked stream packet to the serial port as
    /// start byte + 31 payload bytes + stop byte, then resets the bank.
    pub fn flush_stream_packets(&mut self) {
        while self.buffer_stream_packets.has_unsent() {
            let index = self.buffer_stream_packets.packets_sent;
            let byte_id = self.buffer_stream_packets.packets[index].data[0];
            let _ = self.serial.write_all(&[STREAM_BYTE_START]);
            let _ = self.serial.write_all(
                &self.buffer_stream_packets.packets[index].data[1..MAX_PACKET_SIZE_BYTES],
            );
            let _ = self.serial.write_all(&[byteid::stop_byte(byte_id)]);
            self.buffer_stream_packets.packets_sent += 1;
        }
        let pending = self.buffer_stream_packets.packets_to_send;
        self.buffer_stream_packets.clean_complete(pending);
    }

    // ---- channel management ----------------------------------------------

    /// Persists `channel` (clamped to [`CHANNEL_LIMIT_UPPER`]) to the
    /// store.
    ///
    /// The runtime channel is untouched; callers retune the radio
    /// themselves once persistence succeeds. On the Host, the outcome is
    /// also reported to the operator over the serial port.
    pub fn set_channel_number(&mut self, channel: u8) -> Result<(), Error> {
        let channel = channel.min(CHANNEL_LIMIT_UPPER);
        match self.store.write_channel(channel) {
            Ok(()) => {
                if self.role == Role::Host {
                    let _ = self.serial.write_all(CHANNEL_SET_MESSAGE);
                }
                Ok(())
            }
            Err(error) => {
                if self.role == Role::Host {
                    let message = match error {
                        StoreError::ReservedRegion => FLASH_RESERVED_MESSAGE,
                        StoreError::RegionInUse => FLASH_IN_USE_MESSAGE,
                    };
                    let _ = self.serial.write_all(message);
                }
                Err(Error::Store(error))
            }
        }
    }

    /// Retunes the radio back to the channel recorded before the last
    /// change request. Manual fallback for a handshake that half-failed.
    pub fn revert_to_previous_channel(&mut self) {
        self.radio_channel = self.previous_radio_channel;
        self.radio.set_channel(self.radio_channel);
    }

    // ---- timers ----------------------------------------------------------

    /// Device: true when the poll interval has elapsed since the last
    /// contact with the Host.
    pub fn poll_now(&self) -> bool {
        self.clock
            .millis()
            .wrapping_sub(self.time_of_last_poll)
            > POLL_TIME_DURATION_MS
    }

    /// Device: sends a zero-length keepalive to the Host and restarts the
    /// poll timer.
    pub fn poll_host(&mut self) {
        let _ = self.radio.send_to_host(&[]);
        self.poll_refresh();
    }

    /// Restarts the poll timer; any send to the Host counts as contact.
    pub fn poll_refresh(&mut self) {
        self.time_of_last_poll = self.clock.millis();
    }

    /// Host: true when nothing has arrived from the Device for twice the
    /// poll interval. The first line of defense against a lost link.
    pub fn device_silent_too_long(&self) -> bool {
        self.clock
            .millis()
            .wrapping_sub(self.last_time_host_heard_from_device)
            > HOST_COMMS_TIMEOUT_MS
    }

    fn serial_quiet_long_enough(&self) -> bool {
        self.clock
            .millis()
            .wrapping_sub(self.last_time_new_serial_data)
            > SERIAL_QUIET_TIME_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{
        MAX_DATA_BYTES_IN_PACKET, RADIO_BUFFER_LEN, STREAM_DISPATCH_DELAY_US, STREAM_PACKET_HEAD,
    };
    use core::cell::Cell;
    use core::convert::Infallible;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, Default)]
    struct MockRadio {
        to_host: Vec<Vec<u8>>,
        to_device: Vec<(DeviceId, Vec<u8>)>,
        channel: u8,
    }

    impl Radio for MockRadio {
        type Error = Infallible;

        fn send_to_device(&mut self, device: DeviceId, data: &[u8]) -> Result<(), Self::Error> {
            self.to_device.push((device, data.to_vec()));
            Ok(())
        }

        fn send_to_host(&mut self, data: &[u8]) -> Result<(), Self::Error> {
            self.to_host.push(data.to_vec());
            Ok(())
        }

        fn set_channel(&mut self, channel: u8) {
            self.channel = channel;
        }
    }

    #[derive(Debug, Default)]
    struct MockSerial {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl embedded_io::ErrorType for MockSerial {
        type Error = Infallible;
    }

    impl Read for MockSerial {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            let mut count = 0;
            for slot in buf.iter_mut() {
                match self.rx.pop_front() {
                    Some(byte) => {
                        *slot = byte;
                        count += 1;
                    }
                    None => break,
                }
            }
            Ok(count)
        }
    }

    impl ReadReady for MockSerial {
        fn read_ready(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.rx.is_empty())
        }
    }

    impl Write for MockSerial {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[derive(Debug, Clone, Default)]
    struct MockClock {
        now: Rc<Cell<(u32, u32)>>,
    }

    impl MockClock {
        fn advance_ms(&self, ms: u32) {
            let (millis, micros) = self.now.get();
            self.now.set((millis + ms, micros + ms * 1_000));
        }

        fn advance_us(&self, us: u32) {
            let (millis, micros) = self.now.get();
            self.now.set((millis, micros + us));
        }
    }

    impl Clock for MockClock {
        fn millis(&self) -> u32 {
            self.now.get().0
        }

        fn micros(&self) -> u32 {
            self.now.get().1
        }
    }

    #[derive(Debug, Clone, Default)]
    struct MockStore {
        channel: Rc<Cell<Option<u8>>>,
        fail: Rc<Cell<Option<StoreError>>>,
    }

    impl ChannelStore for MockStore {
        fn read_channel(&mut self) -> Option<u8> {
            self.channel.get()
        }

        fn write_channel(&mut self, channel: u8) -> Result<(), StoreError> {
            if let Some(error) = self.fail.get() {
                return Err(error);
            }
            self.channel.set(Some(channel));
            Ok(())
        }
    }

    type TestBridge = BridgeDriver<MockRadio, MockSerial, MockClock, MockStore>;

    fn bridge(role: Role) -> (TestBridge, MockClock, MockStore) {
        let clock = MockClock::default();
        let store = MockStore::default();
        let mut bridge = BridgeDriver::new(
            role,
            MockRadio::default(),
            MockSerial::default(),
            clock.clone(),
            store.clone(),
        );
        bridge.begin(DEFAULT_CHANNEL).unwrap();
        (bridge, clock, store)
    }

    fn payload_packet(number: u8, payload: &[u8]) -> Vec<u8> {
        let mut packet = vec![byteid::make_byte_id(false, number, payload)];
        packet.extend_from_slice(payload);
        packet
    }

    fn deliver(bridge: &mut TestBridge, data: &[u8]) {
        bridge.on_receive(0, 0, data).unwrap();
        bridge.process_radio();
    }

    #[test]
    fn test_begin_persists_default_channel() {
        let (bridge, _clock, store) = bridge(Role::Device);
        assert_eq!(store.channel.get(), Some(DEFAULT_CHANNEL));
        assert_eq!(bridge.radio.channel, DEFAULT_CHANNEL);
        assert_eq!(bridge.channel(), DEFAULT_CHANNEL);
    }

    #[test]
    fn test_begin_out_of_range_default_falls_back() {
        let clock = MockClock::default();
        let store = MockStore::default();
        let mut bridge = BridgeDriver::new(
            Role::Host,
            MockRadio::default(),
            MockSerial::default(),
            clock,
            store.clone(),
        );
        bridge.begin(99).unwrap();
        assert_eq!(store.channel.get(), Some(CHANNEL_LIMIT_LOWER));
    }

    #[test]
    fn test_begin_prefers_persisted_channel() {
        let clock = MockClock::default();
        let store = MockStore::default();
        store.channel.set(Some(7));
        let mut bridge = BridgeDriver::new(
            Role::Host,
            MockRadio::default(),
            MockSerial::default(),
            clock,
            store,
        );
        bridge.begin(DEFAULT_CHANNEL).unwrap();
        assert_eq!(bridge.channel(), 7);
        assert_eq!(bridge.radio.channel, 7);
    }

    #[test]
    fn test_zero_length_ack_sends_exactly_one_packet() {
        let (mut bridge, clock, _store) = bridge(Role::Device);
        bridge.serial.rx.extend([0x10, 0x20, 0x30]);
        bridge.drain_serial();
        assert_eq!(bridge.buffer_serial.packets_to_send, 1);

        // Quiet window not yet elapsed: the ack must not trigger a send.
        deliver(&mut bridge, &[]);
        assert!(bridge.radio.to_host.is_empty());

        clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);
        deliver(&mut bridge, &[]);
        assert_eq!(bridge.radio.to_host.len(), 1);
        let sent = &bridge.radio.to_host[0];
        assert_eq!(byteid::packet_number(sent[0]), 0);
        assert_eq!(&sent[1..], &[0x10, 0x20, 0x30]);

        // The page is drained; the next ack cleans up instead of resending.
        deliver(&mut bridge, &[]);
        assert_eq!(bridge.radio.to_host.len(), 1);
        assert_eq!(bridge.buffer_serial.packets_to_send, 0);
    }

    #[test]
    fn test_device_main_loop_opens_the_page() {
        let (mut bridge, clock, _store) = bridge(Role::Device);
        bridge.serial.rx.extend([0xAA, 0xBB]);
        bridge.run_once();
        // Bytes ingested, but the port only just went quiet.
        assert!(bridge.radio.to_host.iter().all(|frame| frame.is_empty()));

        clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);
        bridge.run_once();
        let opened = bridge
            .radio
            .to_host
            .iter()
            .find(|frame| !frame.is_empty())
            .expect("first packet should have been sent");
        assert_eq!(&opened[1..], &[0xAA, 0xBB]);
        assert_eq!(bridge.buffer_serial.packets_sent, 1);
    }

    #[test]
    fn test_corrupted_packet_rejected_without_state_change() {
        let (mut bridge, _clock, _store) = bridge(Role::Device);
        let mut packet = payload_packet(0, &[1, 2, 3, 4]);
        packet[2] ^= 0x01;

        deliver(&mut bridge, &packet);

        assert_eq!(bridge.radio.to_host.last().unwrap(), &[PACKET_BAD_CHECK_SUM]);
        assert_eq!(bridge.previous_packet_number, 0);
        assert!(bridge.buffer_radio.bytes().is_empty());
        assert_eq!(bridge.rx_bad, 1);
    }

    #[test]
    fn test_bad_checksum_code_resends_current_packet() {
        let (mut bridge, clock, _store) = bridge(Role::Device);
        let bytes: Vec<u8> = (0..40u8).collect();
        bridge.serial.rx.extend(bytes);
        bridge.drain_serial();
        assert_eq!(bridge.buffer_serial.packets_to_send, 2);

        clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);
        deliver(&mut bridge, &[]);
        assert_eq!(bridge.radio.to_host.len(), 1);
        assert_eq!(bridge.buffer_serial.packets_sent, 1);

        // The peer saw garbage: exactly the same packet goes out again.
        deliver(&mut bridge, &[PACKET_BAD_CHECK_SUM]);
        assert_eq!(bridge.radio.to_host.len(), 2);
        assert_eq!(bridge.radio.to_host[0], bridge.radio.to_host[1]);
        assert_eq!(bridge.buffer_serial.packets_sent, 1);
    }

    #[test]
    fn test_packet_missed_code_restarts_the_page() {
        let (mut bridge, clock, _store) = bridge(Role::Device);
        bridge.serial.rx.extend((0..40u8).collect::<Vec<u8>>());
        bridge.drain_serial();

        clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);
        deliver(&mut bridge, &[]);
        deliver(&mut bridge, &[]);
        assert_eq!(bridge.buffer_serial.packets_sent, 2);

        deliver(&mut bridge, &[PACKET_MISSED]);
        assert_eq!(bridge.buffer_serial.packets_sent, 1);
        assert_eq!(bridge.radio.to_host.len(), 3);
        assert_eq!(bridge.radio.to_host[0], bridge.radio.to_host[2]);
    }

    #[test]
    fn test_multi_packet_page_reassembles_in_order() {
        let (mut bridge, _clock, _store) = bridge(Role::Host);
        deliver(&mut bridge, &payload_packet(2, b"first-"));
        deliver(&mut bridge, &payload_packet(1, b"second-"));
        assert!(!bridge.buffer_radio.ready_to_flush);
        deliver(&mut bridge, &payload_packet(0, b"third"));
        assert!(bridge.buffer_radio.ready_to_flush);

        bridge.flush_radio_buffer();
        assert_eq!(bridge.serial.tx, b"first-second-third");
        assert!(!bridge.buffer_radio.ready_to_flush);
        assert_eq!(bridge.buffer_radio.bytes().len(), 0);
    }

    #[test]
    fn test_out_of_order_packet_requests_page_restart() {
        let (mut bridge, _clock, _store) = bridge(Role::Host);
        deliver(&mut bridge, &payload_packet(3, b"abc"));
        assert_eq!(bridge.previous_packet_number, 3);

        // 3 then 1: packet 2 went missing.
        deliver(&mut bridge, &payload_packet(1, b"def"));
        assert_eq!(bridge.radio.to_device.last().unwrap().1, vec![PACKET_MISSED]);
        assert_eq!(bridge.previous_packet_number, 0);
        assert!(bridge.buffer_radio.bytes().is_empty());
    }

    #[test]
    fn test_invalid_control_code_gets_replied_to() {
        let (mut bridge, _clock, _store) = bridge(Role::Device);
        deliver(&mut bridge, &[0x1F]);
        assert_eq!(
            bridge.radio.to_host.last().unwrap(),
            &[INVALID_CODE_RECEIVED]
        );
    }

    #[test]
    fn test_stream_packet_banked_and_flushed_with_framing() {
        let (mut bridge, _clock, _store) = bridge(Role::Host);
        let payload: Vec<u8> = (0..MAX_DATA_BYTES_IN_PACKET as u8).collect();
        let mut packet = vec![byteid::make_byte_id(true, 3, &payload)];
        packet.extend_from_slice(&payload);

        deliver(&mut bridge, &packet);
        assert_eq!(bridge.buffer_stream_packets.packets_to_send, 1);
        // Nothing reaches the serial port from the receive path.
        assert!(bridge.serial.tx.is_empty());

        bridge.run_once();
        let mut expected = vec![STREAM_BYTE_START];
        expected.extend_from_slice(&payload);
        expected.push(0xC3);
        assert_eq!(bridge.serial.tx, expected);
        assert_eq!(bridge.buffer_stream_packets.packets_to_send, 0);
    }

    #[test]
    fn test_stream_frame_detected_and_launched_end_to_end() {
        let (mut bridge, clock, _store) = bridge(Role::Device);
        let payload: Vec<u8> = (100..131u8).collect();
        bridge.serial.rx.push_back(STREAM_PACKET_HEAD);
        bridge.serial.rx.extend(payload.clone());
        bridge.serial.rx.push_back(0xF3);
        bridge.drain_serial();
        assert!(bridge.stream_packet_buffer.ready_for_launch());
        assert_eq!(bridge.stream_packet_buffer.type_byte, 0xF3);

        // Still inside the dispatch quiet window.
        assert_eq!(
            bridge.launch_stream_packet(),
            Err(nb::Error::WouldBlock)
        );

        clock.advance_us(STREAM_DISPATCH_DELAY_US + 1);
        bridge.launch_stream_packet().unwrap();

        let sent = bridge.radio.to_host.last().unwrap();
        assert_eq!(sent.len(), MAX_PACKET_SIZE_BYTES);
        assert!(byteid::is_stream(sent[0]));
        assert_eq!(byteid::stream_packet_type(sent[0]), 3);
        assert_eq!(&sent[1..], payload.as_slice());

        // The frame's bytes were also ingested as ordinary serial data;
        // launching must have discarded that duplicate page.
        assert_eq!(bridge.buffer_serial.packets_to_send, 0);
    }

    #[test]
    fn test_channel_change_full_round_trip() {
        let (mut host, host_clock, host_store) = bridge(Role::Host);
        let (mut device, _device_clock, device_store) = bridge(Role::Device);
        let target = 12u8;

        // PC asks for the change.
        host.serial.rx.extend([HOST_CHANNEL_CHANGE, target]);
        host.drain_serial();
        host_clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);

        // Device polls; Host answers with the request code.
        deliver(&mut host, &[]);
        let (_, request) = host.radio.to_device.pop().unwrap();
        assert_eq!(request, vec![CHANGE_CHANNEL_HOST_REQUEST]);

        deliver(&mut device, &request);
        let ready = device.radio.to_host.pop().unwrap();
        assert_eq!(ready, vec![CHANGE_CHANNEL_DEVICE_READY]);

        deliver(&mut host, &ready);
        let (_, channel_byte) = host.radio.to_device.pop().unwrap();
        assert_eq!(channel_byte, vec![target]);
        assert_eq!(host.channel(), target);
        assert_eq!(host.radio.channel, target);
        assert_eq!(host_store.channel.get(), Some(target));

        deliver(&mut device, &channel_byte);
        assert_eq!(device.channel(), target);
        assert_eq!(device.radio.channel, target);
        assert_eq!(device_store.channel.get(), Some(target));
        // The Device polls the Host on the new channel...
        let poll = device.radio.to_host.pop().unwrap();
        assert!(poll.is_empty());

        // ...and that poll completes the handshake on the Host.
        deliver(&mut host, &poll);
        assert_eq!(
            host.serial.tx.last().copied(),
            Some(HOST_CHANNEL_CHANGE_SUCCESS)
        );
    }

    #[test]
    fn test_channel_change_aborts_when_device_cannot_persist() {
        let (mut device, _clock, store) = bridge(Role::Device);
        let original = device.channel();
        store.fail.set(Some(StoreError::ReservedRegion));

        deliver(&mut device, &[CHANGE_CHANNEL_HOST_REQUEST]);
        assert_eq!(
            device.radio.to_host.pop().unwrap(),
            vec![CHANGE_CHANNEL_DEVICE_READY]
        );

        deliver(&mut device, &[12]);
        assert_eq!(device.channel(), original);
        assert_eq!(device.radio.channel, original);
        assert_eq!(store.channel.get(), Some(original));
        // No adoption poll either: the Device stays on the old channel.
        assert!(device.radio.to_host.iter().all(|frame| !frame.is_empty()));
    }

    #[test]
    fn test_out_of_range_channel_request_rejected_locally() {
        let (mut host, clock, _store) = bridge(Role::Host);
        host.serial.rx.extend([HOST_CHANNEL_CHANGE, CHANNEL_LIMIT_UPPER + 1]);
        host.drain_serial();
        clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);

        deliver(&mut host, &[]);
        assert!(host.radio.to_device.is_empty());
        assert_eq!(
            host.serial.tx.last().copied(),
            Some(HOST_CHANNEL_CHANGE_INVALID)
        );
    }

    #[test]
    fn test_host_time_sync_acked_then_forwarded() {
        let (mut host, clock, _store) = bridge(Role::Host);
        host.serial.rx.push_back(HOST_TIME_SYNC);
        host.drain_serial();
        clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);

        deliver(&mut host, &[]);
        assert_eq!(host.serial.tx, vec![HOST_TIME_SYNC_ACK]);
        let (_, forwarded) = host.radio.to_device.pop().unwrap();
        assert_eq!(forwarded[1], HOST_TIME_SYNC);
    }

    #[test]
    fn test_host_channel_query_answered_locally() {
        let (mut host, clock, _store) = bridge(Role::Host);
        host.serial.rx.push_back(HOST_CHANNEL_QUERY);
        host.drain_serial();
        clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);

        deliver(&mut host, &[]);
        assert_eq!(host.serial.tx, vec![DEFAULT_CHANNEL]);
        assert!(host.radio.to_device.is_empty());
        assert_eq!(host.buffer_serial.packets_to_send, 0);
    }

    #[test]
    fn test_device_overflow_signals_host_and_requests_reset() {
        let (mut bridge, _clock, _store) = bridge(Role::Device);
        for _ in 0..=RADIO_BUFFER_LEN {
            bridge.serial.rx.push_back(0x55);
        }
        bridge.drain_serial();

        assert!(bridge
            .radio
            .to_host
            .contains(&vec![DEVICE_SERIAL_OVERFLOW]));
        assert!(bridge.serial.tx.contains(&DEVICE_RESET_COMMAND));
        assert_eq!(bridge.buffer_serial.packets_to_send, 0);
    }

    #[test]
    fn test_host_overflow_reports_to_pc() {
        let (mut host, _clock, _store) = bridge(Role::Host);
        for _ in 0..=RADIO_BUFFER_LEN {
            host.serial.rx.push_back(0x55);
        }
        host.drain_serial();

        let tx = host.serial.tx.clone();
        assert!(tx
            .windows(HOST_OVERFLOW_MESSAGE.len())
            .any(|window| window == HOST_OVERFLOW_MESSAGE));
    }

    #[test]
    fn test_device_polls_host_on_schedule() {
        let (mut bridge, clock, _store) = bridge(Role::Device);
        bridge.run_once();
        assert!(bridge.radio.to_host.is_empty());

        clock.advance_ms(POLL_TIME_DURATION_MS + 1);
        bridge.run_once();
        assert_eq!(bridge.radio.to_host.len(), 1);
        assert!(bridge.radio.to_host[0].is_empty());

        // Refreshed: no second poll until the interval passes again.
        bridge.run_once();
        assert_eq!(bridge.radio.to_host.len(), 1);
    }

    #[test]
    fn test_receive_queue_bounds_and_rejects() {
        let (mut bridge, _clock, _store) = bridge(Role::Host);
        for _ in 0..RADIO_QUEUE_DEPTH {
            bridge.on_receive(0, 0, &[]).unwrap();
        }
        assert_eq!(bridge.on_receive(0, 0, &[]), Err(Error::QueueFull));
        assert_eq!(
            bridge.on_receive(0, 0, &[0u8; MAX_PACKET_SIZE_BYTES + 1]),
            Err(Error::FrameTooLong)
        );
    }

    #[test]
    fn test_host_watchdog_notices_silent_device() {
        let (mut host, clock, _store) = bridge(Role::Host);
        clock.advance_ms(HOST_COMMS_TIMEOUT_MS + 1);
        assert!(host.device_silent_too_long());

        deliver(&mut host, &[]);
        assert!(!host.device_silent_too_long());
    }

    #[test]
    fn test_revert_to_previous_channel() {
        let (mut host, clock, _store) = bridge(Role::Host);
        host.serial.rx.extend([HOST_CHANNEL_CHANGE, 3]);
        host.drain_serial();
        clock.advance_ms(SERIAL_QUIET_TIME_MS + 1);
        deliver(&mut host, &[]);
        assert_eq!(host.channel(), 3);

        host.revert_to_previous_channel();
        assert_eq!(host.channel(), DEFAULT_CHANNEL);
        assert_eq!(host.radio.channel, DEFAULT_CHANNEL);
    }
}
