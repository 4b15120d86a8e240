//! # rfbridge
//!
//! A portable, no_std reliable byte-stream bridge for Host/Device radio pairs
//! that can only exchange packets of at most 32 bytes (e.g. Gazell-style
//! 2.4 GHz links between a USB dongle and a board-mounted module).
//!
//! The bridge moves an arbitrary-length serial byte stream across the radio
//! by:
//! - fragmenting outbound bytes into pages of fixed-size packets with a
//!   1-byte header carrying a stream flag, packet number, and 3-bit checksum
//! - reassembling pages losslessly on the receiving side, requesting
//!   retransmission on checksum failure and page restart on sequence gaps
//! - detecting high-rate "stream" telemetry frames inline in the Device's
//!   local serial traffic and forwarding them best-effort
//! - negotiating radio channel changes with a two-phase in-band handshake
//!   coordinated with non-volatile channel persistence
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` and enables `std` support in `thiserror`, `critical-section`, and `log` |
//! | `radio-isr` (default) | `critical_section`-guarded global bridge helpers for wiring the radio receive interrupt |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Roles
//!
//! Every bridge instance runs as exactly one of two roles for its lifetime:
//! - **Host**: faces a controlling computer over its serial port; replies to
//!   Device traffic and interprets single-packet PC commands (time sync,
//!   channel query, channel change).
//! - **Device**: faces a local microcontroller over its serial port; must
//!   initiate all radio contact, so it polls the Host with zero-length
//!   packets at a fixed interval even when it has nothing to send.
//!
//! ## Usage
//!
//! ```ignore
//! use rfbridge::driver::{BridgeDriver, Role};
//!
//! let mut bridge = BridgeDriver::new(Role::Device, radio, serial, clock, store);
//! bridge.begin(rfbridge::consts::DEFAULT_CHANNEL)?;
//!
//! // From the radio receive interrupt (or its queue shim):
//! //     bridge.on_receive(device, rssi, data)
//! loop {
//!     bridge.run_once(); // Drains serial, processes queued frames, polls
//! }
//! ```
//!
//! Or, use `timer::run_bridge_loop()` with a `DelayNs` implementation.
//!
//! ## Integration Notes
//!
//! - `on_receive` only enqueues; all protocol state is mutated from
//!   `run_once()`/`process_radio()` on the main loop, so the receive
//!   interrupt never races the rest of the bridge.
//! - Only one bridge instance should be active at a time in interrupt-driven
//!   mode (see the `radio-isr` helpers in [`isr`]).
//! - All timeouts are `u32` millisecond/microsecond comparisons with
//!   wrapping arithmetic; the [`hal::Clock`] source must be monotonic.
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "radio-isr")]
pub use critical_section;

pub use heapless;

macro_rules! debug_log {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
        #[cfg(feature = "defmt-0-3")]
        ::defmt::debug!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
        let _ = ($($arg)*,);
    }};
}

pub mod buffer;
pub mod byteid;
pub mod consts;
pub mod driver;
pub mod error;
pub mod hal;
#[cfg(feature = "radio-isr")]
pub mod isr;
pub mod stream;
pub mod timer;
