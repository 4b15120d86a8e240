//! Blocking main-loop helper for the bridge.
//!
//! The bridge has no internal scheduler: something must call
//! [`run_once`](crate::driver::BridgeDriver::run_once) often enough that
//! serial ingestion keeps up with the port and the Device's poll interval
//! is honored. On platforms without a better event loop, the simplest
//! correct driver is a delay-paced busy loop, which this module provides.
//!
//! Unlike a bit-banged modem there is no hard real-time bound here; the
//! pace only needs to stay comfortably under the smallest protocol window
//! (the [`SERIAL_QUIET_TIME_MS`](crate::consts::SERIAL_QUIET_TIME_MS)
//! quiet check). [`DEFAULT_LOOP_STEP_US`] satisfies that with margin.

use crate::driver::BridgeDriver;
use crate::hal::{ChannelStore, Clock, Radio};
use embedded_hal::delay::DelayNs;
use embedded_io::{Read, ReadReady, Write};

/// A loop pace that samples the serial port well inside every protocol
/// window: 500 µs.
pub const DEFAULT_LOOP_STEP_US: u32 = 500;

/// Runs a blocking loop that repeatedly calls `run_once()` on the provided
/// bridge.
///
/// This is for environments where interrupts are unavailable or undesired;
/// the radio receive callback still calls
/// [`on_receive`](crate::driver::BridgeDriver::on_receive), but everything
/// else is paced by the delay provider.
///
/// # Arguments
/// - `bridge`: the bridge to drive.
/// - `delay`: a delay provider implementing `DelayNs`, typically from the
///   HAL.
/// - `step_us`: pause between iterations, in microseconds (e.g.
///   [`DEFAULT_LOOP_STEP_US`]).
///
/// # Notes
/// - This loop never returns; it is intended for single-purpose firmware.
/// - For concurrent applications, call `run_once()` from your own loop
///   instead.
pub fn run_bridge_loop<D, R, S, C, F>(
    bridge: &mut BridgeDriver<R, S, C, F>,
    delay: &mut D,
    step_us: u32,
) where
    D: DelayNs,
    R: Radio,
    S: Read + Write + ReadReady,
    C: Clock,
    F: ChannelStore,
{
    loop {
        bridge.run_once();
        delay.delay_us(step_us);
    }
}
