//! Interrupt-side plumbing for the radio receive callback.
//!
//! Radio stacks deliver "packet arrived" notifications from interrupt-like
//! context, while the rest of the bridge runs on the main loop. This module
//! (feature `radio-isr`) provides the shared-instance pattern for that
//! split: one `static` bridge wrapped in a `critical_section::Mutex`, a
//! receive-side entry point that only enqueues, and a main-loop entry point
//! that does everything else.
//!
//! The enqueue inside the critical section is a short, bounded copy; the
//! heavy protocol work happens when the main loop takes the same lock and
//! drains the queue.

use crate::driver::{BridgeDriver, DeviceId};
use crate::hal::{ChannelStore, Clock, Radio};
use core::cell::RefCell;
use critical_section::Mutex;
use embedded_io::{Read, ReadReady, Write};

/// Used to initialize the global static bridge for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```ignore
/// static BRIDGE: Mutex<RefCell<Option<BridgeDriver<R, S, C, F>>>> =
///     global_bridge_init::<R, S, C, F>();
/// ```
pub const fn global_bridge_init<R, S, C, F>() -> Mutex<RefCell<Option<BridgeDriver<R, S, C, F>>>>
where
    R: Radio,
    S: Read + Write + ReadReady,
    C: Clock,
    F: ChannelStore,
{
    Mutex::new(RefCell::new(None))
}

/// Stores a constructed bridge into the global static.
///
/// Call once from `main()` after building and
/// [`begin`](BridgeDriver::begin)-ing the bridge.
pub fn global_bridge_setup<R, S, C, F>(
    global_bridge: &'static Mutex<RefCell<Option<BridgeDriver<R, S, C, F>>>>,
    bridge: BridgeDriver<R, S, C, F>,
) where
    R: Radio,
    S: Read + Write + ReadReady,
    C: Clock,
    F: ChannelStore,
{
    critical_section::with(|cs| {
        let _ = global_bridge.borrow(cs).replace(Some(bridge));
    });
}

/// Enqueues a received radio frame on the global bridge.
///
/// Safe to call from the radio receive interrupt: it copies at most 32
/// bytes under the lock and returns. Does nothing if the bridge has not
/// been set up; a full queue silently drops the frame, which the protocol
/// treats as over-the-air loss.
///
/// # Example
/// ```ignore
/// fn on_radio_receive(device: u8, rssi: i8, data: &[u8]) {
///     global_bridge_on_receive(&BRIDGE, device, rssi, data);
/// }
/// ```
pub fn global_bridge_on_receive<R, S, C, F>(
    global_bridge: &'static Mutex<RefCell<Option<BridgeDriver<R, S, C, F>>>>,
    device: DeviceId,
    rssi: i8,
    data: &[u8],
) where
    R: Radio,
    S: Read + Write + ReadReady,
    C: Clock,
    F: ChannelStore,
{
    critical_section::with(|cs| {
        if let Some(bridge) = global_bridge.borrow(cs).borrow_mut().as_mut() {
            let _ = bridge.on_receive(device, rssi, data);
        }
    });
}

/// Runs one main-loop iteration on the global bridge.
pub fn global_bridge_run_once<R, S, C, F>(
    global_bridge: &'static Mutex<RefCell<Option<BridgeDriver<R, S, C, F>>>>,
) where
    R: Radio,
    S: Read + Write + ReadReady,
    C: Clock,
    F: ChannelStore,
{
    critical_section::with(|cs| {
        if let Some(bridge) = global_bridge.borrow(cs).borrow_mut().as_mut() {
            bridge.run_once();
        }
    });
}

/// Declares a static global `RF_BRIDGE` instance protected by a
/// `critical_section` mutex.
///
/// # Arguments
/// - `$radio`: the concrete [`Radio`] type
/// - `$serial`: the concrete serial type (`embedded-io` `Read + Write +
///   ReadReady`)
/// - `$clock`: the concrete [`Clock`] type
/// - `$store`: the concrete [`ChannelStore`] type
///
/// # Example
/// ```ignore
/// init_rf_bridge!(MyRadio, MySerial, MyClock, MyStore);
/// ```
#[macro_export]
macro_rules! init_rf_bridge {
    ( $radio:ty, $serial:ty, $clock:ty, $store:ty ) => {
        pub static RF_BRIDGE: $crate::critical_section::Mutex<
            core::cell::RefCell<
                Option<$crate::driver::BridgeDriver<$radio, $serial, $clock, $store>>,
            >,
        > = $crate::critical_section::Mutex::new(core::cell::RefCell::new(None));
    };
}

/// Enqueues a received frame on the `RF_BRIDGE` declared by
/// [`init_rf_bridge!`]. Intended to be the body of the radio receive
/// callback.
///
/// # Example
/// ```ignore
/// fn on_radio_receive(device: u8, rssi: i8, data: &[u8]) {
///     bridge_on_receive!(device, rssi, data);
/// }
/// ```
#[macro_export]
macro_rules! bridge_on_receive {
    ( $device:expr, $rssi:expr, $data:expr ) => {
        $crate::critical_section::with(|cs| {
            if let Some(bridge) = RF_BRIDGE.borrow(cs).borrow_mut().as_mut() {
                let _ = bridge.on_receive($device, $rssi, $data);
            }
        });
    };
}

/// Runs one main-loop iteration on the `RF_BRIDGE` declared by
/// [`init_rf_bridge!`].
///
/// # Notes
/// - Safe to call repeatedly; silently does nothing if the bridge hasn't
///   been set up yet.
#[macro_export]
macro_rules! run_rf_bridge {
    () => {
        $crate::critical_section::with(|cs| {
            if let Some(bridge) = RF_BRIDGE.borrow(cs).borrow_mut().as_mut() {
                bridge.run_once();
            }
        });
    };
}
