//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

// Target bulb

/// Advertised "complete local name" of the bulb we connect to.
pub const PEER_NAME: &str = "Yeelight Blue II";

/// Vendor service that holds the control characteristic.
pub const BULB_SERVICE_UUID: u16 = 0xFFF0;

/// Writable control characteristic. Alter this to suit your device.
pub const BULB_CONTROL_CHAR_UUID: u16 = 0xFFF1;

// Colour command protocol

/// Every command the bulb accepts is exactly this many ASCII bytes.
pub const COMMAND_LEN: usize = 18;

/// Filler written after the formatted fields.
pub const COMMAND_PAD: u8 = b',';

/// Brightness used when the input only supplies colour channels.
pub const DEFAULT_BRIGHTNESS: i32 = 100;

pub const MAX_BRIGHTNESS: i32 = 100;
pub const MAX_CHANNEL: i32 = 255;

/// Colour temperature range accepted by the bulb (Kelvin).
pub const MIN_COLOUR_TEMP_K: i32 = 1700;
pub const MAX_COLOUR_TEMP_K: i32 = 6500;

// BLE

/// Scan interval and window (ms). Equal values mean the radio listens
/// continuously.
pub const BLE_SCAN_INTERVAL_MS: u32 = 400;
pub const BLE_SCAN_WINDOW_MS: u32 = 400;

/// Period of the colour write task once the control characteristic is known.
pub const BULB_WRITE_INTERVAL_MS: u64 = 500;

/// Read the control characteristic back after every write and answer each
/// read with the next demo frame. Selected by the `echo-demo` feature.
pub const BULB_ECHO_CHAIN: bool = cfg!(feature = "echo-demo");

/// BLE connection interval range (in 1.25 ms units).
pub const BLE_CONN_INTERVAL_MIN: u16 = 24;
pub const BLE_CONN_INTERVAL_MAX: u16 = 40;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

// GPIO pin assignments (nRF52840-DK defaults)
//
// Actual `embassy_nrf::peripherals::*` pins are picked in `main.rs`.
//
//   Heartbeat LED      → P0.13
//   Column LED (low)   → P0.04
//   Mode button        → P0.11
//   Brightness button  → P0.12

/// Heartbeat LED toggle period (ms).
pub const HEARTBEAT_PERIOD_MS: u64 = 500;

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

/// Brightness change applied per press of the brightness button.
pub const BRIGHTNESS_STEP: i32 = 25;
