//! Hardware side of the firmware: SoftDevice driver, GATT client, GPIO.

pub mod bulb_client;
pub mod buttons;
pub mod central;
pub mod heartbeat;
