//! Host-testable core of bulb-link.
//!
//! Everything here is pure logic - the colour command encoder, the
//! advertisement parser, the connection state machine and the input
//! adapters - so it builds and tests on the host with no radio attached.
//!
//! Usage: `cargo test --lib`
//!
//! Note: The embedded binary (`main.rs`, `embedded` feature) links this
//! library and adds the Embassy / SoftDevice glue in `firmware/`.

#![cfg_attr(not(test), no_std)]

pub mod ble;
pub mod bulb;
pub mod config;
pub mod error;
pub mod input;

pub use ble::link::{ConnectionState, LinkCommand, LinkConfig, LinkEvent, LinkState};
pub use bulb::{ColourCommand, CommandString};
pub use error::{BleError, Error};
