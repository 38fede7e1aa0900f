//! Bluetooth Low Energy link to the bulb.
//!
//! The device runs in **Central** role against exactly one peripheral:
//!
//! 1. **Advertisement parser** - walks AD records looking for the bulb's
//!    complete local name.
//! 2. **Link state machine** - scan → connect → discover → periodic
//!    writes → rescan on disconnect. It never touches the radio; every
//!    transition hands back the transport commands to run.
//!
//! The firmware crate feeds SoftDevice results into the state machine and
//! executes what comes back (see `firmware::central`).

pub mod adv_parser;
pub mod link;

use crate::config::{
    BLE_SCAN_INTERVAL_MS, BLE_SCAN_WINDOW_MS, BULB_CONTROL_CHAR_UUID, BULB_SERVICE_UUID, PEER_NAME,
};

/// How a peer's 48-bit address was assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressKind {
    Public,
    RandomStatic,
    RandomPrivateResolvable,
    RandomPrivateNonResolvable,
}

/// BLE device address as reported in an advertisement (little-endian bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress {
    pub kind: AddressKind,
    pub bytes: [u8; 6],
}

impl PeerAddress {
    pub const fn new(kind: AddressKind, bytes: [u8; 6]) -> Self {
        Self { kind, bytes }
    }
}

/// Which device to connect to and which characteristic to drive.
///
/// Built once at startup and never changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralFilter {
    /// Expected "complete local name" advertisement value.
    pub name: &'static str,
    /// 16-bit service UUID the discovery is scoped to.
    pub service_uuid: u16,
    /// 16-bit UUID of the writable control characteristic.
    pub characteristic_uuid: u16,
}

impl PeripheralFilter {
    pub const fn new(name: &'static str, service_uuid: u16, characteristic_uuid: u16) -> Self {
        Self {
            name,
            service_uuid,
            characteristic_uuid,
        }
    }

    /// Compare an advertised name against ours.
    ///
    /// The advertised value may be at most one byte longer than the name;
    /// that extra byte has to be a NUL terminator. A shorter value matches
    /// when it is a prefix of the name. An empty value never matches.
    pub fn matches_name(&self, value: &[u8]) -> bool {
        let name = self.name.as_bytes();
        if value.is_empty() || value.len() > name.len() + 1 {
            return false;
        }
        value
            .iter()
            .zip(name.iter().chain(core::iter::once(&0u8)))
            .all(|(seen, expected)| seen == expected)
    }
}

impl Default for PeripheralFilter {
    fn default() -> Self {
        Self::new(PEER_NAME, BULB_SERVICE_UUID, BULB_CONTROL_CHAR_UUID)
    }
}

/// Connection handle assigned by the SoftDevice. Meaningless after disconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionHandle(pub u16);

/// Reference to the remote control characteristic found during discovery.
///
/// Only valid while `connection` is up; rediscovered after every reconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicRef {
    pub connection: ConnectionHandle,
    pub uuid: u16,
    pub value_handle: u16,
}

/// Local role on a new connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Central,
    Peripheral,
}

/// GAP scan timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanParams {
    pub interval_ms: u32,
    pub window_ms: u32,
}

impl ScanParams {
    /// The radio listens all the time when window equals interval.
    pub fn is_continuous(&self) -> bool {
        self.window_ms >= self.interval_ms
    }
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            interval_ms: BLE_SCAN_INTERVAL_MS,
            window_ms: BLE_SCAN_WINDOW_MS,
        }
    }
}
