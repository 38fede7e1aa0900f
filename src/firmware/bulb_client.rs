//! GATT client for the bulb's vendor service (0xFFF0).
//!
//! Implements the SoftDevice `gatt_client::Client` trait by hand so the
//! discovery callbacks can be forwarded to the link state machine: every
//! characteristic matching the control UUID (0xFFF1) is recorded, and
//! discovery always "completes" - the state machine decides what an
//! empty result means.

use bulb_link::config::{BULB_CONTROL_CHAR_UUID, BULB_SERVICE_UUID};
use defmt::{debug, info};
use heapless::Vec;
use nrf_softdevice::ble::gatt_client::{self, Characteristic, Descriptor, DiscoverError, HvxType};
use nrf_softdevice::ble::{Connection, Uuid};

/// More than one matching characteristic would be unusual; keep a few.
const MAX_MATCHES: usize = 4;

/// A characteristic that passed the UUID filter during discovery.
#[derive(Clone, Copy, defmt::Format)]
pub struct FoundCharacteristic {
    pub uuid: u16,
    pub value_handle: u16,
}

pub struct BulbServiceClient {
    _conn: Connection,
    found: Vec<FoundCharacteristic, MAX_MATCHES>,
    skipped: usize,
}

impl BulbServiceClient {
    /// Matching characteristics, in discovery order.
    pub fn characteristics(&self) -> &[FoundCharacteristic] {
        &self.found
    }
}

impl gatt_client::Client for BulbServiceClient {
    type Event = ();

    fn on_hvx(&self, _conn: &Connection, _type: HvxType, _handle: u16, _data: &[u8]) -> Option<()> {
        // The bulb never notifies on the control characteristic.
        None
    }

    fn uuid() -> Uuid {
        Uuid::new_16(BULB_SERVICE_UUID)
    }

    fn new_undiscovered(conn: Connection) -> Self {
        Self {
            _conn: conn,
            found: Vec::new(),
            skipped: 0,
        }
    }

    fn discovered_characteristic(&mut self, characteristic: &Characteristic, _descriptors: &[Descriptor]) {
        if characteristic.uuid != Some(Uuid::new_16(BULB_CONTROL_CHAR_UUID)) {
            self.skipped += 1;
            return;
        }

        info!(
            "  C UUID-{:x} valueAttr[{}]",
            BULB_CONTROL_CHAR_UUID, characteristic.handle_value
        );
        let _ = self.found.push(FoundCharacteristic {
            uuid: BULB_CONTROL_CHAR_UUID,
            value_handle: characteristic.handle_value,
        });
    }

    fn discovery_complete(&mut self) -> Result<(), DiscoverError> {
        debug!(
            "discovery complete: {} matching, {} other characteristics",
            self.found.len(),
            self.skipped
        );
        Ok(())
    }
}
