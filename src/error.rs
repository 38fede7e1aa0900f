//! Unified error type for bulb-link.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    /// The SoftDevice could not be initialised. Terminal for this boot.
    BleNotAvailable,

    /// Discovery finished without the bulb's control characteristic.
    CharacteristicNotFound,

    /// Connection to the bulb was lost.
    Disconnected,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Scan was cancelled or could not start.
    ScanFailed,
    /// Connection attempt failed.
    ConnectFailed,
    /// GATT discovery failed.
    DiscoveryFailed,
    /// Characteristic write was rejected.
    WriteFailed,
    /// Characteristic read was rejected.
    ReadFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

impl Error {
    /// Whether the link state machine can keep going after this error.
    ///
    /// Only a failed stack initialisation stops the device; everything
    /// else ends up back in scanning.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::BleNotAvailable)
    }
}
