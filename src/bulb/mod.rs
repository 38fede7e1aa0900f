//! Yeelight Blue II colour command protocol.
//!
//! The bulb's control characteristic takes a fixed 18-byte ASCII string,
//! either an RGB + brightness tuple or a colour temperature + brightness
//! pair, right-padded with commas:
//!
//! ```text
//! RGB:          "RRR,GGG,BBB,B,"  then ',' up to 18 bytes
//! Temperature:  "CLTMP TTTT,B"    then ',' up to 18 bytes
//! ```
//!
//! Brightness is never zero-padded. The bulb firmware only applies a
//! combined colour + brightness change when the brightness field changes
//! width between consecutive writes, so padding it would make it ignore
//! brightness updates.

pub mod demo;
pub mod encoder;

use crate::config::{
    COMMAND_LEN, MAX_BRIGHTNESS, MAX_CHANNEL, MAX_COLOUR_TEMP_K, MIN_COLOUR_TEMP_K,
};

pub use demo::DemoSequence;
pub use encoder::{encode_colour_temp, encode_rgb};

/// One formatted command, ready to be written to the bulb.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandString([u8; COMMAND_LEN]);

impl CommandString {
    pub(crate) const fn from_bytes(bytes: [u8; COMMAND_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; COMMAND_LEN] {
        &self.0
    }

    /// Commands are always ASCII, so this never comes back empty in practice.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl core::fmt::Debug for CommandString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// A colour setting for the bulb. Exactly one mode is active per command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColourCommand {
    /// Red/green/blue in 0-255, brightness in 0-100.
    Rgb {
        red: u8,
        green: u8,
        blue: u8,
        brightness: u8,
    },
    /// White at a colour temperature in 1700-6500 K, brightness in 0-100.
    Temperature { kelvin: u16, brightness: u8 },
}

impl ColourCommand {
    /// Build an RGB command, clamping every field into the protocol range.
    ///
    /// Raw sensor arithmetic can wrap, so out-of-range input is expected
    /// and never an error.
    pub fn rgb(red: i32, green: i32, blue: i32, brightness: i32) -> Self {
        ColourCommand::Rgb {
            red: clamp_channel(red),
            green: clamp_channel(green),
            blue: clamp_channel(blue),
            brightness: clamp_brightness(brightness),
        }
    }

    /// Build a colour temperature command, clamping into 1700-6500 K.
    pub fn temperature(kelvin: i32, brightness: i32) -> Self {
        ColourCommand::Temperature {
            kelvin: kelvin.clamp(MIN_COLOUR_TEMP_K, MAX_COLOUR_TEMP_K) as u16,
            brightness: clamp_brightness(brightness),
        }
    }

    pub fn brightness(&self) -> u8 {
        match *self {
            ColourCommand::Rgb { brightness, .. } => brightness,
            ColourCommand::Temperature { brightness, .. } => brightness,
        }
    }

    /// Format this command into the bulb's wire string.
    pub fn encode(&self) -> CommandString {
        match *self {
            ColourCommand::Rgb {
                red,
                green,
                blue,
                brightness,
            } => encode_rgb(
                red.into(),
                green.into(),
                blue.into(),
                brightness.into(),
            ),
            ColourCommand::Temperature { kelvin, brightness } => {
                encode_colour_temp(kelvin.into(), brightness.into())
            }
        }
    }
}

impl Default for ColourCommand {
    /// Cool white at full brightness: `"CLTMP 6500,100,,,,"`.
    fn default() -> Self {
        ColourCommand::Temperature {
            kelvin: MAX_COLOUR_TEMP_K as u16,
            brightness: MAX_BRIGHTNESS as u8,
        }
    }
}

fn clamp_channel(value: i32) -> u8 {
    value.clamp(0, MAX_CHANNEL) as u8
}

fn clamp_brightness(value: i32) -> u8 {
    value.clamp(0, MAX_BRIGHTNESS) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_constructor_clamps_each_field() {
        let cmd = ColourCommand::rgb(-4, 300, 128, 250);
        assert_eq!(
            cmd,
            ColourCommand::Rgb {
                red: 0,
                green: 255,
                blue: 128,
                brightness: 100
            }
        );
    }

    #[test]
    fn temperature_constructor_clamps_to_bulb_range() {
        assert_eq!(
            ColourCommand::temperature(1000, 50),
            ColourCommand::Temperature {
                kelvin: 1700,
                brightness: 50
            }
        );
        assert_eq!(
            ColourCommand::temperature(9000, -1),
            ColourCommand::Temperature {
                kelvin: 6500,
                brightness: 0
            }
        );
    }

    #[test]
    fn default_command_is_cool_white_full_brightness() {
        assert_eq!(ColourCommand::default().encode().as_str(), "CLTMP 6500,100,,,,");
    }

    #[test]
    fn encode_dispatches_on_mode() {
        let rgb = ColourCommand::rgb(255, 0, 7, 5);
        assert_eq!(rgb.encode().as_str(), "255,000,007,5,,,,,");

        let temp = ColourCommand::temperature(2700, 42);
        assert_eq!(temp.encode().as_str(), "CLTMP 2700,42,,,,,");
    }

    #[test]
    fn brightness_accessor_covers_both_modes() {
        assert_eq!(ColourCommand::rgb(1, 2, 3, 77).brightness(), 77);
        assert_eq!(ColourCommand::temperature(3000, 12).brightness(), 12);
    }
}
