//! Raw command formatters.
//!
//! These mirror `sprintf` field formatting on plain integers: no range
//! checks, `%03d`-style zero padding for colour channels, `%04d` for the
//! temperature, and an unpadded brightness. Whatever the formatted text
//! is, the result is cut to 18 bytes and the tail filled with commas.

use core::fmt::Write;

use heapless::String;

use crate::bulb::CommandString;
use crate::config::{COMMAND_LEN, COMMAND_PAD};

/// Room for four `i32` fields at their widest plus separators.
const SCRATCH_LEN: usize = 64;

/// `"RRR,GGG,BBB,B,"` padded with `,` to 18 bytes.
pub fn encode_rgb(red: i32, green: i32, blue: i32, brightness: i32) -> CommandString {
    format_padded(format_args!(
        "{:03},{:03},{:03},{},",
        red, green, blue, brightness
    ))
}

/// `"CLTMP TTTT,B"` padded with `,` to 18 bytes.
pub fn encode_colour_temp(kelvin: i32, brightness: i32) -> CommandString {
    format_padded(format_args!("CLTMP {:04},{}", kelvin, brightness))
}

fn format_padded(args: core::fmt::Arguments<'_>) -> CommandString {
    let mut text: String<SCRATCH_LEN> = String::new();
    // Cannot overflow: the widest output is four "-2147483648" fields.
    let _ = text.write_fmt(args);

    let mut out = [COMMAND_PAD; COMMAND_LEN];
    let len = text.len().min(COMMAND_LEN);
    out[..len].copy_from_slice(&text.as_bytes()[..len]);
    CommandString::from_bytes(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_padded(cmd: &CommandString, body: &str) {
        let bytes = cmd.as_bytes();
        assert_eq!(bytes.len(), COMMAND_LEN);
        assert_eq!(&bytes[..body.len()], body.as_bytes());
        assert!(bytes[body.len()..].iter().all(|&b| b == b','));
    }

    #[test]
    fn rgb_black_full_brightness() {
        let cmd = encode_rgb(0, 0, 0, 100);
        assert_eq!(cmd.as_str(), "000,000,000,100,,,");
    }

    #[test]
    fn rgb_channels_are_zero_padded_to_three_digits() {
        let cmd = encode_rgb(7, 42, 255, 50);
        assert_padded(&cmd, "007,042,255,50,");
    }

    #[test]
    fn rgb_brightness_is_not_padded() {
        assert_eq!(encode_rgb(0, 255, 0, 100).as_str(), "000,255,000,100,,,");
        assert_eq!(encode_rgb(0, 255, 0, 50).as_str(), "000,255,000,50,,,,");
        assert_eq!(encode_rgb(0, 255, 0, 5).as_str(), "000,255,000,5,,,,,");
    }

    #[test]
    fn colour_temp_format() {
        assert_eq!(encode_colour_temp(6500, 100).as_str(), "CLTMP 6500,100,,,,");
        assert_eq!(encode_colour_temp(1700, 0).as_str(), "CLTMP 1700,0,,,,,,");
    }

    #[test]
    fn colour_temp_is_zero_padded_to_four_digits() {
        assert_padded(&encode_colour_temp(900, 9), "CLTMP 0900,9");
    }

    #[test]
    fn rgb_full_range_matches_wire_pattern() {
        for channel in [0, 1, 9, 10, 99, 100, 128, 254, 255] {
            for brightness in [0, 1, 9, 10, 55, 99, 100] {
                let cmd = encode_rgb(channel, 255 - channel, channel / 2, brightness);
                let text = cmd.as_str();
                assert_eq!(text.len(), COMMAND_LEN);

                let mut fields = text.split(',');
                for _ in 0..3 {
                    let field = fields.next().unwrap();
                    assert_eq!(field.len(), 3);
                    assert!(field.bytes().all(|b| b.is_ascii_digit()));
                }
                let bright = fields.next().unwrap();
                assert!((1..=3).contains(&bright.len()));
                assert_eq!(bright.parse::<i32>().unwrap(), brightness);
                assert!(fields.all(|rest| rest.is_empty()));
            }
        }
    }

    #[test]
    fn colour_temp_full_range_matches_wire_pattern() {
        for kelvin in [1700, 2000, 4321, 6500] {
            for brightness in [0, 7, 50, 100] {
                let cmd = encode_colour_temp(kelvin, brightness);
                let text = cmd.as_str();
                assert_eq!(text.len(), COMMAND_LEN);
                assert!(text.starts_with("CLTMP "));
                assert_eq!(text[6..10].parse::<i32>().unwrap(), kelvin);
                assert_eq!(&text[10..11], ",");
                let rest = &text[11..];
                let digits = rest.trim_end_matches(',');
                assert_eq!(digits.parse::<i32>().unwrap(), brightness);
            }
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(encode_rgb(12, 34, 56, 78), encode_rgb(12, 34, 56, 78));
        assert_eq!(encode_colour_temp(3000, 1), encode_colour_temp(3000, 1));
    }

    #[test]
    fn wrapped_inputs_are_truncated_not_rejected() {
        let cmd = encode_rgb(i32::MAX, i32::MIN, -1, -100);
        assert_eq!(cmd.as_str(), "2147483647,-214748");

        let cmd = encode_colour_temp(-12, 100_000);
        assert_eq!(cmd.as_str(), "CLTMP -012,100000,");
    }
}
