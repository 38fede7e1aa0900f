//! Animated demo sequence.
//!
//! Steps the colour temperature by 100 K and the three channels by
//! 11/21/41 per write, wrapping each back to its start once it runs past
//! the top of its range. Only the RGB part is sent; the temperature
//! counter keeps cycling alongside it.

use crate::bulb::ColourCommand;
use crate::config::{MAX_BRIGHTNESS, MAX_CHANNEL, MAX_COLOUR_TEMP_K, MIN_COLOUR_TEMP_K};

const TEMP_STEP: i32 = 100;
const RED_STEP: i32 = 11;
const GREEN_STEP: i32 = 21;
const BLUE_STEP: i32 = 41;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DemoSequence {
    kelvin: i32,
    red: i32,
    green: i32,
    blue: i32,
}

impl DemoSequence {
    pub const fn new() -> Self {
        Self {
            kelvin: MIN_COLOUR_TEMP_K,
            red: 0,
            green: 0,
            blue: 0,
        }
    }

    /// Advance one frame and return the command for it.
    pub fn next_command(&mut self) -> ColourCommand {
        // Wrap before stepping, so a counter may sit one step past its
        // range for a frame (and gets clamped when encoded).
        if self.kelvin > MAX_COLOUR_TEMP_K {
            self.kelvin = MIN_COLOUR_TEMP_K;
        }
        if self.red > MAX_CHANNEL {
            self.red = 0;
        }
        if self.green > MAX_CHANNEL {
            self.green = 0;
        }
        if self.blue > MAX_CHANNEL {
            self.blue = 0;
        }

        self.kelvin += TEMP_STEP;
        self.red += RED_STEP;
        self.green += GREEN_STEP;
        self.blue += BLUE_STEP;

        ColourCommand::rgb(self.red, self.green, self.blue, MAX_BRIGHTNESS)
    }

    /// Current red/green/blue counters, unclamped.
    pub fn channels(&self) -> [i32; 3] {
        [self.red, self.green, self.blue]
    }
}

impl Default for DemoSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_steps_every_counter_once() {
        let mut demo = DemoSequence::new();
        assert_eq!(demo.next_command(), ColourCommand::rgb(11, 21, 41, 100));
        assert_eq!(demo.kelvin, 1800);
        assert_eq!(demo.channels(), [11, 21, 41]);
    }

    #[test]
    fn frames_encode_as_rgb_at_full_brightness() {
        let mut demo = DemoSequence::new();
        demo.next_command();
        assert_eq!(demo.next_command().encode().as_str(), "022,042,082,100,,,");
    }

    #[test]
    fn blue_wraps_after_passing_255() {
        let mut demo = DemoSequence::new();
        // 41 * 7 = 287 > 255, so the eighth frame starts blue over again.
        for _ in 0..7 {
            demo.next_command();
        }
        match demo.next_command() {
            ColourCommand::Rgb { blue, .. } => assert_eq!(blue, 41),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn overshooting_channel_is_clamped_for_one_frame() {
        let mut demo = DemoSequence::new();
        // Frame 7 leaves blue at 287 before it wraps on the next frame.
        let mut last = demo.next_command();
        for _ in 1..7 {
            last = demo.next_command();
        }
        match last {
            ColourCommand::Rgb { blue, .. } => assert_eq!(blue, 255),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn temperature_cycles_back_to_minimum() {
        let mut demo = DemoSequence::new();
        // 1700 -> 6600 takes 49 steps, the 50th wraps and steps to 1800.
        for _ in 0..49 {
            demo.next_command();
        }
        assert_eq!(demo.kelvin, 6600);
        demo.next_command();
        assert_eq!(demo.kelvin, 1800);
    }
}
