//! Input adapters - where the colour for each periodic write comes from.
//!
//! The link only asks for a [`ColourCommand`] at write time. Sources are a
//! fixed value, the demo animation, or a [`ControlPanel`] fed by live
//! readings and two physical buttons (mode toggle, brightness step).

use crate::bulb::{ColourCommand, DemoSequence};
use crate::config::{
    BRIGHTNESS_STEP, DEFAULT_BRIGHTNESS, MAX_BRIGHTNESS, MAX_CHANNEL, MAX_COLOUR_TEMP_K,
    MIN_COLOUR_TEMP_K,
};

/// Anything that can supply the next colour to send.
pub trait InputSource {
    fn sample(&mut self) -> ColourCommand;
}

/// Physical button events (after debouncing).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonEvent {
    /// Switch between RGB and colour temperature output.
    ToggleMode,
    /// Step brightness down, wrapping back to full.
    StepBrightness,
}

/// Three raw readings (colour channel proxies) plus the mode flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSample {
    pub readings: [i32; 3],
    pub temperature_mode: bool,
}

impl InputSample {
    /// Turn the sample into a command at the given brightness.
    ///
    /// RGB mode uses the readings as red/green/blue. Temperature mode maps
    /// reading 0 from the channel range onto 1700-6500 K.
    pub fn to_command(&self, brightness: i32) -> ColourCommand {
        let [first, second, third] = self.readings;
        if self.temperature_mode {
            let span = MAX_COLOUR_TEMP_K - MIN_COLOUR_TEMP_K;
            let kelvin = MIN_COLOUR_TEMP_K + first.clamp(0, MAX_CHANNEL) * span / MAX_CHANNEL;
            ColourCommand::temperature(kelvin, brightness)
        } else {
            ColourCommand::rgb(first, second, third, brightness)
        }
    }
}

/// Always sends the same command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaticColour(pub ColourCommand);

impl InputSource for StaticColour {
    fn sample(&mut self) -> ColourCommand {
        self.0
    }
}

impl InputSource for DemoSequence {
    fn sample(&mut self) -> ColourCommand {
        self.next_command()
    }
}

/// Live readings shaped by the two buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlPanel {
    sample: InputSample,
    brightness: i32,
}

impl ControlPanel {
    pub const fn new() -> Self {
        Self {
            sample: InputSample {
                readings: [0; 3],
                temperature_mode: false,
            },
            brightness: DEFAULT_BRIGHTNESS,
        }
    }

    pub fn set_readings(&mut self, readings: [i32; 3]) {
        self.sample.readings = readings;
    }

    pub fn apply(&mut self, event: ButtonEvent) {
        match event {
            ButtonEvent::ToggleMode => {
                self.sample.temperature_mode = !self.sample.temperature_mode;
            }
            ButtonEvent::StepBrightness => {
                self.brightness = next_brightness(self.brightness);
            }
        }
    }

    pub fn brightness(&self) -> i32 {
        self.brightness
    }

    pub fn temperature_mode(&self) -> bool {
        self.sample.temperature_mode
    }
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for ControlPanel {
    fn sample(&mut self) -> ColourCommand {
        self.sample.to_command(self.brightness)
    }
}

/// Step brightness down by one notch; from zero go back to full.
pub fn next_brightness(current: i32) -> i32 {
    if current <= 0 {
        MAX_BRIGHTNESS
    } else {
        (current - BRIGHTNESS_STEP).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_colour_repeats() {
        let mut source = StaticColour::default();
        assert_eq!(source.sample().encode().as_str(), "CLTMP 6500,100,,,,");
        assert_eq!(source.sample(), source.sample());
    }

    #[test]
    fn demo_sequence_advances_per_sample() {
        let mut source = DemoSequence::new();
        assert_ne!(source.sample(), source.sample());
    }

    #[test]
    fn rgb_sample_uses_readings_as_channels() {
        let sample = InputSample {
            readings: [10, 300, -5],
            temperature_mode: false,
        };
        assert_eq!(sample.to_command(80), ColourCommand::rgb(10, 255, 0, 80));
    }

    #[test]
    fn temperature_sample_maps_first_reading_onto_kelvin_range() {
        let mut sample = InputSample {
            readings: [0, 0, 0],
            temperature_mode: true,
        };
        assert_eq!(sample.to_command(100), ColourCommand::temperature(1700, 100));

        sample.readings[0] = 255;
        assert_eq!(sample.to_command(100), ColourCommand::temperature(6500, 100));

        sample.readings[0] = 1000;
        assert_eq!(sample.to_command(40), ColourCommand::temperature(6500, 40));
    }

    #[test]
    fn brightness_steps_down_then_wraps() {
        assert_eq!(next_brightness(100), 75);
        assert_eq!(next_brightness(10), 0);
        assert_eq!(next_brightness(0), 100);
    }

    #[test]
    fn panel_buttons_change_output() {
        let mut panel = ControlPanel::new();
        panel.set_readings([255, 0, 0]);
        assert_eq!(panel.sample().encode().as_str(), "255,000,000,100,,,");

        panel.apply(ButtonEvent::StepBrightness);
        assert_eq!(panel.brightness(), 75);
        assert_eq!(panel.sample().encode().as_str(), "255,000,000,75,,,,");

        panel.apply(ButtonEvent::ToggleMode);
        assert!(panel.temperature_mode());
        assert_eq!(panel.sample().encode().as_str(), "CLTMP 6500,75,,,,,");
    }
}
