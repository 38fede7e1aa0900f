//! Mode and brightness buttons.
//!
//! Both buttons are active-low with the internal pull-up enabled. A press
//! only counts once the pin is still low after the debounce delay, and the
//! button must be released (and settle) before it can fire again.
//!
//! Presses are queued for the link task, which applies them to the control
//! panel on its next write tick.

use bulb_link::config::BUTTON_DEBOUNCE_MS;
use bulb_link::input::ButtonEvent;
use defmt::{info, warn};
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};

pub type ButtonSender = Sender<'static, CriticalSectionRawMutex, ButtonEvent, 4>;

/// Watch one button forever, queueing `event` on every debounced press.
pub async fn watch(pin: AnyPin, event: ButtonEvent, tx: ButtonSender) -> ! {
    let mut button = Input::new(pin, Pull::Up);
    let settle = Duration::from_millis(BUTTON_DEBOUNCE_MS);
    let mut presses: u32 = 0;

    loop {
        button.wait_for_low().await;
        Timer::after(settle).await;
        if button.is_high() {
            continue;
        }

        presses = presses.wrapping_add(1);
        info!("{} pressed ({} so far)", event, presses);
        // Full queue: earlier presses are still waiting for a tick.
        if tx.try_send(event).is_err() {
            warn!("{} dropped, link task is behind", event);
        }

        button.wait_for_high().await;
        Timer::after(settle).await;
    }
}
