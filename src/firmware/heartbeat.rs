//! Liveness blink, independent of the BLE link.

use bulb_link::config::HEARTBEAT_PERIOD_MS;
use embassy_nrf::gpio::Output;
use embassy_time::{Duration, Ticker};

/// Toggle `led` forever. `column` is the LED matrix column driver; it is
/// held low for as long as the heartbeat runs.
pub async fn run(mut led: Output<'static>, column: Output<'static>) -> ! {
    let _column = column;
    let mut ticker = Ticker::every(Duration::from_millis(HEARTBEAT_PERIOD_MS));
    loop {
        ticker.next().await;
        led.toggle();
    }
}
