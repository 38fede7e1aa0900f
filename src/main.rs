//! nRF52840 firmware: stream colour commands to a Yeelight Blue II bulb.
//!
//! Task layout:
//!   - `softdevice_task` - SoftDevice event pump
//!   - `link_task`       - scan, connect, discover, periodic colour writes
//!   - `button_task` x2  - mode and brightness buttons
//!   - `heartbeat_task`  - 500 ms LED blink
//!
//! Flash with: `cargo run --release --features embedded`

#![no_std]
#![no_main]

mod firmware;

use core::mem;

use bulb_link::input::ButtonEvent;
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive, Pin};
use embassy_nrf::interrupt::Priority;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use nrf_softdevice::{raw, Softdevice};
use {defmt_rtt as _, panic_probe as _};

use crate::firmware::{buttons, central, heartbeat};

const DEVICE_NAME: &[u8] = b"bulb-link";

/// Button presses from the GPIO tasks to the link task.
static BUTTONS: Channel<CriticalSectionRawMutex, ButtonEvent, 4> = Channel::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn link_task(sd: &'static Softdevice) -> ! {
    central::link_task(sd, BUTTONS.receiver()).await
}

#[embassy_executor::task(pool_size = 2)]
async fn button_task(pin: AnyPin, event: ButtonEvent) -> ! {
    buttons::watch(pin, event, BUTTONS.sender()).await
}

#[embassy_executor::task]
async fn heartbeat_task(led: Output<'static>, column: Output<'static>) -> ! {
    heartbeat::run(led, column).await
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("bulb-link starting");

    // Interrupt priorities 0, 1 and 4 belong to the SoftDevice.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let sd_config = nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 128 }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 0,
            periph_role_count: 0,
            central_role_count: 1,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    };

    // Panics (reported once through panic-probe) if the stack cannot start.
    let sd: &'static Softdevice = Softdevice::enable(&sd_config);
    unwrap!(spawner.spawn(softdevice_task(sd)));
    info!("SoftDevice enabled");

    let led = Output::new(p.P0_13, Level::Low, OutputDrive::Standard);
    let column = Output::new(p.P0_04, Level::Low, OutputDrive::Standard);
    unwrap!(spawner.spawn(heartbeat_task(led, column)));

    unwrap!(spawner.spawn(button_task(p.P0_11.degrade(), ButtonEvent::ToggleMode)));
    unwrap!(spawner.spawn(button_task(p.P0_12.degrade(), ButtonEvent::StepBrightness)));

    unwrap!(spawner.spawn(link_task(sd)));
}
