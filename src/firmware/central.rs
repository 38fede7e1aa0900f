//! SoftDevice driver for the link state machine.
//!
//! This task is the single dispatch loop: it feeds scan reports,
//! connection results, discovery results, timer ticks and write/read
//! completions into [`ConnectionState`] one at a time, and runs the
//! commands each transition returns, in order.
//!
//! The periodic write task is an Embassy `Ticker`; cancelling it is just
//! dropping it.
//!
//! With the `echo-demo` feature every tick sends the fixed default colour
//! and the link's echo chain animates the bulb between ticks. Otherwise
//! ticks sample the control panel.

use bulb_link::ble::adv_parser::{complete_local_name, extract_device_name};
use bulb_link::ble::link::{Commands, TaskId};
use bulb_link::ble::{
    AddressKind, CharacteristicRef, ConnectionHandle, PeerAddress, Role, ScanParams,
};
use bulb_link::bulb::{ColourCommand, CommandString, DemoSequence};
use bulb_link::config;
use bulb_link::input::{ButtonEvent, ControlPanel, InputSource, StaticColour};
use bulb_link::{BleError, ConnectionState, Error, LinkCommand, LinkConfig, LinkEvent};
use defmt::{debug, error, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Ticker, Timer};
use heapless::Deque;
use nrf_softdevice::ble::gatt_client::{self, Client as _, DiscoverError};
use nrf_softdevice::ble::{self, central, Address, AddressType, Connection};
use nrf_softdevice::raw;
use nrf_softdevice::Softdevice;

use crate::firmware::bulb_client::BulbServiceClient;

/// Room for the commands of a few chained transitions.
const QUEUE_LEN: usize = 8;

/// Pause before restarting a scan the SoftDevice refused.
const SCAN_RETRY_MS: u64 = 1000;

/// Longest value we expect to read back from the bulb.
const READ_BUF_LEN: usize = 20;

struct Driver {
    sd: &'static Softdevice,
    link: ConnectionState,
    queue: Deque<LinkCommand, QUEUE_LEN>,
    conn: Option<Connection>,
    client: Option<BulbServiceClient>,
    timer: Option<(TaskId, Ticker)>,
    buttons: Receiver<'static, CriticalSectionRawMutex, ButtonEvent, 4>,
    panel: ControlPanel,
    fixed: StaticColour,
    // Stand-in for the accelerometer: drives the three channel readings.
    motion: DemoSequence,
}

/// Run the bulb link forever.
pub async fn link_task(
    sd: &'static Softdevice,
    buttons: Receiver<'static, CriticalSectionRawMutex, ButtonEvent, 4>,
) -> ! {
    let mut driver = Driver {
        sd,
        link: ConnectionState::new(LinkConfig::for_build()),
        queue: Deque::new(),
        conn: None,
        client: None,
        timer: None,
        buttons,
        panel: ControlPanel::new(),
        fixed: StaticColour::default(),
        motion: DemoSequence::new(),
    };

    info!(
        "Link task started, looking for '{}' (echo chain {})",
        config::PEER_NAME,
        driver.link.config().echo_chain
    );
    driver.dispatch(LinkEvent::Start);

    loop {
        while let Some(command) = driver.queue.pop_front() {
            driver.execute(command).await;
        }
        driver.wait_for_event().await;
    }
}

impl Driver {
    fn dispatch(&mut self, event: LinkEvent<'_>) {
        let before = self.link.state();
        let commands = self.link.handle(event);
        let after = self.link.state();
        if before != after {
            info!("link: {} -> {}", before, after);
        }
        self.enqueue(commands);
    }

    fn enqueue(&mut self, commands: Commands) {
        for command in commands {
            self.enqueue_one(command);
        }
    }

    async fn execute(&mut self, command: LinkCommand) {
        info!("link command: {}", command);
        match command {
            LinkCommand::StartScan(params) => self.scan(params).await,
            LinkCommand::Connect(peer) => self.connect(peer).await,
            LinkCommand::DiscoverServices {
                connection,
                service_uuid,
                characteristic_uuid,
            } => {
                info!(
                    "Starting service discovery (service {:x}, characteristic {:x})",
                    service_uuid, characteristic_uuid
                );
                self.discover(connection, service_uuid).await
            }
            LinkCommand::ArmPeriodicWrite { task, interval_ms } => {
                info!("Arming colour writes every {} ms", interval_ms);
                self.timer = Some((task, Ticker::every(Duration::from_millis(interval_ms))));
            }
            LinkCommand::CancelPeriodicWrite(task) => {
                if matches!(self.timer, Some((armed, _)) if armed == task) {
                    info!("Colour writes cancelled");
                    self.timer = None;
                }
            }
            LinkCommand::Write {
                characteristic,
                payload,
            } => self.write(characteristic, payload).await,
            LinkCommand::Read(characteristic) => self.read(characteristic).await,
            LinkCommand::ReportInitFailure(err) => {
                error!("BLE initialisation failed: {} - link stopped", err);
            }
        }
    }

    async fn scan(&mut self, params: ScanParams) {
        info!(
            "BLE scan starting (interval {} ms, window {} ms, continuous {})",
            params.interval_ms,
            params.window_ms,
            params.is_continuous()
        );

        let config = central::ScanConfig {
            active: true,
            interval: scan_units(params.interval_ms),
            window: scan_units(params.window_ms),
            ..Default::default()
        };

        let link = &mut self.link;
        let result = central::scan(self.sd, &config, |report| {
            let data = unsafe {
                core::slice::from_raw_parts(report.data.p_data, report.data.len as usize)
            };
            let address = Address::from_raw(report.peer_addr);
            let peer = peer_address(&address);

            if let Some(name) = complete_local_name(data) {
                debug!("Seen peer: '{=[u8]:a}'", name);
            }

            let commands = link.handle(LinkEvent::Advertisement { peer, data });
            if commands.is_empty() {
                return None;
            }

            info!(
                "Found '{}' {:02x} rssi {}",
                extract_device_name(data).as_str(),
                peer.bytes,
                report.rssi
            );
            Some(commands)
        })
        .await;

        match result {
            Ok(commands) => {
                info!("link: {}", self.link.state());
                self.enqueue(commands);
            }
            Err(_) => {
                report(BleError::ScanFailed.into());
                Timer::after(Duration::from_millis(SCAN_RETRY_MS)).await;
                self.enqueue_one(LinkCommand::StartScan(params));
            }
        }
    }

    async fn connect(&mut self, peer: PeerAddress) {
        let address = Address::new(address_type(peer.kind), peer.bytes);
        let whitelist = [&address];
        let config = central::ConnectConfig {
            scan_config: central::ScanConfig {
                whitelist: Some(&whitelist),
                ..Default::default()
            },
            conn_params: raw::ble_gap_conn_params_t {
                min_conn_interval: config::BLE_CONN_INTERVAL_MIN,
                max_conn_interval: config::BLE_CONN_INTERVAL_MAX,
                slave_latency: config::BLE_SLAVE_LATENCY,
                conn_sup_timeout: config::BLE_SUP_TIMEOUT,
            },
            ..Default::default()
        };

        let conn = match central::connect(self.sd, &config).await {
            Ok(conn) => conn,
            Err(_) => {
                warn!("Connect to {:02x} failed", peer.bytes);
                report(BleError::ConnectFailed.into());
                self.dispatch(LinkEvent::Disconnected);
                return;
            }
        };

        let Some(handle) = conn.handle() else {
            report(Error::Disconnected);
            self.dispatch(LinkEvent::Disconnected);
            return;
        };

        let role = match conn.role() {
            ble::Role::Central => Role::Central,
            #[allow(unreachable_patterns)]
            _ => Role::Peripheral,
        };

        info!("Connected (handle {})", handle);
        self.client = None;
        self.conn = Some(conn);
        self.dispatch(LinkEvent::Connected {
            connection: ConnectionHandle(handle),
            role,
        });
    }

    async fn discover(&mut self, connection: ConnectionHandle, service_uuid: u16) {
        let Some(conn) = self.conn.clone() else {
            self.dispatch(LinkEvent::Disconnected);
            return;
        };

        match gatt_client::discover::<BulbServiceClient>(&conn).await {
            Ok(client) => {
                info!("S UUID-{:x} discovered", service_uuid);
                self.dispatch(LinkEvent::ServiceDiscovered { uuid: service_uuid });
                for found in client.characteristics() {
                    self.dispatch(LinkEvent::CharacteristicDiscovered(CharacteristicRef {
                        connection,
                        uuid: found.uuid,
                        value_handle: found.value_handle,
                    }));
                }
                self.client = Some(client);
            }
            Err(DiscoverError::ServiceNotFound) => {
                warn!("Service {:x} not found on peer", service_uuid);
                report(Error::CharacteristicNotFound);
                self.client = Some(BulbServiceClient::new_undiscovered(conn));
            }
            Err(_) => {
                report(BleError::DiscoveryFailed.into());
                self.client = Some(BulbServiceClient::new_undiscovered(conn));
            }
        }

        info!("Terminated service discovery for handle {}", connection.0);
        self.dispatch(LinkEvent::DiscoveryTerminated { connection });
    }

    async fn write(&mut self, characteristic: CharacteristicRef, payload: CommandString) {
        let Some(conn) = self.conn.clone() else {
            return;
        };

        info!("Writing bulb colour '{}'", payload.as_str());
        match gatt_client::write(&conn, characteristic.value_handle, payload.as_bytes()).await {
            Ok(()) => self.dispatch(LinkEvent::WriteComplete {
                value_handle: characteristic.value_handle,
            }),
            Err(_) => report(BleError::WriteFailed.into()),
        }
    }

    async fn read(&mut self, characteristic: CharacteristicRef) {
        let Some(conn) = self.conn.clone() else {
            return;
        };

        let mut buf = [0u8; READ_BUF_LEN];
        match gatt_client::read(&conn, characteristic.value_handle, &mut buf).await {
            Ok(len) => {
                info!(
                    "Read back handle {}, len {}: {=[u8]:a}",
                    characteristic.value_handle,
                    len,
                    &buf[..len]
                );
                self.dispatch(LinkEvent::ReadComplete {
                    value_handle: characteristic.value_handle,
                });
            }
            Err(_) => report(BleError::ReadFailed.into()),
        }
    }

    /// Block until the link drops or the write timer fires.
    async fn wait_for_event(&mut self) {
        if let (Some(conn), None) = (&self.conn, &self.client) {
            self.client = Some(BulbServiceClient::new_undiscovered(conn.clone()));
        }

        let outcome = {
            let Self {
                conn, client, timer, ..
            } = self;

            let disconnected = async {
                match (conn.as_ref(), client.as_ref()) {
                    (Some(conn), Some(client)) => {
                        let _ = gatt_client::run(conn, client, |_| {}).await;
                    }
                    _ => core::future::pending::<()>().await,
                }
            };
            let tick = async {
                match timer.as_mut() {
                    Some((task, ticker)) => {
                        ticker.next().await;
                        *task
                    }
                    None => core::future::pending::<TaskId>().await,
                }
            };
            select(disconnected, tick).await
        };

        match outcome {
            Either::First(()) => {
                info!("Disconnected");
                self.conn = None;
                self.client = None;
                self.dispatch(LinkEvent::Disconnected);
            }
            Either::Second(task) => {
                let sample = self.next_sample();
                debug!("tick: brightness {}", sample.brightness());
                self.dispatch(LinkEvent::WriteTick { task, sample });
            }
        }
    }

    /// Colour for the next periodic write.
    fn next_sample(&mut self) -> ColourCommand {
        while let Ok(event) = self.buttons.try_receive() {
            self.panel.apply(event);
            info!(
                "panel: temperature mode {}, brightness {}",
                self.panel.temperature_mode(),
                self.panel.brightness()
            );
        }

        if self.link.config().echo_chain {
            return self.fixed.sample();
        }
        self.motion.next_command();
        self.panel.set_readings(self.motion.channels());
        self.panel.sample()
    }

    fn enqueue_one(&mut self, command: LinkCommand) {
        if let Err(dropped) = self.queue.push_back(command) {
            warn!("dropping {}", dropped);
            report(Error::BufferOverflow);
        }
    }
}

/// Transport failures after init only get logged; the state machine
/// decides how to recover.
fn report(err: Error) {
    if err.is_recoverable() {
        warn!("link error: {}", err);
    } else {
        error!("link error: {}", err);
    }
}

/// Milliseconds to SoftDevice scan units (0.625 ms).
fn scan_units(ms: u32) -> u32 {
    ms * 8 / 5
}

fn peer_address(address: &Address) -> PeerAddress {
    let kind = match address.address_type() {
        AddressType::Public => AddressKind::Public,
        AddressType::RandomStatic => AddressKind::RandomStatic,
        AddressType::RandomPrivateResolvable => AddressKind::RandomPrivateResolvable,
        AddressType::RandomPrivateNonResolvable | AddressType::Anonymous => {
            AddressKind::RandomPrivateNonResolvable
        }
    };
    PeerAddress::new(kind, address.bytes())
}

fn address_type(kind: AddressKind) -> AddressType {
    match kind {
        AddressKind::Public => AddressType::Public,
        AddressKind::RandomStatic => AddressType::RandomStatic,
        AddressKind::RandomPrivateResolvable => AddressType::RandomPrivateResolvable,
        AddressKind::RandomPrivateNonResolvable => AddressType::RandomPrivateNonResolvable,
    }
}
