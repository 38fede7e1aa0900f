//! Connection / discovery lifecycle for the bulb.
//!
//! ```text
//! Idle ─Start─▶ Scanning ─name match─▶ Connecting ─Connected(central)─▶
//!   DiscoveringServices ─service─▶ DiscoveringCharacteristics
//!   ─terminated + match─▶ Active (periodic writes armed)
//!   ─terminated, no match─▶ Inert
//! any connected state ─Disconnected─▶ Scanning
//! ```
//!
//! [`ConnectionState::handle`] applies one event and returns the transport
//! commands that follow from it. Events arrive one at a time from a single
//! dispatch loop, so nothing here needs locking.

use heapless::Vec;

use crate::ble::{
    adv_parser, CharacteristicRef, ConnectionHandle, PeerAddress, PeripheralFilter, Role,
    ScanParams,
};
use crate::bulb::{ColourCommand, CommandString, DemoSequence};
use crate::config::{BULB_ECHO_CHAIN, BULB_WRITE_INTERVAL_MS};
use crate::error::Error;

/// Most commands a single event can produce.
pub const MAX_COMMANDS: usize = 4;

/// Commands produced by one transition, in the order they must run.
pub type Commands = Vec<LinkCommand, MAX_COMMANDS>;

/// Identifies one registration of the periodic write timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(pub u32);

/// Static configuration for the link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkConfig {
    pub filter: PeripheralFilter,
    pub scan: ScanParams,
    pub write_interval_ms: u64,
    /// Chain a read after each completed write and a demo-frame write
    /// after each completed read. Off for the sensor-driven build.
    pub echo_chain: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            filter: PeripheralFilter::default(),
            scan: ScanParams::default(),
            write_interval_ms: BULB_WRITE_INTERVAL_MS,
            echo_chain: false,
        }
    }
}

impl LinkConfig {
    /// Default timings with the write/read echo chain switched on.
    pub fn echo_demo() -> Self {
        Self {
            echo_chain: true,
            ..Self::default()
        }
    }

    /// The configuration this build was compiled for.
    pub fn for_build() -> Self {
        if BULB_ECHO_CHAIN {
            Self::echo_demo()
        } else {
            Self::default()
        }
    }
}

/// Where the link currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Idle,
    Scanning,
    Connecting { peer: PeerAddress },
    DiscoveringServices { connection: ConnectionHandle },
    DiscoveringCharacteristics { connection: ConnectionHandle },
    /// Control characteristic known, periodic writes armed.
    Active { connection: ConnectionHandle },
    /// Connected, but discovery found nothing to write to. Waits for a
    /// disconnect.
    Inert { connection: ConnectionHandle },
    /// Stack initialisation failed; nothing more happens this boot.
    Failed,
}

impl LinkState {
    pub fn connection(&self) -> Option<ConnectionHandle> {
        match *self {
            LinkState::DiscoveringServices { connection }
            | LinkState::DiscoveringCharacteristics { connection }
            | LinkState::Active { connection }
            | LinkState::Inert { connection } => Some(connection),
            _ => None,
        }
    }

    fn is_discovering(&self) -> bool {
        matches!(
            self,
            LinkState::DiscoveringServices { .. } | LinkState::DiscoveringCharacteristics { .. }
        )
    }
}

/// Transport and timer events fed into the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent<'a> {
    /// Boot finished; begin scanning.
    Start,
    /// The BLE stack could not be brought up.
    InitFailed(Error),
    /// One advertising report. `data` is the raw AD payload.
    Advertisement { peer: PeerAddress, data: &'a [u8] },
    Connected { connection: ConnectionHandle, role: Role },
    ServiceDiscovered { uuid: u16 },
    CharacteristicDiscovered(CharacteristicRef),
    DiscoveryTerminated { connection: ConnectionHandle },
    /// The periodic write timer fired. `sample` is the live input value.
    WriteTick { task: TaskId, sample: ColourCommand },
    WriteComplete { value_handle: u16 },
    ReadComplete { value_handle: u16 },
    /// Link lost, or a connect attempt gave up.
    Disconnected,
}

/// Side effects requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkCommand {
    StartScan(ScanParams),
    Connect(PeerAddress),
    DiscoverServices {
        connection: ConnectionHandle,
        service_uuid: u16,
        characteristic_uuid: u16,
    },
    ArmPeriodicWrite { task: TaskId, interval_ms: u64 },
    CancelPeriodicWrite(TaskId),
    Write {
        characteristic: CharacteristicRef,
        payload: CommandString,
    },
    Read(CharacteristicRef),
    ReportInitFailure(Error),
}

/// Owns everything the link needs between events.
pub struct ConnectionState {
    config: LinkConfig,
    state: LinkState,
    characteristic: Option<CharacteristicRef>,
    /// Set when discovery saw the control characteristic; consumed when
    /// discovery terminates.
    arm_pending: bool,
    discovery_active: bool,
    write_task: Option<TaskId>,
    next_task: u32,
    demo: DemoSequence,
}

impl ConnectionState {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            state: LinkState::Idle,
            characteristic: None,
            arm_pending: false,
            discovery_active: false,
            write_task: None,
            next_task: 0,
            demo: DemoSequence::new(),
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn characteristic(&self) -> Option<CharacteristicRef> {
        self.characteristic
    }

    pub fn write_task(&self) -> Option<TaskId> {
        self.write_task
    }

    pub fn is_discovery_active(&self) -> bool {
        self.discovery_active
    }

    /// Apply one event.
    pub fn handle(&mut self, event: LinkEvent<'_>) -> Commands {
        let mut out = Commands::new();
        if self.state == LinkState::Failed {
            return out;
        }

        match event {
            LinkEvent::Start => self.on_start(&mut out),
            LinkEvent::InitFailed(err) => self.on_init_failed(err, &mut out),
            LinkEvent::Advertisement { peer, data } => self.on_advertisement(peer, data, &mut out),
            LinkEvent::Connected { connection, role } => {
                self.on_connected(connection, role, &mut out)
            }
            LinkEvent::ServiceDiscovered { uuid } => self.on_service(uuid),
            LinkEvent::CharacteristicDiscovered(characteristic) => {
                self.on_characteristic(characteristic)
            }
            LinkEvent::DiscoveryTerminated { connection } => {
                self.on_discovery_terminated(connection, &mut out)
            }
            LinkEvent::WriteTick { task, sample } => self.on_write_tick(task, sample, &mut out),
            LinkEvent::WriteComplete { value_handle } => {
                self.on_write_complete(value_handle, &mut out)
            }
            LinkEvent::ReadComplete { value_handle } => {
                self.on_read_complete(value_handle, &mut out)
            }
            LinkEvent::Disconnected => self.on_disconnected(&mut out),
        }
        out
    }

    fn on_start(&mut self, out: &mut Commands) {
        if self.state == LinkState::Idle {
            self.state = LinkState::Scanning;
            push(out, LinkCommand::StartScan(self.config.scan));
        }
    }

    fn on_init_failed(&mut self, err: Error, out: &mut Commands) {
        if let Some(task) = self.write_task.take() {
            push(out, LinkCommand::CancelPeriodicWrite(task));
        }
        self.reset_connection();
        self.state = LinkState::Failed;
        push(out, LinkCommand::ReportInitFailure(err));
    }

    fn on_advertisement(&mut self, peer: PeerAddress, data: &[u8], out: &mut Commands) {
        if self.state != LinkState::Scanning {
            return;
        }
        if adv_parser::matches_peer(data, &self.config.filter) {
            self.state = LinkState::Connecting { peer };
            push(out, LinkCommand::Connect(peer));
        }
    }

    fn on_connected(&mut self, connection: ConnectionHandle, role: Role, out: &mut Commands) {
        if role != Role::Central || self.state == LinkState::Idle {
            return;
        }

        // A fresh connection invalidates the old characteristic. An armed
        // write task survives; ticks are skipped until discovery is done.
        self.characteristic = None;
        self.arm_pending = false;
        self.discovery_active = true;
        self.state = LinkState::DiscoveringServices { connection };
        push(
            out,
            LinkCommand::DiscoverServices {
                connection,
                service_uuid: self.config.filter.service_uuid,
                characteristic_uuid: self.config.filter.characteristic_uuid,
            },
        );
    }

    fn on_service(&mut self, uuid: u16) {
        if let LinkState::DiscoveringServices { connection } = self.state {
            if uuid == self.config.filter.service_uuid {
                self.state = LinkState::DiscoveringCharacteristics { connection };
            }
        }
    }

    fn on_characteristic(&mut self, characteristic: CharacteristicRef) {
        if !self.state.is_discovering()
            || self.state.connection() != Some(characteristic.connection)
        {
            return;
        }
        if characteristic.uuid == self.config.filter.characteristic_uuid {
            self.characteristic = Some(characteristic);
            self.arm_pending = true;
            self.state = LinkState::DiscoveringCharacteristics {
                connection: characteristic.connection,
            };
        }
    }

    fn on_discovery_terminated(&mut self, connection: ConnectionHandle, out: &mut Commands) {
        if !self.state.is_discovering() || self.state.connection() != Some(connection) {
            return;
        }
        self.discovery_active = false;

        if !self.arm_pending {
            // Nothing to write to on this connection.
            if let Some(task) = self.write_task.take() {
                push(out, LinkCommand::CancelPeriodicWrite(task));
            }
            self.state = LinkState::Inert { connection };
            return;
        }

        self.arm_pending = false;
        self.state = LinkState::Active { connection };
        if self.write_task.is_none() {
            let task = TaskId(self.next_task);
            self.next_task = self.next_task.wrapping_add(1);
            self.write_task = Some(task);
            push(
                out,
                LinkCommand::ArmPeriodicWrite {
                    task,
                    interval_ms: self.config.write_interval_ms,
                },
            );
        }
    }

    fn on_write_tick(&mut self, task: TaskId, sample: ColourCommand, out: &mut Commands) {
        if self.write_task != Some(task) || self.discovery_active {
            return;
        }
        if let Some(characteristic) = self.characteristic {
            push(
                out,
                LinkCommand::Write {
                    characteristic,
                    payload: sample.encode(),
                },
            );
        }
    }

    fn on_write_complete(&mut self, value_handle: u16, out: &mut Commands) {
        if let Some(characteristic) = self.echo_target(value_handle) {
            push(out, LinkCommand::Read(characteristic));
        }
    }

    fn on_read_complete(&mut self, value_handle: u16, out: &mut Commands) {
        if let Some(characteristic) = self.echo_target(value_handle) {
            let payload = self.demo.next_command().encode();
            push(
                out,
                LinkCommand::Write {
                    characteristic,
                    payload,
                },
            );
        }
    }

    fn echo_target(&self, value_handle: u16) -> Option<CharacteristicRef> {
        if !self.config.echo_chain || !matches!(self.state, LinkState::Active { .. }) {
            return None;
        }
        self.characteristic
            .filter(|characteristic| characteristic.value_handle == value_handle)
    }

    fn on_disconnected(&mut self, out: &mut Commands) {
        if matches!(self.state, LinkState::Idle | LinkState::Scanning) {
            return;
        }
        if let Some(task) = self.write_task.take() {
            push(out, LinkCommand::CancelPeriodicWrite(task));
        }
        self.reset_connection();
        self.state = LinkState::Scanning;
        push(out, LinkCommand::StartScan(self.config.scan));
    }

    fn reset_connection(&mut self) {
        self.characteristic = None;
        self.arm_pending = false;
        self.discovery_active = false;
    }
}

fn push(out: &mut Commands, command: LinkCommand) {
    // No transition emits more than MAX_COMMANDS.
    let _ = out.push(command);
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════
