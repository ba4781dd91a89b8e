//! Sensor kinds and their sampled readings.

use crate::device::Device;
use crate::error::{DeviceError, DeviceResult};
use crate::role::{Actuation, Role};
use crate::sync::lock;
use crate::transfer::Peers;
use ps_core::DeviceId;
use ps_fluids::Fluid;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, trace};

/// What a sensor observes.
///
/// `Fluid` and `Ph` are pass-through taps wired into the flow like any other
/// device. `Volume` and `State` sample their monitored device on activation
/// and take no part in transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Fluid,
    Ph,
    Volume,
    State,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Fluid,
        SensorKind::Ph,
        SensorKind::Volume,
        SensorKind::State,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SensorKind::Fluid => "fluid",
            SensorKind::Ph => "ph",
            SensorKind::Volume => "volume",
            SensorKind::State => "state",
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, SensorKind::Fluid | SensorKind::Ph)
    }

    /// Only state sensors accept writes (they actuate what they monitor).
    pub fn is_writable(&self) -> bool {
        matches!(self, SensorKind::State)
    }

    pub fn needs_monitored_device(&self) -> bool {
        !self.is_pass_through()
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SensorKind {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SensorKind::ALL
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DeviceError::InvalidRole {
                role: s.to_string(),
            })
    }
}

/// Sensor-specific state held inside the device lock.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    pub kind: SensorKind,
    pub monitored: Option<DeviceId>,
    pub last_ph: Option<f64>,
    pub last_volume: Option<f64>,
    pub last_state: Option<Actuation>,
}

impl SensorState {
    pub fn new(kind: SensorKind) -> Self {
        Self {
            kind,
            monitored: None,
            last_ph: None,
            last_volume: None,
            last_state: None,
        }
    }

    pub(crate) fn monitored_or_err(&self, label: &str) -> DeviceResult<DeviceId> {
        self.monitored.ok_or_else(|| DeviceError::Unmonitored {
            label: label.to_string(),
        })
    }
}

/// The value a sensor reports to a controller.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorReading {
    /// Nothing sampled yet.
    Empty,
    Number(f64),
    State(Actuation),
    Fluid(Arc<Fluid>),
}

/// A controller-side write to a sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorCommand {
    /// Turn on/open (true) or turn off/close (false).
    Engage(bool),
    Set(Actuation),
}

impl Device {
    /// Point a sensor at the device it samples or actuates.
    pub fn monitor(&self, target: DeviceId) -> DeviceResult<()> {
        match &mut lock(&self.state).role {
            Role::Sensor(sensor) => {
                sensor.monitored = Some(target);
                Ok(())
            }
            _ => Err(self.not_a_sensor()),
        }
    }

    pub fn monitored(&self) -> Option<DeviceId> {
        match &lock(&self.state).role {
            Role::Sensor(sensor) => sensor.monitored,
            _ => None,
        }
    }

    /// Whether a controller may write to this device.
    pub fn is_writable(&self) -> bool {
        matches!(self.kind(), crate::RoleKind::Sensor(kind) if kind.is_writable())
    }

    /// Refresh a monitoring sensor's snapshot from its monitored device.
    ///
    /// Pass-through sensors sample during transfers, so this leaves them alone.
    pub fn sample<P: Peers + ?Sized>(&self, peers: &P) -> DeviceResult<()> {
        let (kind, target) = match &lock(&self.state).role {
            Role::Sensor(sensor) if sensor.kind.is_pass_through() => return Ok(()),
            Role::Sensor(sensor) => (sensor.kind, sensor.monitored_or_err(self.label())?),
            _ => return Err(self.not_a_sensor()),
        };
        let peer = peers
            .peer(target)
            .ok_or(DeviceError::UnknownPeer { id: target })?;

        // Read the peer first so the two locks are never held together.
        let volume = peer.volume();
        let actuation = peer.actuation();
        if let Role::Sensor(sensor) = &mut lock(&self.state).role {
            match kind {
                SensorKind::Volume => sensor.last_volume = volume,
                SensorKind::State => sensor.last_state = actuation,
                SensorKind::Fluid | SensorKind::Ph => {}
            }
        }
        trace!(sensor = %self, monitored = %peer, ?volume, ?actuation, "sampled");
        Ok(())
    }

    /// The sensor's latest reading, without touching the monitored device.
    pub fn read_sensor(&self) -> DeviceResult<SensorReading> {
        let state = lock(&self.state);
        let Role::Sensor(sensor) = &state.role else {
            return Err(self.not_a_sensor());
        };
        let reading = match sensor.kind {
            SensorKind::Fluid => state.fluid.clone().map(SensorReading::Fluid),
            SensorKind::Ph => sensor.last_ph.map(SensorReading::Number),
            SensorKind::Volume => sensor.last_volume.map(SensorReading::Number),
            SensorKind::State => sensor.last_state.map(SensorReading::State),
        };
        Ok(reading.unwrap_or(SensorReading::Empty))
    }

    /// Forward a controller write to the monitored device.
    ///
    /// Only state sensors accept writes. The snapshot is updated right away
    /// so a read after the write sees the new state.
    pub fn write_sensor<P: Peers + ?Sized>(
        &self,
        peers: &P,
        command: SensorCommand,
    ) -> DeviceResult<()> {
        let target = match &lock(&self.state).role {
            Role::Sensor(sensor) if sensor.kind.is_writable() => {
                sensor.monitored_or_err(self.label())?
            }
            Role::Sensor(_) => {
                return Err(DeviceError::ReadOnly {
                    label: self.label().to_string(),
                });
            }
            _ => return Err(self.not_a_sensor()),
        };
        let peer = peers
            .peer(target)
            .ok_or(DeviceError::UnknownPeer { id: target })?;
        match command {
            SensorCommand::Engage(engaged) => peer.set_engaged(engaged)?,
            SensorCommand::Set(actuation) => peer.actuate(actuation)?,
        }

        let actuation = peer.actuation();
        if let Role::Sensor(sensor) = &mut lock(&self.state).role {
            sensor.last_state = actuation;
        }
        debug!(sensor = %self, monitored = %peer, ?command, "written");
        Ok(())
    }

    fn not_a_sensor(&self) -> DeviceError {
        DeviceError::NotASensor {
            label: self.label().to_string(),
        }
    }
}
