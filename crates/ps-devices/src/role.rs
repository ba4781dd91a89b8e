//! Device roles and their per-role state.

use crate::error::{DeviceError, DeviceResult};
use crate::sensor::{SensorKind, SensorState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Volume a pump tries to move per activation unless configured otherwise.
pub const DEFAULT_PUMP_FLOW: f64 = 1.0;

/// Pump power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PumpState {
    On,
    #[default]
    Off,
}

impl PumpState {
    pub fn is_on(&self) -> bool {
        matches!(self, PumpState::On)
    }
}

/// Valve position state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveState {
    Open,
    #[default]
    Closed,
}

impl ValveState {
    pub fn is_open(&self) -> bool {
        matches!(self, ValveState::Open)
    }
}

/// The discrete state of an actuated device, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Actuation {
    Pump(PumpState),
    Valve(ValveState),
}

impl Actuation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actuation::Pump(PumpState::On) => "on",
            Actuation::Pump(PumpState::Off) => "off",
            Actuation::Valve(ValveState::Open) => "open",
            Actuation::Valve(ValveState::Closed) => "closed",
        }
    }
}

impl fmt::Display for Actuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Actuation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(Actuation::Pump(PumpState::On)),
            "off" => Ok(Actuation::Pump(PumpState::Off)),
            "open" => Ok(Actuation::Valve(ValveState::Open)),
            "closed" | "close" => Ok(Actuation::Valve(ValveState::Closed)),
            _ => Err(s.to_string()),
        }
    }
}

/// Role tag: the behavioral category of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Pump,
    Valve,
    Tank,
    Reservoir,
    Sensor(SensorKind),
}

impl RoleKind {
    /// Roles a plain (non-sensor) device may declare.
    pub const DEVICES: [RoleKind; 4] = [
        RoleKind::Pump,
        RoleKind::Valve,
        RoleKind::Tank,
        RoleKind::Reservoir,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            RoleKind::Pump => "pump",
            RoleKind::Valve => "valve",
            RoleKind::Tank => "tank",
            RoleKind::Reservoir => "reservoir",
            RoleKind::Sensor(_) => "sensor",
        }
    }

    /// Activation period (seconds) used when the configuration gives none.
    ///
    /// Valves only change on explicit open/close, so they have no timer.
    pub fn default_period(&self) -> Option<f64> {
        match self {
            RoleKind::Valve => None,
            _ => Some(1.0),
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKind::Sensor(kind) => write!(f, "sensor:{kind}"),
            other => f.write_str(other.key()),
        }
    }
}

impl FromStr for RoleKind {
    type Err = DeviceError;

    /// Parse a device role. Sensor roles go through [`SensorKind`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        RoleKind::DEVICES
            .into_iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DeviceError::InvalidRole {
                role: s.to_string(),
            })
    }
}

/// Role-specific mutable state, one closed variant per role.
#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    Pump {
        state: PumpState,
        /// Volume pulled from the inputs on each activation.
        flow_rate: f64,
    },
    Valve {
        state: ValveState,
    },
    Tank {
        volume: f64,
    },
    /// A tank tagged as an inexhaustible source. Nothing enforces that; it is
    /// expected to start with a very large volume.
    Reservoir {
        volume: f64,
    },
    Sensor(SensorState),
}

impl Role {
    pub fn pump() -> Self {
        Role::Pump {
            state: PumpState::Off,
            flow_rate: DEFAULT_PUMP_FLOW,
        }
    }

    pub fn valve() -> Self {
        Role::Valve {
            state: ValveState::Closed,
        }
    }

    pub fn tank(volume: f64) -> Self {
        Role::Tank {
            volume: ps_core::sanitize_volume(volume),
        }
    }

    pub fn reservoir(volume: f64) -> Self {
        Role::Reservoir {
            volume: ps_core::sanitize_volume(volume),
        }
    }

    pub fn sensor(kind: SensorKind) -> Self {
        Role::Sensor(SensorState::new(kind))
    }

    /// Build a plain device role from its tag with default state.
    pub fn from_kind(kind: RoleKind) -> Self {
        match kind {
            RoleKind::Pump => Role::pump(),
            RoleKind::Valve => Role::valve(),
            RoleKind::Tank => Role::tank(0.0),
            RoleKind::Reservoir => Role::reservoir(0.0),
            RoleKind::Sensor(kind) => Role::sensor(kind),
        }
    }

    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Pump { .. } => RoleKind::Pump,
            Role::Valve { .. } => RoleKind::Valve,
            Role::Tank { .. } => RoleKind::Tank,
            Role::Reservoir { .. } => RoleKind::Reservoir,
            Role::Sensor(sensor) => RoleKind::Sensor(sensor.kind),
        }
    }

    /// Stored volume, for roles that hold inventory.
    pub fn volume(&self) -> Option<f64> {
        match self {
            Role::Tank { volume } | Role::Reservoir { volume } => Some(*volume),
            _ => None,
        }
    }

    pub fn actuation(&self) -> Option<Actuation> {
        match self {
            Role::Pump { state, .. } => Some(Actuation::Pump(*state)),
            Role::Valve { state } => Some(Actuation::Valve(*state)),
            _ => None,
        }
    }

    /// Set the actuation of a role that is not yet attached to a device.
    pub fn set_actuation(&mut self, actuation: Actuation) -> DeviceResult<()> {
        let label = self.kind().key();
        self.actuate(label, actuation)
    }

    /// Apply an actuation; the kind of actuation must match the role.
    pub(crate) fn actuate(&mut self, label: &str, actuation: Actuation) -> DeviceResult<()> {
        match (self, actuation) {
            (Role::Pump { state, .. }, Actuation::Pump(next)) => *state = next,
            (Role::Valve { state }, Actuation::Valve(next)) => *state = next,
            (Role::Pump { .. } | Role::Valve { .. }, other) => {
                return Err(DeviceError::InvalidState {
                    label: label.to_string(),
                    value: other.to_string(),
                });
            }
            _ => {
                return Err(DeviceError::NoState {
                    label: label.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Engage (on/open) or disengage (off/closed) whatever this role actuates.
    pub(crate) fn engage(&mut self, label: &str, engaged: bool) -> DeviceResult<()> {
        let actuation = match self {
            Role::Pump { .. } if engaged => Actuation::Pump(PumpState::On),
            Role::Pump { .. } => Actuation::Pump(PumpState::Off),
            Role::Valve { .. } if engaged => Actuation::Valve(ValveState::Open),
            Role::Valve { .. } => Actuation::Valve(ValveState::Closed),
            _ => {
                return Err(DeviceError::NoState {
                    label: label.to_string(),
                });
            }
        };
        self.actuate(label, actuation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_device_roles() {
        assert_eq!("pump".parse::<RoleKind>().unwrap(), RoleKind::Pump);
        assert_eq!("Reservoir".parse::<RoleKind>().unwrap(), RoleKind::Reservoir);
        assert!(matches!(
            "boiler".parse::<RoleKind>(),
            Err(DeviceError::InvalidRole { .. })
        ));
    }

    #[test]
    fn sensor_is_not_a_device_role() {
        assert!("sensor".parse::<RoleKind>().is_err());
    }

    #[test]
    fn actuation_parse_and_display() {
        for text in ["on", "off", "open", "closed"] {
            let a: Actuation = text.parse().unwrap();
            assert_eq!(a.to_string(), text);
        }
        assert!("half".parse::<Actuation>().is_err());
    }

    #[test]
    fn actuate_checks_role_match() {
        let mut pump = Role::pump();
        pump.actuate("p1", Actuation::Pump(PumpState::On)).unwrap();
        assert_eq!(pump.actuation(), Some(Actuation::Pump(PumpState::On)));

        let err = pump
            .actuate("p1", Actuation::Valve(ValveState::Open))
            .unwrap_err();
        assert!(matches!(err, DeviceError::InvalidState { .. }));

        let mut tank = Role::tank(1.0);
        assert!(matches!(
            tank.engage("t1", true),
            Err(DeviceError::NoState { .. })
        ));
    }

    #[test]
    fn tank_constructor_clamps_negative() {
        assert_eq!(Role::tank(-4.0).volume(), Some(0.0));
        assert_eq!(Role::reservoir(1e10).volume(), Some(1e10));
    }

    #[test]
    fn default_periods() {
        assert_eq!(RoleKind::Valve.default_period(), None);
        assert_eq!(RoleKind::Tank.default_period(), Some(1.0));
        assert_eq!(
            RoleKind::Sensor(SensorKind::Volume).default_period(),
            Some(1.0)
        );
    }
}
