//! The device node: identity, role state, wiring, and activation.

use crate::error::{DeviceError, DeviceResult};
use crate::role::{Actuation, PumpState, Role, RoleKind, ValveState};
use crate::sync::{lock, read, write};
use crate::transfer::{Direction, Peers, TransferPath};
use ps_core::DeviceId;
use ps_fluids::Fluid;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, trace};

/// Upstream and downstream peers of a device.
///
/// Sets are ordered so transfers visit peers in a deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    pub inputs: BTreeSet<DeviceId>,
    pub outputs: BTreeSet<DeviceId>,
}

/// Everything a transfer or activation may mutate, behind one lock.
#[derive(Debug)]
pub(crate) struct DeviceState {
    pub(crate) role: Role,
    pub(crate) fluid: Option<Arc<Fluid>>,
}

/// A node in the plant graph.
///
/// The id is the device's slot in the owning arena. Labels are for humans
/// and need not be unique.
#[derive(Debug)]
pub struct Device {
    id: DeviceId,
    label: String,
    kind: RoleKind,
    pub(crate) state: Mutex<DeviceState>,
    links: RwLock<Links>,
    period: Mutex<Option<f64>>,
}

impl Device {
    /// Create a device with its role's default activation period.
    pub fn new(id: DeviceId, label: impl Into<String>, role: Role) -> Self {
        let kind = role.kind();
        Self {
            id,
            label: label.into(),
            kind,
            state: Mutex::new(DeviceState { role, fluid: None }),
            links: RwLock::new(Links::default()),
            period: Mutex::new(kind.default_period()),
        }
    }

    /// Start out holding `fluid`.
    pub fn with_fluid(self, fluid: Fluid) -> Self {
        self.set_fluid(fluid);
        self
    }

    /// Override the activation period; `None` disables recurring activation.
    pub fn with_period(self, period: Option<f64>) -> Self {
        self.set_period(period);
        self
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> RoleKind {
        self.kind
    }

    pub fn is_sensor(&self) -> bool {
        matches!(self.kind, RoleKind::Sensor(_))
    }

    /// Snapshot of the role state.
    pub fn role(&self) -> Role {
        lock(&self.state).role.clone()
    }

    // ---- wiring -------------------------------------------------------

    /// Register `peer` upstream of this device, and this device downstream of `peer`.
    ///
    /// Adding a peer that is already present changes nothing.
    pub fn add_input(&self, peer: &Device) {
        let added = write(&self.links).inputs.insert(peer.id);
        if added {
            write(&peer.links).outputs.insert(self.id);
            trace!(from = %peer, to = %self, "linked");
        }
    }

    /// Register `peer` downstream of this device, and this device upstream of `peer`.
    pub fn add_output(&self, peer: &Device) {
        let added = write(&self.links).outputs.insert(peer.id);
        if added {
            write(&peer.links).inputs.insert(self.id);
            trace!(from = %self, to = %peer, "linked");
        }
    }

    pub fn links(&self) -> Links {
        read(&self.links).clone()
    }

    pub fn inputs(&self) -> Vec<DeviceId> {
        read(&self.links).inputs.iter().copied().collect()
    }

    pub fn outputs(&self) -> Vec<DeviceId> {
        read(&self.links).outputs.iter().copied().collect()
    }

    // ---- held fluid and volume ------------------------------------------

    pub fn fluid(&self) -> Option<Arc<Fluid>> {
        lock(&self.state).fluid.clone()
    }

    /// Replace the held fluid parcel.
    pub fn set_fluid(&self, fluid: Fluid) {
        lock(&self.state).fluid = Some(Arc::new(fluid));
    }

    /// Stored volume for tanks and reservoirs, `None` for everything else.
    pub fn volume(&self) -> Option<f64> {
        lock(&self.state).role.volume()
    }

    /// Overwrite a tank's stored volume (negative values clamp to 0).
    pub fn set_volume(&self, volume: f64) -> DeviceResult<()> {
        let mut state = lock(&self.state);
        match &mut state.role {
            Role::Tank { volume: stock } | Role::Reservoir { volume: stock } => {
                *stock = ps_core::sanitize_volume(volume);
                Ok(())
            }
            _ => Err(DeviceError::InvalidState {
                label: self.label.clone(),
                value: format!("volume={volume}"),
            }),
        }
    }

    // ---- actuation ---------------------------------------------------------

    pub fn actuation(&self) -> Option<Actuation> {
        lock(&self.state).role.actuation()
    }

    pub fn actuate(&self, actuation: Actuation) -> DeviceResult<()> {
        lock(&self.state).role.actuate(&self.label, actuation)?;
        debug!(device = %self, state = %actuation, "actuated");
        Ok(())
    }

    /// Turn on / open (true) or turn off / close (false).
    pub fn set_engaged(&self, engaged: bool) -> DeviceResult<()> {
        lock(&self.state).role.engage(&self.label, engaged)?;
        debug!(device = %self, engaged, "actuated");
        Ok(())
    }

    pub fn turn_on(&self) -> DeviceResult<()> {
        self.actuate(Actuation::Pump(PumpState::On))
    }

    pub fn turn_off(&self) -> DeviceResult<()> {
        self.actuate(Actuation::Pump(PumpState::Off))
    }

    pub fn open(&self) -> DeviceResult<()> {
        self.actuate(Actuation::Valve(ValveState::Open))
    }

    pub fn close(&self) -> DeviceResult<()> {
        self.actuate(Actuation::Valve(ValveState::Closed))
    }

    // ---- activation ----------------------------------------------------------

    /// Seconds between activations, before speed scaling.
    pub fn period(&self) -> Option<f64> {
        *lock(&self.period)
    }

    /// Non-positive or non-finite periods disable recurring activation.
    pub fn set_period(&self, period: Option<f64>) {
        *lock(&self.period) = period.filter(|p| p.is_finite() && *p > 0.0);
    }

    /// Run one activation cycle of this device's worker step.
    ///
    /// Pumps pull their flow rate from their inputs, monitoring sensors
    /// sample their device, tanks report their level. Relays do nothing:
    /// their state only changes through transfers and actuation.
    pub fn activate<P: Peers + ?Sized>(&self, peers: &P) -> DeviceResult<()> {
        let role = self.role();
        match role {
            Role::Pump { state, flow_rate } => {
                if state.is_on() {
                    let mut path = TransferPath::new();
                    let moved = path.within(self, Direction::Supply, |path| {
                        self.pull_inputs(peers, flow_rate, path)
                    })?;
                    debug!(device = %self, moved, "pump cycle");
                }
            }
            Role::Tank { volume } | Role::Reservoir { volume } => {
                let fluid = self
                    .fluid()
                    .map_or_else(|| "-".to_string(), |f| f.to_string());
                debug!(device = %self, volume, %fluid, "level");
            }
            Role::Sensor(sensor) if !sensor.kind.is_pass_through() => {
                self.sample(peers)?;
            }
            Role::Valve { .. } | Role::Sensor(_) => {}
        }
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}][{}]", self.id, self.kind, self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorKind;

    fn device(i: u32, label: &str, role: Role) -> Device {
        Device::new(DeviceId::from_index(i), label, role)
    }

    #[test]
    fn add_output_is_symmetric() {
        let a = device(0, "a", Role::valve());
        let b = device(1, "b", Role::tank(0.0));
        a.add_output(&b);
        assert!(a.links().outputs.contains(&b.id()));
        assert!(b.links().inputs.contains(&a.id()));
        assert!(a.links().inputs.is_empty());
        assert!(b.links().outputs.is_empty());
    }

    #[test]
    fn add_input_is_symmetric_and_idempotent() {
        let a = device(0, "a", Role::valve());
        let b = device(1, "b", Role::pump());
        b.add_input(&a);
        b.add_input(&a);
        a.add_output(&b);
        assert_eq!(b.inputs(), vec![a.id()]);
        assert_eq!(a.outputs(), vec![b.id()]);
    }

    #[test]
    fn self_loop_links_both_sides() {
        let a = device(0, "a", Role::valve());
        a.add_output(&a);
        assert_eq!(a.inputs(), vec![a.id()]);
        assert_eq!(a.outputs(), vec![a.id()]);
    }

    #[test]
    fn display_shows_id_role_label() {
        let d = device(3, "pump1", Role::pump());
        assert_eq!(d.to_string(), "[0003][pump][pump1]");
        let s = device(4, "ph1", Role::sensor(SensorKind::Ph));
        assert_eq!(s.to_string(), "[0004][sensor:ph][ph1]");
    }

    #[test]
    fn period_defaults_and_overrides() {
        assert_eq!(device(0, "v", Role::valve()).period(), None);
        let p = device(1, "p", Role::pump()).with_period(Some(0.5));
        assert_eq!(p.period(), Some(0.5));
        p.set_period(Some(0.0));
        assert_eq!(p.period(), None);
        p.set_period(Some(f64::NAN));
        assert_eq!(p.period(), None);
    }

    #[test]
    fn actuation_helpers() {
        let p = device(0, "p", Role::pump());
        p.turn_on().unwrap();
        assert_eq!(p.actuation(), Some(Actuation::Pump(PumpState::On)));
        assert!(p.open().is_err());
        p.set_engaged(false).unwrap();
        assert_eq!(p.actuation(), Some(Actuation::Pump(PumpState::Off)));

        let t = device(1, "t", Role::tank(1.0));
        assert!(matches!(t.turn_on(), Err(DeviceError::NoState { .. })));
        assert_eq!(t.actuation(), None);
    }

    #[test]
    fn set_volume_only_on_tanks() {
        let t = device(0, "t", Role::reservoir(0.0));
        t.set_volume(-1.0).unwrap();
        assert_eq!(t.volume(), Some(0.0));
        t.set_volume(8.0).unwrap();
        assert_eq!(t.volume(), Some(8.0));
        assert!(device(1, "v", Role::valve()).set_volume(1.0).is_err());
    }
}
