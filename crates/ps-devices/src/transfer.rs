//! Fluid transfer protocol: `receive` pushes fluid downstream, `supply` pulls
//! it from upstream.
//!
//! Calls are synchronous and go straight to the peer, without waiting for the
//! peer's own activation. A device's lock is held only while reading or
//! updating its own state and is always released before a peer is called, so
//! no call ever holds two device locks.
//!
//! Relays (pumps, valves, pass-through sensors) split an offer across their
//! outputs: each output is offered what the previous ones left, and the sum
//! accepted is returned. Pulls work the same way over inputs. Totals never
//! exceed the offer or the request.

use crate::device::Device;
use crate::error::{DeviceError, DeviceResult};
use crate::role::Role;
use crate::sync::lock;
use ps_core::{DeviceId, available_volume, sanitize_volume};
use ps_fluids::Fluid;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Longest chain of nested transfers before the chain is aborted.
pub const MAX_TRANSFER_DEPTH: usize = 64;

/// Lookup of devices by id, implemented by whatever owns the arena.
pub trait Peers {
    fn peer(&self, id: DeviceId) -> Option<&Device>;
}

impl Peers for [Device] {
    fn peer(&self, id: DeviceId) -> Option<&Device> {
        self.get(id.slot())
    }
}

impl Peers for Vec<Device> {
    fn peer(&self, id: DeviceId) -> Option<&Device> {
        self.get(id.slot())
    }
}

/// Which leg of the protocol a device is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Receive,
    Supply,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Receive => f.write_str("receive"),
            Direction::Supply => f.write_str("supply"),
        }
    }
}

/// The chain of devices a single transfer has passed through.
///
/// A device may appear once per direction: a tank answering a pull pushes
/// back through the relays that asked, which is a receive leg, not a loop.
/// Seeing the same device twice in the same direction means the wiring has a
/// cycle and the transfer fails instead of recursing forever.
#[derive(Debug, Default)]
pub struct TransferPath {
    hops: Vec<(DeviceId, Direction)>,
}

impl TransferPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.hops.len()
    }

    /// Run `f` with `device` pushed on the path.
    pub(crate) fn within<T>(
        &mut self,
        device: &Device,
        direction: Direction,
        f: impl FnOnce(&mut Self) -> DeviceResult<T>,
    ) -> DeviceResult<T> {
        let hop = (device.id(), direction);
        if self.hops.contains(&hop) {
            return Err(DeviceError::TransferCycle {
                label: device.label().to_string(),
                direction,
            });
        }
        if self.hops.len() >= MAX_TRANSFER_DEPTH {
            return Err(DeviceError::TransferTooDeep {
                depth: MAX_TRANSFER_DEPTH,
            });
        }
        self.hops.push(hop);
        let out = f(self);
        self.hops.pop();
        out
    }
}

/// What a device does with an incoming offer, decided under its lock.
enum Intake {
    Reject,
    Relay,
    Stored(f64),
}

/// What a device does with a request, decided under its lock.
enum Outflow {
    Reject,
    Pull,
    Stock { fluid: Arc<Fluid>, offer: f64 },
}

impl Device {
    /// Offer `volume` of `fluid` to this device; returns the volume absorbed.
    pub fn receive<P: Peers + ?Sized>(
        &self,
        peers: &P,
        fluid: Arc<Fluid>,
        volume: f64,
    ) -> DeviceResult<f64> {
        self.receive_within(peers, &fluid, volume, &mut TransferPath::new())
    }

    /// Ask this device to provide `volume` to `requester`; returns the volume supplied.
    pub fn supply<P: Peers + ?Sized>(
        &self,
        peers: &P,
        requester: DeviceId,
        volume: f64,
    ) -> DeviceResult<f64> {
        self.supply_within(peers, requester, volume, &mut TransferPath::new())
    }

    pub fn receive_within<P: Peers + ?Sized>(
        &self,
        peers: &P,
        fluid: &Arc<Fluid>,
        volume: f64,
        path: &mut TransferPath,
    ) -> DeviceResult<f64> {
        let volume = sanitize_volume(volume);
        if volume == 0.0 {
            return Ok(0.0);
        }
        path.within(self, Direction::Receive, |path| {
            let intake = {
                let mut guard = lock(&self.state);
                let state = &mut *guard;
                match &mut state.role {
                    Role::Pump { state: power, .. } => {
                        if power.is_on() {
                            state.fluid = Some(Arc::clone(fluid));
                            Intake::Relay
                        } else {
                            Intake::Reject
                        }
                    }
                    Role::Valve { state: position } => {
                        if position.is_open() {
                            Intake::Relay
                        } else {
                            Intake::Reject
                        }
                    }
                    Role::Tank { volume: stock } | Role::Reservoir { volume: stock } => {
                        *stock += volume;
                        state.fluid = Some(Arc::clone(fluid));
                        Intake::Stored(volume)
                    }
                    Role::Sensor(sensor) if sensor.kind.is_pass_through() => {
                        sensor.last_ph = fluid.ph();
                        state.fluid = Some(Arc::clone(fluid));
                        Intake::Relay
                    }
                    Role::Sensor(_) => Intake::Reject,
                }
            };

            match intake {
                Intake::Reject => Ok(0.0),
                Intake::Stored(accepted) => {
                    trace!(device = %self, accepted, "stored");
                    Ok(accepted)
                }
                Intake::Relay => self.push_outputs(peers, fluid, volume, path),
            }
        })
    }

    pub fn supply_within<P: Peers + ?Sized>(
        &self,
        peers: &P,
        requester: DeviceId,
        volume: f64,
        path: &mut TransferPath,
    ) -> DeviceResult<f64> {
        let volume = sanitize_volume(volume);
        if volume == 0.0 {
            return Ok(0.0);
        }
        path.within(self, Direction::Supply, |path| {
            let outflow = {
                let state = lock(&self.state);
                match &state.role {
                    Role::Pump { state: power, .. } if power.is_on() => Outflow::Pull,
                    Role::Valve { state: position } if position.is_open() => Outflow::Pull,
                    Role::Tank { volume: stock } | Role::Reservoir { volume: stock } => {
                        match &state.fluid {
                            Some(fluid) => Outflow::Stock {
                                fluid: Arc::clone(fluid),
                                offer: available_volume(*stock, volume),
                            },
                            None => Outflow::Reject,
                        }
                    }
                    Role::Sensor(sensor) if sensor.kind.is_pass_through() => Outflow::Pull,
                    _ => Outflow::Reject,
                }
            };

            match outflow {
                Outflow::Reject => Ok(0.0),
                Outflow::Pull => self.pull_inputs(peers, volume, path),
                Outflow::Stock { fluid, offer } => {
                    if offer == 0.0 {
                        return Ok(0.0);
                    }
                    let target = peers
                        .peer(requester)
                        .ok_or(DeviceError::UnknownPeer { id: requester })?;
                    let accepted = sanitize_volume(target.receive_within(peers, &fluid, offer, path)?)
                        .min(offer);
                    Ok(self.draw_down(accepted))
                }
            }
        })
    }

    /// Remove up to `amount` from stored volume; returns what was removed.
    fn draw_down(&self, amount: f64) -> f64 {
        let mut state = lock(&self.state);
        match &mut state.role {
            Role::Tank { volume } | Role::Reservoir { volume } => {
                let taken = available_volume(*volume, amount);
                *volume -= taken;
                trace!(device = %self, taken, remaining = *volume, "drawn down");
                taken
            }
            _ => 0.0,
        }
    }

    fn push_outputs<P: Peers + ?Sized>(
        &self,
        peers: &P,
        fluid: &Arc<Fluid>,
        volume: f64,
        path: &mut TransferPath,
    ) -> DeviceResult<f64> {
        let mut remaining = volume;
        for id in self.outputs() {
            if remaining <= 0.0 {
                break;
            }
            let peer = peers.peer(id).ok_or(DeviceError::UnknownPeer { id })?;
            let took = sanitize_volume(peer.receive_within(peers, fluid, remaining, path)?)
                .min(remaining);
            remaining -= took;
        }
        let accepted = volume - remaining;
        trace!(device = %self, offered = volume, accepted, "relayed downstream");
        Ok(accepted)
    }

    /// Ask every input in turn for what is still missing, naming this device
    /// as the requester.
    pub(crate) fn pull_inputs<P: Peers + ?Sized>(
        &self,
        peers: &P,
        volume: f64,
        path: &mut TransferPath,
    ) -> DeviceResult<f64> {
        let mut remaining = volume;
        for id in self.inputs() {
            if remaining <= 0.0 {
                break;
            }
            let peer = peers.peer(id).ok_or(DeviceError::UnknownPeer { id })?;
            let got = sanitize_volume(peer.supply_within(peers, self.id(), remaining, path)?)
                .min(remaining);
            remaining -= got;
        }
        let supplied = volume - remaining;
        trace!(device = %self, requested = volume, supplied, "pulled upstream");
        Ok(supplied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    fn arena(roles: Vec<(&str, Role)>) -> Vec<Device> {
        roles
            .into_iter()
            .enumerate()
            .map(|(i, (label, role))| Device::new(DeviceId::from_index(i as u32), label, role))
            .collect()
    }

    #[test]
    fn path_detects_same_direction_reentry() {
        let devices = arena(vec![("v1", Role::valve())]);
        let mut path = TransferPath::new();
        let err = path
            .within(&devices[0], Direction::Receive, |path| {
                path.within(&devices[0], Direction::Receive, |_| Ok(()))
            })
            .unwrap_err();
        assert!(matches!(err, DeviceError::TransferCycle { .. }));
        assert_eq!(path.depth(), 0);
    }

    #[test]
    fn path_allows_opposite_direction() {
        let devices = arena(vec![("v1", Role::valve())]);
        let mut path = TransferPath::new();
        let depth = path
            .within(&devices[0], Direction::Supply, |path| {
                path.within(&devices[0], Direction::Receive, |path| Ok(path.depth()))
            })
            .unwrap();
        assert_eq!(depth, 2);
    }

    #[test]
    fn zero_and_negative_offers_are_noops() {
        let devices = arena(vec![("t1", Role::tank(3.0))]);
        let water = Arc::new(Fluid::water());
        assert_eq!(devices[0].receive(&devices, Arc::clone(&water), 0.0).unwrap(), 0.0);
        assert_eq!(devices[0].receive(&devices, water, -2.0).unwrap(), 0.0);
        assert_eq!(devices[0].volume(), Some(3.0));
        assert!(devices[0].fluid().is_none());
    }

    #[test]
    fn tank_without_fluid_supplies_nothing() {
        let devices = arena(vec![("t1", Role::tank(10.0)), ("t2", Role::tank(0.0))]);
        devices[0].add_output(&devices[1]);
        let got = devices[0].supply(&devices, devices[1].id(), 5.0).unwrap();
        assert_eq!(got, 0.0);
        assert_eq!(devices[0].volume(), Some(10.0));
    }

    #[test]
    fn tank_supply_capped_by_stock() {
        let devices = arena(vec![("t1", Role::tank(2.0)), ("t2", Role::tank(0.0))]);
        devices[0].set_fluid(Fluid::water());
        let got = devices[0].supply(&devices, devices[1].id(), 5.0).unwrap();
        assert_eq!(got, 2.0);
        assert_eq!(devices[0].volume(), Some(0.0));
        assert_eq!(devices[1].volume(), Some(2.0));
    }

    #[test]
    fn relay_splits_offer_across_outputs() {
        let devices = arena(vec![
            ("v1", Role::valve()),
            ("t1", Role::tank(0.0)),
            ("t2", Role::tank(0.0)),
        ]);
        devices[0].add_output(&devices[1]);
        devices[0].add_output(&devices[2]);
        devices[0].open().unwrap();

        let accepted = devices[0]
            .receive(&devices, Arc::new(Fluid::water()), 4.0)
            .unwrap();
        assert_eq!(accepted, 4.0);
        // Tanks are unbounded, so the first output takes the whole offer.
        assert_eq!(devices[1].volume(), Some(4.0));
        assert_eq!(devices[2].volume(), Some(0.0));
    }

    #[test]
    fn unknown_peer_is_reported() {
        let devices = arena(vec![("v1", Role::valve())]);
        let ghost = Device::new(DeviceId::from_index(9), "ghost", Role::tank(0.0));
        devices[0].add_output(&ghost);
        devices[0].open().unwrap();
        let err = devices[0]
            .receive(&devices, Arc::new(Fluid::water()), 1.0)
            .unwrap_err();
        assert!(matches!(err, DeviceError::UnknownPeer { .. }));
    }
}
