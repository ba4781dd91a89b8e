//! The plant arena.

use crate::error::{GraphError, GraphResult};
use ps_core::DeviceId;
use ps_devices::{Device, Peers, Role};

/// Every device and sensor of a simulation, indexed by [`DeviceId`].
///
/// Devices are only ever appended, so an id stays valid for the plant's
/// lifetime. Wiring goes through `&self`: the links live inside each device
/// behind its own lock, which lets a shared plant be rewired while running.
#[derive(Debug, Default)]
pub struct Plant {
    devices: Vec<Device>,
}

impl Plant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device built from `role` and return its id.
    pub fn add_device(&mut self, label: impl Into<String>, role: Role) -> DeviceId {
        let id = DeviceId::from_index(self.devices.len() as u32);
        self.devices.push(Device::new(id, label, role));
        id
    }

    /// Add a device configured by `f`, which receives the fresh device.
    pub fn add_with(
        &mut self,
        label: impl Into<String>,
        role: Role,
        f: impl FnOnce(Device) -> Device,
    ) -> DeviceId {
        let id = DeviceId::from_index(self.devices.len() as u32);
        self.devices.push(f(Device::new(id, label, role)));
        id
    }

    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.slot())
    }

    pub fn device_or_err(&self, id: DeviceId) -> GraphResult<&Device> {
        self.device(id).ok_or(GraphError::UnknownDevice { id })
    }

    /// First device carrying `label`. Labels may repeat.
    pub fn find(&self, label: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.label() == label)
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn sensors(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter().filter(|d| d.is_sensor())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Wire `from -> to`. Repeating an existing edge is a no-op.
    pub fn connect(&self, from: DeviceId, to: DeviceId) -> GraphResult<()> {
        let upstream = self.device_or_err(from)?;
        let downstream = self.device_or_err(to)?;
        upstream.add_output(downstream);
        Ok(())
    }

    /// Run one activation cycle of device `id`.
    pub fn activate(&self, id: DeviceId) -> GraphResult<()> {
        self.device_or_err(id)?.activate(self)?;
        Ok(())
    }

    /// Refresh every monitoring sensor's snapshot.
    pub fn sample_sensors(&self) -> GraphResult<()> {
        for sensor in self.sensors() {
            sensor.sample(self)?;
        }
        Ok(())
    }
}

impl Peers for Plant {
    fn peer(&self, id: DeviceId) -> Option<&Device> {
        self.device(id)
    }
}
