//! PLC records and the register bridge.

use crate::error::{BridgeError, BridgeResult};
use crate::value::RegisterValue;
use ps_core::DeviceId;
use ps_graph::Plant;
use ps_project::PlcDef;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

pub type ReadFn = Arc<dyn Fn() -> BridgeResult<RegisterValue> + Send + Sync>;
pub type WriteFn = Arc<dyn Fn(RegisterValue) -> BridgeResult<()> + Send + Sync>;

/// What the transport may do with one sensor, bound once at bridge construction.
#[derive(Clone)]
pub struct RegisterCapability {
    pub read: ReadFn,
    pub write: Option<WriteFn>,
}

impl RegisterCapability {
    /// Bind the read accessor of `sensor`, and its write accessor if the sensor accepts writes.
    ///
    /// Reads return the sensor's last sample; sampling belongs to the sensor's
    /// own activation, so the bridge never changes device state on a read.
    pub fn for_sensor(plant: &Arc<Plant>, sensor: DeviceId) -> BridgeResult<Self> {
        let device = plant.device(sensor).ok_or_else(|| missing(sensor))?;
        let writable = device.is_writable();
        let name = device.label().to_string();

        let read: ReadFn = {
            let plant = Arc::clone(plant);
            Arc::new(move || -> BridgeResult<RegisterValue> {
                let device = plant.device(sensor).ok_or_else(|| missing(sensor))?;
                Ok(device.read_sensor()?.into())
            })
        };

        let write: Option<WriteFn> = writable.then(|| {
            let plant = Arc::clone(plant);
            let write: WriteFn = Arc::new(move |value: RegisterValue| -> BridgeResult<()> {
                let command = value.to_command().ok_or_else(|| BridgeError::InvalidValue {
                    name: name.clone(),
                    value: value.to_string(),
                })?;
                let device = plant.device(sensor).ok_or_else(|| missing(sensor))?;
                device.write_sensor(plant.as_ref(), command)?;
                Ok(())
            });
            write
        });

        Ok(Self { read, write })
    }
}

impl std::fmt::Debug for RegisterCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCapability")
            .field("writable", &self.write.is_some())
            .finish()
    }
}

/// One register of a PLC.
#[derive(Debug, Clone)]
pub struct Register {
    pub name: String,
    /// Position in the PLC's sensor list.
    pub address: usize,
    pub sensor: DeviceId,
    pub capability: RegisterCapability,
    /// Value from the latest read cycle.
    pub last_value: RegisterValue,
}

/// An external controller and the registers it may see.
#[derive(Debug, Clone)]
pub struct PlcRecord {
    pub name: String,
    pub registered: bool,
    pub registers: Vec<Register>,
}

impl PlcRecord {
    fn register(&self, name: &str) -> BridgeResult<&Register> {
        self.registers
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| BridgeError::UnknownRegister {
                plc: self.name.clone(),
                name: name.to_string(),
            })
    }

    fn table(&self) -> RegisterTable {
        self.registers
            .iter()
            .map(|r| {
                (
                    r.name.clone(),
                    RegisterEntry {
                        address: r.address,
                        value: r.last_value.clone(),
                        writable: r.capability.write.is_some(),
                    },
                )
            })
            .collect()
    }
}

/// A register as returned by [`RegisterBridge::register`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterEntry {
    pub address: usize,
    pub value: RegisterValue,
    pub writable: bool,
}

pub type RegisterTable = BTreeMap<String, RegisterEntry>;

/// Maps PLC names to the sensor registers they may read and write.
///
/// Safe to share between the transport and the scheduler's read cycle.
/// Accessors run without the bridge lock held, so a slow read never
/// blocks `register` calls from other PLCs.
#[derive(Debug)]
pub struct RegisterBridge {
    plcs: Mutex<BTreeMap<String, PlcRecord>>,
}

impl RegisterBridge {
    /// Bind every configured PLC's sensors and take an initial read.
    pub fn new(plant: &Arc<Plant>, plcs: &BTreeMap<String, PlcDef>) -> BridgeResult<Self> {
        let mut records = BTreeMap::new();
        for (name, def) in plcs {
            let mut registers = Vec::with_capacity(def.sensors.len());
            for (address, label) in def.sensors.iter().enumerate() {
                let sensor = plant
                    .find(label)
                    .filter(|device| device.is_sensor())
                    .ok_or_else(|| BridgeError::Config {
                        what: format!("plc '{name}' lists unknown sensor '{label}'"),
                    })?
                    .id();
                registers.push(Register {
                    name: label.clone(),
                    address,
                    sensor,
                    capability: RegisterCapability::for_sensor(plant, sensor)?,
                    last_value: RegisterValue::Null,
                });
            }
            records.insert(
                name.clone(),
                PlcRecord {
                    name: name.clone(),
                    registered: false,
                    registers,
                },
            );
        }

        let bridge = Self {
            plcs: Mutex::new(records),
        };
        bridge.refresh();
        Ok(bridge)
    }

    pub fn plc_names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn is_registered(&self, plc: &str) -> BridgeResult<bool> {
        self.with_plc(plc, |record| Ok(record.registered))
    }

    /// Mark `plc` as registered and return its register table as of the last read cycle.
    ///
    /// Calling it again is harmless.
    pub fn register(&self, plc: &str) -> BridgeResult<RegisterTable> {
        let mut plcs = self.lock();
        let record = plcs.get_mut(plc).ok_or_else(|| unknown_plc(plc))?;
        if !record.registered {
            record.registered = true;
            info!(plc, registers = record.registers.len(), "plc registered");
        }
        Ok(record.table())
    }

    /// The register table as of the last read cycle, without registering.
    pub fn snapshot(&self, plc: &str) -> BridgeResult<RegisterTable> {
        self.with_plc(plc, |record| Ok(record.table()))
    }

    /// Invoke every read accessor of `plc` and return the fresh values.
    pub fn read(&self, plc: &str) -> BridgeResult<BTreeMap<String, RegisterValue>> {
        let mut values = BTreeMap::new();
        for (name, read) in self.readers(plc)? {
            values.insert(name, read()?);
        }
        self.store(plc, &values);
        Ok(values)
    }

    /// Write `value` through register `name` of `plc`.
    pub fn write(&self, plc: &str, name: &str, value: RegisterValue) -> BridgeResult<()> {
        let (write, read) = self.with_plc(plc, |record| {
            let register = record.register(name)?;
            let write = register.capability.write.clone().ok_or_else(|| {
                BridgeError::ReadOnlyRegister {
                    plc: plc.to_string(),
                    name: name.to_string(),
                }
            })?;
            Ok((write, Arc::clone(&register.capability.read)))
        })?;

        debug!(plc, register = name, %value, "register write");
        write(value)?;

        let fresh = read()?;
        let mut values = BTreeMap::new();
        values.insert(name.to_string(), fresh);
        self.store(plc, &values);
        Ok(())
    }

    /// The scheduler's read cycle: re-read every PLC's registers.
    ///
    /// A failing register keeps its previous value and is logged, so one bad
    /// sensor never stops the cycle.
    pub fn refresh(&self) {
        for plc in self.plc_names() {
            let Ok(readers) = self.readers(&plc) else {
                continue;
            };

            let mut values = BTreeMap::new();
            for (name, read) in readers {
                match read() {
                    Ok(value) => {
                        values.insert(name, value);
                    }
                    Err(err) => warn!(plc = %plc, register = %name, %err, "register read failed"),
                }
            }
            self.store(&plc, &values);
        }
    }

    fn readers(&self, plc: &str) -> BridgeResult<Vec<(String, ReadFn)>> {
        self.with_plc(plc, |record| {
            Ok(record
                .registers
                .iter()
                .map(|r| (r.name.clone(), Arc::clone(&r.capability.read)))
                .collect())
        })
    }

    fn store(&self, plc: &str, values: &BTreeMap<String, RegisterValue>) {
        if let Some(record) = self.lock().get_mut(plc) {
            for register in &mut record.registers {
                if let Some(value) = values.get(&register.name) {
                    register.last_value = value.clone();
                }
            }
        }
    }

    fn with_plc<T>(
        &self,
        plc: &str,
        f: impl FnOnce(&PlcRecord) -> BridgeResult<T>,
    ) -> BridgeResult<T> {
        let plcs = self.lock();
        let record = plcs.get(plc).ok_or_else(|| unknown_plc(plc))?;
        f(record)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PlcRecord>> {
        self.plcs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn missing(sensor: DeviceId) -> BridgeError {
    BridgeError::Config {
        what: format!("sensor {sensor} is not in the plant"),
    }
}

fn unknown_plc(name: &str) -> BridgeError {
    BridgeError::UnknownPlc {
        name: name.to_string(),
    }
}
