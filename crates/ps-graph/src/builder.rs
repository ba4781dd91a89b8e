//! Plant construction from a parsed configuration.

use crate::error::{GraphError, GraphResult};
use crate::plant::Plant;
use ps_core::DeviceId;
use ps_devices::{Actuation, Role, RoleKind, SensorKind, role::DEFAULT_PUMP_FLOW};
use ps_fluids::{Fluid, units};
use ps_project::{DeviceDef, FluidDef, PlantConfig, SensorDef};
use std::collections::HashMap;
use tracing::{debug, info};

/// Build a fully wired plant from `config`.
///
/// Devices come first, then sensors, in configuration order, so ids are
/// stable for a given document. Labels resolve to their first occurrence.
/// Every reference is checked before the plant is returned; a plant is
/// never handed out half-wired.
pub fn build(config: &PlantConfig) -> GraphResult<Plant> {
    let mut fluids = HashMap::new();
    for def in &config.fluids {
        fluids.insert(def.label.as_str(), fluid_from_def(def)?);
    }

    let mut plant = Plant::new();
    let mut labels: HashMap<&str, DeviceId> = HashMap::new();

    for def in &config.devices {
        let role = device_role(def)?;
        let fluid = match &def.fluid {
            Some(name) => Some(
                fluids
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| GraphError::config(format!("unknown fluid '{name}'")))?,
            ),
            None => None,
        };
        let id = plant.add_with(&def.label, role, |device| {
            let device = match fluid {
                Some(fluid) => device.with_fluid(fluid),
                None => device,
            };
            match def.period_s {
                Some(period) => device.with_period(Some(period)),
                None => device,
            }
        });
        labels.entry(def.label.as_str()).or_insert(id);
    }

    let mut monitors = Vec::new();
    for def in &config.sensors {
        let kind = sensor_kind(def)?;
        let id = plant.add_with(&def.label, Role::sensor(kind), |device| match def.period_s {
            Some(period) => device.with_period(Some(period)),
            None => device,
        });
        labels.entry(def.label.as_str()).or_insert(id);
        match &def.monitors {
            Some(target) => monitors.push((id, target.as_str())),
            None if kind.needs_monitored_device() => {
                return Err(GraphError::config(format!(
                    "sensor '{}' of kind '{}' needs a monitored device",
                    def.label, kind
                )));
            }
            None => {}
        }
    }

    let resolve = |label: &str, context: &str| {
        labels
            .get(label)
            .copied()
            .ok_or_else(|| GraphError::config(format!("unknown label '{label}' in {context}")))
    };

    for (sensor, target) in monitors {
        let target = resolve(target, "sensor monitors")?;
        plant.device_or_err(sensor)?.monitor(target)?;
    }

    for (label, connection) in &config.connections {
        let id = resolve(label, "connections")?;
        for input in &connection.inputs {
            let peer = resolve(input, &format!("inputs of '{label}'"))?;
            plant.connect(peer, id)?;
        }
        for output in &connection.outputs {
            let peer = resolve(output, &format!("outputs of '{label}'"))?;
            plant.connect(id, peer)?;
        }
    }

    for (name, plc) in &config.plcs {
        for sensor in &plc.sensors {
            let id = resolve(sensor, &format!("plc '{name}'"))?;
            if !plant.device_or_err(id)?.is_sensor() {
                return Err(GraphError::config(format!(
                    "plc '{name}' lists '{sensor}', which is not a sensor"
                )));
            }
        }
    }

    // Registers must show real values before the first activation cycle.
    plant.sample_sensors()?;

    info!(
        devices = config.devices.len(),
        sensors = config.sensors.len(),
        "plant built"
    );
    Ok(plant)
}

/// Turn a configured fluid into a parcel, checking its kind and ranges.
pub fn fluid_from_def(def: &FluidDef) -> GraphResult<Fluid> {
    let mut fluid = Fluid::new(&def.kind)?;
    if let Some(ph) = def.ph {
        fluid = fluid.with_ph(ph)?;
    }
    if let Some(salinity) = def.salinity {
        fluid = fluid.with_salinity(salinity)?;
    }
    if let Some(t) = def.temperature_k {
        fluid = fluid.with_temperature(units::k(t));
    }
    if let Some(p) = def.pressure_pa {
        fluid = fluid.with_pressure(units::pa(p));
    }
    if let Some(q) = def.flowrate_m3_s {
        fluid = fluid.with_flowrate(units::m3ps(q));
    }
    Ok(fluid)
}

fn device_role(def: &DeviceDef) -> GraphResult<Role> {
    let kind: RoleKind = def.role.parse().map_err(|_| GraphError::InvalidRole {
        label: def.label.clone(),
        role: def.role.clone(),
    })?;

    let state = def
        .state
        .as_deref()
        .map(|text| {
            text.parse::<Actuation>().map_err(|value| {
                GraphError::config(format!("device '{}' has invalid state '{value}'", def.label))
            })
        })
        .transpose()?;

    let volume = def.volume.unwrap_or(0.0);
    let mut role = match kind {
        RoleKind::Pump => Role::Pump {
            state: Default::default(),
            flow_rate: def.flow_rate.unwrap_or(DEFAULT_PUMP_FLOW),
        },
        RoleKind::Tank => Role::tank(volume),
        RoleKind::Reservoir => Role::reservoir(volume),
        other => Role::from_kind(other),
    };

    if let Some(state) = state {
        role.set_actuation(state).map_err(|_| {
            GraphError::config(format!(
                "state '{}' does not apply to {} '{}'",
                state, kind, def.label
            ))
        })?;
    }
    debug!(label = %def.label, %kind, "device configured");
    Ok(role)
}

fn sensor_kind(def: &SensorDef) -> GraphResult<SensorKind> {
    def.role.parse().map_err(|_| GraphError::InvalidRole {
        label: def.label.clone(),
        role: def.role.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(role: &str, label: &str) -> DeviceDef {
        DeviceDef {
            role: role.to_string(),
            label: label.to_string(),
            state: None,
            volume: None,
            fluid: None,
            flow_rate: None,
            period_s: None,
        }
    }

    #[test]
    fn unknown_role_is_invalid_role() {
        let config = PlantConfig {
            devices: vec![device("boiler", "b1")],
            ..Default::default()
        };
        assert_eq!(
            build(&config).unwrap_err(),
            GraphError::InvalidRole {
                label: "b1".to_string(),
                role: "boiler".to_string(),
            }
        );
    }

    #[test]
    fn state_must_match_role() {
        let mut pump = device("pump", "p1");
        pump.state = Some("open".to_string());
        let config = PlantConfig {
            devices: vec![pump],
            ..Default::default()
        };
        assert!(matches!(build(&config), Err(GraphError::Config { .. })));
    }

    #[test]
    fn period_zero_disables_timer() {
        let mut tank = device("tank", "t1");
        tank.period_s = Some(0.0);
        let config = PlantConfig {
            devices: vec![tank, device("pump", "p1")],
            ..Default::default()
        };
        let plant = build(&config).unwrap();
        assert_eq!(plant.find("t1").unwrap().period(), None);
        assert_eq!(plant.find("p1").unwrap().period(), Some(1.0));
    }

    #[test]
    fn fluid_kind_checked() {
        let def = FluidDef {
            label: "x".to_string(),
            kind: "mercury".to_string(),
            ph: None,
            temperature_k: None,
            salinity: None,
            pressure_pa: None,
            flowrate_m3_s: None,
        };
        assert!(matches!(fluid_from_def(&def), Err(GraphError::Config { .. })));
    }
}
