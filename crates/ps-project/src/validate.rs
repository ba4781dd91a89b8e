//! Plant configuration validation logic.
//!
//! Checks what can be checked without building devices. Role names, state
//! strings, and label references are resolved by the graph builder.

use crate::schema::{DeviceDef, FluidDef, PlantConfig, SensorDef};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

pub fn validate_config(config: &PlantConfig) -> Result<(), ValidationError> {
    positive("settings speed", config.settings.speed)?;
    positive("settings read_period_s", config.settings.read_period_s)?;

    let mut fluid_labels = HashSet::new();
    for fluid in &config.fluids {
        if !fluid_labels.insert(fluid.label.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: fluid.label.clone(),
                context: "fluids".to_string(),
            });
        }
        validate_fluid(fluid)?;
    }

    for device in &config.devices {
        validate_device(device, &fluid_labels)?;
    }

    for sensor in &config.sensors {
        validate_sensor(sensor)?;
    }

    for (name, plc) in &config.plcs {
        let mut seen = HashSet::new();
        for sensor in &plc.sensors {
            if !seen.insert(sensor.as_str()) {
                return Err(ValidationError::DuplicateId {
                    id: sensor.clone(),
                    context: format!("plc '{name}' sensors"),
                });
            }
        }
    }

    Ok(())
}

fn validate_fluid(fluid: &FluidDef) -> Result<(), ValidationError> {
    if let Some(ph) = fluid.ph
        && !(ph.is_finite() && (0.0..=14.0).contains(&ph))
    {
        return Err(ValidationError::InvalidValue {
            field: format!("fluid '{}' ph", fluid.label),
            value: ph.to_string(),
            reason: "must be within 0..=14".to_string(),
        });
    }

    if let Some(s) = fluid.salinity
        && !(s.is_finite() && (0.0..=1.0).contains(&s))
    {
        return Err(ValidationError::InvalidValue {
            field: format!("fluid '{}' salinity", fluid.label),
            value: s.to_string(),
            reason: "must be a mass fraction within 0..=1".to_string(),
        });
    }

    if let Some(t) = fluid.temperature_k {
        positive(&format!("fluid '{}' temperature_k", fluid.label), t)?;
    }

    if let Some(p) = fluid.pressure_pa {
        positive(&format!("fluid '{}' pressure_pa", fluid.label), p)?;
    }

    if let Some(q) = fluid.flowrate_m3_s {
        non_negative(&format!("fluid '{}' flowrate_m3_s", fluid.label), q)?;
    }

    Ok(())
}

fn validate_device(device: &DeviceDef, fluids: &HashSet<&str>) -> Result<(), ValidationError> {
    if let Some(volume) = device.volume {
        non_negative(&format!("device '{}' volume", device.label), volume)?;
    }

    if let Some(rate) = device.flow_rate {
        non_negative(&format!("device '{}' flow_rate", device.label), rate)?;
    }

    if let Some(period) = device.period_s {
        non_negative(&format!("device '{}' period_s", device.label), period)?;
    }

    if let Some(fluid) = &device.fluid
        && !fluids.contains(fluid.as_str())
    {
        return Err(ValidationError::MissingReference {
            id: fluid.clone(),
            context: format!("device '{}' fluid", device.label),
        });
    }

    Ok(())
}

fn validate_sensor(sensor: &SensorDef) -> Result<(), ValidationError> {
    if let Some(period) = sensor.period_s {
        non_negative(&format!("sensor '{}' period_s", sensor.label), period)?;
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be positive and finite".to_string(),
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be non-negative and finite".to_string(),
        })
    }
}
