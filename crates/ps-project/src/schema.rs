//! Plant configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlantConfig {
    #[serde(default)]
    pub settings: SettingsDef,
    #[serde(default)]
    pub fluids: Vec<FluidDef>,
    #[serde(default)]
    pub devices: Vec<DeviceDef>,
    /// Wiring keyed by device label.
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionDef>,
    #[serde(default)]
    pub sensors: Vec<SensorDef>,
    #[serde(default)]
    pub plcs: BTreeMap<String, PlcDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SettingsDef {
    /// Global activation speed multiplier.
    #[serde(default = "default_one")]
    pub speed: f64,
    /// Seconds between register bridge read cycles, before speed scaling.
    #[serde(default = "default_one")]
    pub read_period_s: f64,
}

impl Default for SettingsDef {
    fn default() -> Self {
        Self {
            speed: 1.0,
            read_period_s: 1.0,
        }
    }
}

fn default_one() -> f64 {
    1.0
}

/// A named fluid parcel that devices can start out holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluidDef {
    pub label: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salinity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_pa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flowrate_m3_s: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceDef {
    /// One of `pump`, `valve`, `tank`, `reservoir`; checked at graph build.
    pub role: String,
    pub label: String,
    /// Initial `on`/`off` (pumps) or `open`/`closed` (valves).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Label of a [`FluidDef`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fluid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
    /// Activation period; absent means the role default, 0 disables the timer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_s: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConnectionDef {
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorDef {
    /// One of `fluid`, `ph`, `volume`, `state`.
    pub role: String,
    pub label: String,
    /// Label of the device a monitoring sensor samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_s: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlcDef {
    /// Sensor labels exposed to this PLC; register address is the position.
    #[serde(default)]
    pub sensors: Vec<String>,
}
