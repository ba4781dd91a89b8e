//! Fluid parcel value object.

use crate::error::{FluidError, FluidResult};
use crate::kind::FluidKind;
use crate::units::{Pressure, Temperature, VolumeRate};
use ps_core::numeric::ensure_finite;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A parcel of liquid: its kind plus optional physical properties.
///
/// All properties start unset. The `with_*` methods consume the parcel and
/// return an updated one, so a parcel already handed to a device never
/// changes underneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fluid {
    id: Uuid,
    kind: FluidKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<Temperature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    salinity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pressure: Option<Pressure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flowrate: Option<VolumeRate>,
}

impl Fluid {
    /// Create a fluid from a kind name; fails unless the kind is allow-listed.
    pub fn new(kind: &str) -> FluidResult<Self> {
        Ok(Self::of(kind.parse()?))
    }

    /// Create a fluid of a known kind with every property unset.
    pub fn of(kind: FluidKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            ph: None,
            temperature: None,
            salinity: None,
            pressure: None,
            flowrate: None,
        }
    }

    pub fn water() -> Self {
        Self::of(FluidKind::Water)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> FluidKind {
        self.kind
    }

    pub fn ph(&self) -> Option<f64> {
        self.ph
    }

    pub fn temperature(&self) -> Option<Temperature> {
        self.temperature
    }

    pub fn salinity(&self) -> Option<f64> {
        self.salinity
    }

    pub fn pressure(&self) -> Option<Pressure> {
        self.pressure
    }

    pub fn flowrate(&self) -> Option<VolumeRate> {
        self.flowrate
    }

    /// Set pH; must be finite and within 0..=14.
    pub fn with_ph(mut self, ph: f64) -> FluidResult<Self> {
        let ph = ensure_finite(ph, "ph")?;
        if !(0.0..=14.0).contains(&ph) {
            return Err(FluidError::OutOfRange {
                what: "ph",
                value: ph,
            });
        }
        self.ph = Some(ph);
        Ok(self)
    }

    /// Set salinity as a mass fraction in 0..=1.
    pub fn with_salinity(mut self, salinity: f64) -> FluidResult<Self> {
        let salinity = ensure_finite(salinity, "salinity")?;
        if !(0.0..=1.0).contains(&salinity) {
            return Err(FluidError::OutOfRange {
                what: "salinity",
                value: salinity,
            });
        }
        self.salinity = Some(salinity);
        Ok(self)
    }

    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_pressure(mut self, pressure: Pressure) -> Self {
        self.pressure = Some(pressure);
        self
    }

    pub fn with_flowrate(mut self, flowrate: VolumeRate) -> Self {
        self.flowrate = Some(flowrate);
        self
    }
}

fn show<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for Fluid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.simple().to_string();
        write!(
            f,
            "[{}][{}] pH: {} T: {} K salinity: {} p: {} Pa flow: {} m3/s",
            &id[..8],
            self.kind,
            show(self.ph),
            show(self.temperature.map(|t| t.value)),
            show(self.salinity),
            show(self.pressure.map(|p| p.value)),
            show(self.flowrate.map(|q| q.value)),
        )
    }
}
