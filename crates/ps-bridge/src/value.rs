//! Values carried across the register boundary.

use ps_devices::{Actuation, SensorCommand, SensorReading};
use ps_fluids::Fluid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A register's content as the transport sees it.
///
/// Serialized untagged, so a table renders as plain JSON scalars, with
/// fluids as objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RegisterValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Fluid(Fluid),
}

impl RegisterValue {
    /// Interpret a written value as a state sensor command.
    ///
    /// Booleans and numbers engage (true / non-zero) or disengage; text must
    /// name an actuation such as `on` or `closed`.
    pub fn to_command(&self) -> Option<SensorCommand> {
        match self {
            RegisterValue::Bool(b) => Some(SensorCommand::Engage(*b)),
            RegisterValue::Number(n) if n.is_finite() => Some(SensorCommand::Engage(*n != 0.0)),
            RegisterValue::Text(text) => text.parse::<Actuation>().ok().map(SensorCommand::Set),
            _ => None,
        }
    }
}

impl From<SensorReading> for RegisterValue {
    fn from(reading: SensorReading) -> Self {
        match reading {
            SensorReading::Empty => RegisterValue::Null,
            SensorReading::Number(n) => RegisterValue::Number(n),
            SensorReading::State(state) => RegisterValue::Text(state.to_string()),
            SensorReading::Fluid(fluid) => RegisterValue::Fluid((*fluid).clone()),
        }
    }
}

impl fmt::Display for RegisterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterValue::Null => f.write_str("null"),
            RegisterValue::Bool(b) => write!(f, "{b}"),
            RegisterValue::Number(n) => write!(f, "{n}"),
            RegisterValue::Text(text) => write!(f, "'{text}'"),
            RegisterValue::Fluid(fluid) => write!(f, "{fluid}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ps_devices::{PumpState, ValveState};
    use std::sync::Arc;

    #[test]
    fn commands_from_values() {
        assert_eq!(
            RegisterValue::Bool(true).to_command(),
            Some(SensorCommand::Engage(true))
        );
        assert_eq!(
            RegisterValue::Number(0.0).to_command(),
            Some(SensorCommand::Engage(false))
        );
        assert_eq!(
            RegisterValue::Text("closed".into()).to_command(),
            Some(SensorCommand::Set(Actuation::Valve(ValveState::Closed)))
        );
        assert_eq!(RegisterValue::Text("ajar".into()).to_command(), None);
        assert_eq!(RegisterValue::Null.to_command(), None);
        assert_eq!(RegisterValue::Number(f64::NAN).to_command(), None);
    }

    #[test]
    fn readings_convert() {
        assert_eq!(
            RegisterValue::from(SensorReading::State(Actuation::Pump(PumpState::On))),
            RegisterValue::Text("on".into())
        );
        assert_eq!(RegisterValue::from(SensorReading::Empty), RegisterValue::Null);
        let fluid = Arc::new(Fluid::water());
        assert_eq!(
            RegisterValue::from(SensorReading::Fluid(Arc::clone(&fluid))),
            RegisterValue::Fluid((*fluid).clone())
        );
    }

    #[test]
    fn untagged_json() {
        let json = serde_json::to_string(&RegisterValue::Number(42.0)).unwrap();
        assert_eq!(json, "42.0");
        let back: RegisterValue = serde_json::from_str("true").unwrap();
        assert_eq!(back, RegisterValue::Bool(true));
        let back: RegisterValue = serde_json::from_str("null").unwrap();
        assert_eq!(back, RegisterValue::Null);
        let back: RegisterValue = serde_json::from_str("\"open\"").unwrap();
        assert_eq!(back, RegisterValue::Text("open".into()));
    }
}
