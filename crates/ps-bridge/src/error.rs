//! Register bridge errors.

use ps_devices::DeviceError;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors reported to the register transport. None of them stop the plant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Unknown PLC '{name}'")]
    UnknownPlc { name: String },

    #[error("PLC '{plc}' has no register '{name}'")]
    UnknownRegister { plc: String, name: String },

    #[error("Register '{name}' of PLC '{plc}' is read-only")]
    ReadOnlyRegister { plc: String, name: String },

    #[error("Value {value} cannot be written to register '{name}'")]
    InvalidValue { name: String, value: String },

    #[error("Bridge configuration error: {what}")]
    Config { what: String },

    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}
