//! Error types for device operations.

use crate::transfer::Direction;
use ps_core::DeviceId;
use thiserror::Error;

/// Errors that can occur while wiring, activating, or transferring through devices.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("'{role}' is not a valid device role")]
    InvalidRole { role: String },

    #[error("Peer {id} is not part of the plant")]
    UnknownPeer { id: DeviceId },

    #[error("Transfer cycle: {label} re-entered during {direction}")]
    TransferCycle { label: String, direction: Direction },

    #[error("Transfer chain exceeded {depth} hops")]
    TransferTooDeep { depth: usize },

    #[error("Device {label} has no on/off or open/closed state")]
    NoState { label: String },

    #[error("Invalid state '{value}' for device {label}")]
    InvalidState { label: String, value: String },

    #[error("Device {label} is not a sensor")]
    NotASensor { label: String },

    #[error("Sensor {label} has no monitored device")]
    Unmonitored { label: String },

    #[error("Sensor {label} is read-only")]
    ReadOnly { label: String },
}

pub type DeviceResult<T> = Result<T, DeviceError>;
