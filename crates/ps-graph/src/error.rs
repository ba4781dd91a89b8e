//! Graph-specific error types.

use ps_core::DeviceId;
use ps_devices::DeviceError;
use ps_fluids::FluidError;

pub type GraphResult<T> = Result<T, GraphError>;

/// Plant construction and lookup errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// A device or sensor declares a role outside the registered set.
    InvalidRole { label: String, role: String },

    /// The configuration references something that does not exist or is malformed.
    Config { what: String },

    /// An id that is not a slot in this plant.
    UnknownDevice { id: DeviceId },

    /// A device operation failed.
    Device(DeviceError),
}

impl GraphError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        GraphError::Config { what: what.into() }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidRole { label, role } => {
                write!(f, "'{}' declares invalid role '{}'", label, role)
            }
            GraphError::Config { what } => write!(f, "Configuration error: {}", what),
            GraphError::UnknownDevice { id } => write!(f, "Device {} is not in the plant", id),
            GraphError::Device(err) => write!(f, "Device error: {}", err),
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::Device(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeviceError> for GraphError {
    fn from(err: DeviceError) -> Self {
        GraphError::Device(err)
    }
}

impl From<FluidError> for GraphError {
    fn from(err: FluidError) -> Self {
        GraphError::Config {
            what: err.to_string(),
        }
    }
}
