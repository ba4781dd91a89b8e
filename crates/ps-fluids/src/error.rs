//! Fluid errors.

use ps_core::CoreError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur while constructing fluids.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Fluid kind is not in the allow-list.
    #[error("'{kind}' is not a valid fluid type")]
    InvalidFluid { kind: String },

    /// Property value outside its physical range.
    #[error("Value out of range for {what}: {value}")]
    OutOfRange { what: &'static str, value: f64 },

    #[error(transparent)]
    Core(#[from] CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FluidError::InvalidFluid {
            kind: "lava".into(),
        };
        assert!(err.to_string().contains("lava"));
    }

    #[test]
    fn core_error_converts() {
        let err: FluidError = CoreError::NonFinite {
            what: "ph",
            value: f64::NAN,
        }
        .into();
        assert!(err.to_string().contains("Non-finite"));
    }
}
