//! ps-fluids: fluid parcels carried across the plant graph.
//!
//! Provides:
//! - Fluid kind allow-list (`FluidKind`)
//! - The `Fluid` value object with optional physical properties
//! - SI unit aliases and constructors for those properties
//!
//! A `Fluid` is immutable by convention: devices swap the parcel they hold
//! for a new one instead of editing a shared parcel in place.
//!
//! # Example
//!
//! ```
//! use ps_fluids::{Fluid, FluidKind};
//! use ps_fluids::units::k;
//!
//! let water = Fluid::new("water")
//!     .unwrap()
//!     .with_ph(7.2)
//!     .unwrap()
//!     .with_temperature(k(293.15));
//!
//! assert_eq!(water.kind(), FluidKind::Water);
//! assert_eq!(water.ph(), Some(7.2));
//! ```

pub mod error;
pub mod fluid;
pub mod kind;
pub mod units;

// Re-exports for ergonomics
pub use error::{FluidError, FluidResult};
pub use fluid::Fluid;
pub use kind::FluidKind;
