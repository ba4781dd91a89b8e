//! ps-core: stable foundation for plantsim.
//!
//! Contains:
//! - ids (compact arena ids for devices)
//! - numeric (volume sanitizing + float helpers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
