//! ps-graph: the plant arena and its construction from configuration.
//!
//! Provides:
//! - `Plant`, an index-based registry of devices and sensors
//! - Label lookup and explicit wiring on top of the device links
//! - `build`, which turns a validated configuration into a fully wired plant
//!
//! # Example
//!
//! ```
//! use ps_devices::Role;
//! use ps_graph::Plant;
//!
//! let mut plant = Plant::new();
//! let valve = plant.add_device("valve1", Role::valve());
//! let tank = plant.add_device("tank1", Role::tank(0.0));
//! plant.connect(valve, tank).unwrap();
//!
//! assert_eq!(plant.find("tank1").unwrap().inputs(), vec![valve]);
//! ```

pub mod builder;
pub mod error;
pub mod plant;

// Re-exports for ergonomics
pub use builder::{build, fluid_from_def};
pub use error::{GraphError, GraphResult};
pub use plant::Plant;
