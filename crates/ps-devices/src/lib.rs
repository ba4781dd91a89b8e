//! ps-devices: device library for the plant graph.
//!
//! Provides the node type shared by every device and sensor, and the
//! role-specific behavior behind the fluid transfer protocol:
//! - Pumps that pull from their inputs while on
//! - Valves that relay fluid while open
//! - Tanks and reservoirs that hold a non-negative volume
//! - Sensors that either tap a flow (fluid, pH) or sample another device
//!   (volume, state)
//!
//! Devices never own their peers. Edges are id sets and every transfer looks
//! peers up through the [`Peers`] trait, so a cyclic wiring never creates an
//! ownership cycle.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ps_core::DeviceId;
//! use ps_devices::{Device, Role};
//! use ps_fluids::Fluid;
//!
//! let arena = vec![
//!     Device::new(DeviceId::from_index(0), "valve1", Role::valve()),
//!     Device::new(DeviceId::from_index(1), "tank1", Role::tank(0.0)),
//! ];
//! arena[0].add_output(&arena[1]);
//! arena[0].open().unwrap();
//!
//! let accepted = arena[0]
//!     .receive(arena.as_slice(), Arc::new(Fluid::water()), 5.0)
//!     .unwrap();
//! assert_eq!(accepted, 5.0);
//! assert_eq!(arena[1].volume(), Some(5.0));
//! ```

pub mod device;
pub mod error;
pub mod role;
pub mod sensor;
pub mod transfer;

mod sync;

// Re-exports
pub use device::{Device, Links};
pub use error::{DeviceError, DeviceResult};
pub use role::{Actuation, PumpState, Role, RoleKind, ValveState};
pub use sensor::{SensorCommand, SensorKind, SensorReading, SensorState};
pub use transfer::{Direction, MAX_TRANSFER_DEPTH, Peers, TransferPath};
