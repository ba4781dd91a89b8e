//! ps-sim: periodic activation of a plant's devices.
//!
//! Provides:
//! - A virtual-clock `Scheduler` with one timer per device plus the register read cycle
//! - The `Simulation` facade (activate, deactivate, speed, restart)
//! - A real-time `Runner` that advances a shared simulation on a worker thread
//!
//! # Example
//!
//! ```
//! use ps_sim::Simulation;
//!
//! let config = ps_project::parse_yaml(
//!     "devices:\n  - role: tank\n    label: tank1\n    volume: 5.0\n",
//! )
//! .unwrap();
//! let mut sim = Simulation::new(config).unwrap();
//! sim.activate();
//! let fired = sim.advance(2.0).unwrap();
//! // tank1 at t=1 and t=2, read cycle at t=1 and t=2
//! assert_eq!(fired.len(), 4);
//! ```

pub mod error;
pub mod runner;
pub mod scheduler;
pub mod simulation;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use runner::{Runner, SharedSimulation};
pub use scheduler::{Fired, Scheduler, Task};
pub use simulation::Simulation;
