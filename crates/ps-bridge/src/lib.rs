//! ps-bridge: exposes selected sensors to external controllers as registers.
//!
//! Each configured PLC sees a fixed, ordered list of sensors. The bridge binds
//! a capability record per sensor (a read accessor and, for state sensors, a
//! write accessor) and keeps the last value of every register, refreshed by
//! the scheduler's read cycle.

pub mod bridge;
pub mod error;
pub mod value;

pub use bridge::{
    PlcRecord, ReadFn, Register, RegisterBridge, RegisterCapability, RegisterEntry, RegisterTable,
    WriteFn,
};
pub use error::{BridgeError, BridgeResult};
pub use value::RegisterValue;
