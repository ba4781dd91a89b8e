//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while building or driving a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Project error: {0}")]
    Project(#[from] ps_project::ProjectError),

    #[error("Graph error: {0}")]
    Graph(#[from] ps_graph::GraphError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] ps_bridge::BridgeError),
}

pub type SimResult<T> = Result<T, SimError>;
