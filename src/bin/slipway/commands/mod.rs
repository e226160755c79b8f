//! Command implementations

pub mod graph;
pub mod resolve;
pub mod targets;
