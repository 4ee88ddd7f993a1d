//! Bridge between the UI thread and the backend worker that owns the network.

pub mod commands;
pub mod runtime;
