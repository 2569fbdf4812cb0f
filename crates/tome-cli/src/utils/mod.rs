//! Shared helpers for the command implementations.

pub mod context;
pub mod logging;

pub use context::Context;
pub use logging::initialize_logging;
