//! Task execution engine
//!
//! This module handles building tasks, running their commands, writing the
//! execution log and gating each task on its dependencies.

pub mod command;
pub mod context;
pub mod engine;
pub mod interpolate;
pub mod log;
pub mod registry;
pub mod task;
pub mod when;

// Re-export main types
pub use command::*;
pub use context::*;
pub use engine::*;
pub use interpolate::*;
pub use log::*;
pub use registry::*;
pub use task::*;
pub use when::*;
