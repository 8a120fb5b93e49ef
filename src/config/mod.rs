//! Build script loading and validation
//!
//! This module locates and parses build scripts and checks their structure
//! before any task object is built.

pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use parse::*;
pub use schema::*;
pub use types::*;
