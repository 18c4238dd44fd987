//! Scenefile Core Library
//!
//! This crate provides the error type, shared math types and constants
//! used by the scene model and the exporter.

pub mod error;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::types::*;
}
