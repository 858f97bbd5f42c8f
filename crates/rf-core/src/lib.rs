//! # rf-core
//!
//! Shared error type and result alias for the rootformula workspace.

pub mod error;

pub use error::{Error, Result};
