//! # Error Handling
//!
//! Every provider client and service returns [`Result`]; vendor-side failures
//! are values, never panics.

pub mod types;

pub use types::{CdnError, ErrorKind, Result};
