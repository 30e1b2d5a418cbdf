//! Data models for the Coral connection workflow.
//!
//! - `connection` - ConnectionForm, ConnectionConfig, TestTarget
//! - `field_errors` - field-scoped validation failures returned as data

pub mod connection;
pub mod field_errors;

pub use connection::{ConnectionConfig, ConnectionForm, TestTarget};
pub use field_errors::{FieldError, FieldErrors};
