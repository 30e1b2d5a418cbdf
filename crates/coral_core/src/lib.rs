//! Core connection workflow for the Coral Redis client.
//!
//! This crate is everything the new-connection dialog needs behind the
//! chrome:
//!
//! - **error**: Error handling across validation, probing and storage
//! - **models**: Form input, saved connection records, field errors
//! - **services**: Connection probing and local SQLite persistence
//! - **notify**: Toast-style notification dispatch
//! - **state**: Shared snapshot of persisted connections
//! - **workflow**: The validate → test/save → report orchestration
//! - **logging**: Structured logging setup

pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod services;
pub mod state;
pub mod workflow;

pub use error::CoralError;
pub use models::{ConnectionConfig, ConnectionForm, FieldError, FieldErrors, TestTarget};
pub use notify::{ChannelNotifier, Notification, NotificationSink, Severity};
pub use services::{ConnectionStore, ConnectionTester, LocalStorage, RedisTester};
pub use state::ConnectionsState;
pub use workflow::{ConnectionWorkflow, OperationStatus, SubmitOutcome, TestOutcome};
