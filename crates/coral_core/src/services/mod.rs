//! Collaborator services for the connection workflow.
//!
//! - `tester` - connection probing against a live Redis server
//! - `storage` - local SQLite persistence of saved connections

pub mod storage;
pub mod tester;

pub use storage::{ConnectionStore, LocalStorage};
pub use tester::{ConnectionTester, RedisTester};
