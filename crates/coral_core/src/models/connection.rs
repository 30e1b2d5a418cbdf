//! Connection form input and saved connection records.

use crate::models::FieldErrors;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw user input from the new-connection form.
///
/// All fields are text exactly as typed; `port` is numeric text until
/// validation coerces it. Transient: one value per submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionForm {
    /// Display name for the connection.
    pub name: String,
    /// Server hostname or IP.
    pub host: String,
    /// Server port as typed (validated as u16).
    pub port: String,
    /// Server password; empty means no password.
    pub password: String,
}

impl Default for ConnectionForm {
    /// Pre-filled the way the dialog opens: localhost on the default Redis port.
    fn default() -> Self {
        Self {
            name: String::new(),
            host: "localhost".to_string(),
            port: "6379".to_string(),
            password: String::new(),
        }
    }
}

impl ConnectionForm {
    /// Validate for saving: name, host and port are required, port must be a
    /// valid port number, password is optional.
    ///
    /// Collects every violation instead of stopping at the first. On success
    /// returns the type-coerced [`ConnectionConfig`] ready for persistence.
    pub fn validate(&self) -> Result<ConnectionConfig, FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        let port = self.check_endpoint(&mut errors);

        match (errors.is_empty(), port) {
            (true, Some(port)) => Ok(ConnectionConfig::new(
                self.name.trim(),
                self.host.trim(),
                port,
                self.password.clone(),
            )),
            _ => Err(errors),
        }
    }

    /// Validate for a connection test: same rules minus the name, which plays
    /// no part in reaching the server.
    pub fn validate_for_test(&self) -> Result<TestTarget, FieldErrors> {
        let mut errors = FieldErrors::new();
        let port = self.check_endpoint(&mut errors);

        match (errors.is_empty(), port) {
            (true, Some(port)) => Ok(TestTarget {
                host: self.host.trim().to_string(),
                port,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }

    /// Shared host/port rules. Returns the parsed port when it is valid.
    fn check_endpoint(&self, errors: &mut FieldErrors) -> Option<u16> {
        if self.host.trim().is_empty() {
            errors.push("host", "Host is required");
        }

        let port = self.port.trim();
        if port.is_empty() {
            errors.push("port", "Port is required");
            return None;
        }
        match port.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                errors.push("port", "Port must be a number");
                None
            }
        }
    }
}

/// The payload for a connection test. The name is not involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestTarget {
    /// Server hostname or IP.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Server password; empty means no AUTH.
    pub password: String,
}

/// A saved connection record.
///
/// Constructed only from a validated form; the workflow never builds or
/// mutates stored records by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Server hostname or IP.
    pub host: String,
    /// Server port (default 6379).
    pub port: u16,
    /// Server password; empty means no password.
    pub password: String,
}

impl ConnectionConfig {
    /// Create a new connection record with a fresh id.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            host: host.into(),
            port,
            password: password.into(),
        }
    }

    /// Get the display connection string (without password).
    pub fn display_url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }

    /// Check if the connection requires AUTH.
    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// The test payload for this record.
    pub fn test_target(&self) -> TestTarget {
        TestTarget { host: self.host.clone(), port: self.port, password: self.password.clone() }
    }
}
