//! Field-scoped validation failures.
//!
//! Validation never mutates a form handle; it returns a [`FieldErrors`]
//! collection the UI associates with the named inputs.

use serde::Serialize;

/// A validation failure tied to one named input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field (e.g. "port").
    pub field: String,
    /// Message to display next to the field.
    pub message: String,
}

/// Ordered collection of field violations from a single validation pass.
///
/// Validation runs in non-short-circuit mode: every rule is checked and every
/// violation collected, so the user sees all problems at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for a field.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError { field: field.into(), message: message.into() });
    }

    /// Get the message for a field, if it has a violation.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.iter().find(|e| e.field == field).map(|e| e.message.as_str())
    }

    /// Check whether a field has a violation.
    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Check whether any violations were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of violations collected.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the violations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
