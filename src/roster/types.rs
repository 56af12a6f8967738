//! Core data types and error definitions for the student registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Identifier assigned to a stored student.
pub type StudentId = i64;

/// Largest identifier a student may carry (`2^31 - 1`).
pub const MAX_STUDENT_ID: StudentId = i32::MAX as StudentId;

/// A student record as held by the store and returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier in `1..=MAX_STUDENT_ID`.
    pub id: StudentId,
    /// Display name, 1 to 100 characters.
    pub name: String,
    /// Age in years, 1 to 200.
    pub age: u8,
    /// Contact address, at most 100 characters.
    pub email: String,
}

/// Untyped request body accepted by create and update.
///
/// Every field is kept as raw JSON so validation can report all problems at once instead of
/// stopping at the first type mismatch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentPayload {
    /// Optional client-chosen identifier.
    #[serde(default)]
    pub id: Option<Value>,
    /// Raw `name` value.
    #[serde(default)]
    pub name: Option<Value>,
    /// Raw `age` value.
    #[serde(default)]
    pub age: Option<Value>,
    /// Raw `email` value.
    #[serde(default)]
    pub email: Option<Value>,
}

/// Validated input for a create operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    /// Identifier requested by the client; the store assigns one when absent.
    pub id: Option<StudentId>,
    /// Validated name.
    pub name: String,
    /// Validated age.
    pub age: u8,
    /// Validated email address.
    pub email: String,
}

impl NewStudent {
    pub(crate) fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            name: self.name,
            age: self.age,
            email: self.email,
        }
    }
}

/// Validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentPatch {
    /// Identifier echoed in the body, if any. Ids never change.
    pub id: Option<StudentId>,
    /// Replacement name.
    pub name: Option<String>,
    /// Replacement age.
    pub age: Option<u8>,
    /// Replacement email.
    pub email: Option<String>,
}

/// Response body for the summary endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    /// Student the summary describes.
    pub student_id: StudentId,
    /// Generated text, or the fallback message when generation failed.
    pub summary: String,
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: String,
    /// Human readable reason.
    pub message: String,
}

impl FieldError {
    /// Build a failure for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors emitted by registry operations.
#[derive(Debug, Error)]
pub enum RosterError {
    /// One or more fields failed validation.
    #[error("Invalid input data: {}", describe_fields(.0))]
    InvalidInput(Vec<FieldError>),
    /// A record with the requested id already exists.
    #[error("{0}")]
    Conflict(String),
    /// The requested record does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Request was well formed but cannot be honored.
    #[error("{0}")]
    BadRequest(String),
    /// Unexpected failure inside the service.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RosterError {
    /// Standard error for a missing student.
    pub fn student_not_found(id: StudentId) -> Self {
        Self::NotFound(format!("Student with id {id} not found"))
    }
}

fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| format!("{}: {}", error.field, error.message))
        .collect::<Vec<_>>()
        .join("; ")
}
