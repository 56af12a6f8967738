//! Student records: data model, validation, in-memory store, and the service facade.

mod service;
pub mod store;
pub mod types;
pub mod validate;

pub use service::{RosterApi, RosterService};
pub use store::StudentStore;
pub use types::{
    FieldError, MAX_STUDENT_ID, NewStudent, RosterError, Student, StudentId, StudentPatch,
    StudentPayload, StudentSummary,
};
