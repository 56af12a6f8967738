//! Registry service coordinating the store, summaries, and metrics.

use crate::{
    metrics::{MetricsSnapshot, RosterMetrics},
    roster::{
        store::StudentStore,
        types::{RosterError, Student, StudentId, StudentPayload, StudentSummary},
        validate::{validate_new, validate_patch},
    },
    summarization::{SummarizationClient, summarize_or_fallback},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Abstraction over the registry used by the HTTP surface.
#[async_trait]
pub trait RosterApi: Send + Sync {
    /// Validate and store a new student.
    fn create_student(&self, payload: StudentPayload) -> Result<Student, RosterError>;

    /// Return every stored student.
    fn list_students(&self) -> Result<Vec<Student>, RosterError>;

    /// Return a single student.
    fn get_student(&self, id: StudentId) -> Result<Student, RosterError>;

    /// Validate a partial update and apply it.
    fn update_student(
        &self,
        id: StudentId,
        payload: StudentPayload,
    ) -> Result<Student, RosterError>;

    /// Remove a student.
    fn delete_student(&self, id: StudentId) -> Result<(), RosterError>;

    /// Describe a student in natural language.
    ///
    /// Only a missing student is an error; backend failures produce fallback text.
    async fn summarize_student(&self, id: StudentId) -> Result<StudentSummary, RosterError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Default [`RosterApi`] implementation backed by an in-memory [`StudentStore`].
///
/// Construct it once near process start and share it through an `Arc`.
pub struct RosterService {
    store: StudentStore,
    summarizer: Arc<dyn SummarizationClient>,
    metrics: RosterMetrics,
}

impl RosterService {
    /// Build a service with an empty store and the given summary backend.
    pub fn new(summarizer: Arc<dyn SummarizationClient>) -> Self {
        Self {
            store: StudentStore::new(),
            summarizer,
            metrics: RosterMetrics::new(),
        }
    }
}

#[async_trait]
impl RosterApi for RosterService {
    fn create_student(&self, payload: StudentPayload) -> Result<Student, RosterError> {
        let student = validate_new(&payload)?;
        let stored = self.store.create(student)?;
        self.metrics.record_created();
        tracing::info!(student_id = stored.id, "Student created");
        Ok(stored)
    }

    fn list_students(&self) -> Result<Vec<Student>, RosterError> {
        self.store.list()
    }

    fn get_student(&self, id: StudentId) -> Result<Student, RosterError> {
        self.store.get(id)
    }

    fn update_student(
        &self,
        id: StudentId,
        payload: StudentPayload,
    ) -> Result<Student, RosterError> {
        let patch = validate_patch(&payload)?;
        if let Some(body_id) = patch.id.filter(|body_id| *body_id != id) {
            return Err(RosterError::BadRequest(format!(
                "Student id is immutable: body id {body_id} does not match path id {id}"
            )));
        }
        let updated = self.store.update(id, patch)?;
        self.metrics.record_updated();
        tracing::info!(student_id = id, "Student updated");
        Ok(updated)
    }

    fn delete_student(&self, id: StudentId) -> Result<(), RosterError> {
        self.store.delete(id)?;
        self.metrics.record_deleted();
        tracing::info!(student_id = id, "Student deleted");
        Ok(())
    }

    async fn summarize_student(&self, id: StudentId) -> Result<StudentSummary, RosterError> {
        // Lookup releases the store lock before the backend call.
        let student = self.store.get(id)?;
        let outcome = summarize_or_fallback(self.summarizer.as_ref(), &student).await;
        self.metrics.record_summary(outcome.is_fallback());
        Ok(StudentSummary {
            student_id: id,
            summary: outcome.into_text(),
        })
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
