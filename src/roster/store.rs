//! In-memory student registry guarded by a single mutex.
//!
//! Every operation holds the lock for its full duration and never across an `.await`, so the
//! record map and the id counter always change together.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::types::{MAX_STUDENT_ID, NewStudent, RosterError, Student, StudentId, StudentPatch};

struct StoreState {
    records: BTreeMap<StudentId, Student>,
    next_id: StudentId,
}

/// Keyed registry of students plus the id allocator.
pub struct StudentStore {
    state: Mutex<StoreState>,
}

impl Default for StudentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentStore {
    /// Create an empty store whose first assigned id is `1`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                records: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RosterError> {
        self.state
            .lock()
            .map_err(|_| RosterError::Internal("student store lock poisoned".into()))
    }

    /// Insert a student, assigning the next free id when none was requested.
    ///
    /// Assigned ids increase monotonically and are never handed out twice, even after the
    /// student holding them is deleted. Ids already claimed explicitly are skipped.
    pub fn create(&self, student: NewStudent) -> Result<Student, RosterError> {
        let mut state = self.lock()?;
        let id = match student.id {
            Some(id) if state.records.contains_key(&id) => {
                return Err(RosterError::Conflict(format!(
                    "Student ID {id} already exists"
                )));
            }
            Some(id) => id,
            None => {
                while state.records.contains_key(&state.next_id) {
                    state.next_id += 1;
                }
                if state.next_id > MAX_STUDENT_ID {
                    return Err(RosterError::Internal("student id space exhausted".into()));
                }
                let id = state.next_id;
                state.next_id += 1;
                id
            }
        };
        let stored = student.into_student(id);
        state.records.insert(id, stored.clone());
        Ok(stored)
    }

    /// Snapshot of every stored student, ordered by id.
    pub fn list(&self) -> Result<Vec<Student>, RosterError> {
        Ok(self.lock()?.records.values().cloned().collect())
    }

    /// Fetch a single student.
    pub fn get(&self, id: StudentId) -> Result<Student, RosterError> {
        self.lock()?
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| RosterError::student_not_found(id))
    }

    /// Overwrite the fields supplied in `patch`, keeping the others.
    pub fn update(&self, id: StudentId, patch: StudentPatch) -> Result<Student, RosterError> {
        let mut state = self.lock()?;
        let current = state
            .records
            .get_mut(&id)
            .ok_or_else(|| RosterError::student_not_found(id))?;
        if let Some(name) = patch.name {
            current.name = name;
        }
        if let Some(age) = patch.age {
            current.age = age;
        }
        if let Some(email) = patch.email {
            current.email = email;
        }
        Ok(current.clone())
    }

    /// Remove a student.
    pub fn delete(&self, id: StudentId) -> Result<(), RosterError> {
        self.lock()?
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RosterError::student_not_found(id))
    }
}
