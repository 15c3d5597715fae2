//! Record store contract and its implementations.

use async_trait::async_trait;
use shared::{
    domain::{DepartmentRecord, FacultyRecord},
    error::ReadFailure,
    query::FacultyQuery,
};

pub mod postgrest;
mod sqlite;

/// Read access to the faculty and department collections.
///
/// Both reads return rows ordered by name ascending. Faculty rows carry the
/// joined department name.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn query_faculty(&self, query: &FacultyQuery) -> Result<Vec<FacultyRecord>, ReadFailure>;
    async fn query_departments(&self) -> Result<Vec<DepartmentRecord>, ReadFailure>;
}

/// Placeholder handle used before a real store has been configured.
pub struct MissingRecordStore;

#[async_trait]
impl RecordStore for MissingRecordStore {
    async fn query_faculty(&self, query: &FacultyQuery) -> Result<Vec<FacultyRecord>, ReadFailure> {
        Err(ReadFailure::Transport(format!(
            "record store unavailable for {} faculty query",
            query.mode()
        )))
    }

    async fn query_departments(&self) -> Result<Vec<DepartmentRecord>, ReadFailure> {
        Err(ReadFailure::Transport(
            "record store unavailable for department query".to_string(),
        ))
    }
}
