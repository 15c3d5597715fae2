use async_trait::async_trait;
use shared::{
    domain::{DepartmentRecord, FacultyRecord},
    error::ReadFailure,
    query::FacultyQuery,
};
use storage::Storage;

use super::RecordStore;

#[async_trait]
impl RecordStore for Storage {
    async fn query_faculty(&self, query: &FacultyQuery) -> Result<Vec<FacultyRecord>, ReadFailure> {
        Storage::query_faculty(self, query)
            .await
            .map_err(storage_failure)
    }

    async fn query_departments(&self) -> Result<Vec<DepartmentRecord>, ReadFailure> {
        self.list_departments().await.map_err(storage_failure)
    }
}

fn storage_failure(err: anyhow::Error) -> ReadFailure {
    ReadFailure::store(None, format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use storage::NewFaculty;

    use super::*;

    #[tokio::test]
    async fn sqlite_storage_serves_the_record_store_contract() {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let cs = storage.create_department("CS").await.expect("cs");
        storage
            .create_faculty(&NewFaculty {
                name: "Alice".into(),
                designation: "Professor".into(),
                qualification: None,
                email: None,
                phone: None,
                profile_link: None,
                department_id: cs,
            })
            .await
            .expect("alice");

        let store: &dyn RecordStore = &storage;
        let faculty = store
            .query_faculty(&FacultyQuery::Department(cs))
            .await
            .expect("faculty");
        assert_eq!(faculty.len(), 1);
        assert_eq!(faculty[0].department_name(), Some("CS"));

        let departments = store.query_departments().await.expect("departments");
        assert_eq!(departments[0].department_id, cs);
    }

    #[tokio::test]
    async fn storage_errors_become_store_read_failures() {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        storage.pool().close().await;

        let err = RecordStore::query_faculty(&storage, &FacultyQuery::All)
            .await
            .expect_err("closed pool");
        assert!(matches!(err, ReadFailure::Store { status: None, .. }));
        assert!(err.to_string().contains("failed to run all faculty query"));

        let err = storage.query_departments().await.expect_err("closed pool");
        assert!(err.to_string().contains("failed to list departments"));
    }
}
