use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::{
    domain::{DepartmentId, DepartmentRecord, DepartmentRef, FacultyId, FacultyRecord},
    query::FacultyQuery,
};

const FACULTY_SELECT: &str = r#"
    SELECT f.faculty_id, f.name, f.designation, f.qualification, f.email, f.phone,
           f.profile_link, f.department_id, d.department_name
    FROM faculty f
    LEFT JOIN department d ON d.department_id = f.department_id
"#;

const FACULTY_ORDER: &str = "ORDER BY f.name ASC, f.faculty_id ASC";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Column values for a faculty row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewFaculty {
    pub name: String,
    pub designation: String,
    pub qualification: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_link: Option<String>,
    pub department_id: DepartmentId,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_department(&self, name: &str) -> Result<DepartmentId> {
        let rec = sqlx::query(
            "INSERT INTO department (department_name) VALUES (?)
             ON CONFLICT(department_name) DO UPDATE SET department_name=excluded.department_name
             RETURNING department_id",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to create department '{name}'"))?;
        Ok(DepartmentId(rec.get::<i64, _>(0)))
    }

    pub async fn create_faculty(&self, faculty: &NewFaculty) -> Result<FacultyId> {
        let rec = sqlx::query(
            "INSERT INTO faculty
                (name, designation, qualification, email, phone, profile_link, department_id)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING faculty_id",
        )
        .bind(&faculty.name)
        .bind(&faculty.designation)
        .bind(&faculty.qualification)
        .bind(&faculty.email)
        .bind(&faculty.phone)
        .bind(&faculty.profile_link)
        .bind(faculty.department_id.0)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to create faculty '{}'", faculty.name))?;
        Ok(FacultyId(rec.get::<i64, _>(0)))
    }

    pub async fn list_departments(&self) -> Result<Vec<DepartmentRecord>> {
        let rows = sqlx::query(
            "SELECT department_id, department_name FROM department
             ORDER BY department_name ASC, department_id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list departments")?;
        Ok(rows
            .into_iter()
            .map(|r| DepartmentRecord {
                department_id: DepartmentId(r.get::<i64, _>(0)),
                department_name: r.get::<String, _>(1),
            })
            .collect())
    }

    /// Search terms are matched in Rust with [`FacultyQuery::matches`]:
    /// SQLite's `lower()` and `LIKE` only fold ASCII.
    pub async fn query_faculty(&self, query: &FacultyQuery) -> Result<Vec<FacultyRecord>> {
        debug!(mode = query.mode(), "storage: faculty query");
        let rows = match query {
            FacultyQuery::All | FacultyQuery::Search { .. } => {
                sqlx::query(&format!("{FACULTY_SELECT} {FACULTY_ORDER}"))
                    .fetch_all(&self.pool)
                    .await
            }
            FacultyQuery::Department(department_id) => {
                sqlx::query(&format!(
                    "{FACULTY_SELECT} WHERE f.department_id = ?1 {FACULTY_ORDER}"
                ))
                .bind(department_id.0)
                .fetch_all(&self.pool)
                .await
            }
        }
        .with_context(|| format!("failed to run {} faculty query", query.mode()))?;

        let mut faculty = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = faculty_from_row(row)?;
            if query.matches(&record) {
                faculty.push(record);
            }
        }
        Ok(faculty)
    }
}

fn faculty_from_row(row: &SqliteRow) -> Result<FacultyRecord> {
    let department_name: Option<String> = row.try_get("department_name")?;
    Ok(FacultyRecord {
        faculty_id: FacultyId(row.try_get("faculty_id")?),
        name: row.try_get("name")?,
        designation: row.try_get("designation")?,
        qualification: row.try_get("qualification")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        profile_link: row.try_get("profile_link")?,
        department_id: DepartmentId(row.try_get("department_id")?),
        department: department_name.map(|department_name| DepartmentRef { department_name }),
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
