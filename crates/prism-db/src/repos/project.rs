//! Project repository.

use chrono::Utc;

use prism_core::entities::Project;
use prism_core::enums::{AuditAction, RecordKind};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::service::PrismService;

fn row_to_project(row: &libsql::Row) -> Result<Project, DatabaseError> {
    Ok(Project {
        id: row.get::<i64>(0)?,
        name: row.get::<String>(1)?,
        description: get_opt_string(row, 2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

impl PrismService {
    /// Create a project. Names are unique.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank name and
    /// `DatabaseError::Conflict` if the name is taken.
    pub async fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Project, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DatabaseError::Validation("project name is required".into()));
        }
        if self.find_project_by_name(name).await?.is_some() {
            return Err(DatabaseError::Conflict(format!(
                "project '{name}' already exists"
            )));
        }

        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "INSERT INTO projects (name, description, created_at) VALUES (?1, ?2, ?3)",
                libsql::params![name, description, now.to_rfc3339()],
            )
            .await?;
        let id = self.db().last_insert_id();

        self.append_audit(RecordKind::Project, id, AuditAction::Created, None)
            .await?;
        tracing::info!(project_id = id, name, "project created");

        Ok(Project {
            id,
            name: name.to_string(),
            description: description.map(String::from),
            created_at: now,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn get_project(&self, id: i64) -> Result<Project, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, description, created_at FROM projects WHERE id = ?1",
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or(DatabaseError::not_found("project", id))?;
        row_to_project(&row)
    }

    async fn find_project_by_name(&self, name: &str) -> Result<Option<Project>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, description, created_at FROM projects WHERE name = ?1",
                [name],
            )
            .await?;
        rows.next().await?.map(|row| row_to_project(&row)).transpose()
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_projects(&self) -> Result<Vec<Project>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, name, description, created_at FROM projects ORDER BY id",
                (),
            )
            .await?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().await? {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::test_service;

    #[tokio::test]
    async fn create_and_get_project() {
        let svc = test_service().await;
        let project = svc
            .create_project("Payments landscape", Some("Q3 scan"))
            .await
            .unwrap();
        let fetched = svc.get_project(project.id).await.unwrap();
        assert_eq!(fetched.name, "Payments landscape");
        assert_eq!(fetched.description.as_deref(), Some("Q3 scan"));

        let audits = svc
            .query_audit(&AuditFilter {
                record_kind: Some(RecordKind::Project),
                record_id: Some(project.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].action, AuditAction::Created);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts() {
        let svc = test_service().await;
        svc.create_project("Fintech", None).await.unwrap();
        let err = svc.create_project("Fintech", None).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn blank_name_is_invalid() {
        let svc = test_service().await;
        assert!(matches!(
            svc.create_project("  ", None).await,
            Err(DatabaseError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unknown_project_not_found() {
        let svc = test_service().await;
        assert!(matches!(
            svc.get_project(42).await,
            Err(DatabaseError::NotFound { kind: "project", id: 42 })
        ));
    }

    #[tokio::test]
    async fn list_in_creation_order() {
        let svc = test_service().await;
        svc.create_project("b", None).await.unwrap();
        svc.create_project("a", None).await.unwrap();
        let names: Vec<_> = svc
            .list_projects()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["b", "a"]);
    }
}
