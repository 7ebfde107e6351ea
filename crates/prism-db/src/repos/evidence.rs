//! Evidence repository: supporting material attached to entities.

use chrono::Utc;

use prism_core::entities::Evidence;
use prism_core::enums::{AuditAction, RecordKind};
use prism_schema::value::normalize_url;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime};
use crate::service::PrismService;

fn row_to_evidence(row: &libsql::Row) -> Result<Evidence, DatabaseError> {
    Ok(Evidence {
        id: row.get::<i64>(0)?,
        entity_id: row.get::<i64>(1)?,
        title: row.get::<String>(2)?,
        url: get_opt_string(row, 3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

impl PrismService {
    /// Attach a piece of evidence to an entity.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown entity and
    /// `DatabaseError::Validation` for a blank title or a malformed URL.
    pub async fn add_evidence(
        &self,
        entity_id: i64,
        title: &str,
        url: Option<&str>,
    ) -> Result<Evidence, DatabaseError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DatabaseError::Validation("evidence title is required".into()));
        }
        let url = match url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(raw) => Some(
                normalize_url(raw)
                    .map(|_| raw.to_string())
                    .ok_or_else(|| DatabaseError::Validation(format!("invalid evidence url: {raw}")))?,
            ),
            None => None,
        };
        self.get_entity(entity_id).await?;

        let now = Utc::now();
        let id = self
            .db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute(
                        "INSERT INTO evidence (entity_id, title, url, created_at) VALUES (?1, ?2, ?3, ?4)",
                        libsql::params![entity_id, title, url.as_deref(), now.to_rfc3339()],
                    )
                    .await?;
                let id = self.db().last_insert_id();
                self.append_audit(RecordKind::Evidence, id, AuditAction::Created, None)
                    .await?;
                Ok(id)
            })
            .await?;

        Ok(Evidence {
            id,
            entity_id,
            title: title.to_string(),
            url,
            created_at: now,
        })
    }

    /// Evidence attached to an entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_evidence(&self, entity_id: i64) -> Result<Vec<Evidence>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, entity_id, title, url, created_at FROM evidence
                 WHERE entity_id = ?1 ORDER BY id",
                [entity_id],
            )
            .await?;
        let mut evidence = Vec::new();
        while let Some(row) = rows.next().await? {
            evidence.push(row_to_evidence(&row)?);
        }
        Ok(evidence)
    }
}
