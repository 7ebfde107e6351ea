//! Cross-project link repository: asserted relationships between entities.

use chrono::Utc;

use prism_core::audit_detail::LinkedDetail;
use prism_core::entities::{CrossProjectLink, LinkStats, ManualLink};
use prism_core::enums::{AuditAction, LinkSource, LinkType, RecordKind};
use prism_core::errors::CoreError;

use crate::error::DatabaseError;
use crate::helpers::{parse_datetime, parse_enum, to_json};
use crate::service::PrismService;

const LINK_COLUMNS: &str =
    "l.id, l.source_entity_id, l.target_entity_id, l.link_type, l.confidence, l.source, l.created_at";

/// Filter criteria for link queries. Entity and project match either end.
#[derive(Debug, Default, Clone)]
pub struct LinkFilter {
    pub entity_id: Option<i64>,
    pub project_id: Option<i64>,
    pub link_type: Option<LinkType>,
}

fn row_to_link(row: &libsql::Row) -> Result<CrossProjectLink, DatabaseError> {
    Ok(CrossProjectLink {
        id: row.get::<i64>(0)?,
        source_entity_id: row.get::<i64>(1)?,
        target_entity_id: row.get::<i64>(2)?,
        link_type: parse_enum(&row.get::<String>(3)?)?,
        confidence: row.get::<f64>(4)?,
        source: parse_enum(&row.get::<String>(5)?)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

fn linked_detail(link: &CrossProjectLink) -> LinkedDetail {
    LinkedDetail {
        source_entity_id: link.source_entity_id,
        target_entity_id: link.target_entity_id,
        link_type: link.link_type.as_str().to_string(),
        link_source: link.source.as_str().to_string(),
    }
}

impl PrismService {
    /// Insert a link and its audit entry. Runs inside the caller's transaction.
    pub(crate) async fn insert_link(
        &self,
        source_entity_id: i64,
        target_entity_id: i64,
        link_type: LinkType,
        confidence: f64,
        source: LinkSource,
    ) -> Result<CrossProjectLink, DatabaseError> {
        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "INSERT INTO cross_project_links
                 (source_entity_id, target_entity_id, link_type, confidence, source, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    source_entity_id,
                    target_entity_id,
                    link_type.as_str(),
                    confidence,
                    source.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        let link = CrossProjectLink {
            id: self.db().last_insert_id(),
            source_entity_id,
            target_entity_id,
            link_type,
            confidence,
            source,
            created_at: now,
        };
        self.append_audit(
            RecordKind::Link,
            link.id,
            AuditAction::Linked,
            Some(to_json(&linked_detail(&link))?),
        )
        .await?;
        Ok(link)
    }

    async fn link_exists(
        &self,
        source_entity_id: i64,
        target_entity_id: i64,
        link_type: LinkType,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT 1 FROM cross_project_links
                 WHERE source_entity_id = ?1 AND target_entity_id = ?2 AND link_type = ?3",
                libsql::params![source_entity_id, target_entity_id, link_type.as_str()],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Create a user-asserted link between two entities.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for non-positive ids, a self link
    /// or an out-of-range confidence, `DatabaseError::NotFound` for an unknown
    /// entity and `DatabaseError::Conflict` for a duplicate link.
    pub async fn create_link(&self, link: &ManualLink) -> Result<CrossProjectLink, DatabaseError> {
        link.validate().map_err(|err| match err {
            CoreError::Validation(msg) => DatabaseError::Validation(msg),
            other => DatabaseError::Validation(other.to_string()),
        })?;
        self.get_entity(link.source_entity_id).await?;
        self.get_entity(link.target_entity_id).await?;
        if self
            .link_exists(link.source_entity_id, link.target_entity_id, link.link_type)
            .await?
        {
            return Err(DatabaseError::Conflict(format!(
                "{} link {} -> {} already exists",
                link.link_type, link.source_entity_id, link.target_entity_id
            )));
        }

        let created = self
            .db()
            .in_transaction(|| {
                self.insert_link(
                    link.source_entity_id,
                    link.target_entity_id,
                    link.link_type,
                    link.effective_confidence(),
                    LinkSource::Manual,
                )
            })
            .await?;
        tracing::info!(link_id = created.id, "manual link created");
        Ok(created)
    }

    /// Fetch one link.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn get_link(&self, id: i64) -> Result<CrossProjectLink, DatabaseError> {
        let sql = format!("SELECT {LINK_COLUMNS} FROM cross_project_links l WHERE l.id = ?1");
        let mut rows = self.db().conn().query(&sql, [id]).await?;
        let row = rows
            .next()
            .await?
            .ok_or(DatabaseError::not_found("link", id))?;
        row_to_link(&row)
    }

    /// Hard-delete a link.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn delete_link(&self, id: i64) -> Result<(), DatabaseError> {
        let link = self.get_link(id).await?;
        self.db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute("DELETE FROM cross_project_links WHERE id = ?1", [id])
                    .await?;
                self.append_audit(
                    RecordKind::Link,
                    id,
                    AuditAction::Unlinked,
                    Some(to_json(&linked_detail(&link))?),
                )
                .await
            })
            .await?;
        tracing::info!(link_id = id, "link deleted");
        Ok(())
    }

    /// List links, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_links(&self, filter: &LinkFilter) -> Result<Vec<CrossProjectLink>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(entity_id) = filter.entity_id {
            params.push(entity_id.into());
            let n = params.len();
            conditions.push(format!("(l.source_entity_id = ?{n} OR l.target_entity_id = ?{n})"));
        }
        if let Some(project_id) = filter.project_id {
            params.push(project_id.into());
            conditions.push(format!("(s.project_id = ?{n} OR t.project_id = ?{n})", n = params.len()));
        }
        if let Some(link_type) = filter.link_type {
            params.push(link_type.as_str().into());
            conditions.push(format!("l.link_type = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM cross_project_links l
             JOIN entities s ON s.id = l.source_entity_id
             JOIN entities t ON t.id = l.target_entity_id
             {where_clause}
             ORDER BY l.id DESC"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut links = Vec::new();
        while let Some(row) = rows.next().await? {
            links.push(row_to_link(&row)?);
        }
        Ok(links)
    }

    /// Link totals by type and by source.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn link_stats(&self, filter: &LinkFilter) -> Result<LinkStats, DatabaseError> {
        let links = self.list_links(filter).await?;
        let mut stats = LinkStats::default();
        for link in &links {
            stats.total += 1;
            *stats.by_type.entry(link.link_type.as_str().to_string()).or_default() += 1;
            *stats.by_source.entry(link.source.as_str().to_string()).or_default() += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{company, seeded_project, test_service};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn manual_link_defaults_to_full_confidence() {
        let svc = test_service().await;
        let p1 = seeded_project(&svc, "one").await;
        let p2 = seeded_project(&svc, "two").await;
        let a = company(&svc, p1, "Acme", &[]).await;
        let b = company(&svc, p2, "Acme", &[]).await;

        let link = svc
            .create_link(&ManualLink::new(a.id, b.id, LinkType::SameEntity))
            .await
            .unwrap();
        assert_eq!(link.confidence, 1.0);
        assert_eq!(link.source, LinkSource::Manual);

        let dup = svc
            .create_link(&ManualLink::new(a.id, b.id, LinkType::SameEntity))
            .await;
        assert!(matches!(dup, Err(DatabaseError::Conflict(_))));
    }

    #[tokio::test]
    async fn self_link_and_unknown_entity_rejected() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let a = company(&svc, p, "Acme", &[]).await;

        assert!(matches!(
            svc.create_link(&ManualLink::new(a.id, a.id, LinkType::Related)).await,
            Err(DatabaseError::Validation(_))
        ));
        assert!(matches!(
            svc.create_link(&ManualLink::new(a.id, 999, LinkType::Related)).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn filters_and_stats() {
        let svc = test_service().await;
        let p1 = seeded_project(&svc, "one").await;
        let p2 = seeded_project(&svc, "two").await;
        let p3 = seeded_project(&svc, "three").await;
        let a = company(&svc, p1, "Acme", &[]).await;
        let b = company(&svc, p2, "Acme", &[]).await;
        let c = company(&svc, p3, "Globex", &[]).await;
        svc.create_link(&ManualLink::new(a.id, b.id, LinkType::SameEntity))
            .await
            .unwrap();
        svc.create_link(&ManualLink::new(b.id, c.id, LinkType::Related))
            .await
            .unwrap();

        let for_b = svc
            .list_links(&LinkFilter {
                entity_id: Some(b.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_b.len(), 2);

        let for_p1 = svc
            .list_links(&LinkFilter {
                project_id: Some(p1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_p1.len(), 1);

        let stats = svc.link_stats(&LinkFilter::default()).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_type["same_entity"], 1);
        assert_eq!(stats.by_type["related"], 1);
        assert_eq!(stats.by_source["manual"], 2);
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let svc = test_service().await;
        let p1 = seeded_project(&svc, "one").await;
        let p2 = seeded_project(&svc, "two").await;
        let a = company(&svc, p1, "Acme", &[]).await;
        let b = company(&svc, p2, "Acme", &[]).await;
        let link = svc
            .create_link(&ManualLink::new(a.id, b.id, LinkType::Related))
            .await
            .unwrap();

        svc.delete_link(link.id).await.unwrap();
        assert!(svc.list_links(&LinkFilter::default()).await.unwrap().is_empty());
        assert!(matches!(
            svc.delete_link(link.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
