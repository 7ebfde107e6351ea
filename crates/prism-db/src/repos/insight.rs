//! Cross-project insight repository: analysis runs, dismiss and delete.

use chrono::Utc;

use prism_core::entities::{CrossProjectInsight, NewInsight};
use prism_core::enums::{AuditAction, RecordKind};

use crate::analysis::LinkedPair;
use crate::error::DatabaseError;
use crate::helpers::{get_bool, parse_datetime, parse_enum};
use crate::repos::link::LinkFilter;
use crate::service::PrismService;

const INSIGHT_COLUMNS: &str =
    "id, type, severity, title, description, entity_id, project_id, created_at, is_dismissed";

const SEVERITY_ORDER: &str = "CASE severity
    WHEN 'critical' THEN 0 WHEN 'important' THEN 1 WHEN 'notable' THEN 2 ELSE 3 END";

/// Filter criteria for insight queries.
#[derive(Debug, Default, Clone)]
pub struct InsightFilter {
    pub include_dismissed: bool,
    pub project_id: Option<i64>,
    pub limit: Option<u32>,
}

fn row_to_insight(row: &libsql::Row) -> Result<CrossProjectInsight, DatabaseError> {
    Ok(CrossProjectInsight {
        id: row.get::<i64>(0)?,
        insight_type: parse_enum(&row.get::<String>(1)?)?,
        severity: parse_enum(&row.get::<String>(2)?)?,
        title: row.get::<String>(3)?,
        description: row.get::<String>(4)?,
        entity_id: row.get::<Option<i64>>(5)?,
        project_id: row.get::<Option<i64>>(6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        is_dismissed: get_bool(row, 8)?,
    })
}

impl PrismService {
    /// Fetch one insight.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn get_insight(&self, id: i64) -> Result<CrossProjectInsight, DatabaseError> {
        let sql = format!("SELECT {INSIGHT_COLUMNS} FROM cross_project_insights WHERE id = ?1");
        let mut rows = self.db().conn().query(&sql, [id]).await?;
        let row = rows
            .next()
            .await?
            .ok_or(DatabaseError::not_found("insight", id))?;
        row_to_insight(&row)
    }

    /// List insights, most severe first, then newest.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_insights(
        &self,
        filter: &InsightFilter,
    ) -> Result<Vec<CrossProjectInsight>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if !filter.include_dismissed {
            conditions.push("is_dismissed = 0".to_string());
        }
        if let Some(project_id) = filter.project_id {
            params.push(project_id.into());
            conditions.push(format!("project_id = ?{}", params.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.map_or_else(|| "-1".to_string(), |l| l.to_string());
        let sql = format!(
            "SELECT {INSIGHT_COLUMNS} FROM cross_project_insights
             {where_clause}
             ORDER BY {SEVERITY_ORDER}, created_at DESC, id DESC
             LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut insights = Vec::new();
        while let Some(row) = rows.next().await? {
            insights.push(row_to_insight(&row)?);
        }
        Ok(insights)
    }

    /// Soft-dismiss an insight. Only a fresh analysis run brings it back.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn dismiss_insight(&self, id: i64) -> Result<CrossProjectInsight, DatabaseError> {
        self.get_insight(id).await?;
        self.db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute(
                        "UPDATE cross_project_insights SET is_dismissed = 1 WHERE id = ?1",
                        [id],
                    )
                    .await?;
                self.append_audit(RecordKind::Insight, id, AuditAction::Dismissed, None)
                    .await
            })
            .await?;
        self.get_insight(id).await
    }

    /// Permanently delete an insight.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn delete_insight(&self, id: i64) -> Result<(), DatabaseError> {
        self.get_insight(id).await?;
        self.db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute("DELETE FROM cross_project_insights WHERE id = ?1", [id])
                    .await?;
                self.append_audit(RecordKind::Insight, id, AuditAction::Deleted, None)
                    .await
            })
            .await
    }

    async fn linked_pairs_for_analysis(&self) -> Result<Vec<LinkedPair>, DatabaseError> {
        let links = self.list_links(&LinkFilter::default()).await?;
        let mut pairs = Vec::with_capacity(links.len());
        for link in links {
            let diff = self
                .diff_entities(link.source_entity_id, link.target_entity_id)
                .await?;
            pairs.push(LinkedPair {
                source: self.get_entity(link.source_entity_id).await?,
                target: self.get_entity(link.target_entity_id).await?,
                link,
                diff,
            });
        }
        Ok(pairs)
    }

    async fn insert_insight(&self, insight: &NewInsight) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO cross_project_insights
                 (type, severity, title, description, entity_id, project_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    insight.insight_type.as_str(),
                    insight.severity.as_str(),
                    insight.title.as_str(),
                    insight.description.as_str(),
                    insight.entity_id,
                    insight.project_id,
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    /// Regenerate all insights from the current links. Previous insights,
    /// dismissed or not, are replaced. Returns the number generated.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if reading links or writing insights fails;
    /// the previous insights are kept in that case.
    pub async fn run_analysis(&self) -> Result<u32, DatabaseError> {
        let pairs = self.linked_pairs_for_analysis().await?;
        let generated = self.generator().generate(&pairs);

        self.db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute("DELETE FROM cross_project_insights", ())
                    .await?;
                for insight in &generated {
                    self.insert_insight(insight).await?;
                }
                Ok(())
            })
            .await?;

        tracing::info!(pairs = pairs.len(), insights = generated.len(), "analysis finished");
        u32::try_from(generated.len()).map_err(|e| DatabaseError::Other(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::InsightGenerator;
    use crate::test_support::helpers::{company, seeded_project, test_service};
    use pretty_assertions::assert_eq;
    use prism_core::entities::ManualLink;
    use prism_core::enums::{InsightType, LinkType, Severity};
    use serde_json::json;

    struct Fixed(Vec<NewInsight>);

    impl InsightGenerator for Fixed {
        fn generate(&self, _pairs: &[LinkedPair]) -> Vec<NewInsight> {
            self.0.clone()
        }
    }

    fn insight(severity: Severity, title: &str) -> NewInsight {
        NewInsight {
            insight_type: InsightType::Pattern,
            severity,
            title: title.into(),
            description: String::new(),
            entity_id: None,
            project_id: None,
        }
    }

    #[tokio::test]
    async fn analysis_replaces_previous_insights() {
        let svc = test_service().await.with_generator(Fixed(vec![
            insight(Severity::Info, "info"),
            insight(Severity::Critical, "critical"),
            insight(Severity::Notable, "notable"),
        ]));

        assert_eq!(svc.run_analysis().await.unwrap(), 3);
        let first = svc.list_insights(&InsightFilter::default()).await.unwrap();
        let titles: Vec<_> = first.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["critical", "notable", "info"]);

        svc.dismiss_insight(first[0].id).await.unwrap();
        assert_eq!(svc.list_insights(&InsightFilter::default()).await.unwrap().len(), 2);

        assert_eq!(svc.run_analysis().await.unwrap(), 3);
        let fresh = svc.list_insights(&InsightFilter::default()).await.unwrap();
        assert_eq!(fresh.len(), 3);
        assert!(fresh.iter().all(|i| !i.is_dismissed));
    }

    #[tokio::test]
    async fn dismissed_insights_listed_on_request() {
        let svc = test_service()
            .await
            .with_generator(Fixed(vec![insight(Severity::Important, "x")]));
        svc.run_analysis().await.unwrap();
        let id = svc.list_insights(&InsightFilter::default()).await.unwrap()[0].id;

        let dismissed = svc.dismiss_insight(id).await.unwrap();
        assert!(dismissed.is_dismissed);
        let all = svc
            .list_insights(&InsightFilter {
                include_dismissed: true,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let svc = test_service()
            .await
            .with_generator(Fixed(vec![insight(Severity::Important, "x")]));
        svc.run_analysis().await.unwrap();
        let id = svc.list_insights(&InsightFilter::default()).await.unwrap()[0].id;

        svc.delete_insight(id).await.unwrap();
        assert!(matches!(
            svc.delete_insight(id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert!(matches!(
            svc.dismiss_insight(id).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn default_heuristics_see_stored_links() {
        let svc = test_service().await;
        let p1 = seeded_project(&svc, "one").await;
        let p2 = seeded_project(&svc, "two").await;
        let a = company(&svc, p1, "Acme", &[("hq_city", json!("Austin"))]).await;
        let b = company(&svc, p2, "Acme", &[("hq_city", json!("Dallas"))]).await;
        svc.create_link(&ManualLink::new(a.id, b.id, LinkType::SameEntity))
            .await
            .unwrap();

        svc.run_analysis().await.unwrap();
        let insights = svc.list_insights(&InsightFilter::default()).await.unwrap();
        assert_eq!(insights[0].insight_type, InsightType::Contradiction);
        assert!(insights.iter().any(|i| i.insight_type == InsightType::Overlap));
        assert!(insights.iter().any(|i| i.insight_type == InsightType::Divergence));
    }
}
