//! Attribute diff between two stored entities, each read against its own
//! project's schema.

use prism_schema::EntityDiff;

use crate::error::DatabaseError;
use crate::service::PrismService;

impl PrismService {
    /// Diff entity `a` against entity `b`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if either entity is unknown.
    pub async fn diff_entities(&self, a: i64, b: i64) -> Result<EntityDiff, DatabaseError> {
        let entity_a = self.get_entity(a).await?;
        let entity_b = self.get_entity(b).await?;
        let schema_a = self.load_schema(entity_a.project_id).await?;
        let schema_b = if entity_b.project_id == entity_a.project_id {
            schema_a.clone()
        } else {
            self.load_schema(entity_b.project_id).await?
        };

        let diff = EntityDiff::compute(
            &entity_a,
            schema_a.get(&entity_a.type_slug),
            &entity_b,
            schema_b.get(&entity_b.type_slug),
        );
        tracing::debug!(a, b, slugs = diff.attributes.len(), "diff computed");
        Ok(diff)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DatabaseError;
    use crate::test_support::helpers::{company, seeded_project, test_service};
    use pretty_assertions::assert_eq;
    use prism_core::enums::DiffClass;
    use serde_json::json;

    #[tokio::test]
    async fn diff_across_projects_is_type_aware() {
        let svc = test_service().await;
        let p1 = seeded_project(&svc, "one").await;
        let p2 = seeded_project(&svc, "two").await;
        let a = company(
            &svc,
            p1,
            "Acme",
            &[
                ("revenue", json!("$1,200,000")),
                ("hq_city", json!("Austin")),
                ("stage", json!("seed")),
            ],
        )
        .await;
        let b = company(
            &svc,
            p2,
            "Acme",
            &[
                ("revenue", json!(1_200_000)),
                ("hq_city", json!("Dallas")),
                ("website", json!("https://acme.example")),
            ],
        )
        .await;

        let diff = svc.diff_entities(a.id, b.id).await.unwrap();
        assert_eq!(diff.class_of("revenue"), Some(DiffClass::Same));
        assert_eq!(diff.class_of("hq_city"), Some(DiffClass::Different));
        assert_eq!(diff.class_of("stage"), Some(DiffClass::OnlyA));
        assert_eq!(diff.class_of("website"), Some(DiffClass::OnlyB));

        let reverse = svc.diff_entities(b.id, a.id).await.unwrap();
        assert_eq!(reverse.slugs(DiffClass::OnlyB), diff.slugs(DiffClass::OnlyA));
    }

    #[tokio::test]
    async fn unknown_entity_is_not_found() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let a = company(&svc, p, "Acme", &[]).await;
        assert!(matches!(
            svc.diff_entities(a.id, 404).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }
}
