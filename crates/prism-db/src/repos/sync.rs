//! Selective attribute sync from one linked entity onto another.

use std::collections::BTreeSet;

use prism_core::audit_detail::SyncedDetail;
use prism_core::entities::AttributeValue;
use prism_core::enums::{AuditAction, RecordKind, ValueSource};
use prism_core::responses::SyncResponse;

use crate::error::DatabaseError;
use crate::helpers::to_json;
use crate::service::PrismService;

impl PrismService {
    /// Copy the current values of `slugs` from entity `from` onto entity
    /// `to`, marking them `synced`. Other attributes of `to` are untouched.
    ///
    /// Eligibility is re-derived from a fresh diff: every slug must be
    /// carried by the source. The whole call fails if any slug is refused.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` for an empty slug list or a slug the
    /// source does not carry, `DatabaseError::Schema` when the target's type
    /// does not declare a slug or rejects the value, and
    /// `DatabaseError::NotFound` for an unknown entity.
    pub async fn sync_attributes(
        &self,
        from: i64,
        to: i64,
        slugs: &[String],
    ) -> Result<SyncResponse, DatabaseError> {
        let slugs: BTreeSet<&str> = slugs.iter().map(String::as_str).collect();
        if slugs.is_empty() {
            return Err(DatabaseError::Conflict("no attributes selected to sync".into()));
        }
        if from == to {
            return Err(DatabaseError::Validation(
                "cannot sync an entity onto itself".into(),
            ));
        }

        let diff = self.diff_entities(from, to).await?;
        let mut values: Vec<(String, AttributeValue)> = Vec::with_capacity(slugs.len());
        for slug in &slugs {
            let carried = diff
                .attributes
                .iter()
                .find(|d| d.slug == *slug)
                .and_then(|d| d.value_a.as_ref());
            let Some(source_value) = carried else {
                return Err(DatabaseError::Conflict(format!(
                    "entity {from} has no value for '{slug}'"
                )));
            };
            values.push((
                (*slug).to_string(),
                AttributeValue {
                    value: source_value.value.clone(),
                    source: ValueSource::Synced,
                    confidence: source_value.confidence,
                    reasoning: source_value.reasoning.clone(),
                },
            ));
        }

        let target = self.get_entity(to).await?;
        let registry = self.load_schema(target.project_id).await?;
        for (slug, value) in &values {
            registry.validate_value(&target.type_slug, slug, &value.value)?;
        }

        let synced: Vec<String> = values.iter().map(|(slug, _)| slug.clone()).collect();
        self.db()
            .in_transaction(|| async {
                for (slug, value) in &values {
                    self.upsert_attribute(to, slug, value).await?;
                }
                self.append_audit(
                    RecordKind::Entity,
                    to,
                    AuditAction::Synced,
                    Some(to_json(&SyncedDetail {
                        from_entity_id: from,
                        attr_slugs: synced.clone(),
                    })?),
                )
                .await
            })
            .await?;

        tracing::info!(from, to, count = synced.len(), "attributes synced");
        Ok(SyncResponse {
            from_entity_id: from,
            to_entity_id: to,
            synced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{company, seeded_project, test_service};
    use pretty_assertions::assert_eq;
    use prism_schema::SchemaError;
    use serde_json::json;

    fn slugs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn sync_overwrites_only_selected_slugs() {
        let svc = test_service().await;
        let p1 = seeded_project(&svc, "one").await;
        let p2 = seeded_project(&svc, "two").await;
        let a = company(
            &svc,
            p1,
            "Acme",
            &[("hq_city", json!("Austin")), ("stage", json!("seed"))],
        )
        .await;
        let b = company(
            &svc,
            p2,
            "Acme",
            &[("hq_city", json!("Dallas")), ("founded_year", json!(2010))],
        )
        .await;

        let response = svc
            .sync_attributes(a.id, b.id, &slugs(&["hq_city", "stage"]))
            .await
            .unwrap();
        assert_eq!(response.synced, ["hq_city", "stage"]);

        let after = svc.get_entity(b.id).await.unwrap();
        assert_eq!(after.attributes["hq_city"].value, json!("Austin"));
        assert_eq!(after.attributes["hq_city"].source, ValueSource::Synced);
        assert_eq!(after.attributes["stage"].value, json!("seed"));
        assert_eq!(after.attributes["founded_year"], b.attributes["founded_year"]);
        assert_eq!(svc.get_entity(a.id).await.unwrap().attributes, a.attributes);
    }

    #[tokio::test]
    async fn empty_or_uncarried_selection_conflicts() {
        let svc = test_service().await;
        let p1 = seeded_project(&svc, "one").await;
        let p2 = seeded_project(&svc, "two").await;
        let a = company(&svc, p1, "Acme", &[("hq_city", json!("Austin"))]).await;
        let b = company(&svc, p2, "Acme", &[("website", json!("https://acme.example"))]).await;

        assert!(matches!(
            svc.sync_attributes(a.id, b.id, &[]).await,
            Err(DatabaseError::Conflict(_))
        ));
        assert!(matches!(
            svc.sync_attributes(a.id, b.id, &slugs(&["hq_city", "website"])).await,
            Err(DatabaseError::Conflict(_))
        ));
        let unchanged = svc.get_entity(b.id).await.unwrap();
        assert!(!unchanged.attributes.contains_key("hq_city"));
    }

    #[tokio::test]
    async fn target_schema_must_declare_slug() {
        let svc = test_service().await;
        let p1 = seeded_project(&svc, "one").await;
        let p2 = seeded_project(&svc, "two").await;
        let a = company(&svc, p1, "Acme", &[]).await;
        let rocket = svc
            .create_entity(
                &prism_core::entities::NewEntity::new(p1, "product", "Rocket")
                    .under(a.id)
                    .attribute("price", AttributeValue::manual("$99")),
            )
            .await
            .unwrap();
        let b = company(&svc, p2, "Rocket", &[]).await;

        assert!(matches!(
            svc.sync_attributes(rocket.id, b.id, &slugs(&["price"])).await,
            Err(DatabaseError::Schema(SchemaError::UnknownAttribute { .. }))
        ));
    }
}
