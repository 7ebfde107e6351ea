//! Entity repository: typed, hierarchical entities with provenance-tagged
//! attribute values.
//!
//! Lists are scoped by project, type and immediate parent (or "root"). Every
//! write validates attribute slugs and values against the project schema.
//! Bulk star/unstar/delete are all-or-nothing per call.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;

use prism_core::entities::{AttributeValue, Entity, NewEntity};
use prism_core::enums::{AuditAction, RecordKind};
use prism_core::responses::BulkOutcome;
use prism_schema::SchemaRegistry;
use prism_schema::value::is_blank;

use crate::error::DatabaseError;
use crate::helpers::{
    get_bool, get_count, get_opt_string, like_pattern, parse_datetime, parse_enum, parse_json,
    placeholders, to_json,
};
use crate::service::PrismService;
use crate::updates::entity::EntityUpdate;

const ENTITY_COLUMNS: &str = "e.id, e.project_id, e.type_slug, e.parent_id, e.name, e.is_starred,
    e.created_at, e.updated_at,
    (SELECT COUNT(*) FROM entities c WHERE c.parent_id = e.id),
    (SELECT COUNT(*) FROM evidence v WHERE v.entity_id = e.id)";

/// Scope of an entity list query.
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    pub project_id: i64,
    pub type_slug: String,
    /// Immediate parent; `None` lists root entities.
    pub parent_id: Option<i64>,
    /// Case-insensitive match on the name or any attribute value.
    pub search: Option<String>,
    pub limit: Option<u32>,
}

impl EntityQuery {
    pub fn roots(project_id: i64, type_slug: impl Into<String>) -> Self {
        Self {
            project_id,
            type_slug: type_slug.into(),
            ..Self::default()
        }
    }

    pub fn children(project_id: i64, type_slug: impl Into<String>, parent_id: i64) -> Self {
        Self {
            project_id,
            type_slug: type_slug.into(),
            parent_id: Some(parent_id),
            ..Self::default()
        }
    }
}

fn row_to_entity(row: &libsql::Row) -> Result<Entity, DatabaseError> {
    Ok(Entity {
        id: row.get::<i64>(0)?,
        project_id: row.get::<i64>(1)?,
        type_slug: row.get::<String>(2)?,
        parent_id: row.get::<Option<i64>>(3)?,
        name: row.get::<String>(4)?,
        attributes: BTreeMap::new(),
        is_starred: get_bool(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
        child_count: get_count(row, 8)?,
        evidence_count: get_count(row, 9)?,
    })
}

fn row_to_attribute(row: &libsql::Row) -> Result<(i64, String, AttributeValue), DatabaseError> {
    Ok((
        row.get::<i64>(0)?,
        row.get::<String>(1)?,
        AttributeValue {
            value: parse_json(&row.get::<String>(2)?)?,
            source: parse_enum(&row.get::<String>(3)?)?,
            confidence: row.get::<Option<f64>>(4)?,
            reasoning: get_opt_string(row, 5)?,
        },
    ))
}

fn check_required_kept(
    registry: &SchemaRegistry,
    type_slug: &str,
    update: &EntityUpdate,
) -> Result<(), DatabaseError> {
    for slug in &update.clear {
        registry.validate_value(type_slug, slug, &serde_json::Value::Null)?;
    }
    let def = registry.require(type_slug)?;
    let dropped: Vec<String> = def
        .attributes
        .iter()
        .filter(|a| a.required)
        .filter(|a| {
            update.clear.contains(&a.slug)
                || update.set.get(&a.slug).is_some_and(|v| is_blank(&v.value))
        })
        .map(|a| a.slug.clone())
        .collect();
    if dropped.is_empty() {
        Ok(())
    } else {
        Err(DatabaseError::Validation(format!(
            "required attributes cannot be cleared: {}",
            dropped.join(", ")
        )))
    }
}

impl PrismService {
    async fn attach_attributes(&self, entities: &mut [Entity]) -> Result<(), DatabaseError> {
        if entities.is_empty() {
            return Ok(());
        }
        let ids: Vec<libsql::Value> = entities.iter().map(|e| e.id.into()).collect();
        let sql = format!(
            "SELECT entity_id, attr_slug, value, source, confidence, reasoning
             FROM attribute_values WHERE entity_id IN ({})",
            placeholders(1, ids.len())
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(ids))
            .await?;

        let mut by_entity: HashMap<i64, BTreeMap<String, AttributeValue>> = HashMap::new();
        while let Some(row) = rows.next().await? {
            let (entity_id, slug, value) = row_to_attribute(&row)?;
            by_entity.entry(entity_id).or_default().insert(slug, value);
        }
        for entity in entities {
            if let Some(attrs) = by_entity.remove(&entity.id) {
                entity.attributes = attrs;
            }
        }
        Ok(())
    }

    /// Fetch one entity with its attributes and derived counts.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn get_entity(&self, id: i64) -> Result<Entity, DatabaseError> {
        let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.id = ?1");
        let mut rows = self.db().conn().query(&sql, [id]).await?;
        let row = rows
            .next()
            .await?
            .ok_or(DatabaseError::not_found("entity", id))?;
        let mut entity = [row_to_entity(&row)?];
        self.attach_attributes(&mut entity).await?;
        let [entity] = entity;
        Ok(entity)
    }

    /// List entities of one type under one parent (or at the root).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_entities(&self, query: &EntityQuery) -> Result<Vec<Entity>, DatabaseError> {
        let mut conditions = vec!["e.project_id = ?1".to_string(), "e.type_slug = ?2".to_string()];
        let mut params: Vec<libsql::Value> = vec![
            query.project_id.into(),
            query.type_slug.as_str().into(),
        ];

        match query.parent_id {
            Some(parent_id) => {
                params.push(parent_id.into());
                conditions.push(format!("e.parent_id = ?{}", params.len()));
            }
            None => conditions.push("e.parent_id IS NULL".to_string()),
        }
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            params.push(like_pattern(term).into());
            let n = params.len();
            conditions.push(format!(
                "(e.name LIKE ?{n} ESCAPE '\\' OR EXISTS (
                    SELECT 1 FROM attribute_values av
                    WHERE av.entity_id = e.id AND av.value LIKE ?{n} ESCAPE '\\'))"
            ));
        }

        let limit = query.limit.map_or_else(|| "-1".to_string(), |l| l.to_string());
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM entities e
             WHERE {}
             ORDER BY e.name COLLATE NOCASE, e.id
             LIMIT {limit}",
            conditions.join(" AND ")
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next().await? {
            entities.push(row_to_entity(&row)?);
        }
        self.attach_attributes(&mut entities).await?;
        tracing::debug!(
            project_id = query.project_id,
            type_slug = %query.type_slug,
            parent_id = ?query.parent_id,
            count = entities.len(),
            "listed entities"
        );
        Ok(entities)
    }

    /// Direct children of an entity, across all child types.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_children(&self, parent_id: i64) -> Result<Vec<Entity>, DatabaseError> {
        let sql = format!(
            "SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.parent_id = ?1
             ORDER BY e.type_slug, e.name COLLATE NOCASE, e.id"
        );
        let mut rows = self.db().conn().query(&sql, [parent_id]).await?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next().await? {
            entities.push(row_to_entity(&row)?);
        }
        self.attach_attributes(&mut entities).await?;
        Ok(entities)
    }

    /// Every entity of a project, all types and levels.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_project_entities(&self, project_id: i64) -> Result<Vec<Entity>, DatabaseError> {
        let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities e WHERE e.project_id = ?1 ORDER BY e.id");
        let mut rows = self.db().conn().query(&sql, [project_id]).await?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next().await? {
            entities.push(row_to_entity(&row)?);
        }
        self.attach_attributes(&mut entities).await?;
        Ok(entities)
    }

    /// Entity counts per declared type of a project (zero for empty types).
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_by_type(&self, project_id: i64) -> Result<BTreeMap<String, u32>, DatabaseError> {
        let mut counts: BTreeMap<String, u32> = self
            .load_schema(project_id)
            .await?
            .types()
            .iter()
            .map(|t| (t.slug.clone(), 0))
            .collect();
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT type_slug, COUNT(*) FROM entities WHERE project_id = ?1 GROUP BY type_slug",
                [project_id],
            )
            .await?;
        while let Some(row) = rows.next().await? {
            counts.insert(row.get::<String>(0)?, get_count(&row, 1)?);
        }
        Ok(counts)
    }

    /// Upsert one attribute value; a `null` value removes it. Runs inside the
    /// caller's transaction.
    pub(crate) async fn upsert_attribute(
        &self,
        entity_id: i64,
        slug: &str,
        value: &AttributeValue,
    ) -> Result<(), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        if value.value.is_null() {
            self.db()
                .conn()
                .execute(
                    "DELETE FROM attribute_values WHERE entity_id = ?1 AND attr_slug = ?2",
                    libsql::params![entity_id, slug],
                )
                .await?;
        } else {
            self.db()
                .conn()
                .execute(
                    "INSERT INTO attribute_values
                     (entity_id, attr_slug, value, source, confidence, reasoning, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (entity_id, attr_slug) DO UPDATE SET
                        value = excluded.value,
                        source = excluded.source,
                        confidence = excluded.confidence,
                        reasoning = excluded.reasoning,
                        updated_at = excluded.updated_at",
                    libsql::params![
                        entity_id,
                        slug,
                        value.value.to_string(),
                        value.source.as_str(),
                        value.confidence,
                        value.reasoning.as_deref(),
                        now.as_str()
                    ],
                )
                .await?;
        }
        self.db()
            .conn()
            .execute(
                "UPDATE entities SET updated_at = ?1 WHERE id = ?2",
                libsql::params![now, entity_id],
            )
            .await?;
        Ok(())
    }

    async fn check_parent(
        &self,
        registry: &SchemaRegistry,
        new: &NewEntity,
    ) -> Result<(), DatabaseError> {
        let def = registry.require(&new.type_slug)?;
        match (&def.parent_type_slug, new.parent_id) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(DatabaseError::Validation(format!(
                "'{}' is a root type and cannot have a parent",
                new.type_slug
            ))),
            (Some(parent_type), None) => Err(DatabaseError::Validation(format!(
                "'{}' entities need a parent '{parent_type}'",
                new.type_slug
            ))),
            (Some(parent_type), Some(parent_id)) => {
                let parent = self.get_entity(parent_id).await?;
                if parent.project_id == new.project_id && &parent.type_slug == parent_type {
                    Ok(())
                } else {
                    Err(DatabaseError::Validation(format!(
                        "parent {parent_id} is not a '{parent_type}' in project {}",
                        new.project_id
                    )))
                }
            }
        }
    }

    /// Create an entity with validated attributes.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project or parent,
    /// `DatabaseError::Validation`/`Schema` for a blank name, a parent of the
    /// wrong type, undeclared or ill-typed attributes, or missing required ones.
    pub async fn create_entity(&self, new: &NewEntity) -> Result<Entity, DatabaseError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(DatabaseError::Validation("entity name is required".into()));
        }
        self.get_project(new.project_id).await?;
        let registry = self.load_schema(new.project_id).await?;
        self.check_parent(&registry, new).await?;
        registry.validate_attributes(&new.type_slug, &new.attributes, true)?;

        let id = self
            .db()
            .in_transaction(|| async {
                let now = Utc::now().to_rfc3339();
                self.db()
                    .conn()
                    .execute(
                        "INSERT INTO entities (project_id, type_slug, parent_id, name, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                        libsql::params![
                            new.project_id,
                            new.type_slug.as_str(),
                            new.parent_id,
                            name,
                            now
                        ],
                    )
                    .await?;
                let id = self.db().last_insert_id();
                for (slug, value) in &new.attributes {
                    self.upsert_attribute(id, slug, value).await?;
                }
                self.append_audit(RecordKind::Entity, id, AuditAction::Created, None)
                    .await?;
                Ok(id)
            })
            .await?;

        tracing::info!(entity_id = id, type_slug = %new.type_slug, "entity created");
        self.get_entity(id).await
    }

    /// Rename an entity and upsert or clear attribute values.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id and
    /// `DatabaseError::Validation`/`Schema` for undeclared or ill-typed
    /// attributes, or clearing a required one.
    pub async fn update_entity(&self, id: i64, update: &EntityUpdate) -> Result<Entity, DatabaseError> {
        let entity = self.get_entity(id).await?;
        if update.is_empty() {
            return Ok(entity);
        }
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DatabaseError::Validation("entity name is required".into()));
        }
        let registry = self.load_schema(entity.project_id).await?;
        registry.validate_attributes(&entity.type_slug, &update.set, false)?;
        check_required_kept(&registry, &entity.type_slug, update)?;

        self.db()
            .in_transaction(|| async {
                if let Some(name) = &update.name {
                    self.db()
                        .conn()
                        .execute(
                            "UPDATE entities SET name = ?1, updated_at = ?2 WHERE id = ?3",
                            libsql::params![name.trim(), Utc::now().to_rfc3339(), id],
                        )
                        .await?;
                }
                for (slug, value) in &update.set {
                    self.upsert_attribute(id, slug, value).await?;
                }
                for slug in &update.clear {
                    self.db()
                        .conn()
                        .execute(
                            "DELETE FROM attribute_values WHERE entity_id = ?1 AND attr_slug = ?2",
                            libsql::params![id, slug.as_str()],
                        )
                        .await?;
                }
                self.append_audit(
                    RecordKind::Entity,
                    id,
                    AuditAction::Updated,
                    Some(to_json(update)?),
                )
                .await
            })
            .await?;

        self.get_entity(id).await
    }

    async fn require_all_exist(&self, ids: &[i64]) -> Result<(), DatabaseError> {
        let sql = format!(
            "SELECT id FROM entities WHERE id IN ({})",
            placeholders(1, ids.len())
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(ids.iter().copied()))
            .await?;
        let mut found = Vec::with_capacity(ids.len());
        while let Some(row) = rows.next().await? {
            found.push(row.get::<i64>(0)?);
        }
        match ids.iter().find(|id| !found.contains(id)) {
            Some(&missing) => Err(DatabaseError::not_found("entity", missing)),
            None => Ok(()),
        }
    }

    fn dedup(ids: &[i64]) -> Vec<i64> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Star or unstar every entity in `ids`. All-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` naming the first unknown id; nothing
    /// is changed in that case.
    pub async fn set_starred(&self, ids: &[i64], starred: bool) -> Result<BulkOutcome, DatabaseError> {
        let ids = Self::dedup(ids);
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }
        self.require_all_exist(&ids).await?;
        let action = if starred {
            AuditAction::Starred
        } else {
            AuditAction::Unstarred
        };

        self.db()
            .in_transaction(|| async {
                for &id in &ids {
                    self.db()
                        .conn()
                        .execute(
                            "UPDATE entities SET is_starred = ?1 WHERE id = ?2",
                            libsql::params![i64::from(starred), id],
                        )
                        .await?;
                    self.append_audit(RecordKind::Entity, id, action, None).await?;
                }
                Ok(())
            })
            .await?;

        tracing::info!(count = ids.len(), starred, "entities starred");
        Ok(BulkOutcome::all(u32::try_from(ids.len()).unwrap_or(u32::MAX)))
    }

    /// Delete every entity in `ids` with its descendants, attribute values,
    /// evidence and extraction results. All-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` naming the first unknown id; nothing
    /// is deleted in that case.
    pub async fn delete_entities(&self, ids: &[i64]) -> Result<BulkOutcome, DatabaseError> {
        let ids = Self::dedup(ids);
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }
        self.require_all_exist(&ids).await?;

        self.db()
            .in_transaction(|| async {
                for &id in &ids {
                    // A descendant listed after its ancestor is already gone.
                    self.db()
                        .conn()
                        .execute("DELETE FROM entities WHERE id = ?1", [id])
                        .await?;
                    self.append_audit(RecordKind::Entity, id, AuditAction::Deleted, None)
                        .await?;
                }
                Ok(())
            })
            .await?;

        tracing::info!(count = ids.len(), "entities deleted");
        Ok(BulkOutcome::all(u32::try_from(ids.len()).unwrap_or(u32::MAX)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::test_support::helpers::{company, seeded_project, test_service};
    use crate::updates::entity::EntityUpdateBuilder;
    use pretty_assertions::assert_eq;
    use prism_core::enums::ValueSource;
    use prism_schema::SchemaError;
    use serde_json::json;

    #[tokio::test]
    async fn create_roundtrips_attributes() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let acme = company(
            &svc,
            p,
            "Acme Inc",
            &[("hq_city", json!("Austin")), ("founded_year", json!(2019))],
        )
        .await;

        let fetched = svc.get_entity(acme.id).await.unwrap();
        assert_eq!(fetched.name, "Acme Inc");
        assert_eq!(fetched.attributes["hq_city"].value, json!("Austin"));
        assert_eq!(fetched.attributes["founded_year"].value, json!(2019));
        assert_eq!(fetched.attributes["hq_city"].source, ValueSource::Manual);
        assert_eq!(fetched.child_count, 0);
        assert!(!fetched.is_starred);
    }

    #[tokio::test]
    async fn child_needs_parent_of_declared_type() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let acme = company(&svc, p, "Acme", &[]).await;

        let orphan = NewEntity::new(p, "product", "Widget");
        assert!(matches!(
            svc.create_entity(&orphan).await,
            Err(DatabaseError::Validation(_))
        ));

        let widget = svc
            .create_entity(&NewEntity::new(p, "product", "Widget").under(acme.id))
            .await
            .unwrap();
        assert_eq!(widget.parent_id, Some(acme.id));

        let nested = NewEntity::new(p, "product", "Gadget").under(widget.id);
        assert!(matches!(
            svc.create_entity(&nested).await,
            Err(DatabaseError::Validation(_))
        ));

        let root_with_parent = NewEntity::new(p, "company", "Sub").under(acme.id);
        assert!(matches!(
            svc.create_entity(&root_with_parent).await,
            Err(DatabaseError::Validation(_))
        ));
        assert_eq!(svc.get_entity(acme.id).await.unwrap().child_count, 1);
    }

    #[tokio::test]
    async fn undeclared_attribute_rejected_on_create() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let new = NewEntity::new(p, "company", "Acme")
            .attribute("colour", AttributeValue::manual("red"));
        assert!(matches!(
            svc.create_entity(&new).await,
            Err(DatabaseError::Schema(SchemaError::UnknownAttribute { .. }))
        ));
    }

    #[tokio::test]
    async fn ill_typed_value_rejected() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let new = NewEntity::new(p, "company", "Acme")
            .attribute("stage", AttributeValue::manual("ipo"));
        assert!(matches!(
            svc.create_entity(&new).await,
            Err(DatabaseError::Schema(SchemaError::InvalidValue { .. }))
        ));
    }

    #[tokio::test]
    async fn list_is_scoped_by_parent_and_search() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let acme = company(&svc, p, "Acme", &[("hq_city", json!("Austin"))]).await;
        let globex = company(&svc, p, "Globex", &[("hq_city", json!("Springfield"))]).await;
        svc.create_entity(&NewEntity::new(p, "product", "Rocket").under(acme.id))
            .await
            .unwrap();
        svc.create_entity(&NewEntity::new(p, "product", "Drill").under(globex.id))
            .await
            .unwrap();

        let roots = svc.list_entities(&EntityQuery::roots(p, "company")).await.unwrap();
        assert_eq!(roots.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(), ["Acme", "Globex"]);
        assert_eq!(roots[0].child_count, 1);

        let acme_products = svc
            .list_entities(&EntityQuery::children(p, "product", acme.id))
            .await
            .unwrap();
        assert_eq!(acme_products.len(), 1);
        assert_eq!(acme_products[0].name, "Rocket");

        let root_products = svc.list_entities(&EntityQuery::roots(p, "product")).await.unwrap();
        assert!(root_products.is_empty());

        let mut by_name = EntityQuery::roots(p, "company");
        by_name.search = Some("GLOB".into());
        let found = svc.list_entities(&by_name).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, globex.id);

        let mut by_value = EntityQuery::roots(p, "company");
        by_value.search = Some("austin".into());
        let found = svc.list_entities(&by_value).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, acme.id);
    }

    #[tokio::test]
    async fn update_sets_and_clears() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let acme = company(&svc, p, "Acme", &[("hq_city", json!("Austin"))]).await;

        let update = EntityUpdateBuilder::new()
            .name("Acme Corp")
            .set("revenue", AttributeValue::manual("$2,000,000"))
            .clear("hq_city")
            .build();
        let updated = svc.update_entity(acme.id, &update).await.unwrap();
        assert_eq!(updated.name, "Acme Corp");
        assert!(!updated.attributes.contains_key("hq_city"));
        assert_eq!(updated.attributes["revenue"].value, json!("$2,000,000"));

        let audits = svc
            .query_audit(&AuditFilter {
                record_kind: Some(RecordKind::Entity),
                record_id: Some(acme.id),
                action: Some(AuditAction::Updated),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].detail.as_ref().unwrap()["clear"], json!(["hq_city"]));
    }

    #[tokio::test]
    async fn bulk_star_is_all_or_nothing() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let a = company(&svc, p, "A", &[]).await;
        let b = company(&svc, p, "B", &[]).await;

        let err = svc.set_starred(&[a.id, 999], true).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { id: 999, .. }));
        assert!(!svc.get_entity(a.id).await.unwrap().is_starred);

        let outcome = svc.set_starred(&[a.id, b.id, a.id], true).await.unwrap();
        assert_eq!(outcome.updated, 2);
        assert!(svc.get_entity(b.id).await.unwrap().is_starred);

        svc.set_starred(&[b.id], false).await.unwrap();
        assert!(!svc.get_entity(b.id).await.unwrap().is_starred);
    }

    #[tokio::test]
    async fn delete_cascades_to_children() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let acme = company(&svc, p, "Acme", &[("hq_city", json!("Austin"))]).await;
        let rocket = svc
            .create_entity(&NewEntity::new(p, "product", "Rocket").under(acme.id))
            .await
            .unwrap();

        let outcome = svc.delete_entities(&[acme.id, rocket.id]).await.unwrap();
        assert_eq!(outcome.updated, 2);
        assert!(matches!(
            svc.get_entity(rocket.id).await,
            Err(DatabaseError::NotFound { .. })
        ));
        assert_eq!(svc.count_by_type(p).await.unwrap()["company"], 0);
    }

    #[tokio::test]
    async fn failed_delete_changes_nothing() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        let acme = company(&svc, p, "Acme", &[]).await;
        assert!(svc.delete_entities(&[acme.id, 404]).await.is_err());
        assert!(svc.get_entity(acme.id).await.is_ok());
    }

    #[tokio::test]
    async fn counts_cover_every_declared_type() {
        let svc = test_service().await;
        let p = seeded_project(&svc, "p").await;
        company(&svc, p, "A", &[]).await;
        company(&svc, p, "B", &[]).await;
        let counts = svc.count_by_type(p).await.unwrap();
        assert_eq!(counts["company"], 2);
        assert_eq!(counts["product"], 0);
    }
}
