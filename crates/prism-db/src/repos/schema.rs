//! Entity-type schema persistence.
//!
//! Definitions are validated through `SchemaRegistry` before they are stored,
//! so a loaded schema always satisfies the registry invariants.

use chrono::Utc;

use prism_core::entities::{AttributeDef, EntityTypeDef};
use prism_core::enums::{AuditAction, RecordKind};
use prism_schema::SchemaRegistry;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, parse_enum, parse_optional_json, to_json};
use crate::service::PrismService;

impl PrismService {
    /// Add an entity type to a project's schema.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown project and
    /// `DatabaseError::Schema` when the definition breaks a registry invariant
    /// (duplicate slug, unknown parent, cycle, enum without values).
    pub async fn define_entity_type(
        &self,
        project_id: i64,
        def: &EntityTypeDef,
    ) -> Result<(), DatabaseError> {
        self.get_project(project_id).await?;
        self.load_schema(project_id).await?.check_new_type(def)?;

        self.db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute(
                        "INSERT INTO entity_types (project_id, slug, name, parent_type_slug, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        libsql::params![
                            project_id,
                            def.slug.as_str(),
                            def.name.as_str(),
                            def.parent_type_slug.as_deref(),
                            Utc::now().to_rfc3339()
                        ],
                    )
                    .await?;
                let type_id = self.db().last_insert_id();

                for (position, attr) in def.attributes.iter().enumerate() {
                    let enum_values = if attr.enum_values.is_empty() {
                        None
                    } else {
                        Some(to_json(&attr.enum_values)?.to_string())
                    };
                    self.db()
                        .conn()
                        .execute(
                            "INSERT INTO attribute_defs
                             (entity_type_id, position, slug, name, data_type, required, enum_values)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                            libsql::params![
                                type_id,
                                i64::try_from(position).unwrap_or(i64::MAX),
                                attr.slug.as_str(),
                                attr.name.as_str(),
                                attr.data_type.as_str(),
                                i64::from(attr.required),
                                enum_values
                            ],
                        )
                        .await?;
                }

                self.append_audit(
                    RecordKind::EntityType,
                    type_id,
                    AuditAction::Created,
                    Some(to_json(def)?),
                )
                .await
            })
            .await?;

        tracing::info!(project_id, slug = %def.slug, "entity type defined");
        Ok(())
    }

    /// Load all entity types of a project into a registry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or stored rows violate the
    /// registry invariants.
    pub async fn load_schema(&self, project_id: i64) -> Result<SchemaRegistry, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT t.slug, t.name, t.parent_type_slug,
                        a.slug, a.name, a.data_type, a.required, a.enum_values
                 FROM entity_types t
                 LEFT JOIN attribute_defs a ON a.entity_type_id = t.id
                 WHERE t.project_id = ?1
                 ORDER BY t.id, a.position",
                [project_id],
            )
            .await?;

        let mut types: Vec<EntityTypeDef> = Vec::new();
        while let Some(row) = rows.next().await? {
            let slug = row.get::<String>(0)?;
            if types.last().is_none_or(|t| t.slug != slug) {
                types.push(EntityTypeDef {
                    slug: slug.clone(),
                    name: row.get::<String>(1)?,
                    parent_type_slug: get_opt_string(&row, 2)?,
                    attributes: Vec::new(),
                });
            }
            let Some(attr_slug) = get_opt_string(&row, 3)? else {
                continue;
            };
            let enum_values = match parse_optional_json(get_opt_string(&row, 7)?.as_deref())? {
                Some(values) => serde_json::from_value(values)
                    .map_err(|e| DatabaseError::Query(format!("enum_values for {attr_slug}: {e}")))?,
                None => Vec::new(),
            };
            let attr = AttributeDef {
                slug: attr_slug,
                name: row.get::<String>(4)?,
                data_type: parse_enum(&row.get::<String>(5)?)?,
                required: get_bool(&row, 6)?,
                enum_values,
            };
            if let Some(current) = types.last_mut() {
                current.attributes.push(attr);
            }
        }

        Ok(SchemaRegistry::new(types)?)
    }
}
