//! Shared test utilities for prism-db tests.

pub(crate) mod helpers {
    use prism_core::entities::{AttributeDef, AttributeValue, Entity, EntityTypeDef, NewEntity};
    use prism_core::enums::DataType;

    use crate::service::PrismService;

    /// Create an in-memory `PrismService`.
    pub async fn test_service() -> PrismService {
        PrismService::new_local(":memory:").await.unwrap()
    }

    /// Company (root) → product (child) schema used across repo tests.
    pub fn market_schema() -> Vec<EntityTypeDef> {
        vec![
            EntityTypeDef::new("company", "Company")
                .attribute(AttributeDef::new("website", "Website", DataType::Url))
                .attribute(AttributeDef::new("hq_city", "HQ City", DataType::Text))
                .attribute(AttributeDef::new("founded_year", "Founded", DataType::Number))
                .attribute(AttributeDef::new("revenue", "Revenue", DataType::Currency))
                .attribute(
                    AttributeDef::new("stage", "Stage", DataType::Enum)
                        .with_enum_values(["seed", "series_a", "public"]),
                ),
            EntityTypeDef::new("product", "Product")
                .child_of("company")
                .attribute(AttributeDef::new("price", "Price", DataType::Currency)),
        ]
    }

    /// Create a project with the market schema and return its id.
    pub async fn seeded_project(svc: &PrismService, name: &str) -> i64 {
        let project = svc.create_project(name, None).await.unwrap();
        for def in market_schema() {
            svc.define_entity_type(project.id, &def).await.unwrap();
        }
        project.id
    }

    /// Create a root company with manual attribute values.
    pub async fn company(
        svc: &PrismService,
        project_id: i64,
        name: &str,
        attrs: &[(&str, serde_json::Value)],
    ) -> Entity {
        let mut new = NewEntity::new(project_id, "company", name);
        for (slug, value) in attrs {
            new = new.attribute(*slug, AttributeValue::manual(value.clone()));
        }
        svc.create_entity(&new).await.unwrap()
    }
}
