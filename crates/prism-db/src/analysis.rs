//! Insight generation over linked entity pairs.
//!
//! An analysis run hands every stored link, with both entities and their
//! attribute diff, to an [`InsightGenerator`]. The generator is opaque to the
//! store: [`HeuristicInsights`] is the local default, and a model-backed
//! generator can be swapped in with `PrismService::with_generator`.

use std::collections::BTreeMap;

use prism_core::entities::{CrossProjectLink, Entity, NewInsight};
use prism_core::enums::{DiffClass, InsightType, LinkType, Severity};
use prism_schema::EntityDiff;

/// Differing attribute count at which a divergence becomes important.
pub const IMPORTANT_DIVERGENCE: usize = 3;

/// A stored link with both endpoints and the source→target diff.
#[derive(Debug, Clone)]
pub struct LinkedPair {
    pub link: CrossProjectLink,
    pub source: Entity,
    pub target: Entity,
    pub diff: EntityDiff,
}

/// Produces insights from the current set of linked pairs.
pub trait InsightGenerator: Send + Sync {
    fn generate(&self, pairs: &[LinkedPair]) -> Vec<NewInsight>;
}

/// Rule-based generator.
///
/// * `overlap`: one per project pair sharing links (notable)
/// * `divergence`: per `same_entity` link with differing values
/// * `coverage_gap`: per `same_entity` link where one side lacks attributes (info)
/// * `contradiction`: differing values that people asserted on both sides (critical)
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicInsights;

impl HeuristicInsights {
    fn overlaps(pairs: &[LinkedPair]) -> Vec<NewInsight> {
        let mut by_projects: BTreeMap<(i64, i64), u32> = BTreeMap::new();
        for pair in pairs {
            let (a, b) = (pair.source.project_id, pair.target.project_id);
            if a != b {
                *by_projects.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        by_projects
            .into_iter()
            .map(|((a, b), count)| NewInsight {
                insight_type: InsightType::Overlap,
                severity: Severity::Notable,
                title: format!("Projects {a} and {b} share {count} linked entities"),
                description: format!(
                    "{count} entities in project {a} are linked to entities in project {b}."
                ),
                entity_id: None,
                project_id: Some(a),
            })
            .collect()
    }

    fn per_link(pair: &LinkedPair) -> Vec<NewInsight> {
        let mut insights = Vec::new();
        let name = &pair.source.name;
        let different = pair.diff.slugs(DiffClass::Different);

        if !different.is_empty() {
            let severity = if different.len() >= IMPORTANT_DIVERGENCE {
                Severity::Important
            } else {
                Severity::Notable
            };
            insights.push(NewInsight {
                insight_type: InsightType::Divergence,
                severity,
                title: format!("{name} differs on {} attributes", different.len()),
                description: format!(
                    "Projects {} and {} disagree on: {}.",
                    pair.source.project_id,
                    pair.target.project_id,
                    different.join(", ")
                ),
                entity_id: Some(pair.source.id),
                project_id: Some(pair.source.project_id),
            });
        }

        let contradicted: Vec<&str> = pair
            .diff
            .attributes
            .iter()
            .filter(|d| d.class == DiffClass::Different)
            .filter(|d| {
                d.value_a.as_ref().is_some_and(|v| v.source.is_human_asserted())
                    && d.value_b.as_ref().is_some_and(|v| v.source.is_human_asserted())
            })
            .map(|d| d.slug.as_str())
            .collect();
        if !contradicted.is_empty() {
            insights.push(NewInsight {
                insight_type: InsightType::Contradiction,
                severity: Severity::Critical,
                title: format!("Conflicting manual values for {name}"),
                description: format!(
                    "Researchers entered different values in projects {} and {} for: {}.",
                    pair.source.project_id,
                    pair.target.project_id,
                    contradicted.join(", ")
                ),
                entity_id: Some(pair.source.id),
                project_id: Some(pair.source.project_id),
            });
        }

        let only_a = pair.diff.slugs(DiffClass::OnlyA);
        let only_b = pair.diff.slugs(DiffClass::OnlyB);
        for (missing_in, slugs, entity) in [
            (&pair.target, only_a, &pair.source),
            (&pair.source, only_b, &pair.target),
        ] {
            if slugs.is_empty() {
                continue;
            }
            insights.push(NewInsight {
                insight_type: InsightType::CoverageGap,
                severity: Severity::Info,
                title: format!("{} is missing {} attributes", missing_in.name, slugs.len()),
                description: format!(
                    "Project {} has no value for {} that project {} records.",
                    missing_in.project_id,
                    slugs.join(", "),
                    entity.project_id
                ),
                entity_id: Some(missing_in.id),
                project_id: Some(missing_in.project_id),
            });
        }
        insights
    }
}

impl InsightGenerator for HeuristicInsights {
    fn generate(&self, pairs: &[LinkedPair]) -> Vec<NewInsight> {
        let mut insights = Self::overlaps(pairs);
        insights.extend(
            pairs
                .iter()
                .filter(|p| p.link.link_type == LinkType::SameEntity)
                .flat_map(Self::per_link),
        );
        insights
    }
}
