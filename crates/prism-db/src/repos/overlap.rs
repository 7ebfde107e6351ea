//! Overlap detection: automatic `same_entity` links between entities in
//! different projects whose names match once normalized.

use std::collections::{BTreeMap, HashSet};

use prism_core::enums::{LinkSource, LinkType};

use crate::error::DatabaseError;
use crate::service::PrismService;

/// Confidence for a name match between entities of the same type slug.
pub const SAME_TYPE_CONFIDENCE: f64 = 0.95;
/// Confidence for a name match across differently-named types.
pub const CROSS_TYPE_CONFIDENCE: f64 = 0.8;

const COMPANY_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "ltd",
    "limited",
    "llc",
    "corp",
    "corporation",
    "co",
    "gmbh",
    "plc",
];

/// Normalized matching key for an entity name: lowercase words, punctuation
/// and whitespace collapsed, trailing company suffixes removed.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let lowered: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let mut words: Vec<&str> = lowered.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| COMPANY_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

struct Candidate {
    id: i64,
    project_id: i64,
    type_slug: String,
}

impl PrismService {
    async fn linked_pairs(&self) -> Result<HashSet<(i64, i64)>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT source_entity_id, target_entity_id FROM cross_project_links", ())
            .await?;
        let mut pairs = HashSet::new();
        while let Some(row) = rows.next().await? {
            let (a, b) = (row.get::<i64>(0)?, row.get::<i64>(1)?);
            pairs.insert((a.min(b), a.max(b)));
        }
        Ok(pairs)
    }

    /// Link every cross-project pair of entities with matching normalized
    /// names. Pairs already linked in either direction are skipped, so a
    /// repeated scan creates nothing new. Returns the number of links created.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query or insert fails; no links are kept
    /// in that case.
    pub async fn scan_overlaps(&self) -> Result<u32, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query("SELECT id, project_id, type_slug, name FROM entities ORDER BY id", ())
            .await?;
        let mut groups: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            let key = normalize_name(&row.get::<String>(3)?);
            if key.is_empty() {
                continue;
            }
            groups.entry(key).or_default().push(Candidate {
                id: row.get::<i64>(0)?,
                project_id: row.get::<i64>(1)?,
                type_slug: row.get::<String>(2)?,
            });
        }

        let mut linked = self.linked_pairs().await?;
        let mut planned = Vec::new();
        for candidates in groups.values() {
            for (i, a) in candidates.iter().enumerate() {
                for b in &candidates[i + 1..] {
                    if a.project_id == b.project_id || !linked.insert((a.id, b.id)) {
                        continue;
                    }
                    let confidence = if a.type_slug == b.type_slug {
                        SAME_TYPE_CONFIDENCE
                    } else {
                        CROSS_TYPE_CONFIDENCE
                    };
                    planned.push((a.id, b.id, confidence));
                }
            }
        }

        let created = self
            .db()
            .in_transaction(|| async {
                for &(source, target, confidence) in &planned {
                    self.insert_link(source, target, LinkType::SameEntity, confidence, LinkSource::Auto)
                        .await?;
                }
                Ok(planned.len())
            })
            .await?;

        tracing::info!(created, "overlap scan finished");
        u32::try_from(created).map_err(|e| DatabaseError::Other(e.into()))
    }
}
