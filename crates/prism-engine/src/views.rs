//! Pure mappings from engine state to display rows.
//!
//! Nothing here touches the backend. Rendering (tables, cards, colors) is up
//! to the caller.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use prism_core::entities::{
    AttributeDef, CrossProjectInsight, CrossProjectLink, Entity, ExtractionResult,
};
use prism_core::enums::{ConfidenceBucket, DataType, ExtractionStatus};
use prism_schema::EntityDiff;
use prism_schema::value::{parse_bool, parse_currency, parse_number, parse_tags, plain_string};

/// Placeholder for a missing or null value.
pub const EMPTY_CELL: &str = "-";

// ── Entities ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRow {
    pub id: i64,
    pub name: String,
    /// One formatted cell per column, in column order.
    pub cells: Vec<String>,
    pub child_count: u32,
    pub evidence_count: u32,
    pub starred: bool,
}

#[must_use]
pub fn entity_rows(entities: &[Entity], columns: &[AttributeDef]) -> Vec<EntityRow> {
    entities
        .iter()
        .map(|entity| EntityRow {
            id: entity.id,
            name: entity.name.clone(),
            cells: columns
                .iter()
                .map(|col| {
                    entity.attribute(&col.slug).map_or_else(
                        || EMPTY_CELL.to_string(),
                        |attr| format_value(&attr.value, Some(col.data_type)),
                    )
                })
                .collect(),
            child_count: entity.child_count,
            evidence_count: entity.evidence_count,
            starred: entity.is_starred,
        })
        .collect()
}

// ── Review ───────────────────────────────────────────────────────────────

/// Which results the review list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFilter {
    pub bucket: Option<ConfidenceBucket>,
    pub status: Option<ExtractionStatus>,
    pub needs_evidence: Option<bool>,
}

impl Default for ReviewFilter {
    fn default() -> Self {
        Self {
            bucket: None,
            status: Some(ExtractionStatus::Pending),
            needs_evidence: None,
        }
    }
}

impl ReviewFilter {
    #[must_use]
    pub fn matches(&self, result: &ExtractionResult) -> bool {
        self.bucket.is_none_or(|b| b.contains(result.confidence))
            && self.status.is_none_or(|s| s == result.status)
            && self.needs_evidence.is_none_or(|n| n == result.needs_evidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    pub id: i64,
    pub attr_slug: String,
    pub value: String,
    pub confidence: f64,
    pub bucket: ConfidenceBucket,
    pub status: ExtractionStatus,
    pub needs_evidence: bool,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewGroup {
    pub entity_id: i64,
    pub entity_name: String,
    /// Mean confidence of the items, 0 when empty.
    pub mean_confidence: f64,
    pub bucket: ConfidenceBucket,
    pub items: Vec<ReviewItem>,
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

/// Group the results that pass `filter` by entity, in first-seen order.
/// Entities without a name in `names` show as `#id`.
#[must_use]
pub fn review_groups(
    results: &[ExtractionResult],
    filter: &ReviewFilter,
    names: &HashMap<i64, String>,
) -> Vec<ReviewGroup> {
    let mut groups: Vec<ReviewGroup> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();

    for result in results.iter().filter(|r| filter.matches(r)) {
        let slot = *index.entry(result.entity_id).or_insert_with(|| {
            groups.push(ReviewGroup {
                entity_id: result.entity_id,
                entity_name: names
                    .get(&result.entity_id)
                    .cloned()
                    .unwrap_or_else(|| format!("#{}", result.entity_id)),
                mean_confidence: 0.0,
                bucket: ConfidenceBucket::Low,
                items: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].items.push(ReviewItem {
            id: result.id,
            attr_slug: result.attr_slug.clone(),
            value: format_value(&result.extracted_value, None),
            confidence: result.confidence,
            bucket: result.bucket(),
            status: result.status,
            needs_evidence: result.needs_evidence,
            reasoning: result.reasoning.clone(),
        });
    }

    for group in &mut groups {
        group.mean_confidence = mean(group.items.iter().map(|i| i.confidence));
        group.bucket = ConfidenceBucket::of(group.mean_confidence);
    }
    groups
}

// ── Diff ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub slug: String,
    pub class: &'static str,
    pub value_a: String,
    pub value_b: String,
    /// Preselected for syncing A onto B.
    pub eligible: bool,
}

#[must_use]
pub fn diff_rows(diff: &EntityDiff) -> Vec<DiffRow> {
    let cell = |v: Option<&prism_core::entities::AttributeValue>, dt| {
        v.map_or_else(|| EMPTY_CELL.to_string(), |v| format_value(&v.value, dt))
    };
    diff.attributes
        .iter()
        .map(|d| DiffRow {
            slug: d.slug.clone(),
            class: d.class.as_str(),
            value_a: cell(d.value_a.as_ref(), d.data_type),
            value_b: cell(d.value_b.as_ref(), d.data_type),
            eligible: d.class.is_sync_eligible(),
        })
        .collect()
}

// ── Links & insights ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRow {
    pub id: i64,
    pub source_entity_id: i64,
    pub target_entity_id: i64,
    pub link_type: &'static str,
    pub source: &'static str,
    /// Whole percent, e.g. `95%`.
    pub confidence: String,
}

#[must_use]
pub fn link_rows(links: &[CrossProjectLink]) -> Vec<LinkRow> {
    links
        .iter()
        .map(|l| LinkRow {
            id: l.id,
            source_entity_id: l.source_entity_id,
            target_entity_id: l.target_entity_id,
            link_type: l.link_type.as_str(),
            source: l.source.as_str(),
            confidence: format!("{:.0}%", l.confidence * 100.0),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightCard {
    pub id: i64,
    pub insight_type: &'static str,
    pub severity: &'static str,
    pub title: String,
    pub description: String,
    pub dismissed: bool,
}

/// Cards sorted by severity (critical first), then newest first.
#[must_use]
pub fn insight_cards(insights: &[CrossProjectInsight], include_dismissed: bool) -> Vec<InsightCard> {
    let mut visible: Vec<&CrossProjectInsight> = insights
        .iter()
        .filter(|i| include_dismissed || !i.is_dismissed)
        .collect();
    visible.sort_by(|a, b| {
        a.severity
            .rank()
            .cmp(&b.severity.rank())
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
    visible
        .into_iter()
        .map(|i| InsightCard {
            id: i.id,
            insight_type: i.insight_type.as_str(),
            severity: i.severity.as_str(),
            title: i.title.clone(),
            description: i.description.clone(),
            dismissed: i.is_dismissed,
        })
        .collect()
}

// ── Values ───────────────────────────────────────────────────────────────

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `$1,234` or `$1,234.50`; negatives as `-$12.00`.
fn format_currency(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    if cents == "00" {
        format!("{sign}${}", group_thousands(whole))
    } else {
        format!("{sign}${}.{cents}", group_thousands(whole))
    }
}

/// Display form of a value. Without a data type, or when the value does not
/// parse as its declared type, the plain string form is shown.
#[must_use]
pub fn format_value(value: &Value, data_type: Option<DataType>) -> String {
    if value.is_null() {
        return EMPTY_CELL.to_string();
    }
    let formatted = match data_type {
        Some(DataType::Currency) => match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_currency(s),
            _ => None,
        }
        .map(format_currency),
        Some(DataType::Number) => parse_number(value).map(|n| n.to_string()),
        Some(DataType::Boolean) => parse_bool(value).map(|b| if b { "Yes" } else { "No" }.to_string()),
        Some(DataType::Tags) => {
            parse_tags(value).map(|tags| tags.into_iter().collect::<Vec<_>>().join(", "))
        }
        _ => None,
    };
    formatted.unwrap_or_else(|| {
        let plain = plain_string(value);
        if plain.is_empty() { EMPTY_CELL.to_string() } else { plain }
    })
}
