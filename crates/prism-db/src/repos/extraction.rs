//! Extraction result repository: intake from the extraction job and the
//! review lifecycle.
//!
//! A result is created `pending` and transitions exactly once. Accepting or
//! editing commits the value into the entity's attribute set in the same
//! transaction as the status change; rejecting touches only the status.

use chrono::Utc;

use prism_core::audit_detail::{CommittedDetail, StatusChangedDetail};
use prism_core::entities::{AttributeValue, ExtractionResult, NewExtractionResult, ReviewDecision};
use prism_core::enums::{AuditAction, ExtractionStatus, RecordKind, ValueSource};
use prism_core::responses::{BulkFailure, BulkOutcome};

use prism_schema::value::is_blank;

use crate::error::DatabaseError;
use crate::helpers::{
    get_bool, get_opt_string, parse_datetime, parse_enum, parse_json, parse_optional_datetime,
    to_json,
};
use crate::service::PrismService;

const RESULT_COLUMNS: &str = "r.id, r.entity_id, r.attr_slug, r.extracted_value, r.confidence,
    r.reasoning, r.evidence_id, r.status, r.needs_evidence, r.created_at, r.reviewed_at";

/// Filter criteria for extraction result queries.
#[derive(Debug, Default, Clone)]
pub struct ExtractionFilter {
    pub project_id: Option<i64>,
    pub entity_id: Option<i64>,
    pub status: Option<ExtractionStatus>,
    pub limit: Option<u32>,
}

impl ExtractionFilter {
    #[must_use]
    pub fn pending_for_project(project_id: i64) -> Self {
        Self {
            project_id: Some(project_id),
            status: Some(ExtractionStatus::Pending),
            ..Self::default()
        }
    }
}

fn row_to_result(row: &libsql::Row) -> Result<ExtractionResult, DatabaseError> {
    Ok(ExtractionResult {
        id: row.get::<i64>(0)?,
        entity_id: row.get::<i64>(1)?,
        attr_slug: row.get::<String>(2)?,
        extracted_value: parse_json(&row.get::<String>(3)?)?,
        confidence: row.get::<f64>(4)?,
        reasoning: get_opt_string(row, 5)?,
        evidence_id: row.get::<Option<i64>>(6)?,
        status: parse_enum(&row.get::<String>(7)?)?,
        needs_evidence: get_bool(row, 8)?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
        reviewed_at: parse_optional_datetime(get_opt_string(row, 10)?.as_deref())?,
    })
}

fn check_confidence(confidence: f64) -> Result<(), DatabaseError> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(DatabaseError::Validation(format!(
            "confidence must be within [0, 1], got {confidence}"
        )))
    }
}

impl PrismService {
    /// Record a candidate value proposed by the extraction job.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown entity and
    /// `DatabaseError::Validation`/`Schema` for an out-of-range confidence,
    /// an undeclared attribute, or evidence attached to a different entity.
    pub async fn submit_extraction(
        &self,
        new: &NewExtractionResult,
    ) -> Result<ExtractionResult, DatabaseError> {
        check_confidence(new.confidence)?;
        if new.extracted_value.is_null() {
            return Err(DatabaseError::Validation(
                "extracted value must not be null".into(),
            ));
        }
        let entity = self.get_entity(new.entity_id).await?;
        let registry = self.load_schema(entity.project_id).await?;
        if registry.attribute(&entity.type_slug, &new.attr_slug).is_none() {
            return Err(prism_schema::SchemaError::UnknownAttribute {
                type_slug: entity.type_slug,
                attr: new.attr_slug.clone(),
            }
            .into());
        }
        if let Some(evidence_id) = new.evidence_id {
            let evidence = self.list_evidence(new.entity_id).await?;
            if !evidence.iter().any(|e| e.id == evidence_id) {
                return Err(DatabaseError::Validation(format!(
                    "evidence {evidence_id} does not belong to entity {}",
                    new.entity_id
                )));
            }
        }

        let id = self
            .db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute(
                        "INSERT INTO extraction_results
                         (entity_id, attr_slug, extracted_value, confidence, reasoning, evidence_id, created_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        libsql::params![
                            new.entity_id,
                            new.attr_slug.as_str(),
                            new.extracted_value.to_string(),
                            new.confidence,
                            new.reasoning.as_deref(),
                            new.evidence_id,
                            Utc::now().to_rfc3339()
                        ],
                    )
                    .await?;
                let id = self.db().last_insert_id();
                self.append_audit(RecordKind::ExtractionResult, id, AuditAction::Created, None)
                    .await?;
                Ok(id)
            })
            .await?;

        tracing::debug!(extraction_id = id, entity_id = new.entity_id, "extraction submitted");
        self.get_extraction(id).await
    }

    /// Fetch one extraction result.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn get_extraction(&self, id: i64) -> Result<ExtractionResult, DatabaseError> {
        let sql = format!("SELECT {RESULT_COLUMNS} FROM extraction_results r WHERE r.id = ?1");
        let mut rows = self.db().conn().query(&sql, [id]).await?;
        let row = rows
            .next()
            .await?
            .ok_or(DatabaseError::not_found("extraction result", id))?;
        row_to_result(&row)
    }

    /// List extraction results, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_extractions(
        &self,
        filter: &ExtractionFilter,
    ) -> Result<Vec<ExtractionResult>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(project_id) = filter.project_id {
            params.push(project_id.into());
            conditions.push(format!("e.project_id = ?{}", params.len()));
        }
        if let Some(entity_id) = filter.entity_id {
            params.push(entity_id.into());
            conditions.push(format!("r.entity_id = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("r.status = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit = filter.limit.map_or_else(|| "-1".to_string(), |l| l.to_string());
        let sql = format!(
            "SELECT {RESULT_COLUMNS} FROM extraction_results r
             JOIN entities e ON e.id = r.entity_id
             {where_clause}
             ORDER BY r.entity_id, r.id
             LIMIT {limit}"
        );

        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_result(&row)?);
        }
        Ok(results)
    }

    /// Apply a review decision to one pending result.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Conflict` if the result is no longer pending,
    /// `DatabaseError::NotFound` for an unknown id, and
    /// `DatabaseError::Schema` if the committed value does not fit the
    /// attribute's declared type, and `DatabaseError::Validation` for a blank
    /// value on a required attribute. Nothing changes on error.
    pub async fn review_extraction(
        &self,
        id: i64,
        decision: &ReviewDecision,
    ) -> Result<ExtractionResult, DatabaseError> {
        let result = self.get_extraction(id).await?;
        let to = decision.target_status();
        if !result.status.can_transition_to(to) {
            return Err(DatabaseError::Conflict(format!(
                "extraction result {id} is already {}",
                result.status
            )));
        }

        let committed = match decision {
            ReviewDecision::Accept => Some((result.extracted_value.clone(), ValueSource::Extracted)),
            ReviewDecision::Edit(value) => Some((value.clone(), ValueSource::Edited)),
            ReviewDecision::Reject => None,
        };
        let entity = self.get_entity(result.entity_id).await?;
        if let Some((value, _)) = &committed {
            let registry = self.load_schema(entity.project_id).await?;
            registry.validate_value(&entity.type_slug, &result.attr_slug, value)?;
            let required = registry
                .attribute(&entity.type_slug, &result.attr_slug)
                .is_some_and(|def| def.required);
            if required && is_blank(value) {
                return Err(DatabaseError::Validation(format!(
                    "'{}' is required and cannot be committed blank",
                    result.attr_slug
                )));
            }
        }

        self.db()
            .in_transaction(|| async {
                let changed = self
                    .db()
                    .conn()
                    .execute(
                        "UPDATE extraction_results SET status = ?1, reviewed_at = ?2
                         WHERE id = ?3 AND status = 'pending'",
                        libsql::params![to.as_str(), Utc::now().to_rfc3339(), id],
                    )
                    .await?;
                if changed != 1 {
                    return Err(DatabaseError::Conflict(format!(
                        "extraction result {id} was reviewed concurrently"
                    )));
                }
                self.append_audit(
                    RecordKind::ExtractionResult,
                    id,
                    AuditAction::StatusChanged,
                    Some(to_json(&StatusChangedDetail {
                        from: result.status.as_str().to_string(),
                        to: to.as_str().to_string(),
                        reason: None,
                    })?),
                )
                .await?;

                if let Some((value, source)) = &committed {
                    let attribute = AttributeValue {
                        value: value.clone(),
                        source: *source,
                        confidence: Some(result.confidence),
                        reasoning: result.reasoning.clone(),
                    };
                    self.upsert_attribute(result.entity_id, &result.attr_slug, &attribute)
                        .await?;
                    self.append_audit(
                        RecordKind::Entity,
                        result.entity_id,
                        AuditAction::Committed,
                        Some(to_json(&CommittedDetail {
                            extraction_id: id,
                            attr_slug: result.attr_slug.clone(),
                            value: value.clone(),
                            source: source.as_str().to_string(),
                            confidence: result.confidence,
                            reasoning: result.reasoning.clone(),
                        })?),
                    )
                    .await?;
                }
                Ok(())
            })
            .await?;

        tracing::info!(extraction_id = id, status = %to, "extraction reviewed");
        self.get_extraction(id).await
    }

    /// Apply one decision to many results, best-effort. Each failure is
    /// reported per id; successful items stay committed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a bulk edit, which has no
    /// single value that fits every attribute.
    pub async fn review_bulk(
        &self,
        ids: &[i64],
        decision: &ReviewDecision,
    ) -> Result<BulkOutcome, DatabaseError> {
        if matches!(decision, ReviewDecision::Edit(_)) {
            return Err(DatabaseError::Validation(
                "bulk review supports accept and reject only".into(),
            ));
        }
        let mut outcome = BulkOutcome::default();
        for &id in ids {
            match self.review_extraction(id, decision).await {
                Ok(_) => outcome.updated += 1,
                Err(err) => {
                    tracing::warn!(extraction_id = id, %err, "bulk review item failed");
                    outcome.failures.push(BulkFailure {
                        id,
                        message: err.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    /// Apply a decision to every pending result of an entity.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown entity, or the
    /// `review_bulk` errors.
    pub async fn review_entity(
        &self,
        entity_id: i64,
        decision: &ReviewDecision,
    ) -> Result<BulkOutcome, DatabaseError> {
        self.get_entity(entity_id).await?;
        let pending: Vec<i64> = self
            .list_extractions(&ExtractionFilter {
                entity_id: Some(entity_id),
                status: Some(ExtractionStatus::Pending),
                ..ExtractionFilter::default()
            })
            .await?
            .iter()
            .map(|r| r.id)
            .collect();
        self.review_bulk(&pending, decision).await
    }

    /// Flag or unflag a result as needing evidence, independent of status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn set_needs_evidence(
        &self,
        id: i64,
        needs_evidence: bool,
    ) -> Result<ExtractionResult, DatabaseError> {
        self.get_extraction(id).await?;
        self.db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute(
                        "UPDATE extraction_results SET needs_evidence = ?1 WHERE id = ?2",
                        libsql::params![i64::from(needs_evidence), id],
                    )
                    .await?;
                self.append_audit(
                    RecordKind::ExtractionResult,
                    id,
                    AuditAction::Flagged,
                    Some(serde_json::json!({ "needs_evidence": needs_evidence })),
                )
                .await
            })
            .await?;
        self.get_extraction(id).await
    }
}
