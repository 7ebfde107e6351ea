//! Extraction review: load a project's results, filter by confidence bucket,
//! and accept, reject or edit them singly or in bulk.

use std::collections::HashMap;
use std::sync::Arc;

use prism_core::entities::{ExtractionResult, ReviewDecision};
use prism_core::errors::CoreError;
use prism_core::responses::BulkOutcome;
use prism_db::repos::extraction::ExtractionFilter;

use crate::backend::{Backend, read_or};
use crate::views::{ReviewFilter, ReviewGroup, review_groups};

pub struct ReviewEngine<B: Backend> {
    backend: Arc<B>,
    project_id: i64,
    results: Vec<ExtractionResult>,
    names: HashMap<i64, String>,
    filter: ReviewFilter,
}

impl<B: Backend> ReviewEngine<B> {
    /// # Errors
    ///
    /// Returns non-transport errors from the initial load.
    pub async fn open(backend: Arc<B>, project_id: i64) -> Result<Self, CoreError> {
        let mut engine = Self {
            backend,
            project_id,
            results: Vec::new(),
            names: HashMap::new(),
            filter: ReviewFilter::default(),
        };
        engine.load().await?;
        Ok(engine)
    }

    /// Fetch every result of the project along with entity names.
    ///
    /// # Errors
    ///
    /// Returns non-transport backend errors.
    pub async fn load(&mut self) -> Result<(), CoreError> {
        let filter = ExtractionFilter {
            project_id: Some(self.project_id),
            ..ExtractionFilter::default()
        };
        self.results = read_or(
            "extraction results",
            self.backend.list_extractions(&filter).await,
            Vec::new(),
        )?;

        let mut names = HashMap::new();
        for result in &self.results {
            if names.contains_key(&result.entity_id) {
                continue;
            }
            match self.backend.get_entity(result.entity_id).await {
                Ok(entity) => {
                    names.insert(entity.id, entity.name);
                }
                Err(err) => {
                    tracing::warn!(entity_id = result.entity_id, %err, "entity name unavailable");
                }
            }
        }
        self.names = names;
        tracing::debug!(
            project_id = self.project_id,
            results = self.results.len(),
            "loaded extraction results"
        );
        Ok(())
    }

    #[must_use]
    pub const fn filter(&self) -> &ReviewFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ReviewFilter) {
        self.filter = filter;
    }

    #[must_use]
    pub fn results(&self) -> &[ExtractionResult] {
        &self.results
    }

    /// Results passing the current filter.
    #[must_use]
    pub fn visible(&self) -> Vec<&ExtractionResult> {
        self.results.iter().filter(|r| self.filter.matches(r)).collect()
    }

    #[must_use]
    pub fn groups(&self) -> Vec<ReviewGroup> {
        review_groups(&self.results, &self.filter, &self.names)
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_pending()).count()
    }

    fn replace(&mut self, updated: ExtractionResult) {
        if let Some(slot) = self.results.iter_mut().find(|r| r.id == updated.id) {
            *slot = updated;
        }
    }

    async fn decide(
        &mut self,
        id: i64,
        decision: ReviewDecision,
    ) -> Result<ExtractionResult, CoreError> {
        let updated = self.backend.review_extraction(id, &decision).await?;
        tracing::info!(extraction_id = id, status = %updated.status, "reviewed extraction");
        self.replace(updated.clone());
        Ok(updated)
    }

    /// Commit the extracted value as-is.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Conflict` if the result is no longer pending.
    pub async fn accept(&mut self, id: i64) -> Result<ExtractionResult, CoreError> {
        self.decide(id, ReviewDecision::Accept).await
    }

    /// # Errors
    ///
    /// Returns `CoreError::Conflict` if the result is no longer pending.
    pub async fn reject(&mut self, id: i64) -> Result<ExtractionResult, CoreError> {
        self.decide(id, ReviewDecision::Reject).await
    }

    /// Commit a corrected value instead of the extracted one.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Conflict` if the result is no longer pending, or
    /// `CoreError::Validation` if the value does not fit the attribute.
    pub async fn edit(
        &mut self,
        id: i64,
        value: serde_json::Value,
    ) -> Result<ExtractionResult, CoreError> {
        self.decide(id, ReviewDecision::Edit(value)).await
    }

    async fn bulk(&mut self, ids: Vec<i64>, decision: ReviewDecision) -> Result<BulkOutcome, CoreError> {
        if ids.is_empty() {
            return Ok(BulkOutcome::default());
        }
        let outcome = self.backend.review_bulk(&ids, &decision).await?;
        tracing::info!(
            decision = %decision.target_status(),
            updated = outcome.updated,
            failed = outcome.failures.len(),
            "bulk review"
        );
        self.load().await?;
        Ok(outcome)
    }

    fn pending_ids(&self, entity_id: Option<i64>) -> Vec<i64> {
        self.results
            .iter()
            .filter(|r| r.is_pending() && entity_id.is_none_or(|e| e == r.entity_id))
            .map(|r| r.id)
            .collect()
    }

    /// Accept every pending result of one entity.
    ///
    /// # Errors
    ///
    /// Returns the backend error if the bulk call itself fails; per-item
    /// failures are reported in the outcome.
    pub async fn accept_entity(&mut self, entity_id: i64) -> Result<BulkOutcome, CoreError> {
        let ids = self.pending_ids(Some(entity_id));
        self.bulk(ids, ReviewDecision::Accept).await
    }

    /// # Errors
    ///
    /// Same as [`ReviewEngine::accept_entity`].
    pub async fn reject_entity(&mut self, entity_id: i64) -> Result<BulkOutcome, CoreError> {
        let ids = self.pending_ids(Some(entity_id));
        self.bulk(ids, ReviewDecision::Reject).await
    }

    /// Accept every loaded pending result.
    ///
    /// # Errors
    ///
    /// Same as [`ReviewEngine::accept_entity`].
    pub async fn accept_all(&mut self) -> Result<BulkOutcome, CoreError> {
        let ids = self.pending_ids(None);
        self.bulk(ids, ReviewDecision::Accept).await
    }

    /// # Errors
    ///
    /// Same as [`ReviewEngine::accept_entity`].
    pub async fn reject_all(&mut self) -> Result<BulkOutcome, CoreError> {
        let ids = self.pending_ids(None);
        self.bulk(ids, ReviewDecision::Reject).await
    }

    /// Flip the needs-evidence flag. Status is untouched.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` for a result that is not loaded or no
    /// longer exists.
    pub async fn toggle_needs_evidence(&mut self, id: i64) -> Result<ExtractionResult, CoreError> {
        let current = self
            .results
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.needs_evidence)
            .ok_or_else(|| CoreError::not_found("extraction result", id))?;
        let updated = self.backend.set_needs_evidence(id, !current).await?;
        self.replace(updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestBackend;
    use pretty_assertions::assert_eq;
    use prism_core::enums::{ConfidenceBucket, ExtractionStatus, ValueSource};
    use serde_json::json;

    struct Fixture {
        backend: Arc<TestBackend>,
        project: i64,
        e17: i64,
        r1: i64,
        r2: i64,
    }

    async fn fixture() -> Fixture {
        let backend = TestBackend::new().await;
        let project = backend.project("research").await;
        let e17 = backend.entity(project, "company", None, "Acme", &[]).await.id;
        let r1 = backend.propose(e17, "hq_city", json!("Austin"), 0.92).await.id;
        let r2 = backend.propose(e17, "founded_year", json!("2019"), 0.41).await.id;
        Fixture {
            backend: Arc::new(backend),
            project,
            e17,
            r1,
            r2,
        }
    }

    #[tokio::test]
    async fn high_filter_shows_only_confident_result() {
        let f = fixture().await;
        let mut engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        assert_eq!(engine.visible().len(), 2);

        engine.set_filter(ReviewFilter {
            bucket: Some(ConfidenceBucket::High),
            ..ReviewFilter::default()
        });
        let visible: Vec<i64> = engine.visible().iter().map(|r| r.id).collect();
        assert_eq!(visible, vec![f.r1]);

        let groups = engine.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].entity_name, "Acme");
    }

    #[tokio::test]
    async fn accept_all_for_entity_commits_everything() {
        let f = fixture().await;
        let mut engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        let outcome = engine.accept_entity(f.e17).await.unwrap();
        assert_eq!(outcome.updated, 2);
        assert!(outcome.is_clean());
        assert_eq!(engine.pending_count(), 0);
        assert!(engine.groups().is_empty());

        let entity = f.backend.svc.get_entity(f.e17).await.unwrap();
        assert_eq!(entity.attributes["hq_city"].value, json!("Austin"));
        assert_eq!(entity.attributes["founded_year"].source, ValueSource::Extracted);
    }

    #[tokio::test]
    async fn edit_commits_corrected_value() {
        let f = fixture().await;
        let mut engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        let edited = engine.edit(f.r2, json!(2018)).await.unwrap();
        assert_eq!(edited.status, ExtractionStatus::Edited);

        let entity = f.backend.svc.get_entity(f.e17).await.unwrap();
        assert_eq!(entity.attributes["founded_year"].value, json!(2018));
        assert_eq!(entity.attributes["founded_year"].source, ValueSource::Edited);
        assert_eq!(entity.attributes["founded_year"].confidence, Some(0.41));
    }

    #[tokio::test]
    async fn reviewed_result_cannot_be_reviewed_again() {
        let f = fixture().await;
        let mut engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        engine.reject(f.r1).await.unwrap();
        let err = engine.accept(f.r1).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        let entity = f.backend.svc.get_entity(f.e17).await.unwrap();
        assert!(!entity.attributes.contains_key("hq_city"));
    }

    #[tokio::test]
    async fn accept_all_skips_already_reviewed() {
        let f = fixture().await;
        let mut engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        engine.reject(f.r2).await.unwrap();
        let outcome = engine.accept_all().await.unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(engine.pending_count(), 0);
    }

    #[tokio::test]
    async fn stale_bulk_reports_per_item_failures() {
        let f = fixture().await;
        let mut engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        // Reviewed behind the engine's back.
        f.backend
            .svc
            .review_extraction(f.r1, &ReviewDecision::Reject)
            .await
            .unwrap();
        let outcome = engine.reject_all().await.unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].id, f.r1);
    }

    #[tokio::test]
    async fn needs_evidence_toggles_without_status_change() {
        let f = fixture().await;
        let mut engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        let flagged = engine.toggle_needs_evidence(f.r1).await.unwrap();
        assert!(flagged.needs_evidence);
        assert_eq!(flagged.status, ExtractionStatus::Pending);

        engine.set_filter(ReviewFilter {
            needs_evidence: Some(true),
            ..ReviewFilter::default()
        });
        assert_eq!(engine.visible().len(), 1);

        let cleared = engine.toggle_needs_evidence(f.r1).await.unwrap();
        assert!(!cleared.needs_evidence);
    }

    #[tokio::test]
    async fn write_failure_surfaces() {
        let f = fixture().await;
        let mut engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        f.backend.fail_writes(true);
        assert!(engine.accept(f.r1).await.unwrap_err().is_transport());
        assert_eq!(engine.pending_count(), 2);
    }

    #[tokio::test]
    async fn read_failure_loads_nothing() {
        let f = fixture().await;
        f.backend.fail_reads(true);
        let engine = ReviewEngine::open(Arc::clone(&f.backend), f.project).await.unwrap();
        assert!(engine.results().is_empty());
    }
}
