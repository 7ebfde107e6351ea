//! The request/response seam between the engines and storage.
//!
//! Every call resolves to `Result<_, CoreError>`. `PrismService` is the local
//! implementation; its `DatabaseError`s are mapped into the `CoreError`
//! taxonomy here.

use std::collections::BTreeMap;

use async_trait::async_trait;

use prism_core::entities::{
    CrossProjectInsight, CrossProjectLink, Entity, ExtractionResult, Job, LinkStats, ManualLink,
    ReviewDecision,
};
use prism_core::errors::CoreError;
use prism_core::responses::{BulkOutcome, SyncResponse};
use prism_db::repos::entity::EntityQuery;
use prism_db::repos::extraction::ExtractionFilter;
use prism_db::repos::insight::InsightFilter;
use prism_db::repos::link::LinkFilter;
use prism_db::service::PrismService;
use prism_schema::{EntityDiff, SchemaRegistry};

/// Backend operations consumed by the engines.
#[async_trait]
pub trait Backend: Send + Sync {
    // ── Schema & entities ──

    async fn load_schema(&self, project_id: i64) -> Result<SchemaRegistry, CoreError>;
    async fn get_entity(&self, id: i64) -> Result<Entity, CoreError>;
    async fn list_entities(&self, query: &EntityQuery) -> Result<Vec<Entity>, CoreError>;
    async fn count_by_type(&self, project_id: i64) -> Result<BTreeMap<String, u32>, CoreError>;
    async fn set_starred(&self, ids: &[i64], starred: bool) -> Result<BulkOutcome, CoreError>;
    async fn delete_entities(&self, ids: &[i64]) -> Result<BulkOutcome, CoreError>;

    // ── Extraction review ──

    async fn list_extractions(
        &self,
        filter: &ExtractionFilter,
    ) -> Result<Vec<ExtractionResult>, CoreError>;
    async fn review_extraction(
        &self,
        id: i64,
        decision: &ReviewDecision,
    ) -> Result<ExtractionResult, CoreError>;
    async fn review_bulk(
        &self,
        ids: &[i64],
        decision: &ReviewDecision,
    ) -> Result<BulkOutcome, CoreError>;
    async fn set_needs_evidence(
        &self,
        id: i64,
        needs_evidence: bool,
    ) -> Result<ExtractionResult, CoreError>;

    // ── Links, diff, sync ──

    async fn list_links(&self, filter: &LinkFilter) -> Result<Vec<CrossProjectLink>, CoreError>;
    async fn link_stats(&self, filter: &LinkFilter) -> Result<LinkStats, CoreError>;
    async fn create_link(&self, link: &ManualLink) -> Result<CrossProjectLink, CoreError>;
    async fn delete_link(&self, id: i64) -> Result<(), CoreError>;
    async fn diff_entities(&self, a: i64, b: i64) -> Result<EntityDiff, CoreError>;
    async fn sync_attributes(
        &self,
        from: i64,
        to: i64,
        slugs: &[String],
    ) -> Result<SyncResponse, CoreError>;

    // ── Insights & jobs ──

    async fn list_insights(
        &self,
        filter: &InsightFilter,
    ) -> Result<Vec<CrossProjectInsight>, CoreError>;
    async fn dismiss_insight(&self, id: i64) -> Result<CrossProjectInsight, CoreError>;
    async fn delete_insight(&self, id: i64) -> Result<(), CoreError>;
    async fn start_overlap_scan(&self) -> Result<Job, CoreError>;
    async fn start_analysis(&self) -> Result<Job, CoreError>;
    async fn job_status(&self, id: i64) -> Result<Job, CoreError>;
}

#[async_trait]
impl Backend for PrismService {
    async fn load_schema(&self, project_id: i64) -> Result<SchemaRegistry, CoreError> {
        Ok(Self::load_schema(self, project_id).await?)
    }

    async fn get_entity(&self, id: i64) -> Result<Entity, CoreError> {
        Ok(Self::get_entity(self, id).await?)
    }

    async fn list_entities(&self, query: &EntityQuery) -> Result<Vec<Entity>, CoreError> {
        Ok(Self::list_entities(self, query).await?)
    }

    async fn count_by_type(&self, project_id: i64) -> Result<BTreeMap<String, u32>, CoreError> {
        Ok(Self::count_by_type(self, project_id).await?)
    }

    async fn set_starred(&self, ids: &[i64], starred: bool) -> Result<BulkOutcome, CoreError> {
        Ok(Self::set_starred(self, ids, starred).await?)
    }

    async fn delete_entities(&self, ids: &[i64]) -> Result<BulkOutcome, CoreError> {
        Ok(Self::delete_entities(self, ids).await?)
    }

    async fn list_extractions(
        &self,
        filter: &ExtractionFilter,
    ) -> Result<Vec<ExtractionResult>, CoreError> {
        Ok(Self::list_extractions(self, filter).await?)
    }

    async fn review_extraction(
        &self,
        id: i64,
        decision: &ReviewDecision,
    ) -> Result<ExtractionResult, CoreError> {
        Ok(Self::review_extraction(self, id, decision).await?)
    }

    async fn review_bulk(
        &self,
        ids: &[i64],
        decision: &ReviewDecision,
    ) -> Result<BulkOutcome, CoreError> {
        Ok(Self::review_bulk(self, ids, decision).await?)
    }

    async fn set_needs_evidence(
        &self,
        id: i64,
        needs_evidence: bool,
    ) -> Result<ExtractionResult, CoreError> {
        Ok(Self::set_needs_evidence(self, id, needs_evidence).await?)
    }

    async fn list_links(&self, filter: &LinkFilter) -> Result<Vec<CrossProjectLink>, CoreError> {
        Ok(Self::list_links(self, filter).await?)
    }

    async fn link_stats(&self, filter: &LinkFilter) -> Result<LinkStats, CoreError> {
        Ok(Self::link_stats(self, filter).await?)
    }

    async fn create_link(&self, link: &ManualLink) -> Result<CrossProjectLink, CoreError> {
        Ok(Self::create_link(self, link).await?)
    }

    async fn delete_link(&self, id: i64) -> Result<(), CoreError> {
        Ok(Self::delete_link(self, id).await?)
    }

    async fn diff_entities(&self, a: i64, b: i64) -> Result<EntityDiff, CoreError> {
        Ok(Self::diff_entities(self, a, b).await?)
    }

    async fn sync_attributes(
        &self,
        from: i64,
        to: i64,
        slugs: &[String],
    ) -> Result<SyncResponse, CoreError> {
        Ok(Self::sync_attributes(self, from, to, slugs).await?)
    }

    async fn list_insights(
        &self,
        filter: &InsightFilter,
    ) -> Result<Vec<CrossProjectInsight>, CoreError> {
        Ok(Self::list_insights(self, filter).await?)
    }

    async fn dismiss_insight(&self, id: i64) -> Result<CrossProjectInsight, CoreError> {
        Ok(Self::dismiss_insight(self, id).await?)
    }

    async fn delete_insight(&self, id: i64) -> Result<(), CoreError> {
        Ok(Self::delete_insight(self, id).await?)
    }

    async fn start_overlap_scan(&self) -> Result<Job, CoreError> {
        Ok(Self::start_overlap_scan(self).await?)
    }

    async fn start_analysis(&self) -> Result<Job, CoreError> {
        Ok(Self::start_analysis(self).await?)
    }

    async fn job_status(&self, id: i64) -> Result<Job, CoreError> {
        Ok(Self::job_status(self, id).await?)
    }
}

/// Run a read and fall back to `default` on a transport failure.
///
/// Validation, conflict and not-found errors still surface.
///
/// # Errors
///
/// Returns any non-transport error from `result`.
pub fn read_or<T>(what: &str, result: Result<T, CoreError>, default: T) -> Result<T, CoreError> {
    match result {
        Err(err) if err.is_transport() => {
            tracing::warn!(%err, "{what} unavailable, showing empty results");
            Ok(default)
        }
        other => other,
    }
}
