//! Test backends: a real in-memory `PrismService` with switchable transport
//! failures, and a job-status-only script for polling.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use prism_core::entities::{
    AttributeDef, AttributeValue, CrossProjectInsight, CrossProjectLink, Entity, EntityTypeDef,
    ExtractionResult, Job, LinkStats, ManualLink, NewEntity, NewExtractionResult, ReviewDecision,
};
use prism_core::enums::{DataType, JobKind, JobStatus};
use prism_core::errors::CoreError;
use prism_core::responses::{BulkOutcome, SyncResponse};
use prism_db::repos::entity::EntityQuery;
use prism_db::repos::extraction::ExtractionFilter;
use prism_db::repos::insight::InsightFilter;
use prism_db::repos::link::LinkFilter;
use prism_db::service::PrismService;
use prism_schema::{EntityDiff, SchemaRegistry};

use crate::backend::Backend;

pub fn job(id: i64, kind: JobKind, status: JobStatus, result_count: u32) -> Job {
    Job {
        id,
        kind,
        status,
        result_count,
        error: (status == JobStatus::Failed).then(|| "boom".to_string()),
        created_at: Utc::now(),
        finished_at: status.is_finished().then(Utc::now),
    }
}

/// Company → {product, office} schema. `company` has two child types, so
/// drilling into a company needs an explicit child type.
pub fn market_schema() -> Vec<EntityTypeDef> {
    vec![
        EntityTypeDef::new("company", "Company")
            .attribute(AttributeDef::new("website", "Website", DataType::Url))
            .attribute(AttributeDef::new("hq_city", "HQ City", DataType::Text))
            .attribute(AttributeDef::new("founded_year", "Founded", DataType::Number))
            .attribute(AttributeDef::new("revenue", "Revenue", DataType::Currency))
            .attribute(AttributeDef::new("public", "Public", DataType::Boolean))
            .attribute(AttributeDef::new("tags", "Tags", DataType::Tags)),
        EntityTypeDef::new("product", "Product")
            .child_of("company")
            .attribute(AttributeDef::new("price", "Price", DataType::Currency)),
        EntityTypeDef::new("office", "Office")
            .child_of("company")
            .attribute(AttributeDef::new("city", "City", DataType::Text)),
        EntityTypeDef::new("feature", "Feature").child_of("product"),
    ]
}

pub struct TestBackend {
    pub svc: PrismService,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    calls: AtomicU32,
}

impl TestBackend {
    pub async fn new() -> Self {
        Self {
            svc: PrismService::new_local(":memory:").await.unwrap(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            calls: AtomicU32::new(0),
        }
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    /// Backend calls made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<(), CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(CoreError::Transport("connection reset".into()))
        } else {
            Ok(())
        }
    }

    fn write(&self) -> Result<(), CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(CoreError::Transport("connection reset".into()))
        } else {
            Ok(())
        }
    }

    /// Project with `market_schema` defined.
    pub async fn project(&self, name: &str) -> i64 {
        let project = self.svc.create_project(name, None).await.unwrap();
        for def in market_schema() {
            self.svc.define_entity_type(project.id, &def).await.unwrap();
        }
        project.id
    }

    pub async fn entity(
        &self,
        project_id: i64,
        type_slug: &str,
        parent: Option<i64>,
        name: &str,
        attrs: &[(&str, serde_json::Value)],
    ) -> Entity {
        let mut new = NewEntity::new(project_id, type_slug, name);
        if let Some(parent_id) = parent {
            new = new.under(parent_id);
        }
        for (slug, value) in attrs {
            new = new.attribute(*slug, AttributeValue::manual(value.clone()));
        }
        self.svc.create_entity(&new).await.unwrap()
    }

    pub async fn propose(
        &self,
        entity_id: i64,
        slug: &str,
        value: serde_json::Value,
        confidence: f64,
    ) -> ExtractionResult {
        self.svc
            .submit_extraction(&NewExtractionResult {
                entity_id,
                attr_slug: slug.into(),
                extracted_value: value,
                confidence,
                reasoning: None,
                evidence_id: None,
            })
            .await
            .unwrap()
    }
}

/// Answers `job_status` from a script; every other call fails. Once the
/// script runs out the job reports `running`.
pub struct ScriptedJobs {
    statuses: Mutex<VecDeque<JobStatus>>,
    checks: AtomicU32,
}

impl ScriptedJobs {
    pub fn new(statuses: Vec<JobStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            checks: AtomicU32::new(0),
        }
    }

    pub fn checks(&self) -> u32 {
        self.checks.load(Ordering::SeqCst)
    }
}

fn unused<T>() -> Result<T, CoreError> {
    Err(CoreError::Transport("not scripted".into()))
}

#[async_trait]
impl Backend for ScriptedJobs {
    async fn load_schema(&self, _: i64) -> Result<SchemaRegistry, CoreError> {
        unused()
    }
    async fn get_entity(&self, _: i64) -> Result<Entity, CoreError> {
        unused()
    }
    async fn list_entities(&self, _: &EntityQuery) -> Result<Vec<Entity>, CoreError> {
        unused()
    }
    async fn count_by_type(&self, _: i64) -> Result<BTreeMap<String, u32>, CoreError> {
        unused()
    }
    async fn set_starred(&self, _: &[i64], _: bool) -> Result<BulkOutcome, CoreError> {
        unused()
    }
    async fn delete_entities(&self, _: &[i64]) -> Result<BulkOutcome, CoreError> {
        unused()
    }
    async fn list_extractions(&self, _: &ExtractionFilter) -> Result<Vec<ExtractionResult>, CoreError> {
        unused()
    }
    async fn review_extraction(&self, _: i64, _: &ReviewDecision) -> Result<ExtractionResult, CoreError> {
        unused()
    }
    async fn review_bulk(&self, _: &[i64], _: &ReviewDecision) -> Result<BulkOutcome, CoreError> {
        unused()
    }
    async fn set_needs_evidence(&self, _: i64, _: bool) -> Result<ExtractionResult, CoreError> {
        unused()
    }
    async fn list_links(&self, _: &LinkFilter) -> Result<Vec<CrossProjectLink>, CoreError> {
        unused()
    }
    async fn link_stats(&self, _: &LinkFilter) -> Result<LinkStats, CoreError> {
        unused()
    }
    async fn create_link(&self, _: &ManualLink) -> Result<CrossProjectLink, CoreError> {
        unused()
    }
    async fn delete_link(&self, _: i64) -> Result<(), CoreError> {
        unused()
    }
    async fn diff_entities(&self, _: i64, _: i64) -> Result<EntityDiff, CoreError> {
        unused()
    }
    async fn sync_attributes(&self, _: i64, _: i64, _: &[String]) -> Result<SyncResponse, CoreError> {
        unused()
    }
    async fn list_insights(&self, _: &InsightFilter) -> Result<Vec<CrossProjectInsight>, CoreError> {
        unused()
    }
    async fn dismiss_insight(&self, _: i64) -> Result<CrossProjectInsight, CoreError> {
        unused()
    }
    async fn delete_insight(&self, _: i64) -> Result<(), CoreError> {
        unused()
    }
    async fn start_overlap_scan(&self) -> Result<Job, CoreError> {
        unused()
    }
    async fn start_analysis(&self) -> Result<Job, CoreError> {
        unused()
    }
    async fn job_status(&self, id: i64) -> Result<Job, CoreError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(JobStatus::Running);
        Ok(job(id, JobKind::OverlapScan, status, 1))
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn load_schema(&self, project_id: i64) -> Result<SchemaRegistry, CoreError> {
        self.read()?;
        Ok(self.svc.load_schema(project_id).await?)
    }

    async fn get_entity(&self, id: i64) -> Result<Entity, CoreError> {
        self.read()?;
        Ok(self.svc.get_entity(id).await?)
    }

    async fn list_entities(&self, query: &EntityQuery) -> Result<Vec<Entity>, CoreError> {
        self.read()?;
        Ok(self.svc.list_entities(query).await?)
    }

    async fn count_by_type(&self, project_id: i64) -> Result<BTreeMap<String, u32>, CoreError> {
        self.read()?;
        Ok(self.svc.count_by_type(project_id).await?)
    }

    async fn set_starred(&self, ids: &[i64], starred: bool) -> Result<BulkOutcome, CoreError> {
        self.write()?;
        Ok(self.svc.set_starred(ids, starred).await?)
    }

    async fn delete_entities(&self, ids: &[i64]) -> Result<BulkOutcome, CoreError> {
        self.write()?;
        Ok(self.svc.delete_entities(ids).await?)
    }

    async fn list_extractions(
        &self,
        filter: &ExtractionFilter,
    ) -> Result<Vec<ExtractionResult>, CoreError> {
        self.read()?;
        Ok(self.svc.list_extractions(filter).await?)
    }

    async fn review_extraction(
        &self,
        id: i64,
        decision: &ReviewDecision,
    ) -> Result<ExtractionResult, CoreError> {
        self.write()?;
        Ok(self.svc.review_extraction(id, decision).await?)
    }

    async fn review_bulk(
        &self,
        ids: &[i64],
        decision: &ReviewDecision,
    ) -> Result<BulkOutcome, CoreError> {
        self.write()?;
        Ok(self.svc.review_bulk(ids, decision).await?)
    }

    async fn set_needs_evidence(
        &self,
        id: i64,
        needs_evidence: bool,
    ) -> Result<ExtractionResult, CoreError> {
        self.write()?;
        Ok(self.svc.set_needs_evidence(id, needs_evidence).await?)
    }

    async fn list_links(&self, filter: &LinkFilter) -> Result<Vec<CrossProjectLink>, CoreError> {
        self.read()?;
        Ok(self.svc.list_links(filter).await?)
    }

    async fn link_stats(&self, filter: &LinkFilter) -> Result<LinkStats, CoreError> {
        self.read()?;
        Ok(self.svc.link_stats(filter).await?)
    }

    async fn create_link(&self, link: &ManualLink) -> Result<CrossProjectLink, CoreError> {
        self.write()?;
        Ok(self.svc.create_link(link).await?)
    }

    async fn delete_link(&self, id: i64) -> Result<(), CoreError> {
        self.write()?;
        Ok(self.svc.delete_link(id).await?)
    }

    async fn diff_entities(&self, a: i64, b: i64) -> Result<EntityDiff, CoreError> {
        self.read()?;
        Ok(self.svc.diff_entities(a, b).await?)
    }

    async fn sync_attributes(
        &self,
        from: i64,
        to: i64,
        slugs: &[String],
    ) -> Result<SyncResponse, CoreError> {
        self.write()?;
        Ok(self.svc.sync_attributes(from, to, slugs).await?)
    }

    async fn list_insights(
        &self,
        filter: &InsightFilter,
    ) -> Result<Vec<CrossProjectInsight>, CoreError> {
        self.read()?;
        Ok(self.svc.list_insights(filter).await?)
    }

    async fn dismiss_insight(&self, id: i64) -> Result<CrossProjectInsight, CoreError> {
        self.write()?;
        Ok(self.svc.dismiss_insight(id).await?)
    }

    async fn delete_insight(&self, id: i64) -> Result<(), CoreError> {
        self.write()?;
        Ok(self.svc.delete_insight(id).await?)
    }

    async fn start_overlap_scan(&self) -> Result<Job, CoreError> {
        self.write()?;
        Ok(self.svc.start_overlap_scan().await?)
    }

    async fn start_analysis(&self) -> Result<Job, CoreError> {
        self.write()?;
        Ok(self.svc.start_analysis().await?)
    }

    async fn job_status(&self, id: i64) -> Result<Job, CoreError> {
        self.read()?;
        Ok(self.svc.job_status(id).await?)
    }
}
