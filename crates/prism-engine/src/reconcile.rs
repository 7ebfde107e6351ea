//! Cross-project reconciliation: overlap scans, links, the diff panel with
//! attribute sync, and insights from analysis runs.

use std::collections::BTreeSet;
use std::sync::Arc;

use prism_core::entities::{CrossProjectInsight, CrossProjectLink, LinkStats, ManualLink};
use prism_core::errors::CoreError;
use prism_core::responses::SyncResponse;
use prism_db::repos::insight::InsightFilter;
use prism_db::repos::link::LinkFilter;
use prism_schema::EntityDiff;

use crate::backend::{Backend, read_or};
use crate::polling::{PollConfig, wait_for_job};
use crate::views::{DiffRow, InsightCard, LinkRow, diff_rows, insight_cards, link_rows};

/// An open side-by-side comparison of two entities.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffPanel {
    /// Values are copied from this entity...
    pub source_id: i64,
    /// ...onto this one.
    pub target_id: i64,
    pub diff: EntityDiff,
    /// Slugs checked for the next sync.
    pub selection: BTreeSet<String>,
}

impl DiffPanel {
    fn new(diff: EntityDiff) -> Self {
        Self {
            source_id: diff.entity_a,
            target_id: diff.entity_b,
            selection: diff.default_selection(),
            diff,
        }
    }

    #[must_use]
    pub fn rows(&self) -> Vec<DiffRow> {
        diff_rows(&self.diff)
    }

    const fn is_pair(&self, source: i64, target: i64) -> bool {
        self.source_id == source && self.target_id == target
    }
}

pub struct ReconciliationEngine<B: Backend> {
    backend: Arc<B>,
    poll: PollConfig,
    link_filter: LinkFilter,
    links: Vec<CrossProjectLink>,
    stats: LinkStats,
    insights: Vec<CrossProjectInsight>,
    include_dismissed: bool,
    panel: Option<DiffPanel>,
}

impl<B: Backend> ReconciliationEngine<B> {
    /// # Errors
    ///
    /// Returns non-transport errors from the initial load.
    pub async fn open(backend: Arc<B>, poll: PollConfig) -> Result<Self, CoreError> {
        let mut engine = Self {
            backend,
            poll,
            link_filter: LinkFilter::default(),
            links: Vec::new(),
            stats: LinkStats::default(),
            insights: Vec::new(),
            include_dismissed: false,
            panel: None,
        };
        engine.load().await?;
        Ok(engine)
    }

    /// Reload links, link stats and insights.
    ///
    /// # Errors
    ///
    /// Returns non-transport backend errors.
    pub async fn load(&mut self) -> Result<(), CoreError> {
        self.load_links().await?;
        self.load_insights().await
    }

    async fn load_links(&mut self) -> Result<(), CoreError> {
        self.links = read_or("links", self.backend.list_links(&self.link_filter).await, Vec::new())?;
        self.stats = read_or(
            "link stats",
            self.backend.link_stats(&self.link_filter).await,
            LinkStats::default(),
        )?;
        Ok(())
    }

    async fn load_insights(&mut self) -> Result<(), CoreError> {
        let filter = InsightFilter {
            include_dismissed: self.include_dismissed,
            ..InsightFilter::default()
        };
        self.insights = read_or("insights", self.backend.list_insights(&filter).await, Vec::new())?;
        Ok(())
    }

    #[must_use]
    pub fn links(&self) -> &[CrossProjectLink] {
        &self.links
    }

    #[must_use]
    pub const fn stats(&self) -> &LinkStats {
        &self.stats
    }

    #[must_use]
    pub fn insights(&self) -> &[CrossProjectInsight] {
        &self.insights
    }

    #[must_use]
    pub const fn panel(&self) -> Option<&DiffPanel> {
        self.panel.as_ref()
    }

    #[must_use]
    pub fn link_rows(&self) -> Vec<LinkRow> {
        link_rows(&self.links)
    }

    #[must_use]
    pub fn insight_cards(&self) -> Vec<InsightCard> {
        insight_cards(&self.insights, self.include_dismissed)
    }

    /// # Errors
    ///
    /// Returns non-transport errors from the reload.
    pub async fn set_link_filter(&mut self, filter: LinkFilter) -> Result<(), CoreError> {
        self.link_filter = filter;
        self.load_links().await
    }

    // ── Jobs ──

    /// Run an overlap scan to completion and reload links.
    ///
    /// Returns the number of links the scan created.
    ///
    /// # Errors
    ///
    /// Returns the error that prevented the scan from starting,
    /// `CoreError::Timeout` if it did not finish in time, or
    /// `CoreError::Transport` if it failed.
    pub async fn scan_for_overlaps(&mut self) -> Result<u32, CoreError> {
        let job = self.backend.start_overlap_scan().await?;
        let job = wait_for_job(self.backend.as_ref(), job, &self.poll).await?;
        tracing::info!(job_id = job.id, created = job.result_count, "overlap scan finished");
        self.load_links().await?;
        Ok(job.result_count)
    }

    /// Regenerate insights and reload them. Returns how many were produced.
    ///
    /// # Errors
    ///
    /// Same as [`ReconciliationEngine::scan_for_overlaps`].
    pub async fn run_analysis(&mut self) -> Result<u32, CoreError> {
        let job = self.backend.start_analysis().await?;
        let job = wait_for_job(self.backend.as_ref(), job, &self.poll).await?;
        tracing::info!(job_id = job.id, insights = job.result_count, "analysis finished");
        self.load_insights().await?;
        Ok(job.result_count)
    }

    // ── Diff & sync ──

    /// Compare two entities. Sync copies from `source` onto `target`.
    ///
    /// # Errors
    ///
    /// Returns any backend error; the previous panel stays open on failure.
    pub async fn open_diff(&mut self, source: i64, target: i64) -> Result<&DiffPanel, CoreError> {
        let diff = self.backend.diff_entities(source, target).await?;
        Ok(self.panel.insert(DiffPanel::new(diff)))
    }

    pub fn close_diff(&mut self) {
        self.panel = None;
    }

    /// Check or uncheck a slug for syncing. Returns whether it is checked
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` with no open panel or for a slug the
    /// source does not carry.
    pub fn toggle_sync_slug(&mut self, slug: &str) -> Result<bool, CoreError> {
        let panel = self
            .panel
            .as_mut()
            .ok_or_else(|| CoreError::Validation("no diff is open".into()))?;
        let carried = panel
            .diff
            .attributes
            .iter()
            .any(|d| d.slug == slug && d.value_a.is_some());
        if !carried {
            return Err(CoreError::Validation(format!(
                "entity {} has no value for '{slug}'",
                panel.source_id
            )));
        }
        if panel.selection.remove(slug) {
            Ok(false)
        } else {
            panel.selection.insert(slug.to_string());
            Ok(true)
        }
    }

    /// Sync the slugs checked in the open panel.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` with no open panel and
    /// `CoreError::Conflict` when nothing is checked, both before any
    /// request.
    pub async fn sync_selected(&mut self) -> Result<SyncResponse, CoreError> {
        let panel = self
            .panel
            .as_ref()
            .ok_or_else(|| CoreError::Validation("no diff is open".into()))?;
        let (source, target) = (panel.source_id, panel.target_id);
        let slugs: Vec<String> = panel.selection.iter().cloned().collect();
        self.sync(source, target, &slugs).await
    }

    /// Copy `slugs` from `source` onto `target`. The diff panel is refreshed
    /// only if it still shows this pair.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Conflict` for an empty slug list before any
    /// request, otherwise the backend error.
    pub async fn sync(
        &mut self,
        source: i64,
        target: i64,
        slugs: &[String],
    ) -> Result<SyncResponse, CoreError> {
        if slugs.is_empty() {
            return Err(CoreError::Conflict("no attributes selected to sync".into()));
        }
        let response = self.backend.sync_attributes(source, target, slugs).await?;
        tracing::info!(source, target, synced = response.synced.len(), "synced attributes");

        if self.panel.as_ref().is_some_and(|p| p.is_pair(source, target)) {
            match self.backend.diff_entities(source, target).await {
                Ok(diff) => self.panel = Some(DiffPanel::new(diff)),
                Err(err) => tracing::warn!(%err, "diff refresh after sync failed"),
            }
        }
        Ok(response)
    }

    // ── Links ──

    /// # Errors
    ///
    /// Returns `CoreError::Validation` for bad ids or confidence before any
    /// request, `CoreError::Conflict` for a duplicate link.
    pub async fn create_manual_link(
        &mut self,
        link: &ManualLink,
    ) -> Result<CrossProjectLink, CoreError> {
        link.validate()?;
        let created = self.backend.create_link(link).await?;
        self.load_links().await?;
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` for an unknown link.
    pub async fn delete_link(&mut self, id: i64) -> Result<(), CoreError> {
        self.backend.delete_link(id).await?;
        self.load_links().await
    }

    // ── Insights ──

    /// # Errors
    ///
    /// Returns non-transport errors from the reload.
    pub async fn set_include_dismissed(&mut self, include: bool) -> Result<(), CoreError> {
        self.include_dismissed = include;
        self.load_insights().await
    }

    /// Hide an insight until the next analysis run.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::NotFound` for an unknown insight.
    pub async fn dismiss_insight(&mut self, id: i64) -> Result<(), CoreError> {
        let dismissed = self.backend.dismiss_insight(id).await?;
        if self.include_dismissed {
            if let Some(slot) = self.insights.iter_mut().find(|i| i.id == id) {
                *slot = dismissed;
            }
        } else {
            self.insights.retain(|i| i.id != id);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` for an unknown insight.
    pub async fn delete_insight(&mut self, id: i64) -> Result<(), CoreError> {
        self.backend.delete_insight(id).await?;
        self.insights.retain(|i| i.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestBackend;
    use pretty_assertions::assert_eq;
    use prism_core::enums::{DiffClass, LinkType, ValueSource};
    use serde_json::json;

    struct Fixture {
        backend: Arc<TestBackend>,
        acme: i64,
        twin: i64,
    }

    async fn fixture() -> Fixture {
        let backend = TestBackend::new().await;
        let research = backend.project("research").await;
        let diligence = backend.project("diligence").await;
        let acme = backend
            .entity(
                research,
                "company",
                None,
                "Acme Inc",
                &[("hq_city", json!("Austin")), ("founded_year", json!(2019))],
            )
            .await
            .id;
        let twin = backend
            .entity(
                diligence,
                "company",
                None,
                "ACME",
                &[
                    ("hq_city", json!("Dallas")),
                    ("website", json!("https://acme.example")),
                ],
            )
            .await
            .id;
        backend.entity(diligence, "company", None, "Initech", &[]).await;
        Fixture {
            backend: Arc::new(backend),
            acme,
            twin,
        }
    }

    async fn engine(f: &Fixture) -> ReconciliationEngine<TestBackend> {
        ReconciliationEngine::open(Arc::clone(&f.backend), PollConfig::immediate(3))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn scan_links_matching_names_once() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        assert_eq!(engine.scan_for_overlaps().await.unwrap(), 1);
        assert_eq!(engine.links().len(), 1);
        assert_eq!(engine.links()[0].link_type, LinkType::SameEntity);
        assert_eq!(engine.stats().total, 1);

        assert_eq!(engine.scan_for_overlaps().await.unwrap(), 0);
        assert_eq!(engine.links().len(), 1);
    }

    #[tokio::test]
    async fn diff_panel_preselects_eligible_slugs() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        let panel = engine.open_diff(f.acme, f.twin).await.unwrap();
        assert_eq!(panel.diff.class_of("hq_city"), Some(DiffClass::Different));
        assert_eq!(panel.diff.class_of("website"), Some(DiffClass::OnlyB));
        let selected: Vec<&str> = panel.selection.iter().map(String::as_str).collect();
        assert_eq!(selected, vec!["founded_year", "hq_city"]);
        assert!(panel.rows().iter().any(|r| r.slug == "website" && !r.eligible));
    }

    #[tokio::test]
    async fn sync_selected_copies_and_refreshes_panel() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        engine.open_diff(f.acme, f.twin).await.unwrap();
        assert!(!engine.toggle_sync_slug("founded_year").unwrap());

        let response = engine.sync_selected().await.unwrap();
        assert_eq!(response.synced, vec!["hq_city".to_string()]);

        let twin = f.backend.svc.get_entity(f.twin).await.unwrap();
        assert_eq!(twin.attributes["hq_city"].value, json!("Austin"));
        assert_eq!(twin.attributes["hq_city"].source, ValueSource::Synced);
        assert!(!twin.attributes.contains_key("founded_year"));
        assert_eq!(twin.attributes["website"].source, ValueSource::Manual);

        let panel = engine.panel().unwrap();
        assert_eq!(panel.diff.class_of("hq_city"), Some(DiffClass::Same));
        assert_eq!(panel.selection.len(), 1);
    }

    #[tokio::test]
    async fn empty_sync_is_a_conflict_before_any_call() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        engine.open_diff(f.acme, f.twin).await.unwrap();
        engine.toggle_sync_slug("hq_city").unwrap();
        engine.toggle_sync_slug("founded_year").unwrap();

        let before = f.backend.calls();
        assert!(matches!(
            engine.sync_selected().await,
            Err(CoreError::Conflict(_))
        ));
        assert_eq!(f.backend.calls(), before);
    }

    #[tokio::test]
    async fn only_source_values_can_be_checked() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        assert!(engine.toggle_sync_slug("hq_city").is_err());
        engine.open_diff(f.acme, f.twin).await.unwrap();
        assert!(matches!(
            engine.toggle_sync_slug("website"),
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn sync_for_other_pair_leaves_panel_alone() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        engine.open_diff(f.acme, f.twin).await.unwrap();
        let before = engine.panel().cloned();

        engine
            .sync(f.twin, f.acme, &["website".to_string()])
            .await
            .unwrap();
        assert_eq!(engine.panel().cloned(), before);

        engine.close_diff();
        let late = engine
            .sync(f.acme, f.twin, &["founded_year".to_string()])
            .await
            .unwrap();
        assert_eq!(late.synced.len(), 1);
        assert!(engine.panel().is_none());
    }

    #[tokio::test]
    async fn self_link_is_rejected_before_any_call() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        let before = f.backend.calls();
        let err = engine
            .create_manual_link(&ManualLink::new(f.acme, f.acme, LinkType::Related))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(f.backend.calls(), before);
    }

    #[tokio::test]
    async fn manual_links_can_be_removed() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        let link = engine
            .create_manual_link(&ManualLink::new(f.acme, f.twin, LinkType::Related))
            .await
            .unwrap();
        assert_eq!(engine.stats().by_source["manual"], 1);
        engine.delete_link(link.id).await.unwrap();
        assert!(engine.links().is_empty());
        assert!(matches!(
            engine.delete_link(link.id).await,
            Err(CoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn analysis_insights_can_be_dismissed_and_deleted() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        engine.scan_for_overlaps().await.unwrap();
        let produced = engine.run_analysis().await.unwrap();
        assert!(produced > 0);
        assert_eq!(engine.insights().len() as u32, produced);
        assert_eq!(engine.insight_cards()[0].severity, "critical");

        let first = engine.insights()[0].id;
        engine.dismiss_insight(first).await.unwrap();
        assert_eq!(engine.insights().len() as u32, produced - 1);
        engine.set_include_dismissed(true).await.unwrap();
        assert_eq!(engine.insights().len() as u32, produced);

        engine.delete_insight(first).await.unwrap();
        engine.load().await.unwrap();
        assert_eq!(engine.insights().len() as u32, produced - 1);

        // A fresh run brings everything back.
        assert_eq!(engine.run_analysis().await.unwrap(), produced);
    }

    #[tokio::test]
    async fn read_failures_show_empty_lists() {
        let f = fixture().await;
        let mut engine = engine(&f).await;
        engine.scan_for_overlaps().await.unwrap();
        f.backend.fail_reads(true);
        engine.load().await.unwrap();
        assert!(engine.links().is_empty());
        assert_eq!(engine.stats().total, 0);
    }
}
