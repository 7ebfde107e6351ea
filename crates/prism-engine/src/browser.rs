//! Schema-aware entity browser: type filter, drill-down breadcrumbs, search,
//! selection, and bulk star/unstar/delete.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use prism_core::entities::{AttributeDef, Entity};
use prism_core::errors::CoreError;
use prism_core::responses::BulkOutcome;
use prism_db::repos::entity::EntityQuery;
use prism_schema::SchemaRegistry;

use crate::backend::{Backend, read_or};
use crate::views::{EntityRow, entity_rows};

/// One level of the drill-down stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub id: i64,
    pub name: String,
    pub type_slug: String,
    /// Type listed beneath this entity.
    pub child_type: String,
}

pub struct EntityBrowser<B: Backend> {
    backend: Arc<B>,
    project_id: i64,
    schema: SchemaRegistry,
    root_type: Option<String>,
    stack: Vec<Crumb>,
    search: Option<String>,
    limit: Option<u32>,
    entities: Vec<Entity>,
    selection: BTreeSet<i64>,
    counts: BTreeMap<String, u32>,
    last_error: Option<String>,
}

impl<B: Backend> EntityBrowser<B> {
    /// Load the project's schema and counts, then list the first root type.
    ///
    /// # Errors
    ///
    /// Returns non-transport errors from the initial reads.
    pub async fn open(backend: Arc<B>, project_id: i64) -> Result<Self, CoreError> {
        let schema = read_or(
            "schema",
            backend.load_schema(project_id).await,
            SchemaRegistry::default(),
        )?;
        let root_type = schema.roots().next().map(|d| d.slug.clone());
        let mut browser = Self {
            backend,
            project_id,
            schema,
            root_type,
            stack: Vec::new(),
            search: None,
            limit: None,
            entities: Vec::new(),
            selection: BTreeSet::new(),
            counts: BTreeMap::new(),
            last_error: None,
        };
        browser.refresh_counts().await?;
        browser.reload().await?;
        Ok(browser)
    }

    /// Cap on listed entities; `None` lists all.
    pub const fn set_limit(&mut self, limit: Option<u32>) {
        self.limit = limit;
    }

    #[must_use]
    pub const fn project_id(&self) -> i64 {
        self.project_id
    }

    #[must_use]
    pub const fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Type currently listed.
    #[must_use]
    pub fn active_type(&self) -> Option<&str> {
        self.stack
            .last()
            .map(|c| c.child_type.as_str())
            .or(self.root_type.as_deref())
    }

    /// Parent whose children are listed, `None` at the root.
    #[must_use]
    pub fn parent_id(&self) -> Option<i64> {
        self.stack.last().map(|c| c.id)
    }

    #[must_use]
    pub fn breadcrumbs(&self) -> &[Crumb] {
        &self.stack
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub const fn counts(&self) -> &BTreeMap<String, u32> {
        &self.counts
    }

    #[must_use]
    pub const fn selection(&self) -> &BTreeSet<i64> {
        &self.selection
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Message of the last failed bulk action, cleared on the next success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// First five attributes of the active type.
    #[must_use]
    pub fn columns(&self) -> &[AttributeDef] {
        self.active_type().map_or(&[], |t| self.schema.columns(t))
    }

    #[must_use]
    pub fn rows(&self) -> Vec<EntityRow> {
        entity_rows(&self.entities, self.columns())
    }

    // ── Navigation ──

    /// Switch to the root entities of `type_slug`, dropping drill-down,
    /// search and selection.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an undeclared type.
    pub async fn set_type_filter(&mut self, type_slug: &str) -> Result<(), CoreError> {
        self.schema.require(type_slug)?;
        self.root_type = Some(type_slug.to_string());
        self.stack.clear();
        self.search = None;
        self.selection.clear();
        self.reload().await
    }

    /// List the children of an entity. With several child types declared,
    /// `child_type` picks one.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` when the type has no child type, or
    /// several and none (or a wrong one) was given.
    pub async fn drill_down(
        &mut self,
        entity_id: i64,
        entity_name: &str,
        type_slug: &str,
        child_type: Option<&str>,
    ) -> Result<(), CoreError> {
        let child = self.schema.child_type(type_slug, child_type)?.to_string();
        tracing::debug!(entity_id, %type_slug, %child, "drill down");
        self.stack.push(Crumb {
            id: entity_id,
            name: entity_name.to_string(),
            type_slug: type_slug.to_string(),
            child_type: child,
        });
        self.selection.clear();
        self.reload().await
    }

    /// Jump to a breadcrumb. `None` returns to the root list; `Some(i)` keeps
    /// crumbs `0..=i`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an index past the last crumb.
    pub async fn breadcrumb_nav(&mut self, index: Option<usize>) -> Result<(), CoreError> {
        match index {
            None => self.stack.clear(),
            Some(i) if i < self.stack.len() => self.stack.truncate(i + 1),
            Some(i) => {
                return Err(CoreError::Validation(format!(
                    "breadcrumb {i} out of range (depth {})",
                    self.stack.len()
                )));
            }
        }
        self.selection.clear();
        self.reload().await
    }

    /// Filter by name or attribute value. A blank term clears the search.
    ///
    /// # Errors
    ///
    /// Returns non-transport errors from the reload.
    pub async fn set_search(&mut self, term: &str) -> Result<(), CoreError> {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self.reload().await
    }

    /// Re-run the current listing. A transport failure shows an empty list.
    ///
    /// # Errors
    ///
    /// Returns non-transport backend errors.
    pub async fn reload(&mut self) -> Result<(), CoreError> {
        let Some(type_slug) = self.active_type().map(str::to_string) else {
            self.entities.clear();
            return Ok(());
        };
        let query = EntityQuery {
            project_id: self.project_id,
            type_slug,
            parent_id: self.parent_id(),
            search: self.search.clone(),
            limit: self.limit,
        };
        self.entities = read_or("entities", self.backend.list_entities(&query).await, Vec::new())?;
        let listed: BTreeSet<i64> = self.entities.iter().map(|e| e.id).collect();
        self.selection.retain(|id| listed.contains(id));
        Ok(())
    }

    async fn refresh_counts(&mut self) -> Result<(), CoreError> {
        self.counts = read_or(
            "entity counts",
            self.backend.count_by_type(self.project_id).await,
            BTreeMap::new(),
        )?;
        Ok(())
    }

    // ── Selection ──

    /// Returns whether `id` is selected afterwards.
    pub fn toggle_selected(&mut self, id: i64) -> bool {
        if self.selection.remove(&id) {
            false
        } else {
            self.selection.insert(id);
            true
        }
    }

    pub fn select_all(&mut self) {
        self.selection = self.entities.iter().map(|e| e.id).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ── Bulk actions ──

    fn selected_ids(&self) -> Result<Vec<i64>, CoreError> {
        if self.selection.is_empty() {
            return Err(CoreError::Validation("no entities selected".into()));
        }
        Ok(self.selection.iter().copied().collect())
    }

    async fn finish_bulk(
        &mut self,
        action: &str,
        result: Result<BulkOutcome, CoreError>,
    ) -> Result<BulkOutcome, CoreError> {
        match result {
            Ok(outcome) => {
                tracing::info!(action, updated = outcome.updated, "bulk entity action");
                self.selection.clear();
                self.last_error = None;
                self.refresh_counts().await?;
                self.reload().await?;
                Ok(outcome)
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an empty selection, otherwise the
    /// backend error. The selection is kept on failure.
    pub async fn star_selected(&mut self) -> Result<BulkOutcome, CoreError> {
        let ids = self.selected_ids()?;
        let result = self.backend.set_starred(&ids, true).await;
        self.finish_bulk("star", result).await
    }

    /// # Errors
    ///
    /// Same as [`EntityBrowser::star_selected`].
    pub async fn unstar_selected(&mut self) -> Result<BulkOutcome, CoreError> {
        let ids = self.selected_ids()?;
        let result = self.backend.set_starred(&ids, false).await;
        self.finish_bulk("unstar", result).await
    }

    /// Delete the selected entities and their descendants.
    ///
    /// # Errors
    ///
    /// Same as [`EntityBrowser::star_selected`].
    pub async fn delete_selected(&mut self) -> Result<BulkOutcome, CoreError> {
        let ids = self.selected_ids()?;
        let result = self.backend.delete_entities(&ids).await;
        self.finish_bulk("delete", result).await
    }
}
