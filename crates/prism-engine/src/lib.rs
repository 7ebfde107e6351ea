//! # prism-engine
//!
//! Stateful engines driving the research workbench on top of a [`Backend`]:
//!
//! - [`browser::EntityBrowser`]: schema-aware listing with drill-down,
//!   search, selection, and bulk star/unstar/delete
//! - [`review::ReviewEngine`]: pending extraction results grouped by entity
//!   with confidence filters and accept/reject/edit
//! - [`reconcile::ReconciliationEngine`]: overlap scans, diff panel, attribute
//!   sync, manual links, and insights
//!
//! Every engine action takes `&mut self`, so one engine never has two backend
//! requests in flight. Scans and analysis runs are polled with
//! [`polling::PollConfig`]. [`views`] maps engine state to display rows.

pub mod backend;
pub mod browser;
pub mod polling;
pub mod reconcile;
pub mod review;
pub mod views;

pub use backend::Backend;
pub use browser::EntityBrowser;
pub use polling::PollConfig;
pub use reconcile::ReconciliationEngine;
pub use review::ReviewEngine;

#[cfg(test)]
pub(crate) mod test_support;
