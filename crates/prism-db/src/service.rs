//! Service layer orchestrating database mutations with audit.
//!
//! `PrismService` wraps `PrismDb` (raw database access) and the pluggable
//! `InsightGenerator` used by analysis runs. All repo methods are implemented
//! as `impl PrismService` blocks under `repos/`.

use crate::PrismDb;
use crate::analysis::{HeuristicInsights, InsightGenerator};
use crate::error::DatabaseError;

/// Orchestrates database mutations with an audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Validate input against the project schema
/// 2. Begin transaction (multi-statement writes)
/// 3. Execute SQL
/// 4. Append audit entry (inside transaction)
/// 5. Commit transaction
pub struct PrismService {
    db: PrismDb,
    generator: Box<dyn InsightGenerator>,
}

impl PrismService {
    /// Create a new service wrapping a local database.
    ///
    /// `db_path` is a libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = PrismDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Create from an existing `PrismDb` with the default insight heuristics.
    #[must_use]
    pub fn from_db(db: PrismDb) -> Self {
        Self {
            db,
            generator: Box::new(HeuristicInsights),
        }
    }

    /// Replace the insight generator used by analysis runs.
    #[must_use]
    pub fn with_generator(mut self, generator: impl InsightGenerator + 'static) -> Self {
        self.generator = Box::new(generator);
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &PrismDb {
        &self.db
    }

    pub(crate) fn generator(&self) -> &dyn InsightGenerator {
        self.generator.as_ref()
    }
}
