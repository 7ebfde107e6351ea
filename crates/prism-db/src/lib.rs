//! # prism-db
//!
//! libSQL storage for Prism research projects.
//!
//! Holds all relational state: projects, entity-type schemas, entities and
//! their provenance-tagged attribute values, evidence, extraction results,
//! cross-project links and insights, jobs, and the audit trail.
//!
//! `PrismService` is the request/response backend the engines talk to. Every
//! repository lives in an `impl PrismService` block under [`repos`]; the
//! overlap scan and insight generation run as recorded jobs.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) with a local file or an
//! in-memory database.

pub mod analysis;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
pub(crate) mod test_support;

use std::future::Future;

use error::DatabaseError;
use libsql::Builder;

/// Database handle for all Prism state.
///
/// Wraps a libSQL database and a single connection. All repositories share
/// the connection, so a transaction opened here covers every statement issued
/// until it commits.
pub struct PrismDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl PrismDb {
    /// Open a local database at the given path, or `":memory:"`.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let prism_db = Self { db, conn };
        prism_db.run_migrations().await?;
        Ok(prism_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Rowid of the most recent successful INSERT on this connection.
    #[must_use]
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Run `work` inside a transaction: commit on `Ok`, roll back on `Err`.
    ///
    /// Not reentrant: `work` must not open another transaction.
    ///
    /// # Errors
    ///
    /// Returns the error from `work`, or a `DatabaseError` if BEGIN or COMMIT
    /// fails.
    pub async fn in_transaction<T, F, Fut>(&self, work: F) -> Result<T, DatabaseError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DatabaseError>>,
    {
        let tx = self.conn.transaction().await?;
        match work().await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(%rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> PrismDb {
        PrismDb::open_local(":memory:").await.unwrap()
    }

    async fn count(db: &PrismDb, sql: &str) -> i64 {
        let mut rows = db.conn().query(sql, ()).await.unwrap();
        rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        let tables = [
            "projects",
            "entity_types",
            "attribute_defs",
            "entities",
            "attribute_values",
            "evidence",
            "extraction_results",
            "cross_project_links",
            "cross_project_insights",
            "jobs",
            "audit_trail",
        ];
        for table in &tables {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
        assert_eq!(count(&db, "SELECT COUNT(*) FROM projects").await, 0);
    }

    #[tokio::test]
    async fn foreign_keys_enforced() {
        let db = test_db().await;
        let result = db
            .conn()
            .execute(
                "INSERT INTO entities (project_id, type_slug, name, created_at, updated_at)
                 VALUES (999, 'company', 'Ghost', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                (),
            )
            .await;
        assert!(result.is_err(), "insert with unknown project should fail");
    }

    #[tokio::test]
    async fn transaction_rolls_back_on_error() {
        let db = test_db().await;
        let result: Result<(), DatabaseError> = db
            .in_transaction(|| async {
                db.conn()
                    .execute(
                        "INSERT INTO projects (name, created_at) VALUES ('a', '2026-01-01T00:00:00Z')",
                        (),
                    )
                    .await?;
                Err(DatabaseError::Conflict("abort".into()))
            })
            .await;
        assert!(matches!(result, Err(DatabaseError::Conflict(_))));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM projects").await, 0);
    }

    #[tokio::test]
    async fn transaction_commits_on_success() {
        let db = test_db().await;
        db.in_transaction(|| async {
            db.conn()
                .execute(
                    "INSERT INTO projects (name, created_at) VALUES ('a', '2026-01-01T00:00:00Z')",
                    (),
                )
                .await?;
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(count(&db, "SELECT COUNT(*) FROM projects").await, 1);
    }

    #[tokio::test]
    async fn link_to_self_is_rejected_by_schema() {
        let db = test_db().await;
        db.conn()
            .execute_batch(
                "INSERT INTO projects (name, created_at) VALUES ('p', '2026-01-01T00:00:00Z');
                 INSERT INTO entities (project_id, type_slug, name, created_at, updated_at)
                 VALUES (1, 'company', 'Acme', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z');",
            )
            .await
            .unwrap();
        let result = db
            .conn()
            .execute(
                "INSERT INTO cross_project_links
                 (source_entity_id, target_entity_id, link_type, confidence, source, created_at)
                 VALUES (1, 1, 'related', 1.0, 'manual', '2026-01-01T00:00:00Z')",
                (),
            )
            .await;
        assert!(result.is_err());
    }
}
