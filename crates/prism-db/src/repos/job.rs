//! Job repository: recorded overlap scans and analysis runs.
//!
//! The local backend runs a job to completion inside `start_*`, so the
//! returned job is already finished. Callers still poll `job_status` the way
//! they would against a remote backend.

use chrono::Utc;

use prism_core::audit_detail::JobFinishedDetail;
use prism_core::entities::Job;
use prism_core::enums::{AuditAction, JobKind, JobStatus, RecordKind};

use crate::error::DatabaseError;
use crate::helpers::{get_count, get_opt_string, parse_datetime, parse_enum, parse_optional_datetime, to_json};
use crate::service::PrismService;

fn row_to_job(row: &libsql::Row) -> Result<Job, DatabaseError> {
    Ok(Job {
        id: row.get::<i64>(0)?,
        kind: parse_enum(&row.get::<String>(1)?)?,
        status: parse_enum(&row.get::<String>(2)?)?,
        result_count: get_count(row, 3)?,
        error: get_opt_string(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        finished_at: parse_optional_datetime(get_opt_string(row, 6)?.as_deref())?,
    })
}

impl PrismService {
    async fn open_job(&self, kind: JobKind) -> Result<i64, DatabaseError> {
        self.db()
            .conn()
            .execute(
                "INSERT INTO jobs (kind, status, created_at) VALUES (?1, ?2, ?3)",
                libsql::params![kind.as_str(), JobStatus::Running.as_str(), Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(self.db().last_insert_id())
    }

    async fn finish_job(
        &self,
        id: i64,
        kind: JobKind,
        outcome: Result<u32, DatabaseError>,
    ) -> Result<Job, DatabaseError> {
        let (status, result_count, error) = match outcome {
            Ok(count) => (JobStatus::Completed, count, None),
            Err(err) => {
                tracing::warn!(job_id = id, kind = %kind, %err, "job failed");
                (JobStatus::Failed, 0, Some(err.to_string()))
            }
        };
        self.db()
            .in_transaction(|| async {
                self.db()
                    .conn()
                    .execute(
                        "UPDATE jobs SET status = ?1, result_count = ?2, error = ?3, finished_at = ?4
                         WHERE id = ?5 AND status = 'running'",
                        libsql::params![
                            status.as_str(),
                            i64::from(result_count),
                            error.as_deref(),
                            Utc::now().to_rfc3339(),
                            id
                        ],
                    )
                    .await?;
                self.append_audit(
                    RecordKind::Job,
                    id,
                    AuditAction::JobFinished,
                    Some(to_json(&JobFinishedDetail {
                        kind: kind.as_str().to_string(),
                        status: status.as_str().to_string(),
                        result_count,
                    })?),
                )
                .await
            })
            .await?;
        self.job_status(id).await
    }

    /// Start an overlap scan. A failed scan is recorded on the job rather
    /// than returned as an error.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the job row cannot be written.
    pub async fn start_overlap_scan(&self) -> Result<Job, DatabaseError> {
        let id = self.open_job(JobKind::OverlapScan).await?;
        let outcome = self.scan_overlaps().await;
        self.finish_job(id, JobKind::OverlapScan, outcome).await
    }

    /// Start an analysis run. A failed run is recorded on the job rather
    /// than returned as an error.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the job row cannot be written.
    pub async fn start_analysis(&self) -> Result<Job, DatabaseError> {
        let id = self.open_job(JobKind::Analysis).await?;
        let outcome = self.run_analysis().await;
        self.finish_job(id, JobKind::Analysis, outcome).await
    }

    /// Current state of a job.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown id.
    pub async fn job_status(&self, id: i64) -> Result<Job, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, kind, status, result_count, error, created_at, finished_at
                 FROM jobs WHERE id = ?1",
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or(DatabaseError::not_found("job", id))?;
        row_to_job(&row)
    }
}
