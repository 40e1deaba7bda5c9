use serde::Serialize;
use tracing::debug;

use crate::db::job_repository::JobRepository;
use super::models::JobApplication;
use super::service::{JobService, ServiceError};

/// Result of a filter or search
///
/// `Skipped` means the query text was blank and storage was not consulted,
/// which callers can tell apart from a query that matched nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "jobs", rename_all = "snake_case")]
pub enum QueryOutcome {
    Skipped,
    Matched(Vec<JobApplication>),
}

impl QueryOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, QueryOutcome::Skipped)
    }

    /// The matched jobs; empty when the query was skipped
    pub fn jobs(&self) -> &[JobApplication] {
        match self {
            QueryOutcome::Skipped => &[],
            QueryOutcome::Matched(jobs) => jobs,
        }
    }

    pub fn into_jobs(self) -> Vec<JobApplication> {
        match self {
            QueryOutcome::Skipped => Vec::new(),
            QueryOutcome::Matched(jobs) => jobs,
        }
    }
}

impl JobService {
    /// Jobs whose status equals `status` ignoring case, most recent first
    pub async fn filter_by_status(&self, status: &str) -> Result<QueryOutcome, ServiceError> {
        let status = status.trim();
        if status.is_empty() {
            debug!("Service: Blank status filter, no query performed");
            return Ok(QueryOutcome::Skipped);
        }

        let wanted = fold(status);
        debug!("Service: Filtering jobs by status={}", status);
        let mut conn = self.pool.acquire().await?;
        let rows = JobRepository::fetch_where(&mut conn, |row| {
            row.status.as_deref().is_some_and(|stored| fold(stored) == wanted)
        })
        .await?;
        Ok(QueryOutcome::Matched(
            rows.into_iter().map(JobApplication::from).collect(),
        ))
    }

    /// Jobs whose company, role or location contains `keyword` ignoring case,
    /// most recent first
    pub async fn search(&self, keyword: &str) -> Result<QueryOutcome, ServiceError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            debug!("Service: Blank keyword, no query performed");
            return Ok(QueryOutcome::Skipped);
        }

        let needle = fold(keyword);
        debug!("Service: Searching jobs for keyword={}", keyword);
        let mut conn = self.pool.acquire().await?;
        let rows = JobRepository::fetch_where(&mut conn, |row| {
            any_contains(
                [Some(row.company.as_str()), Some(row.role.as_str()), row.location.as_deref()],
                &needle,
            )
        })
        .await?;
        Ok(QueryOutcome::Matched(
            rows.into_iter().map(JobApplication::from).collect(),
        ))
    }
}

/// Unicode case folding shared by every case-insensitive comparison
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Whether any present field contains the already folded `needle`
fn any_contains(fields: [Option<&str>; 3], needle: &str) -> bool {
    fields
        .into_iter()
        .flatten()
        .any(|field| fold(field).contains(needle))
}

/// Keyword search applied to a job already in memory
pub(crate) fn matches_keyword(job: &JobApplication, keyword: &str) -> bool {
    any_contains(
        [Some(job.company.as_str()), Some(job.role.as_str()), job.location.as_deref()],
        &fold(keyword),
    )
}
