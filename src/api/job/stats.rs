use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::db::job_repository::JobRepository;
use super::models::{ApplicationStatus, JobApplication};
use super::query::matches_keyword;
use super::service::{JobService, ServiceError};

/// Companies listed by the CLI summary
pub const SUMMARY_TOP_COMPANIES: u32 = 5;
/// Companies charted on the dashboard
pub const DASHBOARD_TOP_COMPANIES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyCount {
    pub company: String,
    pub count: i64,
}

/// Totals shown by the summary views
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub top_companies: Vec<CompanyCount>,
}

/// Dashboard filter selections; an empty set places no restriction
#[derive(Debug, Clone, Default)]
pub struct DashboardFilter {
    pub statuses: Vec<String>,
    pub companies: Vec<String>,
    pub search: Option<String>,
}

impl DashboardFilter {
    fn admits(&self, job: &JobApplication) -> bool {
        if !self.statuses.is_empty() {
            match job.status.as_ref() {
                Some(status) if self.statuses.contains(status) => {}
                _ => return false,
            }
        }
        if !self.companies.is_empty() && !self.companies.contains(&job.company) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(keyword) if !keyword.is_empty() => matches_keyword(job, keyword),
            _ => true,
        }
    }
}

/// Everything the dashboard page renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub total: i64,
    pub filtered: usize,
    pub offers: usize,
    pub interviews: usize,
    /// Distinct stored statuses, for the status picker
    pub statuses: Vec<String>,
    /// Distinct companies, for the company picker
    pub companies: Vec<String>,
    pub jobs: Vec<JobApplication>,
    pub by_status: BTreeMap<String, i64>,
    pub top_companies: Vec<CompanyCount>,
}

impl JobService {
    pub async fn total_count(&self) -> Result<i64, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(JobRepository::count(&mut conn).await?)
    }

    /// Job count per status. Jobs without a status are counted under "Unknown".
    pub async fn counts_by_status(&self) -> Result<BTreeMap<String, i64>, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        let groups = JobRepository::count_by_status(&mut conn).await?;
        Ok(groups.into_iter().map(|g| (g.label, g.count)).collect())
    }

    /// The `n` companies with the most jobs, highest count first.
    /// Equal counts are ordered by company name ascending.
    pub async fn top_companies(&self, n: u32) -> Result<Vec<CompanyCount>, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        let groups = JobRepository::top_companies(&mut conn, n).await?;
        Ok(groups
            .into_iter()
            .map(|g| CompanyCount {
                company: g.label,
                count: g.count,
            })
            .collect())
    }

    pub async fn summary(&self, top: u32) -> Result<Summary, ServiceError> {
        Ok(Summary {
            total: self.total_count().await?,
            by_status: self.counts_by_status().await?,
            top_companies: self.top_companies(top).await?,
        })
    }

    pub async fn dashboard(&self, filter: &DashboardFilter) -> Result<DashboardView, ServiceError> {
        let all = self.list().await?;
        let summary = self.summary(DASHBOARD_TOP_COMPANIES).await?;

        let offers = count_status(&all, &ApplicationStatus::Offer);
        let interviews = count_status(&all, &ApplicationStatus::Interview);

        let statuses: BTreeSet<String> = all.iter().filter_map(|j| j.status.clone()).collect();
        let companies: BTreeSet<String> = all.iter().map(|j| j.company.clone()).collect();

        let jobs: Vec<JobApplication> = all.into_iter().filter(|j| filter.admits(j)).collect();

        Ok(DashboardView {
            total: summary.total,
            filtered: jobs.len(),
            offers,
            interviews,
            statuses: statuses.into_iter().collect(),
            companies: companies.into_iter().collect(),
            jobs,
            by_status: summary.by_status,
            top_companies: summary.top_companies,
        })
    }
}

fn count_status(jobs: &[JobApplication], status: &ApplicationStatus) -> usize {
    jobs.iter()
        .filter(|j| j.status_kind().as_ref() == Some(status))
        .count()
}
