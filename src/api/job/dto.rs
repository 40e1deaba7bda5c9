use serde::{Deserialize, Serialize};

use super::models::{CoercionWarning, JobApplication};
use super::stats::DashboardFilter;

/// Response for single job reads and writes
#[derive(Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: JobApplication,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<CoercionWarning>,
}

/// Response for list, filter and search endpoints
#[derive(Serialize)]
pub struct JobListResponse {
    /// False when the query text was blank and nothing was looked up
    pub performed: bool,
    pub count: usize,
    pub jobs: Vec<JobApplication>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub keyword: String,
}

#[derive(Deserialize)]
pub struct TopQuery {
    pub top: Option<u32>,
}

/// Dashboard filters as query parameters
///
/// `status` and `company` may repeat, one value per selection, so names
/// containing commas survive intact. Unknown keys and blank values are ignored.
#[derive(Debug, Default)]
pub struct DashboardQuery {
    pub statuses: Vec<String>,
    pub companies: Vec<String>,
    pub search: Option<String>,
}

impl FromIterator<(String, String)> for DashboardQuery {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = DashboardQuery::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "status" => query.statuses.push(value.to_string()),
                "company" => query.companies.push(value.to_string()),
                "search" => query.search = Some(value.to_string()),
                _ => {}
            }
        }
        query
    }
}

impl From<DashboardQuery> for DashboardFilter {
    fn from(query: DashboardQuery) -> Self {
        DashboardFilter {
            statuses: query.statuses,
            companies: query.companies,
            search: query.search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> DashboardQuery {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn dashboard_lists_collect_repeated_parameters() {
        let filter = DashboardFilter::from(pairs(&[
            ("status", "Offer"),
            ("status", "Online Test"),
            ("status", " "),
            ("company", "Acme, Inc"),
            ("company", "Globex"),
            ("search", "acme"),
            ("page", "2"),
        ]));
        assert_eq!(filter.statuses, vec!["Offer", "Online Test"]);
        assert_eq!(filter.companies, vec!["Acme, Inc", "Globex"]);
        assert_eq!(filter.search.as_deref(), Some("acme"));
    }
}
