use std::io;

use chrono::{DateTime, TimeZone};

use super::models::JobApplication;
use super::service::{JobService, ServiceError};

/// Column titles of the export, in cell order
pub const EXPORT_HEADER: [&str; 8] = [
    "ID",
    "Company",
    "Role",
    "Location",
    "Applied Date",
    "Status",
    "Salary",
    "Notes",
];

pub type ExportRow = [String; 8];

/// Export rows: the header first, then one row per job, most recent first
///
/// Rows are rendered as they are pulled. Absent values become empty cells.
#[derive(Debug)]
pub struct ExportRows {
    header_pending: bool,
    jobs: std::vec::IntoIter<JobApplication>,
}

impl ExportRows {
    pub fn new(jobs: Vec<JobApplication>) -> Self {
        Self {
            header_pending: true,
            jobs: jobs.into_iter(),
        }
    }

    /// Number of job rows not yet pulled, excluding the header
    pub fn record_count(&self) -> usize {
        self.jobs.len()
    }

    /// Write the remaining rows as CSV and return how many job rows were written
    pub fn write_csv<W: io::Write>(self, writer: W) -> Result<usize, csv::Error> {
        let records = self.record_count();
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in self {
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;
        Ok(records)
    }
}

impl Iterator for ExportRows {
    type Item = ExportRow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.header_pending {
            self.header_pending = false;
            return Some(EXPORT_HEADER.map(str::to_string));
        }
        self.jobs.next().map(|job| render_row(&job))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.jobs.len() + usize::from(self.header_pending);
        (len, Some(len))
    }
}

impl ExactSizeIterator for ExportRows {}

impl JobService {
    /// Every stored job as export rows
    pub async fn export_all(&self) -> Result<ExportRows, ServiceError> {
        Ok(ExportRows::new(self.list().await?))
    }
}

/// Encode a single row as one CSV line
pub fn csv_line(row: &ExportRow) -> Result<Vec<u8>, csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(Vec::new());
    csv_writer.write_record(row)?;
    csv_writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// File name offered for an export taken at `at`
pub fn default_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("job_applications_{}.csv", at.format("%Y%m%d_%H%M%S"))
}

fn render_row(job: &JobApplication) -> ExportRow {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    [
        job.id.to_string(),
        job.company.clone(),
        job.role.clone(),
        text(&job.location),
        text(&job.applied_date),
        text(&job.status),
        job.salary.map(format_salary).unwrap_or_default(),
        text(&job.notes),
    ]
}

/// Whole amounts keep one decimal place (`50000.0`)
fn format_salary(salary: f64) -> String {
    if salary.fract() == 0.0 && salary.abs() < 1e16 {
        format!("{:.1}", salary)
    } else {
        salary.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::job::models::{NewJob, SalaryInput};
    use crate::db::test_support::temp_pool;

    #[test]
    fn salaries_render_with_a_decimal_place() {
        assert_eq!(format_salary(50000.0), "50000.0");
        assert_eq!(format_salary(1234.56), "1234.56");
        assert_eq!(format_salary(-3.0), "-3.0");
    }

    #[test]
    fn file_name_carries_the_timestamp() {
        let at = chrono::Utc.with_ymd_and_hms(2025, 11, 30, 14, 5, 9).unwrap();
        assert_eq!(default_file_name(&at), "job_applications_20251130_140509.csv");
    }

    #[test]
    fn empty_export_is_only_the_header() {
        let rows: Vec<ExportRow> = ExportRows::new(Vec::new()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], EXPORT_HEADER.map(str::to_string));
    }

    #[actix_web::test]
    async fn export_renders_header_then_jobs_most_recent_first() {
        let (_dir, pool) = temp_pool().await;
        let service = JobService::new(pool);

        let first = service
            .create(&NewJob {
                location: Some("Berlin".to_string()),
                salary: Some(SalaryInput::Amount(50000.0)),
                notes: Some("said \"hi\", waved".to_string()),
                ..NewJob::new("Acme", "Engineer")
            })
            .await
            .unwrap()
            .id;
        let second = service
            .create(&NewJob {
                status: Some("Offer".to_string()),
                ..NewJob::new("Globex", "Clerk")
            })
            .await
            .unwrap()
            .id;

        let rows = service.export_all().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.record_count(), 2);

        let mut out = Vec::new();
        assert_eq!(rows.write_csv(&mut out).unwrap(), 2);

        let expected = format!(
            "ID,Company,Role,Location,Applied Date,Status,Salary,Notes\n\
             {second},Globex,Clerk,,,Offer,,\n\
             {first},Acme,Engineer,Berlin,,,50000.0,\"said \"\"hi\"\", waved\"\n"
        );
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn csv_line_quotes_cells_with_commas() {
        let row: ExportRow = [
            "1".to_string(),
            "Acme, Inc".to_string(),
            "Dev".to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ];
        let line = csv_line(&row).unwrap();
        assert_eq!(String::from_utf8(line).unwrap(), "1,\"Acme, Inc\",Dev,,,,,\n");
    }
}
