use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use std::fmt;
use tracing::{error, info, warn};
use validator::{Validate, ValidationErrors};

use crate::api::validation::ErrorResponse;
use crate::db::job_repository::JobRepository;
use crate::db::models::{JobRowChanges, NewJobRow};
use super::models::{
    clean, CoercionWarning, Fallback, JobApplication, JobUpdate, NewJob, SalaryInput, SalaryParse,
};

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// Database operation failed
    DatabaseError(sqlx::Error),

    /// Validation failed; nothing was stored
    ValidationError(String),

    /// Job not found
    NotFound(i64),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::DatabaseError(e) => write!(f, "Database error: {}", e),
            ServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::NotFound(id) => write!(f, "Job not found: {}", id),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::DatabaseError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::DatabaseError(err)
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::DatabaseError(e) => {
                error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Database error occurred"}),
                })
            }
            ServiceError::ValidationError(msg) => {
                warn!("Validation error: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            ServiceError::NotFound(id) => {
                warn!("Job not found: {}", id);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("Job with id {} not found", id)}),
                })
            }
        }
    }
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOutcome {
    pub id: i64,
    pub warnings: Vec<CoercionWarning>,
}

/// Result of an update; `found` is false when no job had the id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateOutcome {
    pub found: bool,
    pub warnings: Vec<CoercionWarning>,
}

/// Job service containing the validated CRUD boundary over the jobs table
///
/// Each operation acquires the database connection for its own duration and
/// returns it on every exit path. Nothing is cached; every read hits storage.
#[derive(Clone)]
pub struct JobService {
    pub(super) pool: Pool<Sqlite>,
}

impl JobService {
    /// Create a new JobService instance
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create a single job
    ///
    /// # Business Logic
    /// - Company and role are trimmed and must not be empty
    /// - Blank optional fields are stored as null
    /// - A salary that is not a number is stored as null with a warning
    ///
    /// # Returns
    /// - `Ok(CreateOutcome)` - Job stored, with any coercion warnings
    /// - `Err(ServiceError::ValidationError)` - Nothing stored
    pub async fn create(&self, job: &NewJob) -> Result<CreateOutcome, ServiceError> {
        if let Err(errors) = job.validate() {
            let message = validation_message(&errors);
            warn!("Service: Rejected job: {}", message);
            return Err(ServiceError::ValidationError(message));
        }

        let mut warnings = Vec::new();
        let salary = match job.salary.as_ref() {
            None => None,
            Some(input) => match input.parse() {
                SalaryParse::Blank => None,
                SalaryParse::Valid(amount) => Some(amount),
                SalaryParse::Invalid => {
                    warnings.push(salary_warning(input, Fallback::Null));
                    None
                }
            },
        };

        let row = NewJobRow {
            company: job.company.trim().to_string(),
            role: job.role.trim().to_string(),
            location: clean(job.location.as_deref()),
            applied_date: clean(job.applied_date.as_deref()),
            status: clean(job.status.as_deref()),
            salary,
            notes: clean(job.notes.as_deref()),
        };

        info!("Service: Creating job company={}, role={}", row.company, row.role);

        let mut conn = self.pool.acquire().await?;
        let id = JobRepository::insert(&mut conn, &row).await?;

        info!("Service: Job created successfully with id={}", id);
        Ok(CreateOutcome { id, warnings })
    }

    /// Fetch one job; `None` when no job has the id
    pub async fn read(&self, id: i64) -> Result<Option<JobApplication>, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        let row = JobRepository::fetch(&mut conn, id).await?;
        Ok(row.map(JobApplication::from))
    }

    /// Update status, applied date, salary and notes of one job
    ///
    /// # Business Logic
    /// - A missing or blank field keeps the stored value
    /// - A salary that is not a number keeps the stored salary, with a warning
    /// - Company and role are never changed
    ///
    /// The read and the write share one transaction.
    pub async fn update(&self, id: i64, changes: &JobUpdate) -> Result<UpdateOutcome, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = JobRepository::fetch(&mut tx, id).await? else {
            info!("Service: No job with id={} to update", id);
            return Ok(UpdateOutcome {
                found: false,
                warnings: Vec::new(),
            });
        };

        let mut warnings = Vec::new();
        let salary = match changes.salary.as_ref() {
            None => current.salary,
            Some(input) => match input.parse() {
                SalaryParse::Blank => current.salary,
                SalaryParse::Valid(amount) => Some(amount),
                SalaryParse::Invalid => {
                    warnings.push(salary_warning(input, Fallback::PreviousValue));
                    current.salary
                }
            },
        };

        let merged = JobRowChanges {
            status: clean(changes.status.as_deref()).or(current.status),
            applied_date: clean(changes.applied_date.as_deref()).or(current.applied_date),
            salary,
            notes: clean(changes.notes.as_deref()).or(current.notes),
        };

        let affected = JobRepository::update(&mut tx, id, &merged).await?;
        tx.commit().await?;

        info!("Service: Job id={} updated", id);
        Ok(UpdateOutcome {
            found: affected > 0,
            warnings,
        })
    }

    /// Delete one job; `false` when no job had the id
    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        let removed = JobRepository::delete(&mut conn, id).await? > 0;

        if removed {
            info!("Service: Job id={} deleted", id);
        } else {
            info!("Service: No job with id={} to delete", id);
        }
        Ok(removed)
    }

    /// All jobs, most recent first
    pub async fn list(&self) -> Result<Vec<JobApplication>, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        let rows = JobRepository::fetch_all(&mut conn).await?;
        Ok(rows.into_iter().map(JobApplication::from).collect())
    }
}

fn salary_warning(input: &SalaryInput, fallback: Fallback) -> CoercionWarning {
    let warning = CoercionWarning {
        field: "salary",
        input: input.as_text(),
        fallback,
    };
    warn!("Service: {}", warning);
    warning
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Validation error in field: {}", field))
            })
        })
        .collect();
    messages.sort();
    messages.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::temp_pool;

    async fn service() -> (tempfile::TempDir, JobService) {
        let (dir, pool) = temp_pool().await;
        (dir, JobService::new(pool))
    }

    #[actix_web::test]
    async fn create_then_read_round_trips_every_field() {
        let (_dir, service) = service().await;

        let job = NewJob {
            company: "Acme Corp".to_string(),
            role: "Engineer".to_string(),
            location: Some("Berlin".to_string()),
            applied_date: Some("2025-11-30".to_string()),
            status: Some("Online Test".to_string()),
            salary: Some(SalaryInput::from("65000.5")),
            notes: Some("Referred by Sam".to_string()),
        };
        let outcome = service.create(&job).await.unwrap();
        assert!(outcome.warnings.is_empty());

        let stored = service.read(outcome.id).await.unwrap().unwrap();
        assert_eq!(
            stored,
            JobApplication {
                id: outcome.id,
                company: "Acme Corp".to_string(),
                role: "Engineer".to_string(),
                location: Some("Berlin".to_string()),
                applied_date: Some("2025-11-30".to_string()),
                status: Some("Online Test".to_string()),
                salary: Some(65000.5),
                notes: Some("Referred by Sam".to_string()),
            }
        );
    }

    #[actix_web::test]
    async fn unset_optional_fields_read_back_as_null() {
        let (_dir, service) = service().await;

        let id = service.create(&NewJob::new("  Acme ", " Engineer ")).await.unwrap().id;
        let stored = service.read(id).await.unwrap().unwrap();

        assert_eq!(stored.company, "Acme");
        assert_eq!(stored.role, "Engineer");
        assert_eq!(stored.location, None);
        assert_eq!(stored.applied_date, None);
        assert_eq!(stored.status, None);
        assert_eq!(stored.salary, None);
        assert_eq!(stored.notes, None);
    }

    #[actix_web::test]
    async fn blank_company_or_role_is_rejected_without_storing() {
        let (_dir, service) = service().await;

        let err = service.create(&NewJob::new("", "Engineer")).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(ref m) if m == "Company is required"));

        let err = service.create(&NewJob::new("Acme", "   ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(ref m) if m == "Role is required"));

        assert!(service.list().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn invalid_salary_on_create_is_stored_as_null() {
        let (_dir, service) = service().await;

        let job = NewJob {
            salary: Some(SalaryInput::from("abc")),
            ..NewJob::new("Acme", "Engineer")
        };
        let outcome = service.create(&job).await.unwrap();

        assert_eq!(
            outcome.warnings,
            vec![CoercionWarning {
                field: "salary",
                input: "abc".to_string(),
                fallback: Fallback::Null,
            }]
        );
        assert_eq!(service.read(outcome.id).await.unwrap().unwrap().salary, None);
    }

    #[actix_web::test]
    async fn invalid_salary_on_update_keeps_previous_value() {
        let (_dir, service) = service().await;

        let job = NewJob {
            salary: Some(SalaryInput::Amount(50000.0)),
            ..NewJob::new("Acme", "Engineer")
        };
        let id = service.create(&job).await.unwrap().id;

        let changes = JobUpdate {
            salary: Some(SalaryInput::from("abc")),
            ..JobUpdate::default()
        };
        let outcome = service.update(id, &changes).await.unwrap();

        assert!(outcome.found);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].fallback, Fallback::PreviousValue);
        assert_eq!(service.read(id).await.unwrap().unwrap().salary, Some(50000.0));
    }

    #[actix_web::test]
    async fn update_keeps_omitted_and_blank_fields() {
        let (_dir, service) = service().await;

        let job = NewJob {
            location: Some("Remote".to_string()),
            applied_date: Some("2025-01-02".to_string()),
            status: Some("Applied".to_string()),
            salary: Some(SalaryInput::from("40000")),
            notes: Some("first round".to_string()),
            ..NewJob::new("Acme", "Engineer")
        };
        let id = service.create(&job).await.unwrap().id;

        let changes = JobUpdate {
            status: Some("Interview".to_string()),
            applied_date: Some("   ".to_string()),
            salary: Some(SalaryInput::from("")),
            notes: None,
        };
        let outcome = service.update(id, &changes).await.unwrap();
        assert!(outcome.found);
        assert!(outcome.warnings.is_empty());

        let stored = service.read(id).await.unwrap().unwrap();
        assert_eq!(stored.status.as_deref(), Some("Interview"));
        assert_eq!(stored.applied_date.as_deref(), Some("2025-01-02"));
        assert_eq!(stored.salary, Some(40000.0));
        assert_eq!(stored.notes.as_deref(), Some("first round"));
        assert_eq!(stored.company, "Acme");
        assert_eq!(stored.role, "Engineer");
        assert_eq!(stored.location.as_deref(), Some("Remote"));
    }

    #[actix_web::test]
    async fn update_of_missing_job_reports_not_found() {
        let (_dir, service) = service().await;

        let changes = JobUpdate {
            status: Some("Offer".to_string()),
            ..JobUpdate::default()
        };
        let outcome = service.update(99, &changes).await.unwrap();
        assert!(!outcome.found);
    }

    #[actix_web::test]
    async fn delete_removes_exactly_one_job_and_is_idempotent() {
        let (_dir, service) = service().await;

        let keep = service.create(&NewJob::new("Acme", "Engineer")).await.unwrap().id;
        let gone = service.create(&NewJob::new("Globex", "Clerk")).await.unwrap().id;

        assert!(!service.delete(gone + 100).await.unwrap());
        assert_eq!(service.list().await.unwrap().len(), 2);

        assert!(service.delete(gone).await.unwrap());
        let remaining: Vec<i64> = service.list().await.unwrap().iter().map(|j| j.id).collect();
        assert_eq!(remaining, vec![keep]);

        assert!(!service.delete(gone).await.unwrap());
    }

    #[actix_web::test]
    async fn list_returns_most_recent_first() {
        let (_dir, service) = service().await;

        let a = service.create(&NewJob::new("A", "Role")).await.unwrap().id;
        let b = service.create(&NewJob::new("B", "Role")).await.unwrap().id;
        let c = service.create(&NewJob::new("C", "Role")).await.unwrap().id;

        let ids: Vec<i64> = service.list().await.unwrap().iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![c, b, a]);
    }
}
