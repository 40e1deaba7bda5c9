use futures_util::{future, TryStreamExt};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::db::models::{GroupCount, JobRow, JobRowChanges, NewJobRow};

const JOB_COLUMNS: &str = "id, company, role, location, applied_date, status, salary, notes";

/// Label for rows without a status in grouped counts
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Raw storage operations on the `jobs` table
///
/// Every function runs against a connection the caller has acquired, so the
/// caller decides the scope (single statement or transaction). Read-many
/// functions return rows ordered by id descending.
pub struct JobRepository;

impl JobRepository {
    /// Insert a new job row and return the id assigned by the store
    pub async fn insert(conn: &mut SqliteConnection, job: &NewJobRow) -> Result<i64, sqlx::Error> {
        debug!("Inserting job: company={}, role={}", job.company, job.role);

        let result = sqlx::query(
            r#"
            INSERT INTO jobs (company, role, location, applied_date, status, salary, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.company)
        .bind(&job.role)
        .bind(&job.location)
        .bind(&job.applied_date)
        .bind(&job.status)
        .bind(job.salary)
        .bind(&job.notes)
        .execute(&mut *conn)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Job inserted with id={}", id);
        Ok(id)
    }

    pub async fn fetch(conn: &mut SqliteConnection, id: i64) -> Result<Option<JobRow>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = ?");
        sqlx::query_as::<_, JobRow>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
    }

    pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<JobRow>, sqlx::Error> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY id DESC");
        sqlx::query_as::<_, JobRow>(&query).fetch_all(&mut *conn).await
    }

    /// Rows accepted by `predicate`, ordered by id descending
    ///
    /// Rows are streamed from the store and tested one at a time, so matching
    /// rules (such as Unicode case folding) live with the caller.
    pub async fn fetch_where<P>(
        conn: &mut SqliteConnection,
        predicate: P,
    ) -> Result<Vec<JobRow>, sqlx::Error>
    where
        P: Fn(&JobRow) -> bool,
    {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY id DESC");
        let rows: Vec<JobRow> = sqlx::query_as::<_, JobRow>(&query)
            .fetch(&mut *conn)
            .try_filter(|row| future::ready(predicate(row)))
            .try_collect()
            .await?;

        debug!("Fetched {} matching jobs", rows.len());
        Ok(rows)
    }

    /// Overwrite the mutable columns of one row and return the number of rows affected
    pub async fn update(
        conn: &mut SqliteConnection,
        id: i64,
        changes: &JobRowChanges,
    ) -> Result<u64, sqlx::Error> {
        debug!("Updating job id={}", id);

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?, applied_date = ?, salary = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.status)
        .bind(&changes.applied_date)
        .bind(changes.salary)
        .bind(&changes.notes)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<u64, sqlx::Error> {
        debug!("Deleting job id={}", id);

        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn count(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(&mut *conn)
            .await
    }

    /// Row counts per status; null and empty statuses share the `Unknown` group
    pub async fn count_by_status(conn: &mut SqliteConnection) -> Result<Vec<GroupCount>, sqlx::Error> {
        sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT COALESCE(NULLIF(status, ''), ?) AS label, COUNT(*) AS count
            FROM jobs
            GROUP BY label
            ORDER BY label
            "#,
        )
        .bind(UNKNOWN_STATUS)
        .fetch_all(&mut *conn)
        .await
    }

    /// The `limit` companies with the most rows; ties are broken by company name ascending
    pub async fn top_companies(
        conn: &mut SqliteConnection,
        limit: u32,
    ) -> Result<Vec<GroupCount>, sqlx::Error> {
        sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT company AS label, COUNT(*) AS count
            FROM jobs
            GROUP BY company
            ORDER BY count DESC, company ASC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&mut *conn)
        .await
    }
}
