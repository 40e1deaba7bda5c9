use sqlx::FromRow;

/// Database representation of a job application with all fields
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    pub applied_date: Option<String>,
    pub status: Option<String>,
    pub salary: Option<f64>,
    pub notes: Option<String>,
}

/// Column values for a new row; the id is assigned by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewJobRow {
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    pub applied_date: Option<String>,
    pub status: Option<String>,
    pub salary: Option<f64>,
    pub notes: Option<String>,
}

/// The mutable columns of an existing row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobRowChanges {
    pub status: Option<String>,
    pub applied_date: Option<String>,
    pub salary: Option<f64>,
    pub notes: Option<String>,
}

/// One group of a `GROUP BY` count
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct GroupCount {
    pub label: String,
    pub count: i64,
}
