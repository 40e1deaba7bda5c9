use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::db::models::JobRow;

/// Conventional application statuses. Storage keeps free text, so anything
/// outside the suggested set is carried as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    Applied,
    OnlineTest,
    Interview,
    Rejected,
    Offer,
    Other,
    Custom(String),
}

impl ApplicationStatus {
    /// The values offered to users when picking a status
    pub fn suggested() -> [ApplicationStatus; 6] {
        [
            ApplicationStatus::Applied,
            ApplicationStatus::OnlineTest,
            ApplicationStatus::Interview,
            ApplicationStatus::Rejected,
            ApplicationStatus::Offer,
            ApplicationStatus::Other,
        ]
    }

    /// Classify stored status text, ignoring case and surrounding whitespace
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        Self::suggested()
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| ApplicationStatus::Custom(trimmed.to_string()))
    }

    pub fn label(&self) -> &str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::OnlineTest => "Online Test",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Offer => "Offer",
            ApplicationStatus::Other => "Other",
            ApplicationStatus::Custom(text) => text,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored job application
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobApplication {
    pub id: i64,
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    pub applied_date: Option<String>,
    pub status: Option<String>,
    pub salary: Option<f64>,
    pub notes: Option<String>,
}

impl JobApplication {
    /// The stored status classified against the suggested set
    pub fn status_kind(&self) -> Option<ApplicationStatus> {
        self.status.as_deref().map(ApplicationStatus::parse)
    }
}

impl From<JobRow> for JobApplication {
    fn from(row: JobRow) -> Self {
        JobApplication {
            id: row.id,
            company: row.company,
            role: row.role,
            location: non_empty(row.location),
            applied_date: non_empty(row.applied_date),
            status: non_empty(row.status),
            salary: row.salary,
            notes: non_empty(row.notes),
        }
    }
}

/// Salary as supplied by a client: a JSON number or free text
///
/// Any other JSON value is kept as `Unsupported` and coerced like malformed text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SalaryInput {
    Amount(f64),
    Text(String),
    Unsupported(serde_json::Value),
}

/// Result of turning a salary input into a stored value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SalaryParse {
    /// Nothing was entered
    Blank,
    Valid(f64),
    /// Input was present but is not a finite number
    Invalid,
}

impl SalaryInput {
    pub fn parse(&self) -> SalaryParse {
        match self {
            SalaryInput::Amount(amount) if amount.is_finite() => SalaryParse::Valid(*amount),
            SalaryInput::Amount(_) => SalaryParse::Invalid,
            SalaryInput::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return SalaryParse::Blank;
                }
                match strip_digit_separators(text).map(|t| t.parse::<f64>()) {
                    Some(Ok(amount)) if amount.is_finite() => SalaryParse::Valid(amount),
                    _ => SalaryParse::Invalid,
                }
            }
            SalaryInput::Unsupported(_) => SalaryParse::Invalid,
        }
    }

    /// The raw input as text, for warnings
    pub fn as_text(&self) -> String {
        match self {
            SalaryInput::Amount(amount) => amount.to_string(),
            SalaryInput::Text(text) => text.clone(),
            SalaryInput::Unsupported(value) => value.to_string(),
        }
    }
}

/// Remove `_` separators sitting between two digits (`1_000`).
/// Returns `None` when an underscore appears anywhere else.
fn strip_digit_separators(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut digits = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        if c != '_' {
            digits.push(c);
            continue;
        }
        let before = i > 0 && bytes[i - 1].is_ascii_digit();
        let after = bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
        if !(before && after) {
            return None;
        }
    }
    Some(digits)
}

impl From<&str> for SalaryInput {
    fn from(text: &str) -> Self {
        SalaryInput::Text(text.to_string())
    }
}

/// Candidate for a new job application
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewJob {
    #[validate(custom(function = "not_blank", message = "Company is required"))]
    pub company: String,
    #[validate(custom(function = "not_blank", message = "Role is required"))]
    pub role: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub applied_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub salary: Option<SalaryInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewJob {
    pub fn new(company: impl Into<String>, role: impl Into<String>) -> Self {
        NewJob {
            company: company.into(),
            role: role.into(),
            ..NewJob::default()
        }
    }
}

/// Changes to an existing job application
///
/// Every field is optional; a missing or blank value keeps what is stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobUpdate {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub applied_date: Option<String>,
    #[serde(default)]
    pub salary: Option<SalaryInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// What replaced a malformed optional input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// The field was stored as null
    Null,
    /// The previously stored value was kept
    PreviousValue,
}

/// Non-fatal notice that an optional input was replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoercionWarning {
    pub field: &'static str,
    pub input: String,
    pub fallback: Fallback,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fallback {
            Fallback::Null => write!(
                f,
                "Invalid {} {:?}. Saving {} as empty.",
                self.field, self.input, self.field
            ),
            Fallback::PreviousValue => write!(
                f,
                "Invalid {} {:?}. Keeping old {}.",
                self.field, self.input, self.field
            ),
        }
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Trim optional text, treating whitespace-only input as absent
pub(crate) fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
