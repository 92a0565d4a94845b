//! Job record as stored in the `jobs` table.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Fallback employer name.
pub const DEFAULT_COMPANY: &str = "Company";
/// Fallback location.
pub const DEFAULT_LOCATION: &str = "Remote";
/// schema.org employment type used when the record has none.
pub const DEFAULT_EMPLOYMENT_TYPE: &str = "FULL_TIME";

/// Primary key of a job row. Integer or UUID depending on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobId {
    Int(i64),
    Text(String),
}

impl Default for JobId {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Text(id) => write!(f, "{}", id),
        }
    }
}

/// A job posting. Read-only from the edge's point of view; columns the
/// renderer does not use are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub id: JobId,
    pub slug: String,
    pub title: String,
    /// Rich text (HTML fragment).
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub salary_min: Option<Number>,
    #[serde(default)]
    pub salary_max: Option<Number>,
    /// ISO 8601 timestamp, passed through untouched.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
    /// Rich text (HTML fragment).
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub application_url: Option<String>,
}

impl JobRecord {
    /// Create a record with only the required columns.
    pub fn new(slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(&self) -> Option<&str> {
        present(&self.description)
    }

    pub fn requirements(&self) -> Option<&str> {
        present(&self.requirements)
    }

    pub fn job_type(&self) -> Option<&str> {
        present(&self.job_type)
    }

    pub fn application_url(&self) -> Option<&str> {
        present(&self.application_url)
    }

    pub fn company_website(&self) -> Option<&str> {
        present(&self.company_website)
    }

    /// Employer name, or [`DEFAULT_COMPANY`].
    pub fn company_name(&self) -> &str {
        present(&self.company_name).unwrap_or(DEFAULT_COMPANY)
    }

    /// `location`, else `city`, else [`DEFAULT_LOCATION`].
    pub fn location_label(&self) -> &str {
        present(&self.location)
            .or_else(|| present(&self.city))
            .unwrap_or(DEFAULT_LOCATION)
    }

    /// schema.org `employmentType`.
    pub fn employment_type(&self) -> &str {
        self.job_type().unwrap_or(DEFAULT_EMPLOYMENT_TYPE)
    }

    /// Both salary bounds, when both are set and non-zero.
    pub fn salary_bounds(&self) -> Option<(&Number, &Number)> {
        let min = self.salary_min.as_ref().filter(|n| !is_zero(n))?;
        let max = self.salary_max.as_ref().filter(|n| !is_zero(n))?;
        Some((min, max))
    }

    /// Display text such as `€40,000 - €60,000`, or `Competitive salary`.
    pub fn salary_label(&self) -> String {
        match self.salary_bounds() {
            Some((min, max)) => format!("€{} - €{}", group_thousands(min), group_thousands(max)),
            None => "Competitive salary".to_string(),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn is_zero(n: &Number) -> bool {
    n.as_f64().map_or(true, |v| v == 0.0)
}

/// Format a number with `,` thousands separators and at most three
/// fraction digits.
pub fn group_thousands(n: &Number) -> String {
    if let Some(v) = n.as_i64() {
        let grouped = group_digits(&v.unsigned_abs().to_string());
        return if v < 0 { format!("-{}", grouped) } else { grouped };
    }
    if let Some(v) = n.as_u64() {
        return group_digits(&v.to_string());
    }

    let v = n.as_f64().unwrap_or_default();
    let fixed = format!("{:.3}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::new();
    if v < 0.0 {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
