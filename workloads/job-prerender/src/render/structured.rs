//! schema.org `JobPosting` structured data.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Number;

use edge_sdk::edge_security::{script_json, TagAllowlist};

use crate::data::JobRecord;
use crate::render::RenderError;

/// Validity window assumed when a job has no expiry.
pub const DEFAULT_VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting<'a> {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub title: &'a str,
    pub description: String,
    pub hiring_organization: Organization<'a>,
    pub job_location: Place<'a>,
    pub employment_type: &'a str,
    pub date_posted: String,
    pub valid_through: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_salary: Option<MonetaryAmount<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Organization<'a> {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub name: &'a str,
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Place<'a> {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub address: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MonetaryAmount<'a> {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub currency: &'static str,
    pub value: QuantitativeValue<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeValue<'a> {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub min_value: &'a Number,
    pub max_value: &'a Number,
    pub unit_text: &'static str,
}

/// Timestamp in the `2024-03-01T12:00:00.000Z` form.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl<'a> JobPosting<'a> {
    /// Structured data for `job`. `now` fills in missing dates. The
    /// description keeps its allowed markup, like the page body.
    pub fn for_job(job: &'a JobRecord, base_url: &'a str, now: DateTime<Utc>) -> Self {
        let company = job.company_name();
        Self {
            context: "https://schema.org",
            kind: "JobPosting",
            title: &job.title,
            description: job
                .description()
                .map(|d| TagAllowlist::rich_text().sanitize(d))
                .unwrap_or_else(|| format!("{} position at {}", job.title, company)),
            hiring_organization: Organization {
                kind: "Organization",
                name: company,
                url: job.company_website().unwrap_or(base_url),
            },
            job_location: Place {
                kind: "Place",
                address: job.location_label(),
            },
            employment_type: job.employment_type(),
            date_posted: job
                .created_at
                .clone()
                .unwrap_or_else(|| iso_timestamp(now)),
            valid_through: job
                .expires_at
                .clone()
                .unwrap_or_else(|| iso_timestamp(now + Duration::days(DEFAULT_VALIDITY_DAYS))),
            base_salary: job.salary_bounds().map(|(min, max)| MonetaryAmount {
                kind: "MonetaryAmount",
                currency: "EUR",
                value: QuantitativeValue {
                    kind: "QuantitativeValue",
                    min_value: min,
                    max_value: max,
                    unit_text: "YEAR",
                },
            }),
        }
    }

    /// JSON safe to place inside `<script type="application/ld+json">`.
    pub fn to_script_json(&self) -> Result<String, RenderError> {
        script_json(self).map_err(|e| RenderError::StructuredData(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::{json, Value};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn to_value(posting: &JobPosting<'_>) -> Value {
        serde_json::from_str(&posting.to_script_json().unwrap()).unwrap()
    }

    #[test]
    fn test_minimal_job_fallbacks() {
        let job = JobRecord::new("rust-dev", "Rust Developer");
        let value = to_value(&JobPosting::for_job(&job, "https://seo-vacancy.eu", now()));

        assert_eq!(
            value,
            json!({
                "@context": "https://schema.org",
                "@type": "JobPosting",
                "title": "Rust Developer",
                "description": "Rust Developer position at Company",
                "hiringOrganization": {
                    "@type": "Organization",
                    "name": "Company",
                    "url": "https://seo-vacancy.eu"
                },
                "jobLocation": { "@type": "Place", "address": "Remote" },
                "employmentType": "FULL_TIME",
                "datePosted": "2024-03-01T12:00:00.000Z",
                "validThrough": "2024-03-31T12:00:00.000Z"
            })
        );
    }

    #[test]
    fn test_full_job() {
        let job = JobRecord {
            company_name: Some("Acme".into()),
            company_website: Some("https://acme.example".into()),
            city: Some("Berlin".into()),
            job_type: Some("PART_TIME".into()),
            salary_min: Some(Number::from(40_000)),
            salary_max: Some(Number::from(60_000)),
            created_at: Some("2024-02-01T09:00:00+00:00".into()),
            expires_at: Some("2024-04-01T00:00:00+00:00".into()),
            description: Some("<p>Build things.</p>".into()),
            ..JobRecord::new("rust-dev", "Rust Developer")
        };
        let value = to_value(&JobPosting::for_job(&job, "https://seo-vacancy.eu", now()));

        assert_eq!(value["hiringOrganization"]["url"], "https://acme.example");
        assert_eq!(value["jobLocation"]["address"], "Berlin");
        assert_eq!(value["employmentType"], "PART_TIME");
        assert_eq!(value["datePosted"], "2024-02-01T09:00:00+00:00");
        assert_eq!(value["validThrough"], "2024-04-01T00:00:00+00:00");
        assert_eq!(value["description"], "<p>Build things.</p>");
        assert_eq!(
            value["baseSalary"],
            json!({
                "@type": "MonetaryAmount",
                "currency": "EUR",
                "value": {
                    "@type": "QuantitativeValue",
                    "minValue": 40000,
                    "maxValue": 60000,
                    "unitText": "YEAR"
                }
            })
        );
    }

    #[test]
    fn test_script_breakout_is_neutralized() {
        let job = JobRecord::new("x", "</script><script>alert(1)</script>");
        let json = JobPosting::for_job(&job, "https://seo-vacancy.eu", now())
            .to_script_json()
            .unwrap();
        assert!(!json.contains("</script>"));
        assert_eq!(to_value(&JobPosting::for_job(&job, "https://seo-vacancy.eu", now()))["title"], job.title);
    }
}
