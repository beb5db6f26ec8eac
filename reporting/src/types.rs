//! Typed report values produced by the decoders.
//!
//! Field names follow the storage layout (snake_case); the browser-facing key
//! names live in the decoders.

use crate::service_tag::ServiceTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Content-Security-Policy violation.
/// See https://www.w3.org/TR/CSP3/#violation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CspViolation {
    /// The URI of the document in which the violation occurred.
    pub document_uri: String,
    pub referrer: String,
    /// The resource that was blocked. Cross-origin URIs are truncated by the
    /// browser to scheme, host and port.
    pub blocked_uri: String,
    pub violated_directive: String,
    pub effective_directive: String,
    /// The policy as delivered in the Content-Security-Policy header.
    pub original_policy: String,
    pub source_file: String,
    pub status_code: i64,
    /// 1-based
    pub line_number: i32,
    /// 1-based
    pub column_number: i32,
    /// First 40 characters of the rejected script, if the policy asked for it.
    pub script_sample: String,
}

/// A Certificate Transparency policy failure reported via Expect-CT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectCtFailure {
    pub date_time: Option<DateTime<Utc>>,
    pub effective_expiration_date: Option<DateTime<Utc>>,
    pub hostname: String,
    pub port: u16,
    pub scts: Vec<String>,
    pub served_certificate_chain: Vec<String>,
    pub validated_certificate_chain: Vec<String>,
}

/// Use of a deprecated browser feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeprecationNotice {
    /// Name of the API, e.g. `websql`
    pub id: String,
    /// `YYYY-MM-DD`
    pub anticipated_removal: String,
    pub message: String,
    pub source_file: String,
    pub line_number: i32,
    pub column_number: i32,
}

/// Family-specific body of a Reporting API envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", content = "fields", rename_all = "snake_case")]
pub enum EnvelopeBody {
    Csp(CspViolation),
    Deprecation(DeprecationNotice),
    /// Any other report type (`network-error`, `intervention`, `crash`, ...),
    /// kept as received.
    Other(Map<String, Value>),
}

/// Generic W3C Reporting API report. Delivered as a JSON array of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportingEnvelope {
    pub r#type: String,
    /// Milliseconds between report generation and delivery.
    pub age: i64,
    pub url: String,
    pub user_agent: String,
    pub body: EnvelopeBody,
}

/// A Web Vitals performance sample. See https://web.dev/vitals/.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebVital {
    /// The name of the metric in acronym form, e.g. `LCP`
    pub name: String,
    pub value: f64,
    /// Difference to the last reported value. Equal to `value` on the first report.
    pub delta: f64,
    /// Unique per metric and page load, used to group deltas.
    pub id: String,
    pub label: Option<String>,
    /// Performance entries as sent by the library; not interpreted.
    pub entries: Vec<Value>,
}

/// Whether a policy violation was only reported or actually enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    #[default]
    #[serde(rename = "DISPOSITION_UNKNOWN")]
    Unknown,
    Reporting,
    Enforced,
}

impl Disposition {
    /// Maps the Reporting API `disposition` value.
    pub fn from_report_value(value: Option<&str>) -> Self {
        match value {
            Some("enforce") => Disposition::Enforced,
            Some("report") => Disposition::Reporting,
            _ => Disposition::Unknown,
        }
    }
}

/// The report family carried by a [`SecurityReport`]. Exactly one is always set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportExtension {
    CspReport(CspViolation),
    DeprecationReport(DeprecationNotice),
}

/// A security report keyed for deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    /// Checksum of the report as received, see [`crate::checksum`].
    pub report_checksum: String,
    /// When the report was generated, in milliseconds since the epoch.
    /// `None` if the browser did not send an `age`.
    pub report_time: Option<i64>,
    /// Times this report was seen. Always 1 until aggregated.
    pub report_count: i64,
    pub user_agent: String,
    pub browser_name: String,
    pub browser_major_version: i32,
    pub disposition: Disposition,
    pub extension: ReportExtension,
}

impl SecurityReport {
    pub fn new(report_checksum: String, extension: ReportExtension) -> Self {
        SecurityReport {
            report_checksum,
            report_time: None,
            report_count: 1,
            user_agent: String::new(),
            browser_name: String::new(),
            browser_major_version: 0,
            disposition: Disposition::Unknown,
            extension,
        }
    }
}

/// Exactly one decoded report of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "report", rename_all = "kebab-case")]
pub enum Report {
    Csp(CspViolation),
    ExpectCt(ExpectCtFailure),
    ReportingApi(ReportingEnvelope),
    WebVital(WebVital),
    Security(SecurityReport),
}

impl Report {
    /// Grouping key used by summaries: the family name, or the metric name
    /// for web vitals.
    pub fn kind(&self) -> &str {
        match self {
            Report::Csp(_) => "csp",
            Report::ExpectCt(_) => "expect-ct",
            Report::ReportingApi(_) => "reporting-api",
            Report::WebVital(vital) => &vital.name,
            Report::Security(_) => "security",
        }
    }
}

/// A validated report annotated for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub report: Report,
    /// Server clock at ingestion, independent of anything the report claims.
    pub ingested_at: DateTime<Utc>,
    pub service: ServiceTag,
}
